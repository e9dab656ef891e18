//! Chat panel behaviour.
//!
//! - [`ChatPanel`]: drives one question from submit to fully revealed answer
//! - [`RevealSimulator`]: paces the display of an already received answer

mod panel;
mod reveal;

pub use panel::{APOLOGY_MESSAGE, ChatPanel, Turn, TurnOutcome};
pub use reveal::{RevealOutcome, RevealSimulator};
