//! Top navigation bar.

/// External links shown on the right of the bar.
const NAV_LINKS: &[(&str, &str)] = &[
    ("Frontend", "https://github.com/fabischkamau/moduskgfrontend"),
    ("Backend", "https://github.com/fabischkamau/modus-kg"),
];

const GITHUB_ICON: &str = r#"<svg class="icon" xmlns="http://www.w3.org/2000/svg" width="20" height="20" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" aria-hidden="true"><path d="M15 22v-4a4.8 4.8 0 0 0-1-3.5c3 0 6-2 6-5.5.08-1.25-.27-2.48-1-3.5.28-1.15.28-2.35 0-3.5 0 0-1 0-3 1.5-2.64-.5-5.36-.5-8 0C6 2 5 2 5 2c-.3 1.15-.3 2.35 0 3.5A5.403 5.403 0 0 0 4 9c0 3.5 3 5.5 6 5.5-.39.49-.68 1.05-.85 1.65-.17.6-.22 1.23-.15 1.85v4"/><path d="M9 18c-4.51 2-5-2-7-2"/></svg>"#;

#[must_use]
pub fn render_navbar() -> String {
    let links: String = NAV_LINKS
        .iter()
        .map(|(label, href)| {
            format!(
                r#"<a href="{href}" target="_blank" rel="noopener noreferrer" class="nav-link">{GITHUB_ICON}<span>{label}</span></a>"#
            )
        })
        .collect();

    format!(
        r#"<nav class="navbar">
            <div class="container navbar-inner">
                <h1 class="brand">GRAPHRAG</h1>
                <div class="nav-links">{links}</div>
            </div>
        </nav>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navbar_links_open_in_new_tab() {
        let html = render_navbar();
        assert!(html.contains("GRAPHRAG"));
        assert_eq!(html.matches("target=\"_blank\"").count(), NAV_LINKS.len());
        assert!(html.contains("<span>Backend</span>"));
    }
}
