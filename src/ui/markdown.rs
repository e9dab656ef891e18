//! Markdown rendering for message bubbles.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

/// Schemes a link or image may point at; anything else is replaced.
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Render message markdown to HTML.
///
/// Raw HTML in the source is shown as text rather than injected, since
/// both user input and backend answers end up here. Link and image
/// destinations with a scheme other than http, https or mailto become `#`.
#[must_use]
pub fn render_markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(source, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Keep relative, fragment and allow-listed absolute destinations.
fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    // Browsers drop whitespace and control characters before parsing the scheme.
    let compact: String = dest
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect();
    let scheme = compact
        .split_once(':')
        .map(|(scheme, _)| scheme)
        .filter(|scheme| !scheme.contains(['/', '?', '#']));

    match scheme {
        None => dest,
        Some(scheme) if ALLOWED_SCHEMES.iter().any(|s| scheme.eq_ignore_ascii_case(s)) => dest,
        Some(_) => CowStr::Borrowed("#"),
    }
}

/// Escape text for use inside an HTML element.
#[must_use]
pub fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Escape text for use inside a double-quoted attribute.
#[must_use]
pub fn escape_attr(text: &str) -> String {
    html_escape::encode_double_quoted_attribute(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_basic_markdown() {
        let html = render_markdown("A *graph* database.\n\n```\nMATCH (n) RETURN n\n```");
        assert!(html.contains("<em>graph</em>"));
        assert!(html.contains("<pre><code>MATCH (n) RETURN n\n</code></pre>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("hi <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_unsafe_link_schemes_are_neutralized() {
        let html = render_markdown("[click](javascript:alert(document.cookie))");
        assert!(!html.contains("javascript:"));
        assert!(html.contains("<a href=\"#\">click</a>"));

        let html = render_markdown("[x](JavaScript:alert(1)) ![img](data:text/html;base64,AAAA)");
        assert!(!html.to_ascii_lowercase().contains("javascript:"));
        assert!(!html.contains("data:"));
        assert!(html.contains("src=\"#\""));

        assert_eq!(&*safe_destination("java\tscript:alert(1)".into()), "#");
        assert_eq!(&*safe_destination(" vbscript:msgbox".into()), "#");
    }

    #[test]
    fn test_safe_link_destinations_are_kept() {
        let html = render_markdown(
            "[a](https://neo4j.com/docs) [b](mailto:team@example.com) [c](/about?x=1:2) [d](#top)",
        );
        assert!(html.contains("href=\"https://neo4j.com/docs\""));
        assert!(html.contains("href=\"mailto:team@example.com\""));
        assert!(html.contains("href=\"/about?x=1:2\""));
        assert!(html.contains("href=\"#top\""));
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(render_markdown(""), "");
    }

    #[test]
    fn test_escape_helpers() {
        assert_eq!(escape_text("<a & b>"), "&lt;a &amp; b&gt;");
        assert_eq!(escape_attr("say \"hi\""), "say &quot;hi&quot;");
    }
}
