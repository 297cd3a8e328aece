//! Page chrome and static assets
//!
//! Pages are rendered inline; the shared stylesheet is compiled into the
//! binary and served from /static.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

const STYLESHEET: &str = include_str!("../ui/lorehall.css");

/// GET /static/lorehall.css
pub async fn serve_stylesheet() -> Response {
    (StatusCode::OK, [("content-type", "text/css")], STYLESHEET).into_response()
}

/// Escape text for embedding in HTML
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap page body in the shared chrome (header, nav, footer)
pub fn render_page(title: &str, body: &str) -> Html<String> {
    let version = env!("CARGO_PKG_VERSION");

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Lorehall</title>
    <link rel="stylesheet" href="/static/lorehall.css">
</head>
<body>
    <header>
        <div class="header-content">
            <h1>Lorehall</h1>
            <nav>
                <a href="/">Home</a>
                <a href="/events">Events</a>
                <a href="/search">Search</a>
                <a href="/tags">Tags</a>
                <a href="/settings">Settings</a>
            </nav>
        </div>
    </header>
    <div class="content">
{body}
    </div>
    <footer>lorehall-web v{version}</footer>
</body>
</html>"#,
        title = html_escape(title),
        body = body,
        version = version,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_covers_html_specials() {
        assert_eq!(
            html_escape(r#"<b>"wit" & 'humor'</b>"#),
            "&lt;b&gt;&quot;wit&quot; &amp; &#39;humor&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn page_contains_title_and_body() {
        let Html(page) = render_page("Events", "<p>hello</p>");
        assert!(page.contains("Events - Lorehall"));
        assert!(page.contains("<p>hello</p>"));
    }
}
