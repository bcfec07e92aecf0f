//! The synthesized offline document.

use pwa_core::{OfflinePage, Response};

/// Status of the synthesized offline document.
pub const OFFLINE_STATUS: u16 = 503;

/// Render the offline document.
pub fn render_offline_page(page: &OfflinePage) -> String {
    format!(
        concat!(
            "<!DOCTYPE html>\n",
            "<html lang=\"{lang}\">\n",
            "<head>\n",
            "<meta charset=\"utf-8\">\n",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
            "<title>{title}</title>\n",
            "<style>body{{font-family:system-ui,sans-serif;display:flex;align-items:center;",
            "justify-content:center;min-height:100vh;margin:0;text-align:center;padding:1rem}}</style>\n",
            "</head>\n",
            "<body>\n",
            "<main>\n",
            "<h1>{heading}</h1>\n",
            "<p>{message}</p>\n",
            "</main>\n",
            "</body>\n",
            "</html>\n"
        ),
        lang = html_escape(&page.lang),
        title = html_escape(&page.title),
        heading = html_escape(&page.heading),
        message = html_escape(&page.message),
    )
}

/// The 503 response served for navigations with no network and no cached shell.
pub fn offline_response(page: &OfflinePage) -> Response {
    Response::html(OFFLINE_STATUS, render_offline_page(page))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_response_shape() {
        let response = offline_response(&OfflinePage::default());
        assert_eq!(response.status, 503);
        assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));

        let body = response.text().unwrap();
        assert!(body.contains("<html lang=\"es\">"));
        assert!(body.contains("<h1>Sin conexión</h1>"));
        assert!(body.contains("Verifica tu conexión"));
    }

    #[test]
    fn test_page_text_is_escaped() {
        let page = OfflinePage {
            heading: "<Offline & alone>".to_string(),
            ..OfflinePage::default()
        };
        let html = render_offline_page(&page);
        assert!(html.contains("&lt;Offline &amp; alone&gt;"));
    }
}
