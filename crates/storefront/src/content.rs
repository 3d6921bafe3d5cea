//! Blog post rendering.
//!
//! Posts are written in GitHub Flavored Markdown. Raw HTML in the source is
//! never passed through; comrak replaces it with a comment.

use comrak::{Options, markdown_to_html};

/// Render post markdown to HTML.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    // Raw HTML is omitted from the output.
    options.render.r#unsafe = false;

    markdown_to_html(content, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_gfm() {
        let html = render_markdown("# Creatine\n\n| g | day |\n|---|---|\n| 5 | 1 |\n\n~~old~~");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
    }

    #[test]
    fn test_strips_raw_html() {
        let html = render_markdown("Hello <script>alert(1)</script>\n\n<iframe src=\"x\"></iframe>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<iframe"));
        assert!(html.contains("Hello"));
    }

    #[test]
    fn test_autolinks() {
        let html = render_markdown("See https://fuelstack.mn for more.");
        assert!(html.contains("<a href=\"https://fuelstack.mn\">"));
    }
}
