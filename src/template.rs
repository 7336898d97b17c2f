//! The print stylesheet and the HTML shell every document is rendered into.
//!
//! Centralising the template here serves two purposes:
//!
//! 1. **Single source of truth** — changing page margins or table rules means
//!    editing exactly one constant.
//!
//! 2. **Testability** — unit tests can inspect the stylesheet directly
//!    without spinning up a PDF engine.
//!
//! The document is assembled by plain concatenation. There is no format
//! string with placeholders, so a fragment containing `{content}` or braces
//! is inserted like any other text, and the only attribute values taken from
//! outside (`lang`, `title`) are HTML-escaped.

/// Stylesheet embedded in the `<head>` of every composed document.
///
/// Page-break hints keep paragraphs, lists, tables and single table rows
/// on one page whenever they fit.
pub const STYLESHEET: &str = r#"@page {
    margin: 2.5cm;
}
body {
    font-family: "Arial", sans-serif;
    line-height: 1.5;
    font-size: 12pt;
    text-align: justify;
}
h1, h2, h3 {
    color: #222;
}
p, ul, ol {
    page-break-inside: avoid;
    margin: 1em 0;
}
pre, code {
    max-width: 100%;
    overflow-x: auto;
    white-space: pre-wrap;
    word-wrap: break-word;
    background-color: #f5f5f5;
    padding: 10px;
    border: 1px solid #ddd;
}
table {
    width: 100%;
    border-collapse: collapse;
    margin-top: 1em;
    margin-bottom: 1em;
    page-break-inside: avoid;
}
tr, tbody {
    page-break-inside: avoid;
}
th, td {
    border: 1px solid #000;
    padding: 4px;
    text-align: left;
}
"#;

/// Language tag used when none is configured.
pub const DEFAULT_LANG: &str = "pt-BR";

/// Values substituted into the document shell around the fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateOptions {
    /// Value of `<html lang="…">`.
    pub lang: String,
    /// Optional `<title>`; the batch driver uses the source base name.
    pub title: Option<String>,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            lang: DEFAULT_LANG.to_string(),
            title: None,
        }
    }
}

impl TemplateOptions {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Embed an HTML fragment into the styled document shell.
///
/// The fragment is inserted verbatim between `<body>` and `</body>`; it is
/// the caller's job to hand in markup that belongs in a body (see
/// [`crate::pipeline::markdown::markdown_to_html`]). Never fails.
pub fn compose_document(fragment: &str, options: &TemplateOptions) -> String {
    let lang = html_escape::encode_double_quoted_attribute(&options.lang);

    let mut html = String::with_capacity(STYLESHEET.len() + fragment.len() + 256);
    html.push_str("<!DOCTYPE html>\n<html lang=\"");
    html.push_str(&lang);
    html.push_str("\">\n<head>\n<meta charset=\"UTF-8\">\n");
    if let Some(ref title) = options.title {
        html.push_str("<title>");
        html.push_str(&html_escape::encode_text(title));
        html.push_str("</title>\n");
    }
    html.push_str("<style>\n");
    html.push_str(STYLESHEET);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(fragment);
    if !fragment.is_empty() && !fragment.ends_with('\n') {
        html.push('\n');
    }
    html.push_str("</body>\n</html>\n");
    html
}
