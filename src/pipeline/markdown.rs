//! Markdown → HTML: render the fragment and embed it in the print template.
//!
//! The extension set is fixed. It mirrors what people expect from "Markdown
//! Extra" documents: tables, footnotes, definition lists, strikethrough and
//! `{#id .class}` heading attributes, with fenced code coming from CommonMark
//! itself. Smart punctuation turns straight quotes into curly ones, `--` into
//! an en dash, `---` into an em dash and `...` into an ellipsis.
//!
//! Rendering is a pure function of the input text, so converting the same
//! file twice yields byte-identical HTML.

use crate::error::ConversionError;
use crate::template::{compose_document, TemplateOptions};
use once_cell::sync::Lazy;
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

/// Raw markup that would close or reopen the document structure around the
/// fragment. Escaped text (`&lt;body&gt;`) never matches.
static RE_STRUCTURE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<!doctype\b[^>]*>|</?(?:html|head|body)(?:\s[^>]*)?/?>").unwrap()
});

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// The always-on rendering extensions.
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_DEFINITION_LIST
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_SMART_PUNCTUATION
}

/// Render Markdown to an HTML fragment.
///
/// Never fails: constructs the parser does not recognise come out as literal
/// text, the way CommonMark specifies.
pub fn render_fragment(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());
    let mut out = String::with_capacity(markdown.len() + markdown.len() / 2);
    html::push_html(&mut out, parser);
    out
}

/// Make a fragment safe to embed between `<body>` and `</body>`.
///
/// Raw `<html>`, `<head>`, `<body>` and doctype tags passed through from the
/// source are rewritten to escaped text, so a sentence like "put it in the
/// <head>" prints literally instead of restructuring the document. HTML
/// comments are copied untouched.
///
/// # Errors
/// An unterminated `<!--` would comment out the closing tags of the
/// document, so it is reported instead of embedded.
pub fn sanitize_fragment(fragment: &str) -> Result<String, ConversionError> {
    let mut out = String::with_capacity(fragment.len());
    let mut rest = fragment;

    while let Some(start) = rest.find(COMMENT_OPEN) {
        let (before, comment) = rest.split_at(start);
        escape_structure_tags(before, &mut out);

        let len = comment_len(comment).ok_or_else(|| ConversionError {
            markup: COMMENT_OPEN.to_string(),
        })?;
        out.push_str(&comment[..len]);
        rest = &comment[len..];
    }
    escape_structure_tags(rest, &mut out);
    Ok(out)
}

/// Length of the comment at the start of `text`, including both delimiters.
/// `<!-->` and `<!--->` close immediately, as in HTML.
fn comment_len(text: &str) -> Option<usize> {
    let body = &text[COMMENT_OPEN.len()..];
    if body.starts_with('>') {
        return Some(COMMENT_OPEN.len() + 1);
    }
    if body.starts_with("->") {
        return Some(COMMENT_OPEN.len() + 2);
    }
    body.find(COMMENT_CLOSE)
        .map(|end| COMMENT_OPEN.len() + end + COMMENT_CLOSE.len())
}

fn escape_structure_tags(text: &str, out: &mut String) {
    let mut last = 0;
    for m in RE_STRUCTURE_TAG.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        out.push_str(&html_escape::encode_text(m.as_str()));
        last = m.end();
    }
    out.push_str(&text[last..]);
}

/// Convert Markdown into a complete, styled HTML document.
pub fn markdown_to_html(
    markdown: &str,
    options: &TemplateOptions,
) -> Result<String, ConversionError> {
    let fragment = sanitize_fragment(&render_fragment(markdown))?;
    Ok(compose_document(&fragment, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_is_deterministic() {
        let md = "# T\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\nText[^n].\n\n[^n]: Note.\n";
        assert_eq!(render_fragment(md), render_fragment(md));
        let opts = TemplateOptions::default();
        assert_eq!(
            markdown_to_html(md, &opts).unwrap(),
            markdown_to_html(md, &opts).unwrap()
        );
    }

    #[test]
    fn title_and_smart_quotes() {
        let html = render_fragment("# Title\n\nHello \"world\"...");
        assert!(html.contains("<h1>Title</h1>"), "got: {html}");
        assert!(html.contains("<p>Hello \u{201C}world\u{201D}\u{2026}</p>"), "got: {html}");
    }

    #[test]
    fn dashes_and_apostrophes() {
        let html = render_fragment("pages 1--2 --- it's done");
        assert!(html.contains('\u{2013}'), "en dash missing: {html}");
        assert!(html.contains('\u{2014}'), "em dash missing: {html}");
        assert!(html.contains('\u{2019}'), "apostrophe missing: {html}");
    }

    #[test]
    fn tables_render() {
        let html = render_fragment("| Name | Qty |\n|------|-----|\n| Pen  | 2   |\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>Name</th>"));
        assert!(html.contains("<td>Pen</td>"));
    }

    #[test]
    fn fenced_code_is_escaped() {
        let html = render_fragment("```rust\nlet a = \"<b>\";\n```\n");
        assert!(html.contains("<pre><code class=\"language-rust\">"), "got: {html}");
        assert!(html.contains("&lt;b&gt;"));
        // no smart quotes inside code
        assert!(html.contains("&quot;&lt;b&gt;&quot;") || html.contains("\"&lt;b&gt;\""));
    }

    #[test]
    fn footnotes_render() {
        let html = render_fragment("Claim[^1].\n\n[^1]: Source.\n");
        assert!(html.contains("footnote-reference"), "got: {html}");
        assert!(html.contains("footnote-definition"), "got: {html}");
    }

    #[test]
    fn definition_lists_render() {
        let html = render_fragment("Term\n: Definition\n");
        assert!(html.contains("<dl>"), "got: {html}");
        assert!(html.contains("<dt>Term</dt>"), "got: {html}");
        assert!(html.contains("<dd>"), "got: {html}");
    }

    #[test]
    fn malformed_markdown_degrades() {
        let html = render_fragment("[unclosed link(\n\n**half bold\n\n| just | a pipe\n");
        assert!(html.contains("[unclosed link("));
        assert!(html.contains("**half bold"));
    }

    #[test]
    fn empty_input_gives_empty_fragment() {
        assert_eq!(render_fragment(""), "");
        let doc = markdown_to_html("", &TemplateOptions::default()).unwrap();
        assert!(doc.contains("<body>\n</body>"));
    }

    #[test]
    fn structure_tags_in_prose_are_escaped() {
        let doc = markdown_to_html(
            "# Guide\n\nPut your scripts inside the <head> element.\n",
            &TemplateOptions::default(),
        )
        .unwrap();
        assert!(doc.contains("inside the &lt;head&gt; element"), "got: {doc}");
        assert_eq!(doc.matches("<head>").count(), 1);

        let doc = markdown_to_html("Intro\n\n</body>\n<p>after</p>\n", &TemplateOptions::default())
            .unwrap();
        assert!(doc.contains("&lt;/body&gt;"));
        assert_eq!(doc.matches("</body>").count(), 1);
        assert!(doc.contains("<p>after</p>"));
    }

    #[test]
    fn sanitize_handles_case_and_attributes() {
        let out = sanitize_fragment("<p>x <HTML lang=\"en\"> y <!DOCTYPE html></p>").unwrap();
        assert!(!RE_STRUCTURE_TAG.is_match(&out), "got: {out}");
        assert!(out.contains("&lt;HTML lang=\"en\"&gt;"), "got: {out}");
        assert!(out.contains("&lt;!DOCTYPE html&gt;"), "got: {out}");
    }

    #[test]
    fn comments_are_left_alone() {
        let doc = markdown_to_html(
            "Text.\n\n<!-- TODO: move this into <body> later -->\n",
            &TemplateOptions::default(),
        )
        .unwrap();
        assert!(doc.contains("<!-- TODO: move this into <body> later -->"));
        assert!(doc.contains("<p>Text.</p>"));

        assert_eq!(
            sanitize_fragment("a<!---->b<!-->c<head>").unwrap(),
            "a<!---->b<!-->c&lt;head&gt;"
        );
    }

    #[test]
    fn unterminated_comment_is_rejected() {
        let err = markdown_to_html("Intro\n\n<!-- never closed\n\nmore\n", &TemplateOptions::default())
            .unwrap_err();
        assert_eq!(err.markup, "<!--");
    }

    #[test]
    fn structure_tags_in_code_are_fine() {
        let md = "Use `</body>` to close.\n\n```html\n<!DOCTYPE html>\n<html><body></body></html>\n```\n";
        let doc = markdown_to_html(md, &TemplateOptions::default()).unwrap();
        assert!(doc.contains("&lt;/body&gt;"));
        assert_eq!(doc.matches("</body>").count(), 1);
    }

    #[test]
    fn similar_tags_are_not_structure() {
        let fragment = "<header>x</header><bodyguard/><hr/>";
        assert_eq!(sanitize_fragment(fragment).unwrap(), fragment);
    }

    #[test]
    fn composed_document_carries_stylesheet() {
        let doc = markdown_to_html("text", &TemplateOptions::default().with_title("notes")).unwrap();
        assert!(doc.contains("<title>notes</title>"));
        assert!(doc.contains("@page"));
        assert!(doc.contains("<p>text</p>"));
    }
}
