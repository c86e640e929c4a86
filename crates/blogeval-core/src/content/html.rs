//! Permissive HTML inspection.
//!
//! Content is parsed with the tree-sitter HTML grammar. Unclosed tags are
//! closed implicitly by the grammar. When the tree holds `ERROR` or missing
//! nodes the fragment is re-read with a tag scanner instead: markup tokens
//! are dropped, start tags are counted, and everything between them is kept
//! as plain text, so stray `<` or end tags never swallow prose.

use std::collections::HashMap;
use std::ops::Range;

use ast_grep_core::{Doc, Node};
use ast_grep_language::{LanguageExt, SupportLang};

/// Element counts and plain text extracted from one HTML fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlDocument {
    tag_counts: HashMap<String, usize>,
    paragraphs: Vec<String>,
    text: String,
}

impl HtmlDocument {
    /// Parse an HTML fragment. Never fails.
    pub fn parse(content: &str) -> Self {
        let grep = SupportLang::Html.ast_grep(content);
        let root = grep.root();

        let mut doc = HtmlDocument::default();
        let mut text = TextCollector::new(content);
        if root.dfs().any(|n| n.is_error() || n.is_missing()) {
            read_tokens(scan(content), &mut doc, &mut text);
        } else {
            walk(&root, &mut doc, &mut text);
        }
        doc.text = text.finish();
        doc
    }

    /// Number of elements with the given (lower-case) tag name.
    pub fn count(&self, tag: &str) -> usize {
        self.tag_counts.get(tag).copied().unwrap_or(0)
    }

    /// Number of elements matching any of the given tag names.
    pub fn count_any(&self, tags: &[&str]) -> usize {
        tags.iter().map(|t| self.count(t)).sum()
    }

    /// Plain text of every `<p>` element, in document order.
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    /// Plain-text extraction of the whole fragment.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whitespace-separated token count of the plain text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

fn walk<D: Doc>(node: &Node<D>, doc: &mut HtmlDocument, text: &mut TextCollector<'_>) {
    let kind = node.kind();
    match kind.as_ref() {
        "element" => {
            if let Some(tag) = tag_name(node) {
                if tag == "p" {
                    doc.paragraphs.push(element_text(node, text.source));
                }
                *doc.tag_counts.entry(tag).or_insert(0) += 1;
            }
        }
        "script_element" | "style_element" => {
            if let Some(tag) = tag_name(node) {
                *doc.tag_counts.entry(tag).or_insert(0) += 1;
            }
            return;
        }
        "text" | "entity" => {
            text.push(node);
            return;
        }
        _ => {}
    }

    let children: Vec<_> = node.children().collect();
    for child in &children {
        walk(child, doc, text);
    }
}

/// Lower-cased tag name from an element's start tag.
fn tag_name<D: Doc>(node: &Node<D>) -> Option<String> {
    node.children()
        .find(|c| matches!(c.kind().as_ref(), "start_tag" | "self_closing_tag"))?
        .children()
        .find(|c| c.kind().as_ref() == "tag_name")
        .map(|n| n.text().to_lowercase())
}

fn element_text<D: Doc>(node: &Node<D>, source: &str) -> String {
    let mut text = TextCollector::new(source);
    collect_text(node, &mut text);
    text.finish()
}

fn collect_text<D: Doc>(node: &Node<D>, text: &mut TextCollector<'_>) {
    match node.kind().as_ref() {
        "text" | "entity" => text.push(node),
        "script_element" | "style_element" => {}
        _ => {
            let children: Vec<_> = node.children().collect();
            for child in &children {
                collect_text(child, text);
            }
        }
    }
}

/// Concatenates text pieces the way a DOM `textContent` read would: pieces
/// separated only by markup are glued together, pieces separated by any
/// whitespace in the source get a single space.
struct TextCollector<'s> {
    source: &'s str,
    out: String,
    last_end: Option<usize>,
}

impl<'s> TextCollector<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            out: String::new(),
            last_end: None,
        }
    }

    fn push<D: Doc>(&mut self, node: &Node<D>) {
        let raw = node.text();
        if node.kind().as_ref() == "entity" {
            self.push_span(node.range(), &decode_entity(&raw));
        } else {
            self.push_span(node.range(), &raw);
        }
    }

    fn push_span(&mut self, span: Range<usize>, piece: &str) {
        if let Some(end) = self.last_end {
            let gap = self.source.get(end..span.start).unwrap_or(" ");
            if gap.chars().any(char::is_whitespace) {
                self.out.push(' ');
            }
        }
        self.out.push_str(piece);
        self.last_end = Some(span.end);
    }

    fn finish(self) -> String {
        self.out
    }
}

/// One lexical piece of a fragment read without the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Text { span: Range<usize>, text: String },
    StartTag(String),
    EndTag(String),
}

/// Split `source` into text runs and tags. A `<` that does not open a tag,
/// comment or declaration is ordinary text, as is an unterminated `&`.
fn scan(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut run: Option<(usize, String)> = None;
    let mut at = 0;

    while let Some(ch) = source[at..].chars().next() {
        if ch == '<' {
            if let Some((markup, next)) = markup_at(source, at) {
                flush_run(&mut run, at, &mut tokens);
                at = match &markup {
                    Markup::Start(name) if name == "script" || name == "style" => {
                        skip_raw_text(source, next, name)
                    }
                    _ => next,
                };
                match markup {
                    Markup::Start(name) => tokens.push(Token::StartTag(name)),
                    Markup::End(name) => tokens.push(Token::EndTag(name)),
                    Markup::Ignored => {}
                }
                continue;
            }
        }

        let (_, text) = run.get_or_insert_with(|| (at, String::new()));
        if ch == '&' {
            if let Some(len) = entity_len(&source[at..]) {
                text.push_str(&decode_entity(&source[at..at + len]));
                at += len;
                continue;
            }
        }
        text.push(ch);
        at += ch.len_utf8();
    }

    flush_run(&mut run, source.len(), &mut tokens);
    tokens
}

fn flush_run(run: &mut Option<(usize, String)>, end: usize, tokens: &mut Vec<Token>) {
    if let Some((start, text)) = run.take() {
        tokens.push(Token::Text {
            span: start..end,
            text,
        });
    }
}

enum Markup {
    Start(String),
    End(String),
    Ignored,
}

/// Recognize a tag, comment or declaration opening at `at`, returning it
/// with the offset just past its closing `>`.
fn markup_at(source: &str, at: usize) -> Option<(Markup, usize)> {
    let rest = &source[at..];
    if rest.starts_with("<!--") {
        let close = rest.find("-->").map_or(rest.len(), |p| p + 3);
        return Some((Markup::Ignored, at + close));
    }

    let bytes = rest.as_bytes();
    let name_from = match bytes.get(1) {
        Some(b'!') | Some(b'?') => return Some((Markup::Ignored, at + rest.find('>')? + 1)),
        Some(b'/') => 2,
        _ => 1,
    };
    if !bytes.get(name_from).is_some_and(u8::is_ascii_alphabetic) {
        return None;
    }

    let close = rest.find('>')?;
    let name = rest[name_from..close]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();
    let markup = if name_from == 2 {
        Markup::End(name)
    } else {
        Markup::Start(name)
    };
    Some((markup, at + close + 1))
}

/// Offset just past the end tag closing a raw-text element, or the end of
/// input when it is never closed.
fn skip_raw_text(source: &str, from: usize, name: &str) -> usize {
    let closing = format!("</{name}");
    source[from..]
        .to_ascii_lowercase()
        .find(&closing)
        .and_then(|p| source[from + p..].find('>').map(|q| from + p + q + 1))
        .unwrap_or(source.len())
}

/// Byte length of a well-formed character reference at the start of `rest`.
fn entity_len(rest: &str) -> Option<usize> {
    let semi = rest.find(';').filter(|&p| p > 1 && p <= 32)?;
    rest[1..semi]
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '#')
        .then_some(semi + 1)
}

/// Replay scanned tokens into the document. A paragraph runs from `<p>` to
/// the next `</p>`, the next `<p>`, or the end of input.
fn read_tokens(tokens: Vec<Token>, doc: &mut HtmlDocument, text: &mut TextCollector<'_>) {
    let mut paragraph: Option<TextCollector<'_>> = None;
    for token in tokens {
        match token {
            Token::Text { span, text: piece } => {
                text.push_span(span.clone(), &piece);
                if let Some(open) = paragraph.as_mut() {
                    open.push_span(span, &piece);
                }
            }
            Token::StartTag(name) => {
                if name == "p" {
                    if let Some(open) = paragraph.replace(TextCollector::new(text.source)) {
                        doc.paragraphs.push(open.finish());
                    }
                }
                *doc.tag_counts.entry(name).or_insert(0) += 1;
            }
            Token::EndTag(name) => {
                if name == "p" {
                    if let Some(open) = paragraph.take() {
                        doc.paragraphs.push(open.finish());
                    }
                }
            }
        }
    }
    if let Some(open) = paragraph {
        doc.paragraphs.push(open.finish());
    }
}

/// Decode a character reference. Unknown names are kept verbatim.
fn decode_entity(raw: &str) -> String {
    let body = raw.trim_start_matches('&').trim_end_matches(';');
    let decoded = match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('\u{2014}'),
        "ndash" => Some('\u{2013}'),
        "hellip" => Some('\u{2026}'),
        _ => {
            if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                None
            }
        }
    };

    match decoded {
        Some(c) => c.to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_nested_elements() {
        let doc = HtmlDocument::parse(
            "<h2>One</h2><p>a <strong>b</strong></p><h2>Two</h2><ul><li>x</li></ul><p>c</p>",
        );
        assert_eq!(doc.count("h2"), 2);
        assert_eq!(doc.count("p"), 2);
        assert_eq!(doc.count("strong"), 1);
        assert_eq!(doc.count_any(&["ul", "ol"]), 1);
        assert_eq!(doc.count("h3"), 0);
    }

    #[test]
    fn tag_names_are_case_folded() {
        let doc = HtmlDocument::parse("<H2>Loud</H2><P>quiet</P>");
        assert_eq!(doc.count("h2"), 1);
        assert_eq!(doc.count("p"), 1);
    }

    #[test]
    fn extracts_paragraph_text_in_order() {
        let doc = HtmlDocument::parse("<p>First <em>para</em>graph.</p>\n<p>Second one.</p>");
        assert_eq!(
            doc.paragraphs(),
            &["First paragraph.".to_string(), "Second one.".to_string()]
        );
    }

    #[test]
    fn plain_text_separates_blocks_on_source_whitespace() {
        let doc = HtmlDocument::parse("<h2>Title</h2>\n<p>Body text here.</p>");
        assert_eq!(doc.text(), "Title Body text here.");
        assert_eq!(doc.word_count(), 4);
    }

    #[test]
    fn entities_are_decoded_in_place() {
        let doc = HtmlDocument::parse("<p>AT&amp;T &lt;3 caf&#233;</p>");
        assert_eq!(doc.text(), "AT&T <3 caf\u{e9}");
    }

    #[test]
    fn script_and_style_bodies_are_not_text() {
        let doc = HtmlDocument::parse(
            "<style>p { color: red; }</style><p>Visible words</p><script>var hidden = 1;</script>",
        );
        assert_eq!(doc.word_count(), 2);
        assert_eq!(doc.count("p"), 1);
    }

    #[test]
    fn bare_text_without_markup_is_counted() {
        let doc = HtmlDocument::parse("just some plain words");
        assert_eq!(doc.word_count(), 4);
        assert_eq!(doc.count("p"), 0);
    }

    #[test]
    fn stray_end_tags_are_dropped_not_read_as_words() {
        let doc = HtmlDocument::parse("<p>unclosed <b>bold <h2>heading</p></div></span> tail");
        assert_eq!(doc.text(), "unclosed bold heading tail");
        assert_eq!(doc.count("p"), 1);
        assert_eq!(doc.count("h2"), 1);
        assert_eq!(doc.paragraphs(), &["unclosed bold heading".to_string()]);
    }

    #[test]
    fn paragraph_after_stray_end_tag_is_counted() {
        let doc = HtmlDocument::parse("</p>stray<p>ok");
        assert_eq!(doc.count("p"), 1);
        assert_eq!(doc.text(), "strayok");
        assert_eq!(doc.paragraphs(), &["ok".to_string()]);
    }

    #[test]
    fn bare_angle_brackets_stay_in_prose() {
        let doc = HtmlDocument::parse("text < 5 and > 3 & so on");
        assert_eq!(doc.text(), "text < 5 and > 3 & so on");
        assert_eq!(doc.word_count(), 8);
    }

    #[test]
    fn scanner_skips_comments_and_raw_text() {
        let tokens = scan("a<!-- hidden --><SCRIPT>x < y</script>b &amp; c");
        assert_eq!(
            tokens,
            vec![
                Token::Text {
                    span: 0..1,
                    text: "a".to_string()
                },
                Token::StartTag("script".to_string()),
                Token::Text {
                    span: 38..47,
                    text: "b & c".to_string()
                },
            ]
        );
    }

    #[test]
    fn empty_input_is_empty_document() {
        let doc = HtmlDocument::parse("");
        assert_eq!(doc.word_count(), 0);
        assert!(doc.paragraphs().is_empty());
    }

    #[test]
    fn decode_entity_keeps_unknown_names() {
        assert_eq!(decode_entity("&bogus;"), "&bogus;");
        assert_eq!(decode_entity("&#x41;"), "A");
        assert_eq!(decode_entity("&#65;"), "A");
    }
}
