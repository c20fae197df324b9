//! Staged markdown to HTML rendering for note content.

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;

use super::links::{NoteLinkResolver, NoteLookup};
use super::protect::ProtectedSpans;
use super::table::convert_tables;
use crate::highlight::Highlighter;

/// Block elements a paragraph wrapper is stripped from by [`denest_blocks`].
const BLOCK_TAGS: [&str; 10] = [
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "pre",
    "table",
    "ul",
    "blockquote",
];

/// Renders note markdown to an HTML fragment.
///
/// Runs a fixed sequence of textual rewrites, each over the previous
/// stage's output: code protection (fences, then inline code), headers,
/// emphasis, images and links, blockquotes, lists, rules, tables,
/// checkboxes, paragraphs with code restored, then paragraph de-nesting.
/// Code is held out of the text until paragraphs are built, so no markdown
/// rule ever touches code content.
///
/// Never fails: constructs that do not match a rule stay literal text.
/// Deterministic and stateless.
///
/// # Arguments
///
/// * `source`: Raw note content
///
/// # Returns
///
/// HTML fragment, empty for empty input
pub fn render(source: &str) -> String {
    if source.is_empty() {
        return String::new();
    }

    let mut spans = ProtectedSpans::default();
    let text = spans.protect_delimiters(source);
    let text = spans.protect_fences(&text);
    let text = spans.protect_inline_code(&text);

    let text = headers(&text);
    let text = emphasis(&text);
    let text = images_and_links(&text);
    let text = blockquotes(&text);
    let text = lists(&text);
    let text = horizontal_rules(&text);
    let text = convert_tables(&text);
    let text = checkboxes(&text);
    let text = paragraphs(&text, &spans);

    denest_blocks(&text)
}

/// Compiles `pattern` once into `cell`.
///
/// Patterns are literals owned by this module, so a compile failure is a
/// programming error.
fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid markdown pattern"))
}

/// Deepest level first, each pattern requiring its exact hash count and a
/// space, so `#` never matches inside `###`.
fn headers(text: &str) -> String {
    static H3: OnceLock<Regex> = OnceLock::new();
    static H2: OnceLock<Regex> = OnceLock::new();
    static H1: OnceLock<Regex> = OnceLock::new();

    let text = cached(&H3, r"(?mR)^### (.*)$").replace_all(text, "<h3>${1}</h3>");
    let text = cached(&H2, r"(?mR)^## (.*)$").replace_all(&text, "<h2>${1}</h2>");
    let text = cached(&H1, r"(?mR)^# (.*)$").replace_all(&text, "<h1>${1}</h1>");
    text.into_owned()
}

/// Bold before italic so a `**` pair is never split by the italic rule.
/// `***x***` is matched whole before either.
fn emphasis(text: &str) -> String {
    static BOTH: OnceLock<Regex> = OnceLock::new();
    static BOLD: OnceLock<Regex> = OnceLock::new();
    static ITALIC: OnceLock<Regex> = OnceLock::new();

    let text = cached(&BOTH, r"(?R)\*\*\*([^*]+?)\*\*\*")
        .replace_all(text, "<strong><em>${1}</em></strong>");
    let text = cached(&BOLD, r"(?R)\*\*(.*?)\*\*").replace_all(&text, "<strong>${1}</strong>");
    let text = cached(&ITALIC, r"(?R)\*(.*?)\*").replace_all(&text, "<em>${1}</em>");
    text.into_owned()
}

/// Images first: the link rule would otherwise consume the `[alt](url)`
/// part of `![alt](url)`. Neither rule can match `[[id|text]]` since both
/// require `](` right after the bracketed text.
fn images_and_links(text: &str) -> String {
    static IMAGE: OnceLock<Regex> = OnceLock::new();
    static LINK: OnceLock<Regex> = OnceLock::new();

    let text = cached(&IMAGE, r"!\[([^\]]+)\]\(([^)]+)\)").replace_all(
        text,
        "<div class=\"preview-image-container\"><img src=\"${2}\" alt=\"${1}\" class=\"preview-image\">\
         <div class=\"preview-image-caption\">${1}</div></div>",
    );
    let text = cached(&LINK, r"\[([^\]]+)\]\(([^)]+)\)")
        .replace_all(&text, "<a href=\"${2}\" target=\"_blank\">${1}</a>");
    text.into_owned()
}

fn blockquotes(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?mR)^> (.*)$")
        .replace_all(text, "<blockquote>${1}</blockquote>")
        .into_owned()
}

/// Numbered and bulleted items both become `<li>`. Each run of adjacent
/// item lines is wrapped in one `<ul>`; a blank line ends the run.
fn lists(text: &str) -> String {
    static ORDERED: OnceLock<Regex> = OnceLock::new();
    static UNORDERED: OnceLock<Regex> = OnceLock::new();
    static RUN: OnceLock<Regex> = OnceLock::new();

    let text = cached(&ORDERED, r"(?mR)^[ \t]*\d+\.[ \t]+(.*)$").replace_all(text, "<li>${1}</li>");
    let text = cached(&UNORDERED, r"(?mR)^[ \t]*[-*][ \t]+(.*)$").replace_all(&text, "<li>${1}</li>");
    let text = cached(&RUN, r"(?mR)^<li>.*</li>$(?:\r?\n<li>.*</li>$)*")
        .replace_all(&text, "<ul>${0}</ul>");
    text.into_owned()
}

fn horizontal_rules(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?mR)^---+$").replace_all(text, "<hr>").into_owned()
}

/// Closing tags that belong to an enclosing element (the `</li></ul>` of a
/// task list item, the cell boundaries of a table row) stay outside the
/// label.
fn checkboxes(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    cached(&RE, r"(?mR)\[([ x])\] (.*)$")
        .replace_all(text, |caps: &Captures| {
            let checked = if &caps[1] == "x" { " checked" } else { "" };
            let (label, rest) = split_label(&caps[2]);
            format!(
                "<div class=\"checkbox\"><input type=\"checkbox\"{} disabled><label>{}</label></div>{}",
                checked, label, rest
            )
        })
        .into_owned()
}

/// Splits `text` before the first closing tag whose opening tag is not
/// inside the text preceding it.
fn split_label(text: &str) -> (&str, &str) {
    for (start, _) in text.match_indices("</") {
        let Some(name) = text[start + 2..]
            .split_once('>')
            .map(|(name, _)| name)
        else {
            continue;
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            continue;
        }

        let before = &text[..start];
        let opened = count_open_tags(before, name);
        let closed = before.matches(&format!("</{}>", name)).count();
        if opened <= closed {
            return text.split_at(start);
        }
    }

    (text, "")
}

fn count_open_tags(html: &str, name: &str) -> usize {
    let opening = format!("<{}", name);
    html.match_indices(&opening)
        .filter(|(index, _)| {
            matches!(
                html[index + opening.len()..].chars().next(),
                Some('>') | Some(' ')
            )
        })
        .count()
}

/// Splits on blank lines and puts protected code back into each chunk.
/// Chunks that then look like markup (start with `<`, end with `>`) stay
/// unwrapped. The check is textual, not a parse.
fn paragraphs(text: &str, spans: &ProtectedSpans) -> String {
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();

    cached(&BLANK_LINES, r"\n\s*\n")
        .split(text)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let chunk = spans.restore(chunk);
            if chunk.starts_with('<') && chunk.ends_with('>') {
                chunk
            } else {
                format!("<p>{}</p>", chunk)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Strips `<p>` wrappers whose whole content is exactly one block element.
fn denest_blocks(html: &str) -> String {
    static PARAGRAPH: OnceLock<Regex> = OnceLock::new();

    cached(&PARAGRAPH, r"(?s)<p>(.*?)</p>")
        .replace_all(html, |caps: &Captures| {
            let inner = &caps[1];
            if is_single_block(inner) {
                inner.to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn is_single_block(html: &str) -> bool {
    if html == "<hr>" {
        return true;
    }

    BLOCK_TAGS.iter().any(|tag| {
        let opening = format!("<{}", tag);
        let closing = format!("</{}>", tag);

        let opens_here = html.strip_prefix(&opening).is_some_and(|rest| {
            rest.starts_with('>') || rest.starts_with(' ')
        });

        opens_here
            && html.ends_with(&closing)
            && html.find(&closing) == Some(html.len() - closing.len())
    })
}

/// Renders note markdown with optional link resolution and highlighting.
///
/// Wraps [`render`] into the full preview pipeline: markdown to HTML, note
/// links resolved against a lookup, then code blocks highlighted when a
/// highlighter is configured.
pub struct MarkdownRenderer {
    highlighter: Option<Highlighter>,
}

impl MarkdownRenderer {
    /// Creates renderer without syntax highlighting.
    pub fn new() -> Self {
        Self { highlighter: None }
    }

    /// Creates renderer that highlights fenced code blocks.
    ///
    /// # Arguments
    ///
    /// * `highlighter`: Highlighter applied after rendering
    pub fn with_highlighter(highlighter: Highlighter) -> Self {
        Self {
            highlighter: Some(highlighter),
        }
    }

    /// Returns the configured highlighter, if any.
    pub fn highlighter(&self) -> Option<&Highlighter> {
        self.highlighter.as_ref()
    }

    /// Renders markdown content to HTML string.
    ///
    /// Note links are left as written.
    ///
    /// # Errors
    ///
    /// Returns error if syntax highlighting fails
    pub fn render(&self, content: &str) -> Result<String> {
        self.highlight(render(content))
    }

    /// Renders markdown content and resolves note links.
    ///
    /// # Arguments
    ///
    /// * `content`: Markdown content to render
    /// * `lookup`: Note store used to resolve `[[note-id|text]]` links
    ///
    /// # Errors
    ///
    /// Returns error if syntax highlighting fails
    pub fn render_with_links<L: NoteLookup>(&self, content: &str, lookup: L) -> Result<String> {
        let html = NoteLinkResolver::new(lookup).resolve(&render(content));
        self.highlight(html)
    }

    /// Renders markdown file at given path.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or highlighting fails
    pub fn render_file(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read markdown file: {}", path.display()))?;
        self.render(&content)
    }

    fn highlight(&self, html: String) -> Result<String> {
        match &self.highlighter {
            Some(highlighter) => highlighter
                .highlight_code_blocks(&html)
                .context("Failed to highlight code blocks"),
            None => Ok(html),
        }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}
