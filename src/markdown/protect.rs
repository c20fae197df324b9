//! Protection of code spans from the markdown rules.
//!
//! Fenced code blocks and inline code are rendered up front and stand in the
//! working text as numbered placeholders until paragraphs are built. Each
//! placeholder is a pair of private use characters around the span index,
//! which none of the rules match or split. Private use characters already in
//! the source are held the same way, so user text can never pose as a
//! placeholder.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::util::escape_html;

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

/// Rendered spans indexed by placeholder number.
///
/// Lives for a single render call. Every placeholder handed out is replaced
/// again by [`ProtectedSpans::restore`].
#[derive(Debug, Default)]
pub(crate) struct ProtectedSpans {
    spans: Vec<String>,
}

impl ProtectedSpans {
    /// Holds literal placeholder delimiters found in the source.
    ///
    /// Runs first, so afterwards every delimiter in the working text belongs
    /// to a placeholder of this table.
    pub(crate) fn protect_delimiters(&mut self, source: &str) -> String {
        if !source.contains([OPEN, CLOSE]) {
            return source.to_string();
        }

        let mut text = String::with_capacity(source.len());
        for ch in source.chars() {
            if ch == OPEN || ch == CLOSE {
                text.push_str(&self.hold(ch.to_string()));
            } else {
                text.push(ch);
            }
        }
        text
    }

    /// Replaces well formed fences in `text` with placeholders.
    ///
    /// A fence is a non-greedy match from one triple backtick to the next,
    /// spanning lines. Matches that do not have the shape
    /// `` ```lang\n...``` `` are put back verbatim so they degrade to plain
    /// text in later stages.
    ///
    /// # Arguments
    ///
    /// * `text`: Note content with delimiters already protected
    ///
    /// # Returns
    ///
    /// Working text with fence placeholders
    pub(crate) fn protect_fences(&mut self, text: &str) -> String {
        static FENCE: OnceLock<Regex> = OnceLock::new();
        let fence = FENCE.get_or_init(|| Regex::new(r"(?s)```.*?```").expect("valid fence pattern"));

        fence
            .replace_all(text, |caps: &Captures| match render_fence(&caps[0]) {
                Some(markup) => self.hold(markup),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Replaces `` `code` `` spans with placeholders for escaped
    /// `<code class="inline-code">` markup.
    pub(crate) fn protect_inline_code(&mut self, text: &str) -> String {
        static INLINE: OnceLock<Regex> = OnceLock::new();
        let inline = INLINE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("valid inline code pattern"));

        inline
            .replace_all(text, |caps: &Captures| {
                self.hold(format!(
                    "<code class=\"inline-code\">{}</code>",
                    escape_html(&caps[1])
                ))
            })
            .into_owned()
    }

    /// Substitutes span markup back for every placeholder in `text`.
    ///
    /// Spans may carry placeholders of spans held before them (a delimiter
    /// inside a code span), which are restored as well.
    pub(crate) fn restore(&self, text: &str) -> String {
        if self.spans.is_empty() {
            return text.to_string();
        }

        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let pattern = PLACEHOLDER
            .get_or_init(|| Regex::new(r"\x{E000}(\d+)\x{E001}").expect("valid placeholder pattern"));

        pattern
            .replace_all(text, |caps: &Captures| {
                let Some(span) = caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.spans.get(index))
                else {
                    return caps[0].to_string();
                };

                if span.len() > OPEN.len_utf8() && span.contains(OPEN) {
                    self.restore(span)
                } else {
                    span.clone()
                }
            })
            .into_owned()
    }

    /// Number of spans currently held.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.spans.len()
    }

    fn hold(&mut self, markup: String) -> String {
        let token = format!("{}{}{}", OPEN, self.spans.len(), CLOSE);
        self.spans.push(markup);
        token
    }
}

/// Renders one fence as a `pre`/`code` pair.
///
/// The language tag runs from the opening backticks to the line end and may
/// not contain whitespace. Without a tag the code element carries no
/// `language-` class.
fn render_fence(block: &str) -> Option<String> {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    let shape = SHAPE
        .get_or_init(|| Regex::new(r"(?s)```([^\s`]*)\r?\n(.*?)```").expect("valid fence shape"));

    let caps = shape.captures(block)?;
    let language = &caps[1];
    let code = &caps[2];

    let class = if language.is_empty() {
        "code-block".to_string()
    } else {
        format!("code-block language-{}", escape_html(language))
    };

    Some(format!(
        "<pre class=\"line-numbers\"><code class=\"{}\">{}</code></pre>",
        class,
        escape_html(code)
    ))
}
