//! Syntax highlighting for rendered code blocks with syntect.

use anyhow::{Context, Result};
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::util::unescape_html;

/// Theme used when none is requested.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// CSS classes are emitted as `hl-<scope>` so they do not clash with the
/// note stylesheet.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Opening tag the renderer emits for fences carrying a language tag.
const CODE_BLOCK_OPEN: &str = "<code class=\"code-block language-";

/// Highlights fenced code blocks in rendered note HTML.
///
/// Works on renderer output rather than markdown: finds code elements with a
/// `language-*` class, decodes their escaped body and replaces it with
/// syntect markup using CSS class names.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    /// Creates highlighter with the default theme.
    pub fn new() -> Self {
        let theme = ThemeSet::load_defaults()
            .themes
            .remove(DEFAULT_THEME)
            .unwrap_or_default();

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Creates highlighter with a named syntect theme.
    ///
    /// # Arguments
    ///
    /// * `name`: Theme name (see [`Highlighter::theme_names`])
    ///
    /// # Errors
    ///
    /// Returns error if no bundled theme has that name
    pub fn with_theme(name: &str) -> Result<Self> {
        let mut themes = ThemeSet::load_defaults().themes;
        let available = themes.keys().cloned().collect::<Vec<_>>().join(", ");
        let theme = themes
            .remove(name)
            .with_context(|| format!("Unknown theme '{}' (available: {})", name, available))?;

        Ok(Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        })
    }

    /// Names of the bundled themes, sorted.
    pub fn theme_names() -> Vec<String> {
        ThemeSet::load_defaults().themes.into_keys().collect()
    }

    /// Post-processes HTML to apply syntax highlighting with CSS classes.
    ///
    /// Code blocks without a language, or with a language syntect does not
    /// know, keep their escaped plain text body.
    ///
    /// # Arguments
    ///
    /// * `html`: Rendered HTML with `<code class="code-block language-X">` blocks
    ///
    /// # Returns
    ///
    /// HTML with highlighted code blocks
    ///
    /// # Errors
    ///
    /// Returns error if syntect fails on a line
    pub fn highlight_code_blocks(&self, html: &str) -> Result<String> {
        let mut result = String::with_capacity(html.len());
        let mut last_end = 0;
        let mut search_pos = 0;

        while let Some(found) = html[search_pos..].find(CODE_BLOCK_OPEN) {
            let code_start = search_pos + found;
            let lang_start = code_start + CODE_BLOCK_OPEN.len();

            let Some(lang_len) = html[lang_start..].find('"') else {
                break;
            };
            let lang_end = lang_start + lang_len;
            let language = &html[lang_start..lang_end];

            let Some(tag_len) = html[lang_end..].find('>') else {
                break;
            };
            let content_start = lang_end + tag_len + 1;

            let Some(content_len) = html[content_start..].find("</code>") else {
                break;
            };
            let content_end = content_start + content_len;

            let code = unescape_html(&html[content_start..content_end]);
            let highlighted = self
                .highlight_code(&code, &unescape_html(language))
                .with_context(|| format!("Failed to highlight {} code block", language))?;

            if let Some(highlighted) = highlighted {
                result.push_str(&html[last_end..content_start]);
                result.push_str(&highlighted);
                last_end = content_end;
            }

            search_pos = content_end + "</code>".len();
        }

        result.push_str(&html[last_end..]);
        Ok(result)
    }

    /// Highlights code with syntect using CSS classes.
    ///
    /// # Arguments
    ///
    /// * `code`: Source code to highlight, unescaped
    /// * `language`: Language token or file extension (rust, py, bash)
    ///
    /// # Returns
    ///
    /// Highlighted HTML, or `None` when the language is unknown
    ///
    /// # Errors
    ///
    /// Returns error if syntax highlighting fails
    pub fn highlight_code(&self, code: &str, language: &str) -> Result<Option<String>> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(language)
            .or_else(|| self.syntax_set.find_syntax_by_extension(language));

        let Some(syntax) = syntax else {
            return Ok(None);
        };

        if code.is_empty() {
            return Ok(Some(String::new()));
        }

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);

        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .context("Failed to parse line for syntax highlighting")?;
        }

        Ok(Some(generator.finalize()))
    }

    /// Generates the stylesheet matching the emitted class names.
    ///
    /// # Errors
    ///
    /// Returns error if the theme cannot be converted to CSS
    pub fn stylesheet(&self) -> Result<String> {
        css_for_theme_with_class_style(&self.theme, CLASS_STYLE)
            .context("Failed to generate highlighting stylesheet")
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust_block() {
        // Arrange
        let highlighter = Highlighter::new();
        let html = "<pre class=\"line-numbers\"><code class=\"code-block language-rust\">fn main() {}\n</code></pre>";

        // Act
        let result = highlighter
            .highlight_code_blocks(html)
            .expect("Should highlight");

        // Assert
        assert!(
            result.contains("<code class=\"code-block language-rust\"><span class=\"hl-"),
            "Should contain highlighting spans: {}",
            result
        );
        assert!(result.ends_with("</code></pre>"));
        assert!(result.contains("main"));
    }

    #[test]
    fn test_highlight_decodes_entities_once() {
        // Arrange
        let highlighter = Highlighter::new();
        let html = "<code class=\"code-block language-bash\">echo &quot;a &lt; b&quot;\n</code>";

        // Act
        let result = highlighter
            .highlight_code_blocks(html)
            .expect("Should highlight");

        // Assert
        assert!(!result.contains("&amp;lt;"), "Should not double escape: {}", result);
        assert!(result.contains("&lt;"), "Should re-escape: {}", result);
    }

    #[test]
    fn test_unknown_language_keeps_body() {
        // Arrange
        let highlighter = Highlighter::new();
        let html = "<code class=\"code-block language-unknownlang\">x &lt; y\n</code>";

        // Act
        let result = highlighter
            .highlight_code_blocks(html)
            .expect("Should not fail");

        // Assert
        assert_eq!(result, html);
    }

    #[test]
    fn test_block_without_language_untouched() {
        // Arrange
        let highlighter = Highlighter::new();
        let html = "<pre class=\"line-numbers\"><code class=\"code-block\">plain\n</code></pre>";

        // Act
        let result = highlighter
            .highlight_code_blocks(html)
            .expect("Should not fail");

        // Assert
        assert_eq!(result, html);
    }

    #[test]
    fn test_inline_code_untouched() {
        let highlighter = Highlighter::new();
        let html = "<p><code class=\"inline-code\">ls -la</code></p>";
        assert_eq!(highlighter.highlight_code_blocks(html).expect("ok"), html);
    }

    #[test]
    fn test_multiple_blocks() {
        // Arrange
        let highlighter = Highlighter::new();
        let html = "<code class=\"code-block language-rust\">fn foo() {}\n</code>\n\
                    <p>between</p>\n\
                    <code class=\"code-block language-python\">def bar():\n    pass\n</code>";

        // Act
        let result = highlighter
            .highlight_code_blocks(html)
            .expect("Should highlight");

        // Assert
        assert!(result.matches("<span class=\"hl-").count() >= 2, "Got: {}", result);
        assert!(result.contains("<p>between</p>"));
        assert!(result.contains("foo") && result.contains("bar"));
    }

    #[test]
    fn test_empty_code_block() {
        let highlighter = Highlighter::new();
        let html = "<code class=\"code-block language-rust\"></code>";
        assert_eq!(highlighter.highlight_code_blocks(html).expect("ok"), html);
    }

    #[test]
    fn test_unterminated_code_tag() {
        let highlighter = Highlighter::new();
        let html = "<code class=\"code-block language-rust\">fn main()";
        assert_eq!(highlighter.highlight_code_blocks(html).expect("ok"), html);
    }

    #[test]
    fn test_with_theme_unknown() {
        // Act
        let result = Highlighter::with_theme("No Such Theme");

        // Assert
        assert!(result.is_err());
        let msg = format!("{:#}", result.err().expect("error"));
        assert!(msg.contains("Unknown theme"), "Got: {}", msg);
    }

    #[test]
    fn test_theme_names_include_default() {
        assert!(Highlighter::theme_names().contains(&DEFAULT_THEME.to_string()));
    }

    #[test]
    fn test_stylesheet_uses_prefix() {
        // Arrange
        let highlighter = Highlighter::with_theme("base16-ocean.dark").expect("Bundled theme");

        // Act
        let css = highlighter.stylesheet().expect("Should generate CSS");

        // Assert
        assert!(css.contains(".hl-"), "Got: {}", css);
    }
}
