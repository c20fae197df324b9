//! Report generation from selected notes.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::markdown::{MarkdownRenderer, NoNotes};
use crate::notes::{Node, NoteStore};

/// Title used when none is given.
pub const DEFAULT_TITLE: &str = "Security Report";

const REPORT_CSS: &str = "\
body { font-family: Arial, sans-serif; line-height: 1.6; max-width: 900px; margin: 0 auto; padding: 20px; }
h1, h2, h3 { color: #333; }
pre { background-color: #f5f5f5; padding: 10px; overflow: auto; }
code { font-family: monospace; }
img { max-width: 100%; height: auto; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ddd; padding: 8px; }
th { background-color: #f2f2f2; }
";

/// Output format of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Markdown document with raw note content
    #[default]
    Markdown,
    /// Standalone HTML document with rendered note content
    Html,
}

impl ReportFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Html => "html",
        }
    }
}

/// Report settings.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    pub format: ReportFormat,
    /// Timestamp text shown in the "Generated on" line
    pub generated_on: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            format: ReportFormat::default(),
            generated_on: crate::util::format_now(),
        }
    }
}

/// Builds a report over notes of a store.
///
/// Notes appear in the order their ids are given. HTML reports render note
/// content with `renderer`; note links are reduced to their display text since
/// the report leaves the note store behind.
pub struct ReportGenerator<'a> {
    store: &'a NoteStore,
    renderer: &'a MarkdownRenderer,
}

impl<'a> ReportGenerator<'a> {
    /// Creates generator over `store`.
    pub fn new(store: &'a NoteStore, renderer: &'a MarkdownRenderer) -> Self {
        Self { store, renderer }
    }

    /// Generates the report document.
    ///
    /// # Arguments
    ///
    /// * `note_ids`: Selected note ids, in report order
    /// * `options`: Title, format and timestamp
    ///
    /// # Returns
    ///
    /// Complete report text. Ids not found in the store, and folder ids, are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns error if no ids are selected or note rendering fails
    pub fn generate<S: AsRef<str>>(&self, note_ids: &[S], options: &ReportOptions) -> Result<String> {
        if note_ids.is_empty() {
            bail!("Please select at least one note");
        }

        let notes: Vec<&Node> = note_ids
            .iter()
            .filter_map(|id| self.store.find_by_id(id.as_ref()))
            .filter(|node| node.is_note())
            .collect();

        match options.format {
            ReportFormat::Markdown => Ok(self.markdown(&notes, options)),
            ReportFormat::Html => self.html(&notes, options).map(|doc| doc.into_string()),
        }
    }

    fn markdown(&self, notes: &[&Node], options: &ReportOptions) -> String {
        let mut report = format!(
            "# {}\n\n*Generated on {}*\n\n---\n\n",
            options.title, options.generated_on
        );

        for note in notes {
            report.push_str(&format!("## {}\n\n", note.title));
            report.push_str(&format!("*Path: {}*\n\n", self.path(note)));

            let tags = self.store.tag_names(note);
            if !tags.is_empty() {
                report.push_str(&format!("Tags: {}\n\n", tags.join(", ")));
            }

            report.push_str(note.content());
            report.push_str("\n\n---\n\n");
        }

        report
    }

    fn html(&self, notes: &[&Node], options: &ReportOptions) -> Result<Markup> {
        let mut sections = Vec::with_capacity(notes.len());
        for note in notes {
            let body = self
                .renderer
                .render_with_links(note.content(), NoNotes)
                .with_context(|| format!("Failed to render note: {}", note.id))?;
            sections.push((*note, self.path(note), self.store.tag_names(note), body));
        }

        let highlight_css = match self.renderer.highlighter() {
            Some(highlighter) => Some(highlighter.stylesheet()?),
            None => None,
        };

        Ok(html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (options.title) }
                    style { (PreEscaped(REPORT_CSS)) }
                    @if let Some(css) = &highlight_css {
                        style { (PreEscaped(css)) }
                    }
                }
                body {
                    h1 { (options.title) }
                    p { em { "Generated on " (options.generated_on) } }
                    hr;
                    @for (note, path, tags, body) in &sections {
                        h2 { (note.title) }
                        p { em { "Path: " (path) } }
                        @if !tags.is_empty() {
                            p { "Tags: " (tags.join(", ")) }
                        }
                        (PreEscaped(body))
                        hr;
                    }
                }
            }
        })
    }

    fn path(&self, note: &Node) -> String {
        self.store
            .note_path(&note.id)
            .unwrap_or_else(|| note.title.clone())
    }
}

/// Download file name for a report.
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, the rest is
/// lowercased.
///
/// # Examples
///
/// ```
/// use redlines::{ReportFormat, report_file_name};
///
/// assert_eq!(report_file_name("Web App Pentest", ReportFormat::Html), "web_app_pentest.html");
/// ```
pub fn report_file_name(title: &str, format: ReportFormat) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    format!("{}.{}", stem, format.extension())
}
