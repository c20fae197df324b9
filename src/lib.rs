//! Markdown rendering, note linking and report generation for pentest notes.

mod config;
mod highlight;
mod markdown;
mod notes;
mod report;
mod util;

pub use config::{Command, Config, RenderArgs, ReportArgs};
pub use highlight::{DEFAULT_THEME, Highlighter};
pub use markdown::{
    MarkdownRenderer, NoNotes, NoteLinkResolver, NoteLookup, NoteRef, linked_note_ids, render,
    resolve_note_links,
};
pub use notes::{ExportData, Node, NodeKind, NoteStore, SavedCommand, Tag};
pub use report::{DEFAULT_TITLE, ReportFormat, ReportGenerator, ReportOptions, report_file_name};
pub use util::{escape_html, format_now, format_timestamp};
