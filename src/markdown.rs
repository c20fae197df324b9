//! Markdown rendering for note content.
//!
//! Renders the note dialect (fenced code, pipe tables, task checkboxes and
//! `[[note-id|text]]` note links) to an HTML fragment with a staged pattern
//! pipeline, then resolves note links against a [`NoteLookup`].

mod links;
mod protect;
mod renderer;
mod table;

pub use links::{
    NoNotes, NoteLinkResolver, NoteLookup, NoteRef, linked_note_ids, resolve_note_links,
};
pub use renderer::{MarkdownRenderer, render};
