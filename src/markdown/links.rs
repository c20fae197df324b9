//! Note link resolution for `[[note-id|Display Text]]` references.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Minimal view of a note needed to resolve a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteRef<'a> {
    pub id: &'a str,
    pub title: &'a str,
}

/// Lookup capability over an external note store.
///
/// Implementors only read the store. Resolution never mutates it.
pub trait NoteLookup {
    /// Returns the note with `id`, or `None` when no such note exists.
    fn find_note_by_id(&self, id: &str) -> Option<NoteRef<'_>>;
}

impl<T: NoteLookup + ?Sized> NoteLookup for &T {
    fn find_note_by_id(&self, id: &str) -> Option<NoteRef<'_>> {
        (**self).find_note_by_id(id)
    }
}

/// Maps note id to title.
impl NoteLookup for HashMap<String, String> {
    fn find_note_by_id(&self, id: &str) -> Option<NoteRef<'_>> {
        self.get_key_value(id).map(|(id, title)| NoteRef {
            id: id.as_str(),
            title: title.as_str(),
        })
    }
}

/// Lookup that knows no notes.
///
/// Resolving against it strips every note link down to its display text,
/// which suits output that leaves the application (exported reports).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNotes;

impl NoteLookup for NoNotes {
    fn find_note_by_id(&self, _id: &str) -> Option<NoteRef<'_>> {
        None
    }
}

/// Rewrites note links in rendered HTML.
///
/// Runs on renderer output, never on raw markdown, so the bracket syntax
/// has already survived emphasis, link and list handling untouched.
pub struct NoteLinkResolver<L> {
    lookup: L,
}

impl<L: NoteLookup> NoteLinkResolver<L> {
    /// Creates resolver backed by `lookup`.
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    /// Resolves every `[[note-id|text]]` token in `html`.
    ///
    /// Handles different outcomes:
    /// - Known id: `<a class="note-link" data-note-id="id">text</a>`
    /// - Unknown id: bare display text, link syntax removed
    /// - Id not matching `note-[a-z0-9-]+`: token left untouched
    ///
    /// Display text is inserted as it appears in the HTML, without further
    /// escaping.
    ///
    /// # Arguments
    ///
    /// * `html`: Rendered HTML fragment
    ///
    /// # Returns
    ///
    /// HTML with note links resolved
    pub fn resolve(&self, html: &str) -> String {
        note_link_pattern()
            .replace_all(html, |caps: &Captures| {
                let note_id = &caps[1];
                let link_text = &caps[2];

                match self.lookup.find_note_by_id(note_id) {
                    Some(note) => format!(
                        "<a class=\"note-link\" data-note-id=\"{}\">{}</a>",
                        note.id, link_text
                    ),
                    None => link_text.to_string(),
                }
            })
            .into_owned()
    }
}

/// Resolves note links in `html` against `lookup`.
///
/// Shorthand for `NoteLinkResolver::new(lookup).resolve(html)`.
pub fn resolve_note_links<L: NoteLookup>(html: &str, lookup: L) -> String {
    NoteLinkResolver::new(lookup).resolve(html)
}

/// Lists the note ids referenced by `text`, in order of appearance.
///
/// Duplicates are kept. Works on raw markdown and rendered HTML alike.
pub fn linked_note_ids(text: &str) -> Vec<&str> {
    note_link_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

fn note_link_pattern() -> &'static Regex {
    static NOTE_LINK: OnceLock<Regex> = OnceLock::new();
    NOTE_LINK.get_or_init(|| {
        Regex::new(r"(?R)\[\[(note-[a-z0-9-]+)\|(.+?)\]\]").expect("valid note link pattern")
    })
}
