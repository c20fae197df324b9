//! Note store loaded from an application export.
//!
//! The application keeps notes as a tree of folders and notes and exports it
//! as JSON (`{ notes, tags, commands, version }`). Local storage holds the
//! bare node array, which is accepted as well.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::markdown::{NoteLookup, NoteRef};

/// Separator between titles in a note path.
const PATH_SEPARATOR: &str = " > ";

/// Folder or note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Note,
}

/// Tree node as serialized by the application.
///
/// Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub updated: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Node {
    /// Returns true for folders.
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    /// Returns true for notes.
    pub fn is_note(&self) -> bool {
        self.kind == NodeKind::Note
    }

    /// Note body, empty for folders and notes without content.
    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// Tag definition referenced from [`Node::tags`] by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Saved command history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCommand {
    pub id: String,
    pub command: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub created: i64,
}

/// Export file layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportData {
    pub notes: Vec<Node>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub commands: Vec<SavedCommand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredNotes {
    Export(ExportData),
    Tree(Vec<Node>),
}

/// Read-only view over an exported note tree.
///
/// Lookups walk the tree depth first in stored order, entering folders only,
/// so the first match wins when ids repeat.
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    data: ExportData,
}

impl NoteStore {
    /// Creates store from export data.
    pub fn new(data: ExportData) -> Self {
        Self { data }
    }

    /// Parses an export file or a bare node array.
    ///
    /// # Errors
    ///
    /// Returns error if the text is neither layout
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: StoredNotes =
            serde_json::from_str(json).context("Invalid notes format: expected export object or node array")?;

        let data = match stored {
            StoredNotes::Export(data) => data,
            StoredNotes::Tree(notes) => ExportData {
                notes,
                ..ExportData::default()
            },
        };

        Ok(Self::new(data))
    }

    /// Loads store from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read notes file: {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("Failed to parse notes file: {}", path.display()))
    }

    /// Serializes the store back to the export layout.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.data).context("Failed to serialize notes")
    }

    /// Top level nodes.
    pub fn roots(&self) -> &[Node] {
        &self.data.notes
    }

    /// Tag definitions.
    pub fn tags(&self) -> &[Tag] {
        &self.data.tags
    }

    /// Saved commands.
    pub fn commands(&self) -> &[SavedCommand] {
        &self.data.commands
    }

    /// Finds a folder or note by id.
    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        fn search<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Node> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if node.is_folder()
                    && let Some(found) = search(&node.children, id)
                {
                    return Some(found);
                }
            }
            None
        }

        search(&self.data.notes, id)
    }

    /// Finds the folder directly containing `id`.
    ///
    /// Returns `None` for top level items and unknown ids.
    pub fn find_parent_folder(&self, id: &str) -> Option<&Node> {
        fn search<'a>(nodes: &'a [Node], parent: Option<&'a Node>, id: &str) -> Option<Option<&'a Node>> {
            for node in nodes {
                if node.id == id {
                    return Some(parent);
                }
                if node.is_folder()
                    && let Some(found) = search(&node.children, Some(node), id)
                {
                    return Some(found);
                }
            }
            None
        }

        search(&self.data.notes, None, id).flatten()
    }

    /// Titles from the root down to `id`, joined with ` > `.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use redlines::NoteStore;
    /// # fn example(store: &NoteStore) {
    /// // "New Project > Recon > Nmap Scan"
    /// let path = store.note_path("note-3");
    /// # }
    /// ```
    pub fn note_path(&self, id: &str) -> Option<String> {
        fn trail<'a>(nodes: &'a [Node], id: &str, path: &mut Vec<&'a str>) -> bool {
            for node in nodes {
                path.push(&node.title);
                if node.id == id {
                    return true;
                }
                if node.is_folder() && trail(&node.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        trail(&self.data.notes, id, &mut path).then(|| path.join(PATH_SEPARATOR))
    }

    /// Every note (folders excluded) in tree order.
    pub fn notes(&self) -> Vec<&Node> {
        fn collect<'a>(nodes: &'a [Node], out: &mut Vec<&'a Node>) {
            for node in nodes {
                if node.is_note() {
                    out.push(node);
                }
                if node.is_folder() {
                    collect(&node.children, out);
                }
            }
        }

        let mut out = Vec::new();
        collect(&self.data.notes, &mut out);
        out
    }

    /// Names of the tags on `node`.
    ///
    /// Tag ids without a definition are skipped.
    pub fn tag_names(&self, node: &Node) -> Vec<&str> {
        node.tags
            .iter()
            .filter_map(|tag_id| self.data.tags.iter().find(|tag| &tag.id == tag_id))
            .map(|tag| tag.name.as_str())
            .collect()
    }
}

impl NoteLookup for NoteStore {
    fn find_note_by_id(&self, id: &str) -> Option<NoteRef<'_>> {
        self.find_by_id(id).map(|node| NoteRef {
            id: &node.id,
            title: &node.title,
        })
    }
}
