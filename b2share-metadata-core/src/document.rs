//! Output document tree produced by a mapping run.

use indexmap::IndexMap;
use serde::Serialize;

/// Insertion-ordered mapping node.
pub type Mapping = IndexMap<String, Node>;

/// One node of the output document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    /// Textual value, copied verbatim from the record.
    Text(String),
    /// Coerced boolean value.
    Bool(bool),
    Mapping(Mapping),
    Sequence(Vec<Node>),
}

impl Node {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// The nested document built from one run's records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Document {
    root: Mapping,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Mapping {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Mapping {
        &mut self.root
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.root.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}
