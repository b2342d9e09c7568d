//! Endpoint declarations and their flattened form.
//!
//! # Responsibilities
//! - Model the nested endpoint declaration tree
//! - Flatten it into dot-joined names (`users.get`)
//! - Rebuild the nested shape from flattened names
//!
//! # Design Decisions
//! - A node is a leaf iff it is a string or an object with a `path` field
//! - Declaration order is preserved end to end, so route tables are
//!   reproducible for the same input

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An endpoint declared as an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointDefinition {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    /// Any other declared fields, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EndpointDefinition {
    pub fn new(path: impl Into<String>, method: Option<&str>) -> Self {
        Self {
            path: path.into(),
            method: method.map(str::to_string),
            extra: Map::new(),
        }
    }
}

/// A leaf endpoint: either a bare path or a full definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointEntry {
    Path(String),
    Definition(EndpointDefinition),
}

impl EndpointEntry {
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) => path,
            Self::Definition(def) => &def.path,
        }
    }

    /// Declared method, before normalization.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Definition(def) => def.method.as_deref(),
        }
    }

    /// Same entry with its path replaced, other fields preserved.
    pub fn with_path(&self, path: String) -> Self {
        match self {
            Self::Path(_) => Self::Path(path),
            Self::Definition(def) => Self::Definition(EndpointDefinition {
                path,
                ..def.clone()
            }),
        }
    }
}

/// A node of the declaration tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointNode {
    Path(String),
    Definition(EndpointDefinition),
    Tree(EndpointTree),
}

impl From<EndpointEntry> for EndpointNode {
    fn from(entry: EndpointEntry) -> Self {
        match entry {
            EndpointEntry::Path(path) => Self::Path(path),
            EndpointEntry::Definition(def) => Self::Definition(def),
        }
    }
}

/// Ordered mapping from names to nodes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EndpointTree {
    entries: Vec<(String, EndpointNode)>,
}

impl EndpointTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing an existing one with the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, node: EndpointNode) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = node,
            None => self.entries.push((name, node)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&EndpointNode> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EndpointNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Child tree under `name`, created (or replacing a leaf) if needed.
    fn subtree_mut(&mut self, name: &str) -> &mut EndpointTree {
        let index = match self.entries.iter().position(|(key, _)| key == name) {
            Some(index) => {
                if !matches!(self.entries[index].1, EndpointNode::Tree(_)) {
                    self.entries[index].1 = EndpointNode::Tree(EndpointTree::new());
                }
                index
            }
            None => {
                self.entries
                    .push((name.to_string(), EndpointNode::Tree(EndpointTree::new())));
                self.entries.len() - 1
            }
        };
        match &mut self.entries[index].1 {
            EndpointNode::Tree(tree) => tree,
            _ => unreachable!("entry was just made a tree"),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, EndpointNode)> for EndpointTree {
    fn from_iter<I: IntoIterator<Item = (K, EndpointNode)>>(iter: I) -> Self {
        let mut tree = EndpointTree::new();
        for (name, node) in iter {
            tree.insert(name, node);
        }
        tree
    }
}

impl Serialize for EndpointTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, node) in &self.entries {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EndpointTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TreeVisitor;

        impl<'de> Visitor<'de> for TreeVisitor {
            type Value = EndpointTree;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of endpoint names to paths, definitions or nested maps")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut tree = EndpointTree::new();
                while let Some((name, node)) = access.next_entry::<String, EndpointNode>()? {
                    tree.insert(name, node);
                }
                Ok(tree)
            }
        }

        deserializer.deserialize_map(TreeVisitor)
    }
}

/// Flattened endpoints keyed by dot-joined name, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatEndpoints {
    entries: Vec<(String, EndpointEntry)>,
}

impl FlatEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert with map semantics: an existing name is replaced in place.
    pub fn insert(&mut self, name: impl Into<String>, entry: EndpointEntry) {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((name, entry)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&EndpointEntry> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, entry)| entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EndpointEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flatten a declaration tree into dot-joined names.
pub fn flatten(tree: &EndpointTree) -> FlatEndpoints {
    let mut flat = FlatEndpoints::new();
    flatten_into(tree, None, &mut flat);
    flat
}

fn flatten_into(tree: &EndpointTree, prefix: Option<&str>, out: &mut FlatEndpoints) {
    for (name, node) in tree.iter() {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        };
        match node {
            EndpointNode::Path(path) => out.insert(key, EndpointEntry::Path(path.clone())),
            EndpointNode::Definition(def) => {
                out.insert(key, EndpointEntry::Definition(def.clone()))
            }
            EndpointNode::Tree(sub) => flatten_into(sub, Some(&key), out),
        }
    }
}

/// Rebuild the nested shape from dot-joined names.
pub fn unflatten(flat: &FlatEndpoints) -> EndpointTree {
    let mut root = EndpointTree::new();
    for (name, entry) in flat.iter() {
        let mut segments: Vec<&str> = name.split('.').collect();
        let leaf = segments.pop().unwrap_or(name);
        let mut tree = &mut root;
        for segment in segments {
            tree = tree.subtree_mut(segment);
        }
        tree.insert(leaf, entry.clone().into());
    }
    root
}
