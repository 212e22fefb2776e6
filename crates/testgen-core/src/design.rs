//! Figma document tree and its simplified form
//!
//! A raw Figma file is tens of thousands of nodes of mostly visual detail.
//! [`simplify`] keeps only the structural node kinds a tester cares about
//! and prunes everything else, whole branch at a time.

use serde::{Deserialize, Serialize};

/// Raw node as found in a Figma file. Unknown fields are ignored; fields of
/// the wrong JSON type (including `null`) count as absent, and malformed
/// children are dropped.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawNode {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::string")]
    pub node_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::nodes")]
    pub children: Vec<RawNode>,
}

/// Root container of a Figma file's node tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDocument {
    #[serde(default, deserialize_with = "lenient::nodes")]
    pub children: Vec<RawNode>,
}

/// Figma file as returned by `GET /v1/files/{key}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DesignFile {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::document")]
    pub document: RawDocument,
}

/// Type-tolerant decoders for the raw tree
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{RawDocument, RawNode};

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    pub fn nodes<'de, D>(deserializer: D) -> Result<Vec<RawNode>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn document<'de, D>(deserializer: D) -> Result<RawDocument, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
    }
}

impl DesignFile {
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Node kinds that survive simplification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Canvas,
    Frame,
    Component,
    Instance,
    Text,
    Rectangle,
}

impl NodeKind {
    /// Map a Figma `type` string onto the whitelist.
    pub fn from_type(node_type: &str) -> Option<Self> {
        match node_type {
            "CANVAS" => Some(NodeKind::Canvas),
            "FRAME" => Some(NodeKind::Frame),
            "COMPONENT" => Some(NodeKind::Component),
            "INSTANCE" => Some(NodeKind::Instance),
            "TEXT" => Some(NodeKind::Text),
            "RECTANGLE" => Some(NodeKind::Rectangle),
            _ => None,
        }
    }
}

/// A whitelisted node. `children` is omitted from JSON when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignNode {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DesignNode>,
}

impl DesignNode {
    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(DesignNode::node_count).sum::<usize>()
    }
}

/// Output of [`simplify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifiedDesign {
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
    pub pages: Vec<DesignNode>,
}

impl SimplifiedDesign {
    pub fn node_count(&self) -> usize {
        self.pages.iter().map(DesignNode::node_count).sum()
    }

    /// Text used to look up related knowledge: the file name, then each
    /// page name followed by the names of its top-level nodes.
    pub fn retrieval_query(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.file_name.as_deref());
        for page in &self.pages {
            parts.extend(page.name.as_deref());
            parts.extend(page.children.iter().filter_map(|c| c.name.as_deref()));
        }
        parts
            .into_iter()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Simplify one node. Returns `None` when the node is outside the whitelist,
/// which drops its whole subtree.
pub fn simplify_node(node: &RawNode) -> Option<DesignNode> {
    let kind = NodeKind::from_type(node.node_type.as_deref()?)?;
    Some(DesignNode {
        id: node.id.clone(),
        name: node.name.clone(),
        kind,
        children: node.children.iter().filter_map(simplify_node).collect(),
    })
}

/// Simplify a whole file. Only top-level `CANVAS` nodes become pages.
pub fn simplify(file: &DesignFile) -> SimplifiedDesign {
    SimplifiedDesign {
        file_name: file.name.clone(),
        pages: file
            .document
            .children
            .iter()
            .filter(|node| node.node_type.as_deref() == Some("CANVAS"))
            .filter_map(simplify_node)
            .collect(),
    }
}
