//! Minimal wire model for list+watch endpoints.
//!
//! Only the fields the cache needs are typed; everything else an object
//! carries is kept verbatim in a flattened map so handlers see full payloads.

use serde::{Deserialize, Serialize};

/// Identifying metadata of a mirrored object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name, unique within its namespace.
    #[serde(default)]
    pub name: String,

    /// Namespace, absent for cluster-scoped resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Server-assigned version, used to resume watches.
    #[serde(
        rename = "resourceVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_version: Option<String>,
}

/// One remote resource, mirrored locally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiObject {
    /// Identifying metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Everything else the server sent, untouched.
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl ApiObject {
    /// The store key for this object.
    pub fn key(&self) -> ObjectKey {
        ObjectKey {
            namespace: self.metadata.namespace.clone(),
            name: self.metadata.name.clone(),
        }
    }
}

/// Namespace/name pair identifying an object in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    /// Namespace, absent for cluster-scoped resources.
    pub namespace: Option<String>,
    /// Object name.
    pub name: String,
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Metadata of a list response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMeta {
    /// Version the listing was served at; watches resume from here.
    #[serde(
        rename = "resourceVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub resource_version: Option<String>,
}

/// A full listing of a resource collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectList {
    /// List metadata.
    #[serde(default)]
    pub metadata: ListMeta,

    /// The listed objects.
    #[serde(default)]
    pub items: Vec<ApiObject>,
}

/// Kind of a single watch-stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WatchEventKind {
    Added,
    Modified,
    Deleted,
}

/// One line of a watch stream: `{"type": "...", "object": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchEvent {
    /// What happened to the object.
    #[serde(rename = "type")]
    pub kind: WatchEventKind,

    /// The object after (or, for deletes, before) the change.
    pub object: ApiObject,
}
