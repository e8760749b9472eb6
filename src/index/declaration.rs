//! Index declarations and their canonical form.
//!
//! Two declarations describe the same index iff their canonical forms are
//! byte-identical. Key order is significant; option order is not.

use std::collections::BTreeMap;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};
use sha2::{Digest, Sha256};

/// Index key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Json", try_from = "Json")]
pub enum IndexDirection {
    Ascending,
    Descending,
    Hashed,
    Text,
}

impl IndexDirection {
    /// The store's representation: `1`, `-1`, `"hashed"`, `"text"`.
    pub fn to_json(self) -> Json {
        match self {
            IndexDirection::Ascending => json!(1),
            IndexDirection::Descending => json!(-1),
            IndexDirection::Hashed => json!("hashed"),
            IndexDirection::Text => json!("text"),
        }
    }

    fn name_part(self) -> &'static str {
        match self {
            IndexDirection::Ascending => "1",
            IndexDirection::Descending => "-1",
            IndexDirection::Hashed => "hashed",
            IndexDirection::Text => "text",
        }
    }
}

impl From<IndexDirection> for Json {
    fn from(dir: IndexDirection) -> Self {
        dir.to_json()
    }
}

impl TryFrom<Json> for IndexDirection {
    type Error = String;

    fn try_from(json: Json) -> Result<Self, Self::Error> {
        match &json {
            Json::Number(n) if n.as_f64() == Some(1.0) => Ok(IndexDirection::Ascending),
            Json::Number(n) if n.as_f64() == Some(-1.0) => Ok(IndexDirection::Descending),
            Json::String(s) if s == "hashed" => Ok(IndexDirection::Hashed),
            Json::String(s) if s == "text" => Ok(IndexDirection::Text),
            other => Err(format!("unsupported index direction {}", other)),
        }
    }
}

impl fmt::Display for IndexDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name_part())
    }
}

/// Index options. Unset options are omitted from the canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial_filter_expression: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_after_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "default_language")]
    pub default_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "language_override")]
    pub language_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<BTreeMap<String, i32>>,
}

impl IndexOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(mut self) -> Self {
        self.unique = Some(true);
        self
    }

    pub fn sparse(mut self) -> Self {
        self.sparse = Some(true);
        self
    }

    pub fn partial_filter(mut self, expression: Json) -> Self {
        self.partial_filter_expression = Some(expression);
        self
    }

    /// TTL in seconds.
    pub fn expire_after(mut self, seconds: i64) -> Self {
        self.expire_after_seconds = Some(seconds);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = Some(language.into());
        self
    }

    pub fn language_override(mut self, field: impl Into<String>) -> Self {
        self.language_override = Some(field.into());
        self
    }

    pub fn weight(mut self, field: impl Into<String>, weight: i32) -> Self {
        self.weights
            .get_or_insert_with(BTreeMap::new)
            .insert(field.into(), weight);
        self
    }

    /// Options without the name, as compared structurally.
    fn without_name(&self) -> Self {
        Self {
            name: None,
            ..self.clone()
        }
    }
}

/// Index metadata attached to a single schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIndex {
    pub direction: IndexDirection,
    pub options: IndexOptions,
}

impl FieldIndex {
    pub fn new(direction: IndexDirection, options: IndexOptions) -> Self {
        Self { direction, options }
    }
}

/// One index a schema wants to exist (or the store reports).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDeclaration {
    pub key: IndexMap<String, IndexDirection>,
    #[serde(default)]
    pub options: IndexOptions,
}

impl IndexDeclaration {
    pub fn new(key: IndexMap<String, IndexDirection>, options: IndexOptions) -> Self {
        Self { key, options }
    }

    pub fn single(path: impl Into<String>, direction: IndexDirection, options: IndexOptions) -> Self {
        let mut key = IndexMap::new();
        key.insert(path.into(), direction);
        Self { key, options }
    }

    /// Builds a declaration from `(path, direction)` pairs in order.
    pub fn compound<K: Into<String>>(
        keys: impl IntoIterator<Item = (K, IndexDirection)>,
        options: IndexOptions,
    ) -> Self {
        let key = keys.into_iter().map(|(k, d)| (k.into(), d)).collect();
        Self { key, options }
    }

    /// Explicit name, or the store's generated name (`a_1_b_-1`).
    pub fn name(&self) -> String {
        if let Some(name) = &self.options.name {
            return name.clone();
        }
        self.key
            .iter()
            .map(|(path, dir)| format!("{}_{}", path, dir.name_part()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// The store's implicit primary-key index.
    pub fn is_primary(&self) -> bool {
        self.key.len() == 1 && self.key.get("_id") == Some(&IndexDirection::Ascending)
    }

    /// Whether any key component is a text key.
    pub fn is_text(&self) -> bool {
        self.key.values().any(|dir| *dir == IndexDirection::Text)
    }

    /// Canonical serialization: ordered key pairs, resolved name, and
    /// options with sorted field names.
    pub fn canonical(&self) -> String {
        let key: Vec<Json> = self
            .key
            .iter()
            .map(|(path, dir)| json!([path, dir.to_json()]))
            .collect();
        let options = serde_json::to_value(self.options.without_name()).unwrap_or(Json::Null);
        json!({ "key": key, "name": self.name(), "options": options }).to_string()
    }

    /// SHA-256 hex digest of the canonical form.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.canonical().as_bytes());
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }
}
