//! Root schema: an object shape bound to a collection, plus compound index
//! declarations and document-wide options.

use std::sync::OnceLock;

use chrono::Utc;
use serde::Deserialize;

use crate::index::{collect_indexes, IndexDeclaration, IndexDirection, IndexOptions};
use crate::mutation::validate_mutation;
use crate::value::{Document, Value};

use super::composite::ObjectNode;
use super::errors::{ValidationError, ValidationResult};
use super::node::{date, NodeExt, Parse, SchemaNode};

/// Name of the store-assigned identity field.
pub const ID_FIELD: &str = "_id";

/// Names of the auto-managed timestamp fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampFields {
    pub created_at: String,
    pub updated_at: String,
}

impl Default for TimestampFields {
    fn default() -> Self {
        Self {
            created_at: "createdAt".into(),
            updated_at: "updatedAt".into(),
        }
    }
}

/// Document-wide schema options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SchemaOptions {
    /// Auto-managed creation/update instants. Disabled when `None`.
    #[serde(default)]
    pub timestamps: Option<TimestampFields>,
}

impl SchemaOptions {
    /// Options with the default timestamp field names enabled.
    pub fn with_timestamps() -> Self {
        Self {
            timestamps: Some(TimestampFields::default()),
        }
    }

    /// Whether `path` names one of the auto-managed timestamp fields.
    pub fn is_timestamp_field(&self, path: &str) -> bool {
        self.timestamps
            .as_ref()
            .map_or(false, |t| path == t.created_at || path == t.updated_at)
    }
}

/// A named, independently indexed document shape.
///
/// `Schema` deliberately does not convert into a `SchemaNode`: embedded
/// shapes must be plain object nodes.
#[derive(Debug, Clone)]
pub struct Schema {
    collection: String,
    shape: ObjectNode,
    indexes: Vec<IndexDeclaration>,
    options: SchemaOptions,
    collected: OnceLock<Vec<IndexDeclaration>>,
}

impl Schema {
    pub fn new(collection: impl Into<String>, shape: ObjectNode) -> Self {
        Self {
            collection: collection.into(),
            shape,
            indexes: Vec::new(),
            options: SchemaOptions::default(),
            collected: OnceLock::new(),
        }
    }

    /// Enables `createdAt` / `updatedAt`.
    pub fn with_timestamps(self) -> Self {
        self.with_options(SchemaOptions::with_timestamps())
    }

    pub fn with_options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self.collected = OnceLock::new();
        self
    }

    /// Appends a compound index declaration. Identical duplicates are
    /// reported by index synchronization, not here.
    pub fn index<K: Into<String>>(
        mut self,
        keys: impl IntoIterator<Item = (K, IndexDirection)>,
        options: IndexOptions,
    ) -> Self {
        self.indexes.push(IndexDeclaration::compound(keys, options));
        self.collected = OnceLock::new();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn shape(&self) -> &ObjectNode {
        &self.shape
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Root-level compound declarations in declaration order.
    pub fn compound_indexes(&self) -> &[IndexDeclaration] {
        &self.indexes
    }

    /// Every index the schema wants: per-field declarations in tree order,
    /// then compound declarations. Computed once per schema.
    pub fn collect_indexes(&self) -> &[IndexDeclaration] {
        self.collected
            .get_or_init(|| collect_indexes(&self.shape, &self.indexes))
    }

    /// Validates a whole document for creation or replacement.
    ///
    /// An `_id` not declared in the shape is passed through verbatim; a
    /// declared `_id` is validated like any other field. The same holds for
    /// timestamp fields: the shape's own declaration takes precedence.
    pub fn parse(&self, input: &Value) -> ValidationResult<Document> {
        let doc = self.root_document(input)?;
        let parsed = self.shape.parse_document(doc)?;

        let mut out = self.passthrough_id(doc);
        out.extend(parsed);

        if let Some(fields) = &self.options.timestamps {
            let now = Value::DateTime(Utc::now());
            for name in self.managed_timestamps(fields) {
                let value = match timestamp_node().parse_for_update(doc.get(name.as_str())) {
                    Ok(Some(value)) => value,
                    Ok(None) => now.clone(),
                    Err(e) => return Err(e.within_field(name)),
                };
                out.insert(name.clone(), value);
            }
        }

        Ok(out)
    }

    /// Validates the fields present in a partial document. Nothing is
    /// defaulted or filled.
    pub fn parse_for_update(&self, input: &Value) -> ValidationResult<Document> {
        let doc = self.root_document(input)?;
        let parsed = self.shape.parse_document_for_update(doc)?;

        let mut out = self.passthrough_id(doc);
        out.extend(parsed);

        if let Some(fields) = &self.options.timestamps {
            for name in self.managed_timestamps(fields) {
                if let Some(value) = timestamp_node()
                    .parse_for_update(doc.get(name.as_str()))
                    .map_err(|e| e.within_field(name))?
                {
                    out.insert(name.clone(), value);
                }
            }
        }

        Ok(out)
    }

    /// Validates an update-operator document against this schema.
    pub fn validate_mutation(&self, update: &Document) -> ValidationResult<()> {
        validate_mutation(update, &self.shape, &self.options)
    }

    fn root_document<'a>(&self, input: &'a Value) -> ValidationResult<&'a Document> {
        let doc = input
            .as_document()
            .ok_or_else(|| ValidationError::type_mismatch("object", input.type_name()))?;
        self.shape
            .reject_undeclared(doc, |key| key == ID_FIELD || self.options.is_timestamp_field(key))?;
        Ok(doc)
    }

    /// Timestamp fields not declared by the shape. A declared field is
    /// validated by its own node only and never filled.
    fn managed_timestamps<'a>(
        &'a self,
        fields: &'a TimestampFields,
    ) -> impl Iterator<Item = &'a String> + 'a {
        [&fields.created_at, &fields.updated_at]
            .into_iter()
            .filter(move |name| self.shape.get(name.as_str()).is_none())
    }

    fn passthrough_id(&self, doc: &Document) -> Document {
        let mut out = Document::new();
        if self.shape.get(ID_FIELD).is_none() {
            if let Some(id) = doc.get(ID_FIELD).filter(|v| !v.is_undefined()) {
                out.insert(ID_FIELD.to_string(), id.clone());
            }
        }
        out
    }
}

/// Node used for the auto-managed timestamp fields.
pub(crate) fn timestamp_node() -> SchemaNode {
    date().optional()
}
