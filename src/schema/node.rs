//! Schema node hierarchy
//!
//! A `SchemaNode` is a closed sum over every node kind plus optional index
//! metadata. Wrapper kinds hold a boxed inner node; "unwrapping" is a
//! pattern-match loop. Nodes are immutable values: every builder call
//! consumes the node and returns a new one, so branches never alias.

use std::fmt;
use std::sync::Arc;

use crate::index::{FieldIndex, IndexDirection, IndexOptions};
use crate::value::Value;

use super::composite::{ArrayNode, ObjectNode, TupleNode, UnionNode};
use super::errors::{ValidationError, ValidationResult};
use super::primitives::{
    BinaryNode, BooleanNode, DateNode, DecimalNode, NumberNode, ObjectIdNode, StringNode,
};

/// Full and partial parsing.
///
/// `None` input means the value was not supplied (an explicit
/// `Value::Undefined` is treated the same way). `Ok(None)` output means
/// "absent": the caller omits the field.
pub trait Parse {
    /// Full validation for document creation or replacement.
    fn parse(&self, input: Option<&Value>) -> ValidationResult<Option<Value>>;

    /// Partial validation for updates. Absent input is valid and yields
    /// `Ok(None)`; defaults are never injected.
    fn parse_for_update(&self, input: Option<&Value>) -> ValidationResult<Option<Value>>;
}

/// Node kinds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Number(NumberNode),
    String(StringNode),
    Boolean(BooleanNode),
    Date(DateNode),
    ObjectId(ObjectIdNode),
    Decimal(DecimalNode),
    Binary(BinaryNode),
    /// Permits absent-on-create
    Optional(Box<SchemaNode>),
    /// Permits null, still requires presence
    Nullable(Box<SchemaNode>),
    DefaultProvided(DefaultNode),
    CustomValidated(CustomNode),
    Object(ObjectNode),
    Array(ArrayNode),
    Tuple(TupleNode),
    Union(UnionNode),
}

/// Underlying kind once every wrapper layer is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Number,
    String,
    Boolean,
    Date,
    ObjectId,
    Decimal,
    Binary,
    Object,
    Array,
    Tuple,
    Union,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Number => "number",
            NodeType::String => "string",
            NodeType::Boolean => "boolean",
            NodeType::Date => "date",
            NodeType::ObjectId => "objectId",
            NodeType::Decimal => "decimal",
            NodeType::Binary => "binary",
            NodeType::Object => "object",
            NodeType::Array => "array",
            NodeType::Tuple => "tuple",
            NodeType::Union => "union",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A schema node: one validator for one shape of data.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    kind: NodeKind,
    index: Option<FieldIndex>,
}

impl SchemaNode {
    pub fn new(kind: NodeKind) -> Self {
        Self { kind, index: None }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Index metadata attached to this node, if any.
    pub fn field_index(&self) -> Option<&FieldIndex> {
        self.index.as_ref()
    }

    /// The directly wrapped node for wrapper kinds.
    pub fn inner(&self) -> Option<&SchemaNode> {
        match &self.kind {
            NodeKind::Optional(inner) | NodeKind::Nullable(inner) => Some(inner),
            NodeKind::DefaultProvided(node) => Some(&node.inner),
            NodeKind::CustomValidated(node) => Some(&node.inner),
            _ => None,
        }
    }

    /// Strips every wrapper layer.
    pub fn base(&self) -> &SchemaNode {
        let mut current = self;
        while let Some(inner) = current.inner() {
            current = inner;
        }
        current
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Number(_) => NodeType::Number,
            NodeKind::String(_) => NodeType::String,
            NodeKind::Boolean(_) => NodeType::Boolean,
            NodeKind::Date(_) => NodeType::Date,
            NodeKind::ObjectId(_) => NodeType::ObjectId,
            NodeKind::Decimal(_) => NodeType::Decimal,
            NodeKind::Binary(_) => NodeType::Binary,
            NodeKind::Object(_) => NodeType::Object,
            NodeKind::Array(_) => NodeType::Array,
            NodeKind::Tuple(_) => NodeType::Tuple,
            NodeKind::Union(_) => NodeType::Union,
            NodeKind::Optional(inner) | NodeKind::Nullable(inner) => inner.node_type(),
            NodeKind::DefaultProvided(node) => node.inner.node_type(),
            NodeKind::CustomValidated(node) => node.inner.node_type(),
        }
    }

    pub fn as_object(&self) -> Option<&ObjectNode> {
        match &self.base().kind {
            NodeKind::Object(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayNode> {
        match &self.base().kind {
            NodeKind::Array(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&TupleNode> {
        match &self.base().kind {
            NodeKind::Tuple(node) => Some(node),
            _ => None,
        }
    }

    /// Human-readable description used in union failures.
    pub fn describe(&self) -> String {
        match &self.kind {
            NodeKind::Optional(inner) => format!("optional<{}>", inner.describe()),
            NodeKind::Nullable(inner) => format!("nullable<{}>", inner.describe()),
            NodeKind::DefaultProvided(node) => node.inner.describe(),
            NodeKind::CustomValidated(node) => node.inner.describe(),
            NodeKind::Array(node) => format!("array<{}>", node.element().describe()),
            NodeKind::Union(node) => node
                .variants()
                .iter()
                .map(SchemaNode::describe)
                .collect::<Vec<_>>()
                .join(" | "),
            _ => self.node_type().to_string(),
        }
    }
}

impl Parse for SchemaNode {
    fn parse(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let input = present(input);
        match &self.kind {
            NodeKind::Number(node) => required(input, |v| node.check(v)),
            NodeKind::String(node) => required(input, |v| node.check(v)),
            NodeKind::Boolean(node) => required(input, |v| node.check(v)),
            NodeKind::Date(node) => required(input, |v| node.check(v)),
            NodeKind::ObjectId(node) => required(input, |v| node.check(v)),
            NodeKind::Decimal(node) => required(input, |v| node.check(v)),
            NodeKind::Binary(node) => required(input, |v| node.check(v)),
            NodeKind::Optional(inner) => match input {
                None => Ok(None),
                Some(_) => inner.parse(input),
            },
            NodeKind::Nullable(inner) => match input {
                Some(Value::Null) => Ok(Some(Value::Null)),
                _ => inner.parse(input),
            },
            NodeKind::DefaultProvided(node) => match input {
                None => {
                    let fallback = node.default.produce();
                    node.inner.parse(Some(&fallback))
                }
                Some(_) => node.inner.parse(input),
            },
            NodeKind::CustomValidated(node) => {
                let parsed = node.inner.parse(input)?;
                node.apply(parsed)
            }
            NodeKind::Object(node) => node.parse(input),
            NodeKind::Array(node) => node.parse(input),
            NodeKind::Tuple(node) => node.parse(input),
            NodeKind::Union(node) => node.parse(input),
        }
    }

    fn parse_for_update(&self, input: Option<&Value>) -> ValidationResult<Option<Value>> {
        let input = present(input);
        match &self.kind {
            NodeKind::Number(node) => when_present(input, |v| node.check(v)),
            NodeKind::String(node) => when_present(input, |v| node.check(v)),
            NodeKind::Boolean(node) => when_present(input, |v| node.check(v)),
            NodeKind::Date(node) => when_present(input, |v| node.check(v)),
            NodeKind::ObjectId(node) => when_present(input, |v| node.check(v)),
            NodeKind::Decimal(node) => when_present(input, |v| node.check(v)),
            NodeKind::Binary(node) => when_present(input, |v| node.check(v)),
            NodeKind::Optional(inner) => inner.parse_for_update(input),
            NodeKind::Nullable(inner) => match input {
                Some(Value::Null) => Ok(Some(Value::Null)),
                _ => inner.parse_for_update(input),
            },
            // defaults apply to creation only
            NodeKind::DefaultProvided(node) => node.inner.parse_for_update(input),
            NodeKind::CustomValidated(node) => {
                let parsed = node.inner.parse_for_update(input)?;
                node.apply(parsed)
            }
            NodeKind::Object(node) => node.parse_for_update(input),
            NodeKind::Array(node) => node.parse_for_update(input),
            NodeKind::Tuple(node) => node.parse_for_update(input),
            NodeKind::Union(node) => node.parse_for_update(input),
        }
    }
}

/// Treats an explicit `Undefined` as absent.
pub(crate) fn present(input: Option<&Value>) -> Option<&Value> {
    input.filter(|v| !v.is_undefined())
}

fn required(
    input: Option<&Value>,
    check: impl FnOnce(&Value) -> ValidationResult<Value>,
) -> ValidationResult<Option<Value>> {
    match input {
        Some(value) => check(value).map(Some),
        None => Err(ValidationError::missing_required()),
    }
}

fn when_present(
    input: Option<&Value>,
    check: impl FnOnce(&Value) -> ValidationResult<Value>,
) -> ValidationResult<Option<Value>> {
    input.map(check).transpose()
}

/// Source of a default value.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Factory(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// A node that need not be supplied on create.
#[derive(Debug, Clone)]
pub struct DefaultNode {
    inner: Box<SchemaNode>,
    default: DefaultValue,
}

impl DefaultNode {
    pub fn inner(&self) -> &SchemaNode {
        &self.inner
    }

    pub fn default_value(&self) -> &DefaultValue {
        &self.default
    }
}

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A node whose output must also satisfy a caller predicate.
#[derive(Clone)]
pub struct CustomNode {
    inner: Box<SchemaNode>,
    predicate: Predicate,
    message: String,
}

impl CustomNode {
    pub fn inner(&self) -> &SchemaNode {
        &self.inner
    }

    /// Runs the predicate only over a produced value.
    fn apply(&self, parsed: Option<Value>) -> ValidationResult<Option<Value>> {
        match &parsed {
            Some(value) if !(self.predicate)(value) => {
                Err(ValidationError::custom(self.message.clone()))
            }
            _ => Ok(parsed),
        }
    }
}

impl fmt::Debug for CustomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomNode")
            .field("inner", &self.inner)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

const DEFAULT_CUSTOM_MESSAGE: &str = "custom validation failed";

/// Builder methods available on every node.
pub trait NodeExt: Into<SchemaNode> + Sized {
    /// Permits the value to be absent.
    fn optional(self) -> SchemaNode {
        SchemaNode::new(NodeKind::Optional(Box::new(self.into())))
    }

    /// Permits `null`.
    fn nullable(self) -> SchemaNode {
        SchemaNode::new(NodeKind::Nullable(Box::new(self.into())))
    }

    /// Supplies `value` when the field is absent on create.
    fn default(self, value: impl Into<Value>) -> SchemaNode {
        SchemaNode::new(NodeKind::DefaultProvided(DefaultNode {
            inner: Box::new(self.into()),
            default: DefaultValue::Value(value.into()),
        }))
    }

    /// Supplies a freshly produced value when the field is absent on create.
    fn default_with<F>(self, factory: F) -> SchemaNode
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        SchemaNode::new(NodeKind::DefaultProvided(DefaultNode {
            inner: Box::new(self.into()),
            default: DefaultValue::Factory(Arc::new(factory)),
        }))
    }

    fn validate<F>(self, predicate: F) -> SchemaNode
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.validate_with(predicate, DEFAULT_CUSTOM_MESSAGE)
    }

    fn validate_with<F>(self, predicate: F, message: impl Into<String>) -> SchemaNode
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        SchemaNode::new(NodeKind::CustomValidated(CustomNode {
            inner: Box::new(self.into()),
            predicate: Arc::new(predicate),
            message: message.into(),
        }))
    }

    fn index(self, direction: IndexDirection) -> SchemaNode {
        self.index_with(direction, IndexOptions::default())
    }

    fn index_with(self, direction: IndexDirection, options: IndexOptions) -> SchemaNode {
        let mut node = self.into();
        node.index = Some(FieldIndex::new(direction, options));
        node
    }

    fn unique(self) -> SchemaNode {
        self.index_with(IndexDirection::Ascending, IndexOptions::default().unique())
    }

    fn text(self) -> SchemaNode {
        self.index(IndexDirection::Text)
    }

    fn hashed(self) -> SchemaNode {
        self.index(IndexDirection::Hashed)
    }
}

impl<T: Into<SchemaNode>> NodeExt for T {}

macro_rules! into_schema_node {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for SchemaNode {
                fn from(node: $node) -> Self {
                    SchemaNode::new(NodeKind::$variant(node))
                }
            }
        )*
    };
}

into_schema_node! {
    NumberNode => Number,
    StringNode => String,
    BooleanNode => Boolean,
    DateNode => Date,
    ObjectIdNode => ObjectId,
    DecimalNode => Decimal,
    BinaryNode => Binary,
    ObjectNode => Object,
    ArrayNode => Array,
    TupleNode => Tuple,
    UnionNode => Union,
}

pub fn number() -> NumberNode {
    NumberNode::new()
}

pub fn string() -> StringNode {
    StringNode::new()
}

pub fn boolean() -> BooleanNode {
    BooleanNode
}

pub fn date() -> DateNode {
    DateNode::new()
}

pub fn object_id() -> ObjectIdNode {
    ObjectIdNode
}

pub fn decimal() -> DecimalNode {
    DecimalNode
}

pub fn binary() -> BinaryNode {
    BinaryNode::new()
}

pub fn object() -> ObjectNode {
    ObjectNode::new()
}

pub fn array(element: impl Into<SchemaNode>) -> ArrayNode {
    ArrayNode::new(element.into())
}

pub fn tuple() -> TupleNode {
    TupleNode::new()
}

pub fn union() -> UnionNode {
    UnionNode::new()
}
