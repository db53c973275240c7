// scope.rs - Scopes narrowed by `limit` and inference of their resource type.
//
// A scope is one of a closed set of shapes. `resolve_resource()` applies the
// inference rules in order, first match wins:
//
// 1. Type(t)                     → t
// 2. List(items)                 → resolve_resource(items[0]); empty → InvalidScope
// 3. Query with declared schema  → schema
// 4. Record                      → its type tag
// 5. anything else               → InvalidScope

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DispatchError;

/// The type of entity a scope contains.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A struct-like value that carries its own type tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "type")]
    pub type_tag: ResourceType,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(type_tag: impl Into<ResourceType>) -> Self {
        Self {
            type_tag: type_tag.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// An equality condition on a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

/// A query-builder value: a source table, optionally backed by a declared schema.
///
/// Queries built from a bare table name have no schema, so their resource
/// type cannot be inferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub table: String,
    #[serde(default)]
    pub schema: Option<ResourceType>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Query {
    /// A query over `table` whose rows are `schema` entities.
    pub fn for_schema(schema: impl Into<ResourceType>, table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: Some(schema.into()),
            filters: Vec::new(),
            limit: None,
        }
    }

    /// A schemaless query straight against a table.
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            schema: None,
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Add an equality filter.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn limit(mut self, rows: usize) -> Self {
        self.limit = Some(rows);
        self
    }
}

/// What `limit` narrows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Scope {
    /// A bare type identifier.
    Type(ResourceType),
    /// An ordered sequence of scopes (usually records).
    List(Vec<Scope>),
    /// A query-builder value.
    Query(Query),
    /// A single tagged record.
    Record(Record),
    /// Any other value; its resource type cannot be inferred.
    Value(Value),
}

impl Scope {
    /// Keep only the records matching `keep`. Non-list scopes are returned as is.
    pub fn retain_records(self, mut keep: impl FnMut(&Record) -> bool) -> Scope {
        match self {
            Scope::List(items) => Scope::List(
                items
                    .into_iter()
                    .filter(|item| match item {
                        Scope::Record(record) => keep(record),
                        _ => true,
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    fn describe(&self) -> String {
        match self {
            Scope::Type(t) => format!("type {t}"),
            Scope::List(items) if items.is_empty() => "an empty list".to_string(),
            Scope::List(_) => "a list".to_string(),
            Scope::Query(q) => format!("a query on '{}' without a declared schema", q.table),
            Scope::Record(r) => format!("a {} record", r.type_tag),
            Scope::Value(v) => format!("the value {v}"),
        }
    }
}

impl From<ResourceType> for Scope {
    fn from(resource: ResourceType) -> Self {
        Scope::Type(resource)
    }
}

impl From<Query> for Scope {
    fn from(query: Query) -> Self {
        Scope::Query(query)
    }
}

impl From<Record> for Scope {
    fn from(record: Record) -> Self {
        Scope::Record(record)
    }
}

impl From<Vec<Record>> for Scope {
    fn from(records: Vec<Record>) -> Self {
        Scope::List(records.into_iter().map(Scope::Record).collect())
    }
}

/// Infer the resource type contained in `scope`.
pub fn resolve_resource(scope: &Scope) -> Result<ResourceType, DispatchError> {
    match scope {
        Scope::Type(resource) => Ok(resource.clone()),
        Scope::List(items) => match items.first() {
            Some(head) => resolve_resource(head),
            None => Err(invalid(scope)),
        },
        Scope::Query(Query {
            schema: Some(schema),
            ..
        }) => Ok(schema.clone()),
        Scope::Record(record) => Ok(record.type_tag.clone()),
        Scope::Query(_) | Scope::Value(_) => Err(invalid(scope)),
    }
}

fn invalid(scope: &Scope) -> DispatchError {
    DispatchError::InvalidScope {
        scope: scope.describe(),
    }
}
