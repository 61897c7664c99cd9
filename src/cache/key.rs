//! Cache keys: normalized query arguments and invalidation tags.

use std::collections::BTreeMap;
use std::fmt;

use url::form_urlencoded;

use crate::catalog::Endpoint;

/// A single filter or pagination value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
  Text(String),
  Int(i64),
  List(Vec<i64>),
}

impl ArgValue {
  /// Stringified form, or `None` when the value would be omitted from a request.
  fn normalized(&self) -> Option<String> {
    match self {
      ArgValue::Text(s) if s.is_empty() => None,
      ArgValue::Text(s) => Some(s.clone()),
      ArgValue::Int(n) => Some(n.to_string()),
      ArgValue::List(items) if items.is_empty() => None,
      ArgValue::List(items) => Some(
        items
          .iter()
          .map(|i| i.to_string())
          .collect::<Vec<_>>()
          .join(","),
      ),
    }
  }
}

impl From<&str> for ArgValue {
  fn from(value: &str) -> Self {
    ArgValue::Text(value.to_string())
  }
}

impl From<String> for ArgValue {
  fn from(value: String) -> Self {
    ArgValue::Text(value)
  }
}

impl From<i64> for ArgValue {
  fn from(value: i64) -> Self {
    ArgValue::Int(value)
  }
}

impl From<u32> for ArgValue {
  fn from(value: u32) -> Self {
    ArgValue::Int(i64::from(value))
  }
}

impl From<i32> for ArgValue {
  fn from(value: i32) -> Self {
    ArgValue::Int(i64::from(value))
  }
}

impl From<Vec<i64>> for ArgValue {
  fn from(value: Vec<i64>) -> Self {
    ArgValue::List(value)
  }
}

/// Filter and pagination arguments for one list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
  fields: BTreeMap<String, ArgValue>,
}

impl QueryArgs {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builder-style setter.
  pub fn with(mut self, name: &str, value: impl Into<ArgValue>) -> Self {
    self.set(name, value);
    self
  }

  pub fn set(&mut self, name: &str, value: impl Into<ArgValue>) {
    self.fields.insert(name.to_string(), value.into());
  }

  #[cfg(test)]
  pub fn get(&self, name: &str) -> Option<&ArgValue> {
    self.fields.get(name)
  }

  /// Canonical form used as the cache key and as the request query string.
  pub fn normalize(&self) -> NormalizedArgs {
    NormalizedArgs(
      self
        .fields
        .iter()
        .filter_map(|(name, value)| value.normalized().map(|v| (name.clone(), v)))
        .collect(),
    )
  }
}

/// Sorted `(name, value)` pairs with empty values dropped.
///
/// Two `QueryArgs` are equivalent iff their normalized forms are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedArgs(Vec<(String, String)>);

impl NormalizedArgs {
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Form-encoded query string (no leading `?`).
  pub fn to_query_string(&self) -> String {
    form_urlencoded::Serializer::new(String::new())
      .extend_pairs(self.0.iter())
      .finish()
  }
}

/// What a cache entry was requested for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKey {
  /// `GET {endpoint}/?{args}`
  List(NormalizedArgs),
  /// `GET {endpoint}/{id}/`
  Detail(u64),
}

/// Identity of one cache entry: endpoint plus normalized request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
  pub endpoint: Endpoint,
  pub request: RequestKey,
}

impl CacheKey {
  pub fn list(endpoint: Endpoint, args: &QueryArgs) -> Self {
    Self {
      endpoint,
      request: RequestKey::List(args.normalize()),
    }
  }

  pub fn detail(endpoint: Endpoint, id: u64) -> Self {
    Self {
      endpoint,
      request: RequestKey::Detail(id),
    }
  }
}

impl fmt::Display for CacheKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.request {
      RequestKey::List(args) if args.is_empty() => write!(f, "{}/", self.endpoint),
      RequestKey::List(args) => write!(f, "{}/?{}", self.endpoint, args.to_query_string()),
      RequestKey::Detail(id) => write!(f, "{}/{}/", self.endpoint, id),
    }
  }
}

/// Invalidation tag declared by a query.
///
/// List queries provide `{endpoint}`, detail queries provide `{endpoint, id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheTag {
  pub endpoint: Endpoint,
  pub id: Option<u64>,
}

impl CacheTag {
  /// Tag covering every entry of an endpoint.
  pub fn all(endpoint: Endpoint) -> Self {
    Self { endpoint, id: None }
  }

  /// Tag for a single entity.
  pub fn item(endpoint: Endpoint, id: u64) -> Self {
    Self {
      endpoint,
      id: Some(id),
    }
  }

  /// Whether invalidating `self` hits an entry that provided `provided`.
  ///
  /// A tag without id matches every tag of its endpoint; a tag with an id
  /// only matches that exact id.
  pub fn matches(&self, provided: &CacheTag) -> bool {
    self.endpoint == provided.endpoint && (self.id.is_none() || self.id == provided.id)
  }
}

impl fmt::Display for CacheTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.id {
      Some(id) => write!(f, "{}#{}", self.endpoint, id),
      None => write!(f, "{}", self.endpoint),
    }
  }
}
