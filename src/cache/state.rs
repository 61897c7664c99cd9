//! Entry states and the error type shared by subscribers.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use super::key::CacheKey;

/// Classification of a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// 404 on a detail fetch
  NotFound,
  /// Non-2xx response with a body, or an undecodable body
  ServerError,
  /// Transport failure, no response
  NetworkError,
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      ErrorKind::NotFound => "not found",
      ErrorKind::ServerError => "server error",
      ErrorKind::NetworkError => "network error",
    };
    f.write_str(label)
  }
}

/// Why an entry was rejected. Cloned to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ErrorInfo {
  pub kind: ErrorKind,
  pub message: String,
}

impl ErrorInfo {
  pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
    Self {
      kind,
      message: message.into(),
    }
  }

  pub fn not_found(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::NotFound, message)
  }

  pub fn server(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::ServerError, message)
  }

  pub fn network(message: impl Into<String>) -> Self {
    Self::new(ErrorKind::NetworkError, message)
  }
}

/// The state of a cache entry.
///
/// Transitions are strictly `Pending -> Resolved | Rejected`; a refetch
/// starts again from `Pending`.
#[derive(Debug)]
pub enum QueryStatus<V> {
  /// A fetch is in flight
  Pending,
  /// The latest fetch succeeded
  Resolved(Arc<V>),
  /// The latest fetch failed
  Rejected(ErrorInfo),
}

impl<V> Clone for QueryStatus<V> {
  fn clone(&self) -> Self {
    match self {
      QueryStatus::Pending => QueryStatus::Pending,
      QueryStatus::Resolved(value) => QueryStatus::Resolved(Arc::clone(value)),
      QueryStatus::Rejected(error) => QueryStatus::Rejected(error.clone()),
    }
  }
}

impl<V> QueryStatus<V> {
  pub fn is_pending(&self) -> bool {
    matches!(self, QueryStatus::Pending)
  }

  #[cfg(test)]
  pub fn is_resolved(&self) -> bool {
    matches!(self, QueryStatus::Resolved(_))
  }

  pub fn is_rejected(&self) -> bool {
    matches!(self, QueryStatus::Rejected(_))
  }

  pub fn data(&self) -> Option<&V> {
    match self {
      QueryStatus::Resolved(value) => Some(value.as_ref()),
      _ => None,
    }
  }

  #[cfg(test)]
  pub fn error(&self) -> Option<&ErrorInfo> {
    match self {
      QueryStatus::Rejected(error) => Some(error),
      _ => None,
    }
  }
}

/// Immutable view of an entry, as delivered to subscribers.
#[derive(Debug)]
pub struct EntrySnapshot<V> {
  pub key: CacheKey,
  pub status: QueryStatus<V>,
  /// When the entry last left `Pending`
  pub settled_at: Option<DateTime<Utc>>,
}

impl<V> Clone for EntrySnapshot<V> {
  fn clone(&self) -> Self {
    Self {
      key: self.key.clone(),
      status: self.status.clone(),
      settled_at: self.settled_at,
    }
  }
}

impl<V> EntrySnapshot<V> {
  pub fn pending(key: CacheKey) -> Self {
    Self {
      key,
      status: QueryStatus::Pending,
      settled_at: None,
    }
  }

  pub fn settled(key: CacheKey, result: Result<V, ErrorInfo>) -> Self {
    let status = match result {
      Ok(value) => QueryStatus::Resolved(Arc::new(value)),
      Err(error) => QueryStatus::Rejected(error),
    };
    Self {
      key,
      status,
      settled_at: Some(Utc::now()),
    }
  }
}
