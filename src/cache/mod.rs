//! Read-through query cache shared by every page.
//!
//! This module provides an endpoint-keyed caching mechanism that:
//! - Keys entries by endpoint plus normalized query arguments
//! - De-duplicates concurrent identical requests
//! - Notifies subscribers of `Pending -> Resolved | Rejected` transitions
//! - Refetches or drops entries when a matching tag is invalidated
//! - Evicts entries nobody has subscribed to for a while

mod key;
mod layer;
mod state;

#[cfg(test)]
pub use key::ArgValue;
pub use key::{CacheKey, CacheTag, NormalizedArgs, QueryArgs};
pub use layer::{CacheOptions, QueryCache, Subscription};
pub use state::{ErrorInfo, ErrorKind, QueryStatus};
