//! Catalog REST API: endpoints, response types and the cache store.

mod client;
mod endpoint;
#[cfg(test)]
pub(crate) mod fixture;
mod resource;
mod store;
pub mod types;

pub use client::CatalogClient;
pub use endpoint::Endpoint;
pub use resource::Resource;
pub use store::CacheStore;
#[cfg(test)]
pub(crate) use store::tests as store_tests;
