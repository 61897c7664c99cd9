//! Two-way mapping between list page state and the address bar.

mod filter;
mod history;
mod profile;
mod synchronizer;

pub use filter::FilterState;
pub use history::History;
#[cfg(test)]
pub use synchronizer::HistoryMode;
pub use profile::ListProfile;
pub use synchronizer::{FilterChange, UrlStateSync, UrlUpdate};
