use tracing::debug;

use super::filter::FilterState;
use super::profile::ListProfile;

/// A user interaction that changes list state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChange {
  Search(String),
  ToggleTag(u64),
  CycleOrdering,
  Year(Option<i32>),
  Page(u32),
  Clear,
}

/// How a new address is recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
  Push,
  Replace,
}

/// Address bar update produced by a state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlUpdate {
  /// Serialized state, without the leading `?`
  pub query: String,
  pub mode: HistoryMode,
}

/// Keeps a list page's [`FilterState`] and its address in step.
///
/// All changes go through here: interactions via [`Self::apply`], which
/// returns the address update to record, and back/forward navigation via
/// [`Self::navigated`], which re-reads the state from the address.
#[derive(Debug, Clone)]
pub struct UrlStateSync {
  profile: ListProfile,
  state: FilterState,
}

impl UrlStateSync {
  /// Read the initial state from the page's current query string.
  pub fn mount(profile: ListProfile, query: Option<&str>) -> Self {
    let state = FilterState::parse(&profile, query.unwrap_or_default());
    Self { profile, state }
  }

  pub fn profile(&self) -> &ListProfile {
    &self.profile
  }

  pub fn state(&self) -> &FilterState {
    &self.state
  }

  pub fn query_string(&self) -> String {
    self.state.serialize(&self.profile)
  }

  /// Apply an interaction.
  ///
  /// Returns `None` when the state did not change. Page changes are
  /// pushed onto history, everything else replaces the current entry.
  /// Filter changes go back to the first page.
  pub fn apply(&mut self, change: FilterChange) -> Option<UrlUpdate> {
    let mut next = self.state.clone();
    let mode = match &change {
      FilterChange::Page(_) => HistoryMode::Push,
      _ => HistoryMode::Replace,
    };

    match change {
      FilterChange::Search(text) => {
        let text = text.trim();
        next.search = (!text.is_empty()).then(|| text.to_string());
        next.page = 1;
      }
      FilterChange::ToggleTag(id) if self.profile.tags => {
        if !next.tags.remove(&id) {
          next.tags.insert(id);
        }
        next.page = 1;
      }
      FilterChange::CycleOrdering => {
        next.ordering = self.profile.next_ordering(next.ordering).or(next.ordering);
        next.page = 1;
      }
      FilterChange::Year(year) if self.profile.year => {
        next.year = year.filter(|y| *y > 0);
        next.page = 1;
      }
      FilterChange::Page(page) => {
        next.page = page.max(1);
      }
      FilterChange::Clear => {
        next = FilterState {
          page_size: next.page_size,
          ..FilterState::defaults(&self.profile)
        };
      }
      other => {
        debug!(change = ?other, endpoint = %self.profile.endpoint, "change not recognized by page");
        return None;
      }
    }

    if next == self.state {
      return None;
    }
    self.state = next;

    Some(UrlUpdate {
      query: self.query_string(),
      mode,
    })
  }

  /// Re-read the state after the address changed underneath the page.
  ///
  /// Returns whether the state changed.
  pub fn navigated(&mut self, query: Option<&str>) -> bool {
    let next = FilterState::parse(&self.profile, query.unwrap_or_default());
    if next == self.state {
      return false;
    }
    self.state = next;
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Endpoint;

  fn videos(query: &str) -> UrlStateSync {
    UrlStateSync::mount(ListProfile::for_endpoint(Endpoint::Videos), Some(query))
  }

  #[test]
  fn test_mount_reads_address() {
    let sync = videos("page=3&ordering=title");
    assert_eq!(sync.state().page, 3);
    assert_eq!(sync.state().ordering, Some("title"));
    assert_eq!(sync.query_string(), "ordering=title&page=3");
  }

  #[test]
  fn test_filter_change_replaces_and_resets_page() {
    let mut sync = videos("page=3");
    let update = sync.apply(FilterChange::Search("  miku ".to_string())).unwrap();
    assert_eq!(
      update,
      UrlUpdate {
        query: "search=miku".to_string(),
        mode: HistoryMode::Replace,
      }
    );
    assert_eq!(sync.state().page, 1);
  }

  #[test]
  fn test_page_change_pushes() {
    let mut sync = videos("search=miku");
    let update = sync.apply(FilterChange::Page(2)).unwrap();
    assert_eq!(update.mode, HistoryMode::Push);
    assert_eq!(update.query, "page=2&search=miku");
  }

  #[test]
  fn test_unchanged_state_produces_no_update() {
    let mut sync = videos("");
    assert_eq!(sync.apply(FilterChange::Page(1)), None);
    assert_eq!(sync.apply(FilterChange::Search(String::new())), None);
    assert_eq!(sync.apply(FilterChange::Year(None)), None);
  }

  #[test]
  fn test_toggle_tag() {
    let mut sync = videos("");
    sync.apply(FilterChange::ToggleTag(4));
    let update = sync.apply(FilterChange::ToggleTag(2)).unwrap();
    assert_eq!(update.query, "tags=2,4");

    let update = sync.apply(FilterChange::ToggleTag(4)).unwrap();
    assert_eq!(update.query, "tags=2");
  }

  #[test]
  fn test_cycle_ordering() {
    let mut sync = videos("");
    let update = sync.apply(FilterChange::CycleOrdering).unwrap();
    assert_eq!(update.query, "ordering=-view_count");

    let mut groups = UrlStateSync::mount(ListProfile::for_endpoint(Endpoint::Groups), None);
    assert_eq!(groups.apply(FilterChange::CycleOrdering), None);
  }

  #[test]
  fn test_fields_outside_profile_are_rejected() {
    let mut groups = UrlStateSync::mount(ListProfile::for_endpoint(Endpoint::Groups), None);
    assert_eq!(groups.apply(FilterChange::ToggleTag(1)), None);
    assert_eq!(groups.apply(FilterChange::Year(Some(2023))), None);
  }

  #[test]
  fn test_clear_keeps_page_size() {
    let mut sync = videos("page_size=40&search=x&year=2021&page=3");
    let update = sync.apply(FilterChange::Clear).unwrap();
    assert_eq!(update.query, "page_size=40");
    assert_eq!(update.mode, HistoryMode::Replace);
  }

  #[test]
  fn test_navigated_reparses() {
    let mut sync = videos("page=2");
    assert!(sync.navigated(Some("page=1")));
    assert_eq!(sync.state().page, 1);
    assert!(!sync.navigated(None));
  }
}
