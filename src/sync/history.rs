use tracing::trace;
use url::Url;

use super::synchronizer::{HistoryMode, UrlUpdate};

/// Oldest entries are dropped beyond this many
const MAX_ENTRIES: usize = 100;

/// Browser-style session history of addresses.
#[derive(Debug, Clone)]
pub struct History {
  entries: Vec<Url>,
  index: usize,
}

impl History {
  pub fn new(initial: Url) -> Self {
    Self {
      entries: vec![initial],
      index: 0,
    }
  }

  pub fn current(&self) -> &Url {
    &self.entries[self.index]
  }

  /// Add `url` after the current entry, discarding any forward entries.
  ///
  /// Returns false if `url` is already current.
  pub fn push(&mut self, url: Url) -> bool {
    if *self.current() == url {
      return false;
    }
    trace!(%url, "history push");
    self.entries.truncate(self.index + 1);
    self.entries.push(url);
    if self.entries.len() > MAX_ENTRIES {
      self.entries.remove(0);
    }
    self.index = self.entries.len() - 1;
    true
  }

  pub fn replace(&mut self, url: Url) {
    trace!(%url, "history replace");
    self.entries[self.index] = url;
  }

  pub fn back(&mut self) -> Option<&Url> {
    if !self.can_go_back() {
      return None;
    }
    self.index -= 1;
    Some(self.current())
  }

  pub fn forward(&mut self) -> Option<&Url> {
    if !self.can_go_forward() {
      return None;
    }
    self.index += 1;
    Some(self.current())
  }

  pub fn can_go_back(&self) -> bool {
    self.index > 0
  }

  pub fn can_go_forward(&self) -> bool {
    self.index + 1 < self.entries.len()
  }

  /// Record a query string change of the current page.
  pub fn apply(&mut self, update: &UrlUpdate) {
    let mut url = self.current().clone();
    url.set_query(Some(update.query.as_str()).filter(|q| !q.is_empty()));
    match update.mode {
      HistoryMode::Push => {
        self.push(url);
      }
      HistoryMode::Replace => self.replace(url),
    }
  }
}
