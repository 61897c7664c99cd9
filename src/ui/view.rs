use crate::catalog::CacheStore;
use crate::route::Route;
use crate::sync::UrlUpdate;
use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
  pub key: &'static str,
  pub label: &'static str,
}

impl Shortcut {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
  None,
  /// Navigate to another page (pushes history)
  Open(Route),
  /// The page's own state changed; record the new query string
  Update(UrlUpdate),
  /// Go back in history
  Back,
}

/// A page bound to one route.
///
/// Views subscribe to the [`CacheStore`] while mounted and hand their
/// subscriptions back in [`View::unmount`]. Address changes that stay on the same
/// route (back/forward between pages of a list) are delivered through
/// [`View::navigated`] instead of a fresh mount.
pub trait View {
  fn route(&self) -> Route;

  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent, store: &mut CacheStore) -> ViewAction;

  /// The address's query string changed underneath the view
  fn navigated(&mut self, _query: Option<&str>, _store: &mut CacheStore) {}

  /// The page is being replaced; release its subscriptions
  fn unmount(self: Box<Self>, _store: &mut CacheStore) {}

  fn render(&mut self, frame: &mut Frame, area: Rect);

  fn breadcrumb_label(&self) -> String;

  /// True while a prompt or picker owns the keyboard
  fn is_capturing_input(&self) -> bool {
    false
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command"),
      Shortcut::new("r", "refresh"),
      Shortcut::new("q", "back"),
    ]
  }
}
