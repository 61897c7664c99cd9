use crate::cache::{CacheTag, QueryStatus, Subscription};
use crate::catalog::types::{Page, Tag};
use crate::catalog::{CacheStore, Resource};
use crate::route::Route;
use crate::sync::{FilterChange, FilterState, ListProfile, UrlStateSync};
use crate::ui::components::{KeyResult, PromptEvent, PromptInput, TagPicker, TagPickerEvent};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{error_color, error_hint, truncate};
use crate::ui::rows::ListRow;
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::sync::Arc;
use tracing::debug;

/// Paginated, filterable list of one resource type
pub struct ListView<R: Resource> {
  sync: UrlStateSync,
  page: Subscription<Page<R>>,
  /// Tag names for the filter line and picker (pages with a tag filter only)
  tag_options: Option<Subscription<Page<Tag>>>,
  list_state: ListState,
  search: PromptInput,
  year: PromptInput,
  tag_picker: TagPicker,
  notice: Option<String>,
}

impl<R: Resource + ListRow> ListView<R> {
  /// `tag_profile` is the tags list's own profile, so the picker shares its first page.
  pub fn new(profile: ListProfile, tag_profile: &ListProfile, query: Option<&str>, store: &mut CacheStore) -> Self {
    let sync = UrlStateSync::mount(profile, query);
    let page = store.list::<R>(&sync.state().to_query_args());
    let tag_options = sync
      .profile()
      .tags
      .then(|| store.list::<Tag>(&FilterState::defaults(tag_profile).to_query_args()));

    Self {
      sync,
      page,
      tag_options,
      list_state: ListState::default().with_selected(Some(0)),
      search: PromptInput::new('/', "Search"),
      year: PromptInput::new('y', "Year"),
      tag_picker: TagPicker::new(),
      notice: None,
    }
  }

  pub fn state(&self) -> &FilterState {
    self.sync.state()
  }

  fn resolved_page(&self) -> Option<Arc<Page<R>>> {
    match self.page.status() {
      QueryStatus::Resolved(page) => Some(page),
      _ => None,
    }
  }

  fn tags(&self) -> Vec<Tag> {
    let Some(options) = &self.tag_options else {
      return Vec::new();
    };
    options
      .status()
      .data()
      .map(|page| page.results.clone())
      .unwrap_or_default()
  }

  fn resubscribe(&mut self, store: &mut CacheStore) {
    let args = self.sync.state().to_query_args();
    // Subscribe first so an entry shared by both pages is never idle
    let previous = std::mem::replace(&mut self.page, store.list::<R>(&args));
    store.list_cache::<R>().release(previous);
    self.list_state.select(Some(0));
  }

  fn apply(&mut self, change: FilterChange, store: &mut CacheStore) -> ViewAction {
    self.notice = None;
    match self.sync.apply(change) {
      Some(update) => {
        self.resubscribe(store);
        ViewAction::Update(update)
      }
      None => ViewAction::None,
    }
  }

  fn submit_search(&mut self, text: String, store: &mut CacheStore) -> ViewAction {
    let unchanged = self.state().search.as_deref().unwrap_or("") == text.trim();
    if unchanged {
      // Searching again for the same thing asks for fresh results
      let key = self.page.key().clone();
      store.list_cache::<R>().refetch(&key);
      return ViewAction::None;
    }
    self.apply(FilterChange::Search(text), store)
  }

  fn submit_year(&mut self, text: String, store: &mut CacheStore) -> ViewAction {
    let text = text.trim();
    if text.is_empty() {
      return self.apply(FilterChange::Year(None), store);
    }
    match text.parse::<i32>() {
      Ok(year) if year > 0 => self.apply(FilterChange::Year(Some(year)), store),
      _ => {
        debug!(text, "rejected year input");
        self.notice = Some(format!("'{}' is not a year", text));
        ViewAction::None
      }
    }
  }

  fn handle_prompts(&mut self, key: KeyEvent, store: &mut CacheStore) -> Option<ViewAction> {
    match self.tag_picker.handle_key(key) {
      KeyResult::Event(TagPickerEvent::Toggled(id)) => {
        return Some(self.apply(FilterChange::ToggleTag(id), store));
      }
      KeyResult::Event(TagPickerEvent::Closed) | KeyResult::Handled => {
        return Some(ViewAction::None);
      }
      KeyResult::NotHandled => {}
    }

    if self.sync.profile().search {
      let current = self.state().search.clone().unwrap_or_default();
      match self.search.handle_key(key, &current) {
        KeyResult::Event(PromptEvent::Submitted(text)) => {
          return Some(self.submit_search(text, store));
        }
        KeyResult::Event(PromptEvent::Cancelled) | KeyResult::Handled => {
          return Some(ViewAction::None);
        }
        KeyResult::NotHandled => {}
      }
    }

    if self.sync.profile().year {
      let current = self.state().year.map(|y| y.to_string()).unwrap_or_default();
      match self.year.handle_key(key, &current) {
        KeyResult::Event(PromptEvent::Submitted(text)) => {
          return Some(self.submit_year(text, store));
        }
        KeyResult::Event(PromptEvent::Cancelled) | KeyResult::Handled => {
          return Some(ViewAction::None);
        }
        KeyResult::NotHandled => {}
      }
    }

    None
  }

  fn filter_line(&self) -> Line<'static> {
    let state = self.state();
    let profile = self.sync.profile();
    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::Yellow);
    let mut spans = vec![Span::raw(" ")];

    let mut push = |name: &str, text: String| {
      spans.push(Span::styled(format!("{}: ", name), label));
      spans.push(Span::styled(text, value));
      spans.push(Span::raw("   "));
    };

    if let Some(search) = &state.search {
      push("search", format!("\"{}\"", search));
    }
    if !state.tags.is_empty() {
      let known = self.tags();
      let names: Vec<String> = state
        .tags
        .iter()
        .map(|id| {
          known
            .iter()
            .find(|t| t.id == *id)
            .map_or_else(|| format!("#{}", id), |t| t.name.clone())
        })
        .collect();
      push("tags", names.join(", "));
    }
    if let Some(sort) = profile.ordering_label(state.ordering) {
      push("sort", sort.to_string());
    }
    if let Some(year) = state.year {
      push("year", year.to_string());
    }
    if let Some(notice) = &self.notice {
      spans.push(Span::styled(notice.clone(), Style::default().fg(Color::Red)));
    }

    Line::from(spans)
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let endpoint = R::ENDPOINT;
    let state = self.state().clone();
    let snapshot = self.page.mark_seen();

    let title = match &snapshot.status {
      QueryStatus::Pending => format!(" {} (loading...) ", endpoint.title()),
      QueryStatus::Rejected(_) => format!(" {} (error) ", endpoint.title()),
      QueryStatus::Resolved(page) => format!(
        " {} ({}) page {}/{} ",
        endpoint.title(),
        page.count,
        state.page,
        page.total_pages(state.page_size)
      ),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let message = |text: String, color: Color| Paragraph::new(text).style(Style::default().fg(color));

    let page = match &snapshot.status {
      QueryStatus::Pending => {
        frame.render_widget(message("Loading...".to_string(), Color::DarkGray).block(block), area);
        return;
      }
      QueryStatus::Rejected(error) => {
        let text = format!("{}\n\n{}", error, error_hint(error.kind));
        frame.render_widget(message(text, error_color(error.kind)).block(block), area);
        return;
      }
      QueryStatus::Resolved(page) => Arc::clone(page),
    };

    if page.is_empty() {
      let text = if state.is_filtered(self.sync.profile()) {
        "No results. Press 'c' to clear filters."
      } else if state.page > 1 {
        "No results on this page. Press 'p' to go back a page."
      } else {
        "Nothing here yet."
      };
      frame.render_widget(message(text.to_string(), Color::DarkGray).block(block), area);
      return;
    }

    ensure_valid_selection(&mut self.list_state, page.results.len());

    let width = area.width.saturating_sub(6) as usize;
    let primary_width = (width * 3 / 5).max(10);
    let items: Vec<ListItem> = page
      .results
      .iter()
      .map(|item| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<6}", item.id()),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(format!(
            "{:<w$}",
            truncate(&item.primary(), primary_width),
            w = primary_width
          )),
          Span::raw(" "),
          Span::styled(
            truncate(&item.secondary(), width.saturating_sub(primary_width + 7)),
            Style::default().fg(Color::Cyan),
          ),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl<R: Resource + ListRow> View for ListView<R> {
  fn route(&self) -> Route {
    Route::List(R::ENDPOINT)
  }

  fn handle_key(&mut self, key: KeyEvent, store: &mut CacheStore) -> ViewAction {
    if let Some(action) = self.handle_prompts(key, store) {
      return action;
    }

    let profile = self.sync.profile().clone();
    let current_page = self.state().page;

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('n') | KeyCode::Right => {
        let last = self
          .resolved_page()
          .map(|page| page.total_pages(self.state().page_size));
        if last.is_some_and(|last| current_page < last) {
          return self.apply(FilterChange::Page(current_page + 1), store);
        }
      }
      KeyCode::Char('p') | KeyCode::Left if current_page > 1 => {
        return self.apply(FilterChange::Page(current_page - 1), store);
      }
      KeyCode::Char('o') if !profile.orderings.is_empty() => {
        return self.apply(FilterChange::CycleOrdering, store);
      }
      KeyCode::Char('t') if profile.tags => {
        self.tag_picker.show(self.tags());
      }
      KeyCode::Char('c') => return self.apply(FilterChange::Clear, store),
      KeyCode::Char('r') => {
        // A failed page retries alone; otherwise every list of this endpoint is stale
        let key = self.page.key().clone();
        if !store.list_cache::<R>().retry(&key) {
          store.invalidate(&CacheTag::all(R::ENDPOINT));
        }
      }
      KeyCode::Enter => {
        let selected = self.list_state.selected().unwrap_or(0);
        let id = self
          .resolved_page()
          .and_then(|page| page.results.get(selected).map(|item| item.id()));
        if let Some(id) = id {
          return ViewAction::Open(Route::Detail(R::ENDPOINT, id));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Back,
      _ => {}
    }
    ViewAction::None
  }

  fn navigated(&mut self, query: Option<&str>, store: &mut CacheStore) {
    if self.sync.navigated(query) {
      self.resubscribe(store);
    }
  }

  fn unmount(self: Box<Self>, store: &mut CacheStore) {
    let this = *self;
    store.list_cache::<R>().release(this.page);
    if let Some(tags) = this.tag_options {
      store.list_cache::<Tag>().release(tags);
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(1), Constraint::Min(1)])
      .split(area);

    frame.render_widget(Paragraph::new(self.filter_line()), chunks[0]);
    self.render_list(frame, chunks[1]);

    self.search.render_overlay(frame, chunks[1]);
    self.year.render_overlay(frame, chunks[1]);
    let chosen = self.state().tags.clone();
    self.tag_picker.render_overlay(frame, chunks[1], &chosen);
  }

  fn breadcrumb_label(&self) -> String {
    match self.state().page {
      1 => R::ENDPOINT.title().to_string(),
      page => format!("{} (page {})", R::ENDPOINT.title(), page),
    }
  }

  fn is_capturing_input(&self) -> bool {
    self.search.is_active() || self.year.is_active() || self.tag_picker.is_active()
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    let profile = self.sync.profile();
    let mut shortcuts = vec![Shortcut::new(":", "command")];
    if profile.search {
      shortcuts.push(Shortcut::new("/", "search"));
    }
    if profile.tags {
      shortcuts.push(Shortcut::new("t", "tags"));
    }
    if profile.year {
      shortcuts.push(Shortcut::new("y", "year"));
    }
    if !profile.orderings.is_empty() {
      shortcuts.push(Shortcut::new("o", "sort"));
    }
    shortcuts.extend([
      Shortcut::new("n/p", "page"),
      Shortcut::new("c", "clear"),
      Shortcut::new("r", "refresh"),
      Shortcut::new("q", "back"),
    ]);
    shortcuts
  }
}
