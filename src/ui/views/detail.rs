use crate::cache::{CacheTag, QueryStatus, Subscription};
use crate::catalog::{CacheStore, Resource};
use crate::route::Route;
use crate::ui::renderfns::{error_color, error_hint};
use crate::ui::rows::DetailFields;
use crate::ui::view::{Shortcut, View, ViewAction};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Single entity page, keyed by id
pub struct DetailView<R: Resource> {
  id: u64,
  entity: Subscription<R::Detail>,
  scroll: u16,
}

impl<R: Resource> DetailView<R>
where
  R::Detail: DetailFields,
{
  pub fn new(id: u64, store: &mut CacheStore) -> Self {
    Self {
      id,
      entity: store.detail::<R>(id),
      scroll: 0,
    }
  }

  fn lines(detail: &R::Detail) -> Vec<Line<'static>> {
    let fields = detail.fields();
    let label_width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 2;

    let mut lines: Vec<Line> = fields
      .into_iter()
      .map(|(label, value)| {
        Line::from(vec![
          Span::styled(
            format!("{:<w$}", format!("{}:", label), w = label_width),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw(value),
        ])
      })
      .collect();

    if let Some(description) = detail.description().filter(|d| !d.trim().is_empty()) {
      lines.push(Line::raw(""));
      lines.extend(description.lines().map(|l| Line::raw(l.to_string())));
    }
    lines
  }
}

impl<R: Resource> View for DetailView<R>
where
  R::Detail: DetailFields,
{
  fn route(&self) -> Route {
    Route::Detail(R::ENDPOINT, self.id)
  }

  fn handle_key(&mut self, key: KeyEvent, store: &mut CacheStore) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
      }
      KeyCode::Char('r') => {
        let key = self.entity.key().clone();
        if !store.detail_cache::<R>().retry(&key) {
          store.invalidate(&CacheTag::item(R::ENDPOINT, self.id));
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Back,
      _ => {}
    }
    ViewAction::None
  }

  fn unmount(self: Box<Self>, store: &mut CacheStore) {
    store.detail_cache::<R>().release(self.entity);
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let snapshot = self.entity.mark_seen();
    let fetched = snapshot
      .settled_at
      .map(|at| format!(" fetched {} ", at.with_timezone(&Local).format("%H:%M:%S")))
      .unwrap_or_default();

    let (title, body) = match &snapshot.status {
      QueryStatus::Pending => (
        format!(" {} #{} (loading...) ", R::ENDPOINT.title(), self.id),
        Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray)),
      ),
      QueryStatus::Rejected(error) => (
        format!(" {} #{} ", R::ENDPOINT.title(), self.id),
        Paragraph::new(format!("{}\n\n{}", error, error_hint(error.kind)))
          .style(Style::default().fg(error_color(error.kind))),
      ),
      QueryStatus::Resolved(detail) => (
        format!(" {} ", detail.heading()),
        Paragraph::new(Self::lines(detail))
          .wrap(Wrap { trim: false })
          .scroll((self.scroll, 0)),
      ),
    };

    let block = Block::default()
      .title(title)
      .title_bottom(Line::from(fetched).right_aligned())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    frame.render_widget(body.block(block), area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("#{}", self.id)
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new(":", "command"),
      Shortcut::new("j/k", "scroll"),
      Shortcut::new("r", "refresh"),
      Shortcut::new("q", "back"),
    ]
  }
}
