use super::KeyResult;
use crate::catalog::types::Tag;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};
use std::collections::BTreeSet;

/// Events emitted by the tag picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagPickerEvent {
  /// Tag toggled on or off (tag id)
  Toggled(u64),
  Closed,
}

/// Multi-select overlay for the tag filter.
///
/// The picker does not own the selection; the list page's filter state
/// does, and is passed in when rendering.
#[derive(Debug, Clone, Default)]
pub struct TagPicker {
  active: bool,
  tags: Vec<Tag>,
  selected: usize,
}

impl TagPicker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker with the given tags
  pub fn show(&mut self, tags: Vec<Tag>) {
    self.active = true;
    self.tags = tags;
    self.selected = 0;
  }

  pub fn hide(&mut self) {
    self.active = false;
    self.tags.clear();
    self.selected = 0;
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<TagPickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('t') => {
        self.hide();
        KeyResult::Event(TagPickerEvent::Closed)
      }
      KeyCode::Enter | KeyCode::Char(' ') => match self.tags.get(self.selected) {
        Some(tag) => KeyResult::Event(TagPickerEvent::Toggled(tag.id)),
        None => KeyResult::Handled,
      },
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.tags.is_empty() {
          self.selected = (self.selected + 1) % self.tags.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.tags.is_empty() {
          self.selected = (self.selected + self.tags.len() - 1) % self.tags.len();
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect, chosen: &BTreeSet<u64>) {
    if !self.active {
      return;
    }

    let max_name_len = self
      .tags
      .iter()
      .map(|t| t.name.chars().count())
      .max()
      .unwrap_or(10);
    let width = (max_name_len as u16 + 10)
      .max(24)
      .min(area.width.saturating_sub(4));
    let height = (self.tags.len() as u16 + 2)
      .max(3)
      .min(area.height.saturating_sub(2));

    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" Tags ({} selected) ", chosen.len()));

    if self.tags.is_empty() {
      frame.render_widget(block.title_bottom(" no tags "), overlay_area);
      return;
    }

    let items: Vec<ListItem> = self
      .tags
      .iter()
      .map(|tag| {
        let mark = if chosen.contains(&tag.id) { "[x] " } else { "[ ] " };
        let mut spans = vec![
          Span::styled(mark, Style::default().fg(Color::Yellow)),
          Span::styled(tag.name.clone(), Style::default().fg(Color::Cyan)),
        ];
        if let Some(category) = &tag.category {
          spans.push(Span::styled(
            format!("  {}", category),
            Style::default().fg(Color::DarkGray),
          ));
        }
        ListItem::new(Line::from(spans))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, overlay_area, &mut state);
  }
}
