use super::input::{InputResult, TextInput};
use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

/// Events emitted by a prompt that the parent view acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEvent {
  /// Enter pressed with this value
  Submitted(String),
  /// Escape pressed, nothing changes
  Cancelled,
}

/// One-line prompt overlay opened by a key (`/` for search, `y` for year)
#[derive(Debug, Clone)]
pub struct PromptInput {
  input: TextInput,
  active: bool,
  trigger: char,
  title: &'static str,
}

impl PromptInput {
  pub fn new(trigger: char, title: &'static str) -> Self {
    Self {
      input: TextInput::new(),
      active: false,
      trigger,
      title,
    }
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  #[cfg(test)]
  pub fn value(&self) -> &str {
    self.input.value()
  }

  /// Open the prompt pre-filled with the current value
  pub fn activate(&mut self, current: &str) {
    self.active = true;
    self.input.set_value(current);
  }

  /// Handle a key event.
  ///
  /// When inactive only the trigger key is consumed; the caller supplies
  /// the value to pre-fill with.
  pub fn handle_key(&mut self, key: KeyEvent, current: &str) -> KeyResult<PromptEvent> {
    if !self.active {
      if key.code == KeyCode::Char(self.trigger) {
        self.activate(current);
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(value) => {
        self.active = false;
        KeyResult::Event(PromptEvent::Submitted(value))
      }
      InputResult::Cancelled => {
        self.active = false;
        self.input.clear();
        KeyResult::Event(PromptEvent::Cancelled)
      }
      // Swallow everything else so view shortcuts don't fire mid-typing
      InputResult::Consumed | InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, 3.min(area.height));

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let input_line = Line::from(vec![
      Span::styled(self.trigger.to_string(), Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
    ]);
    frame.render_widget(Paragraph::new(input_line), inner);
  }
}
