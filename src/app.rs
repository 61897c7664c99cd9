use crate::catalog::{CacheStore, CatalogClient, Endpoint};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::route::{resolve_location, Route};
use crate::sync::History;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Main application state
pub struct App {
  config: Config,
  /// Address-bar root every route is resolved against
  base: Url,
  history: History,
  /// Page mounted for `history.current()`
  view: Box<dyn View>,
  store: CacheStore,
  command: CommandInput,
  /// One-line message shown in the footer until the next navigation
  status: Option<String>,
  should_quit: bool,
}

impl App {
  /// Build the app and mount the page for `location` (the videos list if none).
  pub fn new(config: &Config, location: Option<&str>) -> Result<Self> {
    let client = CatalogClient::new(&config.api)?;
    let mut store = CacheStore::new(client, config.cache_options());
    let base = config.web_base()?;

    let videos = Route::List(Endpoint::Videos);
    let mut status = None;
    let requested = match location {
      Some(location) => match resolve_location(&base, location) {
        Ok(url) if Route::parse(&base, &url).is_some() => url,
        Ok(url) => {
          status = Some(format!("No page at {}", url));
          videos.to_url(&base)
        }
        Err(e) => {
          status = Some(format!("Invalid address '{}': {}", location, e));
          videos.to_url(&base)
        }
      },
      None => videos.to_url(&base),
    };

    let (initial, route) = match Route::parse(&base, &requested) {
      Some(Route::Home) | None => (redirect_home(&base, &requested), videos),
      Some(route) => (requested, route),
    };
    info!(url = %initial, "starting");

    let view = views::mount(route, initial.query(), config, &mut store);
    Ok(Self {
      config: config.clone(),
      base,
      history: History::new(initial),
      view,
      store,
      command: CommandInput::new(),
      status,
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut events = EventHandler::new(Duration::from_millis(100));

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Resize | Event::Tick => {}
    }
    let applied = self.store.poll();
    if applied > 0 {
      debug!(applied, "applied fetch results");
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Prompts inside the view get ':' as text
    if !self.view.is_capturing_input() {
      match self.command.handle_key(key) {
        KeyResult::Handled | KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::Event(CommandEvent::Submitted { name, arg }) => {
          self.run_command(&name, &arg);
          return;
        }
        KeyResult::NotHandled => {}
      }
    }

    let action = self.view.handle_key(key, &mut self.store);
    self.perform(action);
  }

  fn run_command(&mut self, name: &str, arg: &str) {
    if let Some(endpoint) = Endpoint::from_key(name) {
      self.perform(ViewAction::Open(Route::List(endpoint)));
      return;
    }

    match name {
      "open" => self.open_location(arg),
      "back" => self.go_back(),
      "forward" => {
        if self.history.forward().is_some() {
          self.show_current();
        } else {
          self.status = Some("Nothing to go forward to".to_string());
        }
      }
      "quit" => self.should_quit = true,
      "" => {}
      other => self.status = Some(format!("Unknown command: {}", other)),
    }
  }

  fn open_location(&mut self, input: &str) {
    if input.trim().is_empty() {
      self.status = Some("Usage: open <address>".to_string());
      return;
    }
    match resolve_location(&self.base, input) {
      Ok(url) if Route::parse(&self.base, &url).is_none() => {
        self.status = Some(format!("No page at {}", url));
      }
      Ok(url) => {
        if self.history.push(url) {
          self.show_current();
        }
      }
      Err(e) => self.status = Some(format!("Invalid address '{}': {}", input, e)),
    }
  }

  fn perform(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Open(route) => {
        if self.history.push(route.to_url(&self.base)) {
          self.show_current();
        }
      }
      ViewAction::Update(update) => {
        debug!(query = %update.query, mode = ?update.mode, "address updated");
        self.history.apply(&update);
      }
      ViewAction::Back => {
        if self.history.can_go_back() {
          self.go_back();
        } else {
          self.should_quit = true;
        }
      }
    }
  }

  fn go_back(&mut self) {
    if self.history.back().is_some() {
      self.show_current();
    } else {
      self.status = Some("Nothing to go back to".to_string());
    }
  }

  /// Bring the mounted view in line with the current history entry.
  fn show_current(&mut self) {
    self.status = None;
    let url = self.history.current().clone();

    let route = match Route::parse(&self.base, &url) {
      Some(Route::Home) => {
        self.history.replace(redirect_home(&self.base, &url));
        Route::List(Endpoint::Videos)
      }
      Some(route) => route,
      None => {
        warn!(%url, "no page for address");
        self.status = Some(format!("No page at {}", url));
        return;
      }
    };
    let query = self.history.current().query().map(str::to_string);

    if route == self.view.route() {
      self.view.navigated(query.as_deref(), &mut self.store);
    } else {
      info!(path = %route.path(), "mounting page");
      let next = views::mount(route, query.as_deref(), &self.config, &mut self.store);
      std::mem::replace(&mut self.view, next).unmount(&mut self.store);
    }
  }

  fn breadcrumb(&self) -> Vec<String> {
    match self.view.route() {
      Route::Detail(endpoint, _) => vec![
        endpoint.title().to_string(),
        self.view.breadcrumb_label(),
      ],
      _ => vec![self.view.breadcrumb_label()],
    }
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(2), // Header
        Constraint::Min(1),    // Page
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let shortcuts = self.view.shortcuts();
    draw_header(
      frame,
      chunks[0],
      self.store.client().base_url(),
      self.history.current(),
      &shortcuts,
    );
    self.view.render(frame, chunks[1]);

    let breadcrumb = self.breadcrumb();
    let in_flight = self.store.in_flight();
    draw_footer(frame, chunks[2], &breadcrumb, in_flight, self.status.as_deref());

    self.command.render_overlay(frame, chunks[1]);
  }
}

/// The videos list address carrying `url`'s query string.
fn redirect_home(base: &Url, url: &Url) -> Url {
  let mut target = Route::List(Endpoint::Videos).to_url(base);
  target.set_query(url.query().filter(|q| !q.is_empty()));
  target
}

#[cfg(test)]
impl App {
  fn should_quit(&self) -> bool {
    self.should_quit
  }

  fn current_url(&self) -> &Url {
    self.history.current()
  }

  fn route(&self) -> Route {
    self.view.route()
  }

  fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }
}
