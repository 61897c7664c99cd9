use crate::ui::view::Shortcut;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use url::Url;

/// Draw the header: app name, API host, the address bar and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  api_url: &Url,
  address: &Url,
  shortcuts: &[Shortcut],
) {
  let rows = Layout::default()
    .direction(Direction::Vertical)
    .constraints([Constraint::Length(1), Constraint::Length(1)])
    .split(area);

  let mut top = vec![
    Span::styled(" cosview ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", api_host(api_url)), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::raw(" "),
  ];
  for shortcut in shortcuts {
    top.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(Color::Cyan),
    ));
    top.push(Span::styled(
      format!(" {}  ", shortcut.label),
      Style::default().fg(Color::DarkGray),
    ));
  }

  let address_line = Line::from(vec![
    Span::styled(" ⌂ ", Style::default().fg(Color::DarkGray)),
    Span::styled(address_text(address), Style::default().fg(Color::Yellow)),
  ]);

  let style = Style::default().bg(Color::Black);
  frame.render_widget(Paragraph::new(Line::from(top)).style(style), rows[0]);
  frame.render_widget(Paragraph::new(address_line).style(style), rows[1]);
}

/// Host and port of the API, as shown in the header
fn api_host(url: &Url) -> String {
  match (url.host_str(), url.port()) {
    (Some(host), Some(port)) => format!("{}:{}", host, port),
    (Some(host), None) => host.to_string(),
    _ => url.as_str().to_string(),
  }
}

/// Path and query of the current address
fn address_text(url: &Url) -> String {
  match url.query() {
    Some(query) => format!("{}?{}", url.path(), query),
    None => url.path().to_string(),
  }
}
