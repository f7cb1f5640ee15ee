use crate::{app::AppView, components::Component};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Paragraph, Wrap},
};

const HELP: &str = "\
NAVIGATION:
  ↑/k, ↓/j          Move up/down
  Home/g, End/G     Jump to top/bottom
  u                 Upstake selected application (adds to current stake)
  f                 Fund selected application
  U                 Upstake all applications (opens :ua prompt)
  F                 Fund all applications (opens :fa prompt)
  enter             Show application details
  r                 Refresh
  n                 Switch network
  /                 Search by address or service
  q, ctrl+c         Quit

COMMANDS (prefix with :):
  q, quit           Quit
  h, help           Show this help
  n, network        Switch network
  g, gateway        Switch gateway
  u <addr> <amt>    Upstake application by <amt> upokt
  f <addr> <amt>    Send <amt> upokt from the bank to an application
  fa <amt>          Fund every configured application with <amt> each
  ua <amt>          Upstake every configured application by <amt>
  show <addr>       Show raw application details
  ss sa sp sb sv sg Sort by status, address, stake, balance, service, gateway
  sort <field>      Same as above; repeating a field reverses the order
  asc, desc         Set sort direction

Press esc, q or enter to close.";

#[derive(Debug, Default)]
pub struct HelpView;

impl Component for HelpView {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, _ctx: &AppView<'_>) {
        let title = Line::from("AppStakes Help").style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let widget = Paragraph::new(HELP)
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: false })
            .block(Block::bordered().border_type(BorderType::Double).title(title));
        frame.render_widget(widget, area);
    }
}
