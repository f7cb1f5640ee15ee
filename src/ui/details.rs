use super::util::pretty_json;
use crate::{app::AppView, components::Component};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Paragraph, Wrap},
};

/// Full-screen view of one application's raw documents.
#[derive(Debug, Default)]
pub struct DetailsView;

impl Component for DetailsView {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let detail = &ctx.state.detail;
        let title = Line::from(format!("Application {}", detail.address)).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let block = Block::bordered()
            .title(title)
            .title_bottom(Line::from("esc/q to go back"));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if detail.loading {
            let loading = Paragraph::new("Loading application details…")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(loading, inner);
            return;
        }

        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(inner);

        let application = Paragraph::new(pretty_json(&detail.details))
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title("Application"));
        let balances = Paragraph::new(pretty_json(&detail.balances))
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title("Balances"));
        frame.render_widget(application, halves[0]);
        frame.render_widget(balances, halves[1]);
    }
}
