use super::util::{format_amount, short_address};
use crate::{app::AppView, components::Component};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

pub const HEADER_HEIGHT: u16 = 4;

#[derive(Debug, Default)]
pub struct Header;

impl Component for Header {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let state = ctx.state;
        let label = Style::default().fg(Color::Gray);
        let value = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        let mut summary = vec![
            Span::styled("Network: ", label),
            Span::styled(state.network.to_uppercase(), value),
            Span::styled("  Gateway: ", label),
            Span::styled(short_address(&state.gateway, 10, 6), value),
            Span::styled("  Apps: ", label),
            Span::styled(state.accounts.len().to_string(), value),
            Span::styled("  Bank: ", label),
            Span::styled(format!("{} POKT", format_amount(state.funding_balance)), value),
        ];
        if state.upstake_all_pending {
            summary.push(Span::styled(
                "  Processing upstake all…",
                Style::default().fg(Color::Yellow),
            ));
        } else if state.loading {
            summary.push(Span::styled(
                "  Loading…",
                Style::default().fg(Color::Yellow),
            ));
        }
        let keys = Line::from(
            "u Upstake • f Fund • U Upstake All • F Fund All • r Refresh • n Network • / Search • h Help",
        )
        .style(Style::default().fg(Color::DarkGray));

        let widget = Paragraph::new(vec![Line::from(summary), keys]).block(
            Block::bordered().title(
                Line::from("Application Stakes").style(Style::default().add_modifier(Modifier::BOLD)),
            ),
        );
        frame.render_widget(widget, area);
    }
}
