use super::util::{centered_rect, short_address};
use crate::{
    app::{AppView, ViewMode},
    components::Component,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, List, ListItem, ListState},
};

/// Centered picker for networks and gateways, drawn over the table.
#[derive(Debug, Default)]
pub struct SelectModal {
    list_state: ListState,
}

impl Component for SelectModal {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let state = ctx.state;
        let (title, options, cursor, current) = match state.mode {
            ViewMode::NetworkSelect => (
                "Select Network",
                &state.networks,
                state.network_cursor,
                &state.network,
            ),
            ViewMode::GatewaySelect => (
                "Select Gateway",
                &state.gateways,
                state.gateway_cursor,
                &state.gateway,
            ),
            _ => return,
        };

        let height = (options.len() as u16).saturating_add(2).max(3);
        let modal_area = centered_rect(56, height, area);
        frame.render_widget(Clear, modal_area);

        let items: Vec<ListItem> = options
            .iter()
            .map(|option| {
                let marker = if option == current { " (current)" } else { "" };
                ListItem::new(Line::from(vec![
                    Span::raw(short_address(option, 20, 10)),
                    Span::styled(marker, Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect();
        let block = Block::bordered()
            .title(Span::styled(
                title,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .title_bottom(Line::from("enter select • esc cancel"));
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▸ ");
        self.list_state.select(Some(cursor));
        frame.render_stateful_widget(list, modal_area, &mut self.list_state);
    }
}
