use super::util::{format_amount, short_address};
use crate::{
    app::{AppView, Health, SortField, SortSpec},
    components::Component,
};
use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Cell, Paragraph, Row, Table, TableState},
};

const COLUMNS: [(SortField, &str); 6] = [
    (SortField::Status, "Status"),
    (SortField::Address, "Address"),
    (SortField::Stake, "Stake (POKT)"),
    (SortField::Balance, "Balance (POKT)"),
    (SortField::Service, "Service"),
    (SortField::Gateway, "Gateway"),
];

pub fn health_marker(health: Health) -> &'static str {
    match health {
        Health::Healthy => "🟢",
        Health::Warning => "🟡",
        Health::Danger => "🔴",
    }
}

/// Column title with an arrow on the active sort column.
pub fn column_title(field: SortField, title: &str, sort: SortSpec) -> String {
    if sort.field != field {
        return title.to_string();
    }
    let arrow = if sort.descending { "🔽" } else { "🔼" };
    format!("{title} {arrow}")
}

#[derive(Debug, Default)]
pub struct AccountTable {
    table_state: TableState,
}

impl Component for AccountTable {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let state = ctx.state;
        let sort = state.accounts.sort_spec();
        let mut title = format!(
            "Applications • sorted by {} {}",
            sort.field.name(),
            if sort.descending { "desc" } else { "asc" }
        );
        if !state.search_matches.is_empty() {
            title.push_str(&format!(" • {} matches", state.search_matches.len()));
        }
        let block = Block::bordered()
            .title(Line::from(title).style(Style::default().add_modifier(Modifier::BOLD)));

        if state.accounts.is_empty() {
            let text = if state.upstake_all_pending {
                "Processing upstake all…"
            } else if state.loading {
                "Loading applications…"
            } else {
                "No applications delegated to this gateway"
            };
            let empty = Paragraph::new(text)
                .style(Style::default().fg(Color::Gray))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let header = Row::new(
            COLUMNS
                .iter()
                .map(|(field, name)| Cell::from(column_title(*field, name, sort))),
        )
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let rows = state.accounts.items().iter().enumerate().map(|(index, account)| {
            let health = state.health(account);
            let gateways = account
                .gateways
                .iter()
                .map(|gw| short_address(gw, 8, 4))
                .collect::<Vec<_>>()
                .join(", ");
            let row = Row::new(vec![
                Cell::from(format!("{} {}", health_marker(health), health.label())),
                Cell::from(short_address(&account.address, 10, 6)),
                Cell::from(format_amount(account.display_stake())),
                Cell::from(format_amount(account.balance)),
                Cell::from(account.service_id.clone()),
                Cell::from(gateways),
            ]);
            if state.search_matches.contains(&index) {
                row.style(Style::default().fg(Color::Yellow))
            } else {
                row
            }
        });

        let widths = [
            Constraint::Length(12),
            Constraint::Length(22),
            Constraint::Length(16),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Min(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .row_highlight_style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▸ ");
        self.table_state.select(Some(state.cursor));
        frame.render_stateful_widget(table, area, &mut self.table_state);
    }
}
