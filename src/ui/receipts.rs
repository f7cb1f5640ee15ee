use crate::{app::AppView, components::Component, ledger::Receipt};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Wrap},
};

pub fn receipt_line(index: usize, receipt: &Receipt) -> Line<'static> {
    let prefix = format!("{}. {} - ", index + 1, receipt.address);
    match &receipt.result {
        Ok(hash) => Line::from(vec![
            Span::raw(prefix),
            Span::styled(format!("TX: {hash}"), Style::default().fg(Color::Green)),
        ]),
        Err(err) => Line::from(vec![
            Span::raw(prefix),
            Span::styled(format!("ERROR: {err}"), Style::default().fg(Color::Red)),
        ]),
    }
}

#[derive(Debug, Default)]
pub struct ReceiptsView;

impl Component for ReceiptsView {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let state = ctx.state;
        let lines: Vec<Line> = if state.receipts.is_empty() {
            let text = if state.upstake_all_pending {
                "PROCESSING UPSTAKE TRANSACTIONS..."
            } else {
                "No applications were upstaked"
            };
            vec![Line::from(Span::styled(
                text,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))]
        } else {
            state
                .receipts
                .iter()
                .enumerate()
                .map(|(index, receipt)| receipt_line(index, receipt))
                .collect()
        };

        let title = Line::from("Upstake All Receipts").style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::bordered()
                    .title(title)
                    .title_bottom(Line::from("esc/q to go back")),
            );
        frame.render_widget(widget, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn receipts_are_numbered_from_one() {
        let ok = Receipt {
            address: "pokt1a".into(),
            result: Ok("ABC".into()),
        };
        let failed = Receipt {
            address: "pokt1b".into(),
            result: Err("insufficient funds".into()),
        };
        assert_eq!(text(&receipt_line(0, &ok)), "1. pokt1a - TX: ABC");
        assert_eq!(
            text(&receipt_line(1, &failed)),
            "2. pokt1b - ERROR: insufficient funds"
        );
    }
}
