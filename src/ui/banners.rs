use crate::{
    app::{AppView, Notification, NotificationKind},
    components::Component,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::Paragraph,
};

pub fn banner_text(notification: &Notification) -> String {
    match notification.kind {
        NotificationKind::UpstakeHash => format!("✅ Upstake submitted: {}", notification.hash),
        NotificationKind::FundHash => format!("✅ Funds sent: {}", notification.hash),
        NotificationKind::TxError if notification.hash.is_empty() => {
            format!("❌ Transaction failed: {}", notification.detail)
        }
        NotificationKind::TxError => format!(
            "❌ Transaction {} failed: {}",
            notification.hash, notification.detail
        ),
    }
}

/// One line per active notification, above the table.
#[derive(Debug, Default)]
pub struct Banners;

impl Banners {
    pub fn height(ctx: &AppView<'_>) -> u16 {
        ctx.state.notifications.active().len() as u16
    }
}

impl Component for Banners {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let lines: Vec<Line> = ctx
            .state
            .notifications
            .active()
            .into_iter()
            .map(|notification| {
                let color = match notification.kind {
                    NotificationKind::TxError => Color::Red,
                    _ => Color::Green,
                };
                Line::from(banner_text(notification))
                    .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ViewState;

    #[test]
    fn failed_banner_keeps_hash_and_log() {
        let mut state = ViewState::default();
        let tracker = &mut state.notifications;
        tracker.push(NotificationKind::TxError, "H1".into(), "out of gas".into());
        tracker.push(NotificationKind::FundHash, "H2".into(), String::new());
        let texts: Vec<String> = tracker.active().into_iter().map(banner_text).collect();
        assert_eq!(texts, vec!["✅ Funds sent: H2", "❌ Transaction H1 failed: out of gas"]);
    }
}
