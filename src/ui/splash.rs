use crate::{app::AppView, components::Component};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Paragraph, Wrap},
};

/// Boot banner shown while the configuration loads.
#[derive(Debug, Default)]
pub struct Splash;

impl Component for Splash {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, _ctx: &AppView<'_>) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(3),
                Constraint::Fill(1),
            ])
            .split(area);
        let banner = Paragraph::new(vec![
            Line::from("AppStakes").style(
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::from(""),
            Line::from("Loading configuration…").style(Style::default().fg(Color::Gray)),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(banner, rows[1]);
    }
}

/// Terminal view for unrecoverable errors; only quitting is possible.
#[derive(Debug, Default)]
pub struct FatalView;

impl Component for FatalView {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let message = ctx.state.fatal_error().unwrap_or("unknown error");
        let widget = Paragraph::new(vec![
            Line::from(format!("Error: {message}")).style(
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD),
            ),
            Line::from("Press q to quit."),
        ])
        .wrap(Wrap { trim: false })
        .block(Block::bordered());
        frame.render_widget(widget, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::{Message, ViewState},
        ui::util::testing::draw,
    };

    #[test]
    fn fatal_view_names_the_error() {
        let (state, _) = ViewState::boot();
        let (state, _) = state.update(Message::ConfigLoaded(Err("no networks found in config".into())));
        let rows = draw(50, 4, |frame| {
            let area = frame.area();
            FatalView.render(frame, area, &AppView { state: &state })
        });
        assert!(rows[1].contains("Error: no networks found in config"));
        assert!(rows[2].contains("Press q to quit."));
    }
}
