use crate::{
    app::{AppView, ViewMode},
    components::Component,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};

pub const COMMAND_BAR_HEIGHT: u16 = 3;
const HINT: &str = "Press : for commands, / for search, h for help";

#[derive(Debug, Default)]
pub struct CommandBar;

impl CommandBar {
    fn content(ctx: &AppView<'_>) -> Line<'static> {
        let state = ctx.state;
        let prompt = Style::default().add_modifier(Modifier::BOLD);
        match state.mode {
            ViewMode::Command => Line::from(Span::styled(format!(":{}_", state.command_input), prompt)),
            ViewMode::Search => Line::from(Span::styled(format!("/{}_", state.search_input), prompt)),
            _ => match state.local_error() {
                Some(error) => Line::from(Span::styled(
                    format!("Error: {error}"),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                )),
                None => Line::from(HINT).style(Style::default().fg(Color::Gray)),
            },
        }
    }
}

impl Component for CommandBar {
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let focused = matches!(ctx.state.mode, ViewMode::Command | ViewMode::Search);
        let style = if focused {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        let widget = Paragraph::new(Self::content(ctx))
            .block(Block::bordered().border_style(style));
        frame.render_widget(widget, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::{AppView, Message, ViewState},
        ui::util::testing::draw,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn press(state: ViewState, code: KeyCode) -> ViewState {
        state
            .update(Message::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .0
    }

    fn render(state: &ViewState) -> Vec<String> {
        draw(60, COMMAND_BAR_HEIGHT, |frame| {
            let area = frame.area();
            CommandBar.render(frame, area, &AppView { state })
        })
    }

    #[test]
    fn shows_hint_when_idle() {
        let state = ViewState::default();
        assert!(render(&state)[1].contains(HINT));
    }

    #[test]
    fn shows_command_buffer() {
        let mut state = ViewState::default();
        state.mode = ViewMode::Table;
        state = press(state, KeyCode::Char(':'));
        state = press(state, KeyCode::Char('s'));
        state = press(state, KeyCode::Char('p'));
        assert!(render(&state)[1].contains(":sp_"));
    }
}
