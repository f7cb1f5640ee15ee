use crate::app::AppView;
use ratatui::Frame;
use ratatui::layout::Rect;

/// Trait implemented by all UI panes. State changes happen in the reducer, so a
/// component only turns a [`AppView`] snapshot into widgets.
pub trait Component {
    /// Render the component into the provided [`Rect`].
    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>);
}
