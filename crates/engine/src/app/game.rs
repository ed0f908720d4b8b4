use super::rendering::Canvas;
use super::InputSnapshot;

/// Cursor affordance requested by the game for the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CursorHint {
    #[default]
    Default,
    /// A deferred action is pending; further clicks will be ignored.
    Busy,
    /// The pointer is over something that would react to a click.
    Action,
}

/// The simulation driven by the loop runner.
///
/// `tick` runs at the fixed simulation period; every call within one frame
/// sees the same `dt_seconds`. `render` runs once per display frame at
/// whatever rate the display refreshes.
pub trait Game {
    fn tick(&mut self, dt_seconds: f32, input: &InputSnapshot);
    fn render(&mut self, canvas: &mut dyn Canvas, frame_dt_seconds: f32);

    fn cursor_hint(&self) -> CursorHint {
        CursorHint::Default
    }

    fn debug_title(&self) -> Option<String> {
        None
    }

    fn shutdown(&mut self) {}
}
