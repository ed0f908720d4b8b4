use super::Vec2;

/// Immutable view of player input for one simulation tick.
///
/// Edge-triggered fields (`click_pressed`, `pause_pressed`, `debug_pressed`)
/// are true for exactly one snapshot per physical press; the collector in the
/// loop runner clears them once taken.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    cursor_position_px: Option<Vec2>,
    click_pressed: bool,
    pause_pressed: bool,
    debug_pressed: bool,
    quit_requested: bool,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        cursor_position_px: Option<Vec2>,
        click_pressed: bool,
        pause_pressed: bool,
        debug_pressed: bool,
        quit_requested: bool,
    ) -> Self {
        Self {
            cursor_position_px,
            click_pressed,
            pause_pressed,
            debug_pressed,
            quit_requested,
        }
    }

    pub fn with_cursor_position_px(mut self, cursor_position_px: Option<Vec2>) -> Self {
        self.cursor_position_px = cursor_position_px;
        self
    }

    pub fn with_click_pressed(mut self, click_pressed: bool) -> Self {
        self.click_pressed = click_pressed;
        self
    }

    pub fn with_pause_pressed(mut self, pause_pressed: bool) -> Self {
        self.pause_pressed = pause_pressed;
        self
    }

    pub fn with_debug_pressed(mut self, debug_pressed: bool) -> Self {
        self.debug_pressed = debug_pressed;
        self
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.cursor_position_px
    }

    pub fn click_pressed(&self) -> bool {
        self.click_pressed
    }

    pub fn pause_pressed(&self) -> bool {
        self.pause_pressed
    }

    pub fn debug_pressed(&self) -> bool {
        self.debug_pressed
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}
