use engine::{Canvas, Rgba, Vec2};

use super::module::ModuleKind;

const PANEL_WIDTH: f32 = 168.0;
const ROW_HEIGHT: f32 = 26.0;
const PANEL_PADDING: f32 = 10.0;
const TITLE_HEIGHT: f32 = 22.0;
const PANEL_BG_COLOR: Rgba = [14, 18, 24, 235];
const PANEL_BORDER_COLOR: Rgba = [120, 140, 160, 255];
const ROW_COLOR: Rgba = [36, 44, 54, 255];
const ROW_TEXT_COLOR: Rgba = [235, 240, 245, 255];
const CANCEL_TEXT_COLOR: Rgba = [220, 160, 150, 255];
const TITLE_COLOR: Rgba = [180, 200, 215, 255];

/// Outcome of a construction choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEvent {
    Confirmed {
        x: usize,
        y: usize,
        kind: ModuleKind,
    },
    Cancelled,
}

/// Presentation port for the construction choice. The session opens it with
/// the candidate kinds for a cell and polls for the player's decision each
/// tick; how the choice is presented (in-canvas panel, DOM list) is the
/// implementor's business.
pub trait BuildMenu {
    fn open(&mut self, x: usize, y: usize, options: &[ModuleKind]);
    fn close(&mut self);
    fn is_open(&self) -> bool;
    /// Routes a pointer click while the menu is open.
    fn handle_click(&mut self, point: Vec2);
    /// Takes the player's decision, at most once per open/choice cycle.
    fn poll(&mut self) -> Option<MenuEvent>;
    fn render(&self, canvas: &mut dyn Canvas);
}

/// Build menu drawn with the canvas capability: a centered panel listing one
/// row per candidate kind plus a cancel row. A click anywhere outside the
/// panel also cancels.
pub struct CanvasMenu {
    viewport: (u32, u32),
    target: Option<(usize, usize)>,
    options: Vec<ModuleKind>,
    queued: Option<MenuEvent>,
}

impl CanvasMenu {
    pub fn new(viewport: (u32, u32)) -> Self {
        Self {
            viewport,
            target: None,
            options: Vec::new(),
            queued: None,
        }
    }

    fn panel_rect(&self) -> (f32, f32, f32, f32) {
        let rows = self.options.len() as f32 + 1.0;
        let height = TITLE_HEIGHT + rows * ROW_HEIGHT + PANEL_PADDING * 2.0;
        let left = (self.viewport.0 as f32 - PANEL_WIDTH) * 0.5;
        let top = (self.viewport.1 as f32 * 0.5 - height) * 0.5;
        (left, top, PANEL_WIDTH, height)
    }

    /// Row index under `point`: `0..options.len()` picks a kind, the final
    /// row is cancel.
    fn row_at(&self, point: Vec2) -> Option<usize> {
        let (left, top, width, _) = self.panel_rect();
        let rows_top = top + PANEL_PADDING + TITLE_HEIGHT;
        if point.x < left + PANEL_PADDING || point.x > left + width - PANEL_PADDING {
            return None;
        }
        let offset = point.y - rows_top;
        if offset < 0.0 {
            return None;
        }
        let row = (offset / ROW_HEIGHT) as usize;
        if row <= self.options.len() {
            Some(row)
        } else {
            None
        }
    }

    fn inside_panel(&self, point: Vec2) -> bool {
        let (left, top, width, height) = self.panel_rect();
        point.x >= left && point.x <= left + width && point.y >= top && point.y <= top + height
    }
}

impl BuildMenu for CanvasMenu {
    fn open(&mut self, x: usize, y: usize, options: &[ModuleKind]) {
        self.target = Some((x, y));
        self.options = options.to_vec();
        self.queued = None;
    }

    fn close(&mut self) {
        self.target = None;
        self.options.clear();
    }

    fn is_open(&self) -> bool {
        self.target.is_some()
    }

    fn handle_click(&mut self, point: Vec2) {
        let Some((x, y)) = self.target else {
            return;
        };
        if !self.inside_panel(point) {
            self.queued = Some(MenuEvent::Cancelled);
            self.close();
            return;
        }
        match self.row_at(point) {
            Some(row) if row < self.options.len() => {
                self.queued = Some(MenuEvent::Confirmed {
                    x,
                    y,
                    kind: self.options[row],
                });
                self.close();
            }
            Some(_) => {
                self.queued = Some(MenuEvent::Cancelled);
                self.close();
            }
            None => {}
        }
    }

    fn poll(&mut self) -> Option<MenuEvent> {
        self.queued.take()
    }

    fn render(&self, canvas: &mut dyn Canvas) {
        if !self.is_open() {
            return;
        }
        let (left, top, width, height) = self.panel_rect();
        canvas.fill_rect(left, top, width, height, PANEL_BG_COLOR);
        canvas.stroke_rect(left, top, width, height, PANEL_BORDER_COLOR);
        canvas.draw_text("BUILD", left + PANEL_PADDING, top + PANEL_PADDING, TITLE_COLOR);

        let rows_top = top + PANEL_PADDING + TITLE_HEIGHT;
        for (index, kind) in self.options.iter().enumerate() {
            let row_top = rows_top + index as f32 * ROW_HEIGHT;
            canvas.fill_rect(
                left + PANEL_PADDING,
                row_top + 2.0,
                width - PANEL_PADDING * 2.0,
                ROW_HEIGHT - 4.0,
                ROW_COLOR,
            );
            canvas.draw_text(
                kind.label(),
                left + PANEL_PADDING + 6.0,
                row_top + 8.0,
                ROW_TEXT_COLOR,
            );
        }
        let cancel_top = rows_top + self.options.len() as f32 * ROW_HEIGHT;
        canvas.draw_text(
            "CANCEL",
            left + PANEL_PADDING + 6.0,
            cancel_top + 8.0,
            CANCEL_TEXT_COLOR,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_menu() -> CanvasMenu {
        let mut menu = CanvasMenu::new((960, 540));
        menu.open(2, 1, &[ModuleKind::Hull, ModuleKind::Boiler]);
        menu
    }

    fn row_center(menu: &CanvasMenu, row: usize) -> Vec2 {
        let (left, top, width, _) = menu.panel_rect();
        Vec2::new(
            left + width * 0.5,
            top + PANEL_PADDING + TITLE_HEIGHT + row as f32 * ROW_HEIGHT + ROW_HEIGHT * 0.5,
        )
    }

    #[test]
    fn open_menu_reports_open_until_closed() {
        let mut menu = open_menu();
        assert!(menu.is_open());
        menu.close();
        assert!(!menu.is_open());
    }

    #[test]
    fn clicking_an_option_row_confirms_that_kind_for_the_opened_cell() {
        let mut menu = open_menu();
        let point = row_center(&menu, 1);
        menu.handle_click(point);

        assert_eq!(
            menu.poll(),
            Some(MenuEvent::Confirmed {
                x: 2,
                y: 1,
                kind: ModuleKind::Boiler
            })
        );
        assert!(!menu.is_open());
        assert_eq!(menu.poll(), None);
    }

    #[test]
    fn clicking_the_cancel_row_cancels() {
        let mut menu = open_menu();
        let point = row_center(&menu, 2);
        menu.handle_click(point);

        assert_eq!(menu.poll(), Some(MenuEvent::Cancelled));
        assert!(!menu.is_open());
    }

    #[test]
    fn clicking_outside_the_panel_cancels() {
        let mut menu = open_menu();
        menu.handle_click(Vec2::new(5.0, 5.0));

        assert_eq!(menu.poll(), Some(MenuEvent::Cancelled));
        assert!(!menu.is_open());
    }

    #[test]
    fn click_with_no_menu_open_does_nothing() {
        let mut menu = CanvasMenu::new((960, 540));
        menu.handle_click(Vec2::new(5.0, 5.0));
        assert_eq!(menu.poll(), None);
    }

    #[test]
    fn reopening_discards_any_stale_choice() {
        let mut menu = open_menu();
        menu.handle_click(row_center(&menu, 0));
        menu.open(3, 2, &[ModuleKind::Castle]);
        assert_eq!(menu.poll(), None);
        assert!(menu.is_open());
    }
}
