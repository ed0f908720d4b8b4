use engine::{Canvas, Rgba, Vec2};

use super::entity::Entity;
use super::session::SessionState;

pub const HUD_DEPTH: i32 = 900;
pub const GAME_OVER_DEPTH: i32 = 1000;

const TEXT_COLOR: Rgba = [235, 240, 245, 255];
const DIM_TEXT_COLOR: Rgba = [170, 190, 205, 255];
const GAUGE_BG_COLOR: Rgba = [16, 22, 30, 200];
const GAUGE_FILL_COLOR: Rgba = [90, 160, 200, 255];
const GAUGE_DANGER_COLOR: Rgba = [210, 80, 60, 255];
const COOLDOWN_BG_COLOR: Rgba = [16, 22, 30, 200];
const COOLDOWN_FILL_COLOR: Rgba = [230, 200, 110, 255];
const PAUSE_BANNER_COLOR: Rgba = [10, 12, 16, 180];
const GAME_OVER_SHADE_COLOR: Rgba = [8, 10, 14, 195];

const MARGIN: f32 = 10.0;
const LINE_HEIGHT: f32 = 16.0;
const GAUGE_WIDTH: f32 = 12.0;
const GAUGE_HEIGHT: f32 = 120.0;
const COOLDOWN_BAR_WIDTH: f32 = 140.0;
const COOLDOWN_BAR_HEIGHT: f32 = 8.0;
/// The draught gauge turns red past this fill fraction.
const GAUGE_DANGER_FRACTION: f32 = 0.75;

pub fn format_clock(elapsed_seconds: f32) -> String {
    let total = elapsed_seconds.max(0.0) as u32;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Voyage readout and status affordances. Pure display; never interacts.
pub struct Hud {
    cooldown_total_hint: f32,
}

impl Hud {
    pub fn new() -> Self {
        Self {
            cooldown_total_hint: 1.0,
        }
    }
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity for Hud {
    fn depth(&self) -> i32 {
        HUD_DEPTH
    }

    fn update(&mut self, _dt_seconds: f32, state: &mut SessionState) {
        // Track the largest cooldown seen so the bar drains from full.
        if state.cooldown_seconds > self.cooldown_total_hint {
            self.cooldown_total_hint = state.cooldown_seconds;
        } else if state.cooldown_seconds <= 0.0 {
            self.cooldown_total_hint = 1.0;
        }
    }

    fn render(&self, canvas: &mut dyn Canvas, state: &SessionState) {
        let (width, height) = canvas.size();
        let width = width as f32;
        let height = height as f32;

        canvas.draw_text(
            &format!("DIST {:.0}", state.distance),
            MARGIN,
            MARGIN,
            TEXT_COLOR,
        );
        canvas.draw_text(
            &format!("SPEED {:.1}", state.speed),
            MARGIN,
            MARGIN + LINE_HEIGHT,
            TEXT_COLOR,
        );
        canvas.draw_text(
            &format!("TIME {}", format_clock(state.elapsed_seconds)),
            MARGIN,
            MARGIN + LINE_HEIGHT * 2.0,
            TEXT_COLOR,
        );

        // Draught gauge: how deep the hull sits against its total height.
        let gauge_left = width - MARGIN - GAUGE_WIDTH;
        canvas.fill_rect(gauge_left, MARGIN, GAUGE_WIDTH, GAUGE_HEIGHT, GAUGE_BG_COLOR);
        let fill_fraction = if state.ship_height > 0.0 {
            (state.draught / state.ship_height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let fill_color = if fill_fraction >= GAUGE_DANGER_FRACTION {
            GAUGE_DANGER_COLOR
        } else {
            GAUGE_FILL_COLOR
        };
        let fill_height = GAUGE_HEIGHT * fill_fraction;
        canvas.fill_rect(
            gauge_left,
            MARGIN + GAUGE_HEIGHT - fill_height,
            GAUGE_WIDTH,
            fill_height,
            fill_color,
        );

        if state.cooldown_seconds > 0.0 {
            let bar_left = (width - COOLDOWN_BAR_WIDTH) * 0.5;
            let bar_top = height - MARGIN - COOLDOWN_BAR_HEIGHT;
            let remaining =
                (state.cooldown_seconds / self.cooldown_total_hint).clamp(0.0, 1.0);
            canvas.fill_rect(
                bar_left,
                bar_top,
                COOLDOWN_BAR_WIDTH,
                COOLDOWN_BAR_HEIGHT,
                COOLDOWN_BG_COLOR,
            );
            canvas.fill_rect(
                bar_left,
                bar_top,
                COOLDOWN_BAR_WIDTH * (1.0 - remaining),
                COOLDOWN_BAR_HEIGHT,
                COOLDOWN_FILL_COLOR,
            );
            let label = "WORKING";
            let label_x = (width - canvas.measure_text(label)) * 0.5;
            canvas.draw_text(label, label_x, bar_top - LINE_HEIGHT, DIM_TEXT_COLOR);
        }

        if state.paused {
            canvas.fill_rect(0.0, height * 0.42, width, 34.0, PAUSE_BANNER_COLOR);
            let label = "PAUSED - SPACE TO RESUME";
            let label_x = (width - canvas.measure_text(label)) * 0.5;
            canvas.draw_text(label, label_x, height * 0.42 + 12.0, TEXT_COLOR);
        }

        if state.debug {
            let lines = [
                format!("DRAUGHT {:.2}/{:.0}", state.draught, state.ship_height),
                format!("WEIGHT {:.1}", state.last_stats.weight),
                format!("BUOY {:.1}", state.last_stats.buoyancy),
                format!("FLOOD {:.1}", state.last_stats.flood),
                format!("COOLDOWN {:.1}", state.cooldown_seconds),
            ];
            for (index, line) in lines.iter().enumerate() {
                canvas.draw_text(
                    line,
                    MARGIN,
                    height - MARGIN - LINE_HEIGHT * (lines.len() - index) as f32,
                    DIM_TEXT_COLOR,
                );
            }
        }
    }
}

/// Terminal overlay spawned once when the loss condition fires. Covers the
/// whole screen and turns any click into a restart request.
pub struct GameOverView {
    final_distance: f32,
    final_elapsed_seconds: f32,
}

impl GameOverView {
    pub fn new(final_distance: f32, final_elapsed_seconds: f32) -> Self {
        Self {
            final_distance,
            final_elapsed_seconds,
        }
    }
}

impl Entity for GameOverView {
    fn depth(&self) -> i32 {
        GAME_OVER_DEPTH
    }

    fn clickable_while_paused(&self) -> bool {
        true
    }

    fn hit_test(&self, _point: Vec2) -> bool {
        true
    }

    fn on_click(&mut self, _point: Vec2, state: &mut SessionState) {
        state.restart_requested = true;
    }

    fn render(&self, canvas: &mut dyn Canvas, _state: &SessionState) {
        let (width, height) = canvas.size();
        let width = width as f32;
        let height = height as f32;
        canvas.fill_rect(0.0, 0.0, width, height, GAME_OVER_SHADE_COLOR);

        let title = "THE SHIP WENT DOWN";
        let stats = format!(
            "DIST {:.0}  TIME {}",
            self.final_distance,
            format_clock(self.final_elapsed_seconds)
        );
        let prompt = "CLICK TO RESTART";

        let title_x = (width - canvas.measure_text(title)) * 0.5;
        let stats_x = (width - canvas.measure_text(&stats)) * 0.5;
        let prompt_x = (width - canvas.measure_text(prompt)) * 0.5;
        canvas.draw_text(title, title_x, height * 0.34, TEXT_COLOR);
        canvas.draw_text(&stats, stats_x, height * 0.34 + LINE_HEIGHT * 2.0, DIM_TEXT_COLOR);
        canvas.draw_text(prompt, prompt_x, height * 0.34 + LINE_HEIGHT * 4.0, TEXT_COLOR);
    }
}
