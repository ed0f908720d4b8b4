use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::{Error as PixelsError, Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorIcon, Window, WindowBuilder};

use super::metrics::MetricsAccumulator;
use super::rendering::{FrameCanvas, SpriteStore};
use super::{CursorHint, Game, InputSnapshot, Vec2};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    /// Fixed framebuffer resolution; the surface scales it to the window.
    pub logical_width: u32,
    pub logical_height: u32,
    /// Simulation tick period. Every tick sees exactly this delta.
    pub tick_period: Duration,
    /// Upper bound on the per-frame wall-clock delta. Absorbs stalls from
    /// minimized or backgrounded windows without exploding the simulation.
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub asset_root: PathBuf,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Waterline".to_string(),
            logical_width: 960,
            logical_height: 540,
            tick_period: Duration::from_millis(100),
            max_frame_delta: Duration::from_millis(1000),
            max_ticks_per_frame: 10,
            metrics_log_interval: Duration::from_secs(5),
            asset_root: PathBuf::from("assets"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize framebuffer surface: {0}")]
    CreateSurface(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

pub fn run_app(config: LoopConfig, mut game: Box<dyn Game>) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.logical_width as f64,
                config.logical_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let size = window.inner_size();
    let mut pixels = build_pixels(
        Arc::clone(&window),
        size.width.max(1),
        size.height.max(1),
        config.logical_width,
        config.logical_height,
    )
    .map_err(AppError::CreateSurface)?;
    let mut sprites = SpriteStore::new(config.asset_root.clone());

    event_loop.set_control_flow(ControlFlow::Poll);

    let mut pacer = TickPacer::new(
        normalize_non_zero_duration(config.tick_period, Duration::from_millis(100)),
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(1000)),
        config.max_ticks_per_frame.max(1),
    );
    let tick_dt_seconds = pacer.tick_period.as_secs_f32();
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(5));
    let mut metrics = MetricsAccumulator::new(metrics_log_interval);
    let mut input = InputCollector::default();
    let mut last_frame_instant = Instant::now();
    let mut last_applied_cursor: Option<CursorIcon> = None;
    let mut last_applied_title: Option<String> = None;

    info!(
        tick_period_ms = pacer.tick_period.as_millis() as u64,
        max_frame_delta_ms = pacer.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = pacer.max_ticks_per_frame,
        logical_width = config.logical_width,
        logical_height = config.logical_height,
        "loop_config"
    );

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if new_size.width > 0 && new_size.height > 0 {
                        if let Err(error) =
                            pixels.resize_surface(new_size.width, new_size.height)
                        {
                            warn!(error = %error, "surface_resize_failed");
                            window_target.exit();
                        }
                    }
                }
                WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    if size.width > 0 && size.height > 0 {
                        if let Err(error) = pixels.resize_surface(size.width, size.height) {
                            warn!(error = %error, "surface_resize_failed");
                            window_target.exit();
                        }
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let logical = pixels
                        .window_pos_to_pixel((position.x as f32, position.y as f32))
                        .ok()
                        .map(|(x, y)| Vec2::new(x as f32, y as f32));
                    input.set_cursor_position(logical);
                }
                WindowEvent::CursorLeft { .. } => {
                    input.set_cursor_position(None);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input.handle_mouse_input(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input.handle_keyboard_input(event.physical_key, event.state);
                    if input.quit_requested {
                        info!(reason = "escape_key", "shutdown_requested");
                        window_target.exit();
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let batch = pacer.advance(raw_frame_dt);
                    for _ in 0..batch.ticks {
                        let snapshot = input.snapshot_for_tick();
                        game.tick(tick_dt_seconds, &snapshot);
                    }
                    metrics.record_ticks(batch.ticks);
                    if batch.dropped_backlog > Duration::ZERO {
                        metrics.record_dropped_backlog(batch.dropped_backlog);
                        warn!(
                            dropped_backlog_ms = batch.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame = pacer.max_ticks_per_frame,
                            "tick_backlog_dropped"
                        );
                    }

                    {
                        let frame = pixels.frame_mut();
                        let mut canvas = FrameCanvas::new(
                            frame,
                            config.logical_width,
                            config.logical_height,
                            &mut sprites,
                        );
                        game.render(&mut canvas, raw_frame_dt.as_secs_f32());
                    }
                    if let Err(error) = pixels.render() {
                        warn!(error = %error, "frame_present_failed");
                        window_target.exit();
                    }

                    let cursor = cursor_icon_for_hint(game.cursor_hint());
                    if last_applied_cursor != Some(cursor) {
                        window.set_cursor_icon(cursor);
                        last_applied_cursor = Some(cursor);
                    }
                    let next_title = game.debug_title();
                    if next_title != last_applied_title {
                        match &next_title {
                            Some(title) => window.set_title(title),
                            None => window.set_title(&config.window_title),
                        }
                        last_applied_title = next_title;
                    }

                    metrics.record_frame(raw_frame_dt);
                    if let Some(report) = metrics.maybe_report(now) {
                        info!(
                            fps = report.fps,
                            tps = report.tps,
                            frame_time_ms = report.frame_time_ms,
                            dropped_backlog_ms = report.dropped_backlog_ms,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                game.shutdown();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn build_pixels(
    window: Arc<Window>,
    surface_width: u32,
    surface_height: u32,
    logical_width: u32,
    logical_height: u32,
) -> Result<Pixels<'static>, PixelsError> {
    let surface = SurfaceTexture::new(surface_width, surface_height, window);
    Pixels::new(logical_width, logical_height, surface)
}

fn cursor_icon_for_hint(hint: CursorHint) -> CursorIcon {
    match hint {
        CursorHint::Default => CursorIcon::Default,
        CursorHint::Busy => CursorIcon::Progress,
        CursorHint::Action => CursorIcon::Pointer,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TickBatch {
    ticks: u32,
    dropped_backlog: Duration,
}

/// Converts irregular frame deltas into a whole number of fixed-period ticks.
///
/// The raw delta is clamped before entering the accumulator, and catch-up is
/// capped per frame; any backlog beyond the cap is dropped rather than
/// replayed, so a long stall never produces a burst of stale simulation.
#[derive(Debug)]
struct TickPacer {
    tick_period: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
}

impl TickPacer {
    fn new(tick_period: Duration, max_frame_delta: Duration, max_ticks_per_frame: u32) -> Self {
        Self {
            tick_period,
            max_frame_delta,
            max_ticks_per_frame,
            accumulator: Duration::ZERO,
        }
    }

    fn advance(&mut self, raw_frame_dt: Duration) -> TickBatch {
        let clamped = raw_frame_dt.min(self.max_frame_delta);
        self.accumulator = self.accumulator.saturating_add(clamped);

        let mut ticks = 0u32;
        while self.accumulator >= self.tick_period && ticks < self.max_ticks_per_frame {
            self.accumulator = self.accumulator.saturating_sub(self.tick_period);
            ticks = ticks.saturating_add(1);
        }

        let dropped_backlog = if self.accumulator >= self.tick_period {
            let dropped = self.accumulator;
            self.accumulator = Duration::ZERO;
            dropped
        } else {
            Duration::ZERO
        };

        TickBatch {
            ticks,
            dropped_backlog,
        }
    }
}

#[derive(Debug, Default)]
struct InputCollector {
    quit_requested: bool,
    cursor_position_px: Option<Vec2>,
    left_mouse_is_down: bool,
    click_pressed_edge: bool,
    pause_key_is_down: bool,
    pause_pressed_edge: bool,
    debug_key_is_down: bool,
    debug_pressed_edge: bool,
}

impl InputCollector {
    fn set_cursor_position(&mut self, position: Option<Vec2>) {
        self.cursor_position_px = position;
    }

    fn handle_mouse_input(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                if !self.left_mouse_is_down {
                    self.click_pressed_edge = true;
                }
                self.left_mouse_is_down = true;
            }
            ElementState::Released => self.left_mouse_is_down = false,
        }
    }

    fn handle_keyboard_input(&mut self, key: PhysicalKey, state: ElementState) {
        match key {
            PhysicalKey::Code(KeyCode::Space) => match state {
                ElementState::Pressed => {
                    if !self.pause_key_is_down {
                        self.pause_pressed_edge = true;
                    }
                    self.pause_key_is_down = true;
                }
                ElementState::Released => self.pause_key_is_down = false,
            },
            PhysicalKey::Code(KeyCode::F3) => match state {
                ElementState::Pressed => {
                    if !self.debug_key_is_down {
                        self.debug_pressed_edge = true;
                    }
                    self.debug_key_is_down = true;
                }
                ElementState::Released => self.debug_key_is_down = false,
            },
            PhysicalKey::Code(KeyCode::Escape) => {
                if state == ElementState::Pressed {
                    self.quit_requested = true;
                }
            }
            _ => {}
        }
    }

    fn snapshot_for_tick(&mut self) -> InputSnapshot {
        let snapshot = InputSnapshot::new(
            self.cursor_position_px,
            self.click_pressed_edge,
            self.pause_pressed_edge,
            self.debug_pressed_edge,
            self.quit_requested,
        );
        self.click_pressed_edge = false;
        self.pause_pressed_edge = false;
        self.debug_pressed_edge = false;
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacer_100ms(max_ticks: u32) -> TickPacer {
        TickPacer::new(
            Duration::from_millis(100),
            Duration::from_millis(1000),
            max_ticks,
        )
    }

    #[test]
    fn pacer_runs_expected_ticks_and_keeps_remainder() {
        let mut pacer = pacer_100ms(10);
        let batch = pacer.advance(Duration::from_millis(250));

        assert_eq!(batch.ticks, 2);
        assert_eq!(batch.dropped_backlog, Duration::ZERO);
        assert_eq!(pacer.accumulator, Duration::from_millis(50));
    }

    #[test]
    fn pacer_accumulates_across_short_frames() {
        let mut pacer = pacer_100ms(10);
        assert_eq!(pacer.advance(Duration::from_millis(60)).ticks, 0);
        assert_eq!(pacer.advance(Duration::from_millis(60)).ticks, 1);
        assert_eq!(pacer.accumulator, Duration::from_millis(20));
    }

    #[test]
    fn pacer_clamps_stall_to_max_frame_delta() {
        let mut pacer = pacer_100ms(20);
        let batch = pacer.advance(Duration::from_secs(30));

        assert_eq!(batch.ticks, 10);
        assert_eq!(batch.dropped_backlog, Duration::ZERO);
        assert_eq!(pacer.accumulator, Duration::ZERO);
    }

    #[test]
    fn pacer_drops_backlog_beyond_tick_cap() {
        let mut pacer = pacer_100ms(3);
        let batch = pacer.advance(Duration::from_millis(800));

        assert_eq!(batch.ticks, 3);
        assert_eq!(batch.dropped_backlog, Duration::from_millis(500));
        assert_eq!(pacer.accumulator, Duration::ZERO);
    }

    #[test]
    fn click_edge_fires_for_single_tick() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);

        assert!(input.snapshot_for_tick().click_pressed());
        assert!(!input.snapshot_for_tick().click_pressed());
    }

    #[test]
    fn held_click_does_not_retrigger_edge() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        let _ = input.snapshot_for_tick();
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert!(!input.snapshot_for_tick().click_pressed());

        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        assert!(input.snapshot_for_tick().click_pressed());
    }

    #[test]
    fn right_button_does_not_produce_click_edge() {
        let mut input = InputCollector::default();
        input.handle_mouse_input(MouseButton::Right, ElementState::Pressed);
        assert!(!input.snapshot_for_tick().click_pressed());
    }

    #[test]
    fn space_pause_edge_is_single_tick_until_release() {
        let mut input = InputCollector::default();
        input.handle_keyboard_input(
            PhysicalKey::Code(KeyCode::Space),
            ElementState::Pressed,
        );
        assert!(input.snapshot_for_tick().pause_pressed());

        input.handle_keyboard_input(
            PhysicalKey::Code(KeyCode::Space),
            ElementState::Pressed,
        );
        assert!(!input.snapshot_for_tick().pause_pressed());

        input.handle_keyboard_input(
            PhysicalKey::Code(KeyCode::Space),
            ElementState::Released,
        );
        input.handle_keyboard_input(
            PhysicalKey::Code(KeyCode::Space),
            ElementState::Pressed,
        );
        assert!(input.snapshot_for_tick().pause_pressed());
    }

    #[test]
    fn debug_toggle_edge_is_single_tick() {
        let mut input = InputCollector::default();
        input.handle_keyboard_input(PhysicalKey::Code(KeyCode::F3), ElementState::Pressed);
        assert!(input.snapshot_for_tick().debug_pressed());
        assert!(!input.snapshot_for_tick().debug_pressed());
    }

    #[test]
    fn escape_marks_quit_requested() {
        let mut input = InputCollector::default();
        input.handle_keyboard_input(
            PhysicalKey::Code(KeyCode::Escape),
            ElementState::Pressed,
        );
        assert!(input.snapshot_for_tick().quit_requested());
    }

    #[test]
    fn cursor_position_carries_into_snapshot() {
        let mut input = InputCollector::default();
        input.set_cursor_position(Some(Vec2::new(12.0, 34.0)));
        let snapshot = input.snapshot_for_tick();
        let cursor = snapshot.cursor_position_px().expect("cursor");
        assert_eq!(cursor, Vec2::new(12.0, 34.0));

        input.set_cursor_position(None);
        assert!(input.snapshot_for_tick().cursor_position_px().is_none());
    }

    #[test]
    fn cursor_hint_maps_to_cursor_icon() {
        assert_eq!(
            cursor_icon_for_hint(CursorHint::Default),
            CursorIcon::Default
        );
        assert_eq!(cursor_icon_for_hint(CursorHint::Busy), CursorIcon::Progress);
        assert_eq!(cursor_icon_for_hint(CursorHint::Action), CursorIcon::Pointer);
    }

    #[test]
    fn zero_durations_fall_back_to_defaults() {
        assert_eq!(
            normalize_non_zero_duration(Duration::ZERO, Duration::from_millis(100)),
            Duration::from_millis(100)
        );
        assert_eq!(
            normalize_non_zero_duration(Duration::from_millis(7), Duration::from_millis(100)),
            Duration::from_millis(7)
        );
    }
}
