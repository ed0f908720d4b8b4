pub mod app;

pub use app::{
    run_app, AppError, Canvas, CursorHint, FrameCanvas, Game, InputSnapshot, LoopConfig,
    LoopMetrics, NullSound, Rgba, Sound, SpriteStore, Vec2,
};
