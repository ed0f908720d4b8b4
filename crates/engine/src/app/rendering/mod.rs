mod canvas;
mod frame_canvas;

pub use canvas::{Canvas, Rgba};
pub use frame_canvas::{FrameCanvas, SpriteStore};
