mod background;
mod config;
mod entity;
mod hud;
mod menu;
mod module;
mod particles;
mod session;
mod ship;

pub use config::GameConfig;
pub use menu::CanvasMenu;
pub use session::Session;
