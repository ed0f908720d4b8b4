use std::process::ExitCode;

use engine::{run_app, LoopConfig, Sound};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod app;

use app::{CanvasMenu, GameConfig, Session};

/// Forwards cues to the log until a real audio backend is wired in.
#[derive(Debug, Default)]
struct CueLogger;

impl Sound for CueLogger {
    fn play(&mut self, cue: &str) {
        debug!(cue, "sound_cue");
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let loop_config = LoopConfig::default();
    let viewport = (loop_config.logical_width, loop_config.logical_height);
    let session = Session::new(
        GameConfig::load_or_default(),
        viewport,
        Box::new(CanvasMenu::new(viewport)),
        Box::new(CueLogger),
        StdRng::from_entropy(),
    );

    if let Err(error) = run_app(loop_config, Box::new(session)) {
        error!(error = %error, "startup_failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
