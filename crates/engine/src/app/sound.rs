/// Fire-and-forget audio capability. Cues are named; no result is consulted.
pub trait Sound {
    fn play(&mut self, cue: &str);
}

/// Discards every cue. Useful for tests and headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSound;

impl Sound for NullSound {
    fn play(&mut self, _cue: &str) {}
}
