use engine::{Canvas, Rgba, Vec2};
use rand::Rng;

use super::entity::Entity;
use super::session::SessionState;

/// Particles draw over the ship and sea but under every UI overlay.
pub const PARTICLE_DEPTH: i32 = 50;

const STEAM_LIFETIME_SECONDS: f32 = 1.8;
const STEAM_SPEED: f32 = 26.0;
const STEAM_SPREAD_RADIANS: f32 = 0.5;
const STEAM_COLOR: Rgba = [230, 232, 236, 210];
/// Steam rises and curls sideways as the drift force bends its direction.
const STEAM_FORCE: Vec2 = Vec2 { x: 0.55, y: -1.3 };

const SPRAY_LIFETIME_SECONDS: f32 = 0.8;
const SPRAY_SPEED: f32 = 58.0;
const SPRAY_COLOR: Rgba = [205, 228, 242, 230];
const SPRAY_GRAVITY: Vec2 = Vec2 { x: 0.0, y: 2.6 };

const DUST_LIFETIME_SECONDS: f32 = 0.7;
const DUST_SPEED: f32 = 34.0;
const DUST_COLOR: Rgba = [184, 162, 120, 225];
const DUST_GRAVITY: Vec2 = Vec2 { x: 0.0, y: 1.8 };

const UP: Vec2 = Vec2 { x: 0.0, y: -1.0 };

/// Short-lived visual effect. Created and expiry stamps are in simulation
/// seconds; once the clock passes expiry the particle marks itself dead and
/// is swept out by the registry's next compaction.
pub struct Particle {
    created: f32,
    expires: f32,
    position: Vec2,
    direction: Vec2,
    force: Vec2,
    speed: f32,
    size_px: f32,
    color: Rgba,
    alive: bool,
}

impl Particle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        now: f32,
        lifetime_seconds: f32,
        position: Vec2,
        direction: Vec2,
        force: Vec2,
        speed: f32,
        size_px: f32,
        color: Rgba,
    ) -> Self {
        Self {
            created: now,
            expires: now + lifetime_seconds,
            position,
            direction,
            force,
            speed,
            size_px,
            color,
            alive: true,
        }
    }

    pub fn steam<R: Rng>(now: f32, position: Vec2, rng: &mut R) -> Self {
        let direction = rotated(UP, rng.gen_range(-STEAM_SPREAD_RADIANS..=STEAM_SPREAD_RADIANS));
        Self::new(
            now,
            STEAM_LIFETIME_SECONDS,
            position,
            direction,
            STEAM_FORCE,
            STEAM_SPEED,
            rng.gen_range(4.0..=7.0),
            STEAM_COLOR,
        )
    }

    pub fn spray<R: Rng>(now: f32, position: Vec2, rng: &mut R) -> Self {
        let direction = rotated(UP, rng.gen_range(-1.2..=1.2f32));
        Self::new(
            now,
            SPRAY_LIFETIME_SECONDS,
            position,
            direction,
            SPRAY_GRAVITY,
            SPRAY_SPEED * rng.gen_range(0.7..=1.0),
            rng.gen_range(2.0..=4.0),
            SPRAY_COLOR,
        )
    }

    pub fn dust<R: Rng>(now: f32, position: Vec2, rng: &mut R) -> Self {
        let direction = rotated(UP, rng.gen_range(-1.4..=1.4f32));
        Self::new(
            now,
            DUST_LIFETIME_SECONDS,
            position,
            direction,
            DUST_GRAVITY,
            DUST_SPEED * rng.gen_range(0.5..=1.0),
            rng.gen_range(2.0..=5.0),
            DUST_COLOR,
        )
    }

    fn lifetime_fraction(&self, now: f32) -> f32 {
        let span = self.expires - self.created;
        if span <= 0.0 {
            return 1.0;
        }
        ((now - self.created) / span).clamp(0.0, 1.0)
    }
}

impl Entity for Particle {
    fn depth(&self) -> i32 {
        PARTICLE_DEPTH
    }

    fn alive(&self) -> bool {
        self.alive
    }

    fn update(&mut self, dt_seconds: f32, state: &mut SessionState) {
        if state.elapsed_seconds >= self.expires {
            self.alive = false;
            return;
        }
        self.position = self.position.plus(self.direction.scaled(self.speed * dt_seconds));
        // Bending rather than accelerating: the force steers the unit
        // direction, which gives the curved steam and spray arcs.
        self.direction = self
            .direction
            .plus(self.force.scaled(dt_seconds))
            .normalized_or(self.direction);
    }

    fn render(&self, canvas: &mut dyn Canvas, state: &SessionState) {
        let alpha = 1.0 - self.lifetime_fraction(state.elapsed_seconds);
        canvas.push();
        canvas.set_alpha(alpha);
        let half = self.size_px * 0.5;
        canvas.fill_rect(
            self.position.x - half,
            self.position.y - half,
            self.size_px,
            self.size_px,
            self.color,
        );
        canvas.pop();
    }
}

fn rotated(v: Vec2, theta: f32) -> Vec2 {
    let (sin, cos) = theta.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}
