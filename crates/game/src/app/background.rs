use engine::{Canvas, Rgba};

const SKY_HIGH_COLOR: Rgba = [126, 168, 196, 255];
const SKY_LOW_COLOR: Rgba = [158, 192, 210, 255];
const HORIZON_COLOR: Rgba = [178, 204, 216, 255];
const CLOUD_COLOR: Rgba = [236, 240, 244, 255];
const SEA_BODY_COLOR: Rgba = [38, 76, 104, 255];
const SEA_FRONT_COLOR: Rgba = [52, 108, 140, 150];
const SEA_SURFACE_COLOR: Rgba = [210, 230, 238, 220];
const WAVE_COLOR: Rgba = [70, 126, 158, 255];

/// Pixels of layer travel per unit of background distance.
const CLOUD_PARALLAX_FACTOR: f32 = 3.0;
const WAVE_PARALLAX_FACTOR: f32 = 14.0;
const CLOUD_SPACING_PX: f32 = 220.0;
const WAVE_SPACING_PX: f32 = 90.0;
/// Exponential approach rate of the smoothed background distance.
const SMOOTHING_RATE_PER_SECOND: f32 = 3.0;

/// Scrolling sky and sea layers.
///
/// Layers advance from a smoothed copy of the gameplay distance, updated on
/// the render clock. Gameplay distance moves in 100 ms steps; chasing it
/// exponentially per frame keeps the scroll continuous instead of jittering
/// with tick timing.
pub struct ParallaxBackground {
    smoothed_distance: f32,
}

impl Default for ParallaxBackground {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallaxBackground {
    pub fn new() -> Self {
        Self {
            smoothed_distance: 0.0,
        }
    }

    fn advance(&mut self, distance: f32, frame_dt_seconds: f32) {
        let blend = 1.0 - (-SMOOTHING_RATE_PER_SECOND * frame_dt_seconds.max(0.0)).exp();
        self.smoothed_distance += (distance - self.smoothed_distance) * blend;
    }

    /// Everything behind the ship: sky bands, drifting clouds, the sea body.
    pub fn render(
        &mut self,
        canvas: &mut dyn Canvas,
        distance: f32,
        frame_dt_seconds: f32,
        waterline_y: f32,
    ) {
        self.advance(distance, frame_dt_seconds);
        let (width, height) = canvas.size();
        let width = width as f32;
        let height = height as f32;

        let band = waterline_y / 3.0;
        canvas.fill_rect(0.0, 0.0, width, band, SKY_HIGH_COLOR);
        canvas.fill_rect(0.0, band, width, band, SKY_LOW_COLOR);
        canvas.fill_rect(0.0, band * 2.0, width, waterline_y - band * 2.0, HORIZON_COLOR);
        canvas.fill_rect(0.0, waterline_y, width, height - waterline_y, SEA_BODY_COLOR);

        let cloud_offset = scroll_offset(
            self.smoothed_distance,
            CLOUD_PARALLAX_FACTOR,
            CLOUD_SPACING_PX,
        );
        let mut x = cloud_offset - CLOUD_SPACING_PX;
        let mut slot = 0u32;
        while x < width + CLOUD_SPACING_PX {
            let y = 30.0 + (slot % 3) as f32 * 34.0;
            canvas.fill_rect(x, y + 8.0, 64.0, 12.0, CLOUD_COLOR);
            canvas.fill_rect(x + 14.0, y, 34.0, 12.0, CLOUD_COLOR);
            x += CLOUD_SPACING_PX;
            slot += 1;
        }

        let wave_offset = scroll_offset(
            self.smoothed_distance,
            WAVE_PARALLAX_FACTOR,
            WAVE_SPACING_PX,
        );
        let mut x = wave_offset - WAVE_SPACING_PX;
        while x < width + WAVE_SPACING_PX {
            canvas.fill_rect(x, waterline_y + 14.0, 40.0, 3.0, WAVE_COLOR);
            canvas.fill_rect(x + 22.0, waterline_y + 34.0, 32.0, 3.0, WAVE_COLOR);
            x += WAVE_SPACING_PX;
        }
    }

    /// Translucent water in front of the ship, so submerged rows read as
    /// underwater, plus the surface line.
    pub fn render_foreground(&self, canvas: &mut dyn Canvas, waterline_y: f32) {
        let (width, height) = canvas.size();
        let width = width as f32;
        canvas.fill_rect(
            0.0,
            waterline_y,
            width,
            height as f32 - waterline_y,
            SEA_FRONT_COLOR,
        );
        canvas.fill_rect(0.0, waterline_y, width, 2.0, SEA_SURFACE_COLOR);
    }
}

/// Leftward scroll offset of a repeating layer, wrapped into `[-spacing, 0]`.
fn scroll_offset(distance: f32, factor: f32, spacing: f32) -> f32 {
    -(distance * factor).rem_euclid(spacing)
}
