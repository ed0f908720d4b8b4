/// 2D vector in logical pixels. Y grows downward, matching the framebuffer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn plus(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub fn scaled(self, factor: f32) -> Vec2 {
        Vec2 {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Unit vector in the same direction, or `fallback` when the vector is
    /// degenerate (zero length or non-finite components).
    pub fn normalized_or(self, fallback: Vec2) -> Vec2 {
        let length = self.length();
        if length <= f32::EPSILON || !length.is_finite() {
            return fallback;
        }
        self.scaled(1.0 / length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_of_axis_vectors() {
        assert_eq!(Vec2::new(3.0, 0.0).length(), 3.0);
        assert_eq!(Vec2::new(0.0, -4.0).length(), 4.0);
        assert_eq!(Vec2::ZERO.length(), 0.0);
    }

    #[test]
    fn plus_and_scaled_compose() {
        let value = Vec2::new(1.0, -2.0).plus(Vec2::new(2.0, 5.0)).scaled(2.0);
        assert_eq!(value, Vec2::new(6.0, 6.0));
    }

    #[test]
    fn normalized_vector_has_unit_length() {
        let unit = Vec2::new(3.0, 4.0).normalized_or(Vec2::ZERO);
        assert!((unit.length() - 1.0).abs() < 0.0001);
        assert!((unit.x - 0.6).abs() < 0.0001);
        assert!((unit.y - 0.8).abs() < 0.0001);
    }

    #[test]
    fn normalizing_zero_vector_returns_fallback() {
        let fallback = Vec2::new(0.0, -1.0);
        assert_eq!(Vec2::ZERO.normalized_or(fallback), fallback);
    }

    #[test]
    fn normalizing_non_finite_vector_returns_fallback() {
        let fallback = Vec2::new(1.0, 0.0);
        assert_eq!(Vec2::new(f32::NAN, 0.0).normalized_or(fallback), fallback);
        assert_eq!(
            Vec2::new(f32::INFINITY, 1.0).normalized_or(fallback),
            fallback
        );
    }
}
