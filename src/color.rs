//! RGBA color value type
//!
//! Components are floats in `[0, 1]`; `to_css` produces the `rgba()`
//! syntax the canvas backend consumes.

use crate::lerp;

/// An RGBA color with components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha
    pub const fn with_opacity(self, opacity: f32) -> Self {
        Self {
            r: self.r,
            g: self.g,
            b: self.b,
            a: opacity,
        }
    }

    /// Componentwise linear interpolation
    pub fn lerp(a: Self, b: Self, t: f32) -> Self {
        Self {
            r: lerp(a.r, b.r, t),
            g: lerp(a.g, b.g, t),
            b: lerp(a.b, b.b, t),
            a: lerp(a.a, b.a, t),
        }
    }

    /// CSS `rgba(...)` string for the canvas fill/stroke style
    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            self.a
        )
    }

    // System palette
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const CLEAR: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const RED: Color = Color::new(1.0, 0.231, 0.188);
    pub const ORANGE: Color = Color::new(1.0, 0.584, 0.0);
    pub const YELLOW: Color = Color::new(1.0, 0.8, 0.0);
    pub const GREEN: Color = Color::new(0.204, 0.78, 0.349);
    pub const CYAN: Color = Color::new(0.196, 0.678, 0.902);
    pub const BLUE: Color = Color::new(0.0, 0.478, 1.0);
    pub const PURPLE: Color = Color::new(0.686, 0.322, 0.871);
    pub const GRAY: Color = Color::new(0.557, 0.557, 0.576);
    /// Golden accent used by milestone celebrations
    pub const GOLD: Color = Color::new(1.0, 0.85, 0.2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_opacity_keeps_rgb() {
        let c = Color::RED.with_opacity(0.3);
        assert_eq!(c.r, Color::RED.r);
        assert_eq!(c.a, 0.3);
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = Color::BLACK;
        let b = Color::WHITE;
        assert_eq!(Color::lerp(a, b, 0.0), a);
        assert_eq!(Color::lerp(a, b, 1.0), b);
        let mid = Color::lerp(a, b, 0.5);
        assert!((mid.r - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_to_css() {
        assert_eq!(Color::WHITE.to_css(), "rgba(255, 255, 255, 1)");
        assert_eq!(Color::BLACK.with_opacity(0.5).to_css(), "rgba(0, 0, 0, 0.5)");
    }
}
