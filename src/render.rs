//! 2D render surface abstraction
//!
//! The scene draws exclusively through these primitives; nothing in the
//! core touches pixels or platform types. The wasm build binds the trait
//! to `CanvasRenderingContext2d`.

use crate::color::Color;

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl TextAlign {
    pub fn as_css(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Primitive drawing surface with an affine transform stack
///
/// `save`/`restore` bracket transform and alpha changes; alpha composes
/// multiplicatively down the scene tree via `multiply_alpha`.
pub trait RenderContext {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f32, y: f32);
    fn rotate(&mut self, radians: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    /// Multiply the current global alpha (undone by `restore`)
    fn multiply_alpha(&mut self, alpha: f32);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color);
    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Color);
    fn stroke_rounded_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        radius: f32,
        line_width: f32,
        color: Color,
    );
    fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color);
    fn stroke_circle(&mut self, x: f32, y: f32, radius: f32, line_width: f32, color: Color);
    fn fill_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font_size: f32,
        color: Color,
        align: TextAlign,
    );
}

#[cfg(target_arch = "wasm32")]
mod canvas {
    use super::{RenderContext, TextAlign};
    use crate::color::Color;
    use web_sys::CanvasRenderingContext2d;

    /// Font stack for all label text
    const FONT_STACK: &str = "-apple-system, 'SF Pro Display', Helvetica, sans-serif";

    /// `RenderContext` over an HTML5 canvas 2D context
    pub struct CanvasSurface {
        ctx: CanvasRenderingContext2d,
    }

    impl CanvasSurface {
        pub fn new(ctx: CanvasRenderingContext2d) -> Self {
            Self { ctx }
        }

        fn rounded_rect_path(&self, x: f64, y: f64, w: f64, h: f64, r: f64) {
            let ctx = &self.ctx;
            ctx.begin_path();
            ctx.move_to(x + r, y);
            ctx.line_to(x + w - r, y);
            ctx.quadratic_curve_to(x + w, y, x + w, y + r);
            ctx.line_to(x + w, y + h - r);
            ctx.quadratic_curve_to(x + w, y + h, x + w - r, y + h);
            ctx.line_to(x + r, y + h);
            ctx.quadratic_curve_to(x, y + h, x, y + h - r);
            ctx.line_to(x, y + r);
            ctx.quadratic_curve_to(x, y, x + r, y);
            ctx.close_path();
        }

        fn circle_path(&self, x: f64, y: f64, radius: f64) {
            self.ctx.begin_path();
            let _ = self.ctx.arc(x, y, radius, 0.0, std::f64::consts::TAU);
        }
    }

    impl RenderContext for CanvasSurface {
        fn save(&mut self) {
            self.ctx.save();
        }

        fn restore(&mut self) {
            self.ctx.restore();
        }

        fn translate(&mut self, x: f32, y: f32) {
            let _ = self.ctx.translate(x as f64, y as f64);
        }

        fn rotate(&mut self, radians: f32) {
            let _ = self.ctx.rotate(radians as f64);
        }

        fn scale(&mut self, sx: f32, sy: f32) {
            let _ = self.ctx.scale(sx as f64, sy as f64);
        }

        fn multiply_alpha(&mut self, alpha: f32) {
            let current = self.ctx.global_alpha();
            self.ctx.set_global_alpha(current * alpha as f64);
        }

        fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
            self.ctx.set_fill_style_str(&color.to_css());
            self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
        }

        fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Color) {
            self.rounded_rect_path(x as f64, y as f64, w as f64, h as f64, radius as f64);
            self.ctx.set_fill_style_str(&color.to_css());
            self.ctx.fill();
        }

        fn stroke_rounded_rect(
            &mut self,
            x: f32,
            y: f32,
            w: f32,
            h: f32,
            radius: f32,
            line_width: f32,
            color: Color,
        ) {
            self.rounded_rect_path(x as f64, y as f64, w as f64, h as f64, radius as f64);
            self.ctx.set_stroke_style_str(&color.to_css());
            self.ctx.set_line_width(line_width as f64);
            self.ctx.stroke();
        }

        fn fill_circle(&mut self, x: f32, y: f32, radius: f32, color: Color) {
            self.circle_path(x as f64, y as f64, radius as f64);
            self.ctx.set_fill_style_str(&color.to_css());
            self.ctx.fill();
        }

        fn stroke_circle(&mut self, x: f32, y: f32, radius: f32, line_width: f32, color: Color) {
            self.circle_path(x as f64, y as f64, radius as f64);
            self.ctx.set_stroke_style_str(&color.to_css());
            self.ctx.set_line_width(line_width as f64);
            self.ctx.stroke();
        }

        fn fill_text(
            &mut self,
            text: &str,
            x: f32,
            y: f32,
            font_size: f32,
            color: Color,
            align: TextAlign,
        ) {
            self.ctx.set_font(&format!("{}px {}", font_size, FONT_STACK));
            self.ctx.set_fill_style_str(&color.to_css());
            self.ctx.set_text_align(align.as_css());
            self.ctx.set_text_baseline("middle");
            let _ = self.ctx.fill_text(text, x as f64, y as f64);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;
