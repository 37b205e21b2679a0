//! Point-light shading for sprites
//!
//! Flat shading: every pixel faces the viewer, so only the planar distance to
//! the light matters. Light height (`z`) is carried for callers but does not
//! enter the falloff.

use crate::color::Color;
use crate::display::PixelBuffer;
use crate::sprite::Sprite;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub color: Color,
    /// Scales the attenuated contribution; 1.0 = full light color
    pub intensity: f32,
    range: f32,
    inv_range_sq: f32,
    pub enabled: bool,
}

impl Light {
    pub fn new(x: f32, y: f32, z: f32, color: Color, intensity: f32, range: f32) -> Self {
        let mut light = Self {
            x,
            y,
            z,
            color,
            intensity,
            range: 0.0,
            inv_range_sq: 0.0,
            enabled: true,
        };
        light.set_range(range);
        light
    }

    #[inline]
    pub fn range(&self) -> f32 {
        self.range
    }

    #[inline]
    pub fn inv_range_sq(&self) -> f32 {
        self.inv_range_sq
    }

    /// Non-positive ranges light nothing
    pub fn set_range(&mut self, range: f32) {
        self.range = range.max(0.0);
        self.inv_range_sq = if self.range > 0.0 {
            1.0 / (self.range * self.range)
        } else {
            0.0
        };
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// `(1 - d²/r²) * intensity` inside the range, 0 on or past its edge
    pub fn attenuation_at(&self, px: f32, py: f32) -> f32 {
        if !self.enabled {
            return 0.0;
        }
        let dx = px - self.x;
        let dy = py - self.y;
        let d2 = dx * dx + dy * dy;
        if d2 >= self.range * self.range {
            return 0.0;
        }
        (1.0 - d2 * self.inv_range_sq) * self.intensity
    }

    /// Shade one source color given the attenuation at its position.
    /// Alpha is left as is.
    pub fn shade(&self, src: Color, ambient: f32, attenuation: f32) -> Color {
        let channel = |s: u8, l: u8| -> u8 {
            let lit = (s as f32 / 255.0) * (ambient + attenuation * (l as f32 / 255.0));
            (lit * 255.0).round().clamp(0.0, 255.0) as u8
        };
        Color::rgba(
            channel(src.r, self.color.r),
            channel(src.g, self.color.g),
            channel(src.b, self.color.b),
            src.a,
        )
    }
}

impl PixelBuffer {
    /// Composite `sprite` at its world position, shaded by `light` plus
    /// `ambient` (0.0..=1.0 typical). Transparent source pixels are skipped.
    pub fn draw_lit(&mut self, sprite: &Sprite, light: &Light, ambient: f32) {
        for row in 0..sprite.height() {
            let py = sprite.y.saturating_add(row as i32);
            for col in 0..sprite.width() {
                let Some(src) = sprite.pixel(col, row) else {
                    continue;
                };
                if src.is_transparent() {
                    continue;
                }
                let px = sprite.x.saturating_add(col as i32);
                let attenuation = light.attenuation_at(px as f32, py as f32);
                self.blend_pixel(px, py, light.shade(src, ambient, attenuation));
            }
        }
    }
}
