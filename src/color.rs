//! Color packing and source-over compositing
//!
//! Every buffer in the pipeline stores colors as a packed `u32` laid out
//! `0xRRGGBBAA`. That matches SDL's `RGBA8888` texture format, so the output
//! framebuffer can be uploaded without swizzling.

use serde::{Deserialize, Serialize};

pub const R_SHIFT: u32 = 24;
pub const G_SHIFT: u32 = 16;
pub const B_SHIFT: u32 = 8;
pub const A_SHIFT: u32 = 0;

/// An RGBA color with 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    /// Opaque color
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Pack into the canonical `0xRRGGBBAA` word
    #[inline]
    pub const fn pack(self) -> u32 {
        ((self.r as u32) << R_SHIFT)
            | ((self.g as u32) << G_SHIFT)
            | ((self.b as u32) << B_SHIFT)
            | ((self.a as u32) << A_SHIFT)
    }

    /// Inverse of [`Color::pack`]
    #[inline]
    pub const fn unpack(packed: u32) -> Self {
        Self {
            r: (packed >> R_SHIFT) as u8,
            g: (packed >> G_SHIFT) as u8,
            b: (packed >> B_SHIFT) as u8,
            a: (packed >> A_SHIFT) as u8,
        }
    }

    #[inline]
    pub const fn is_transparent(self) -> bool {
        self.a == 0
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

impl From<(u8, u8, u8, u8)> for Color {
    fn from((r, g, b, a): (u8, u8, u8, u8)) -> Self {
        Self::rgba(r, g, b, a)
    }
}

/// Blend one color channel: `round((src * a + dst * (255 - a)) / 255)`
///
/// The `+ 127` bias turns the truncating division into round-to-nearest.
#[inline]
pub fn blend_channel(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((src as u32 * a + dst as u32 * (255 - a) + 127) / 255) as u8
}

/// Composite alpha: `Sa + round(Da * (255 - Sa) / 255)`
#[inline]
pub fn blend_alpha(src_alpha: u8, dst_alpha: u8) -> u8 {
    let inv = 255 - src_alpha as u32;
    (src_alpha as u32 + (dst_alpha as u32 * inv + 127) / 255) as u8
}

/// Source-over composite of `src` onto `dst`
#[inline]
pub fn blend_over(src: Color, dst: Color) -> Color {
    match src.a {
        0 => dst,
        255 => src,
        a => Color {
            r: blend_channel(src.r, dst.r, a),
            g: blend_channel(src.g, dst.g, a),
            b: blend_channel(src.b, dst.b, a),
            a: blend_alpha(a, dst.a),
        },
    }
}

/// [`blend_over`] on packed words
#[inline]
pub fn blend_packed(src: u32, dst: u32) -> u32 {
    match (src >> A_SHIFT) & 0xFF {
        0 => dst,
        255 => src,
        _ => blend_over(Color::unpack(src), Color::unpack(dst)).pack(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout_is_rrggbbaa() {
        assert_eq!(Color::rgba(0x11, 0x22, 0x33, 0x44).pack(), 0x1122_3344);
        assert_eq!(Color::unpack(0xAABB_CCDD), Color::rgba(0xAA, 0xBB, 0xCC, 0xDD));
    }

    #[test]
    fn test_pack_unpack_inverse() {
        for &c in &[Color::BLACK, Color::WHITE, Color::TRANSPARENT, Color::rgba(1, 2, 3, 4)] {
            assert_eq!(Color::unpack(c.pack()), c);
        }
    }

    #[test]
    fn test_zero_alpha_leaves_destination() {
        let dst = Color::rgba(10, 20, 30, 200);
        for r in [0u8, 77, 255] {
            assert_eq!(blend_over(Color::rgba(r, 255 - r, r / 2, 0), dst), dst);
        }
    }

    #[test]
    fn test_opaque_source_overwrites() {
        let dst = Color::rgba(10, 20, 30, 40);
        let src = Color::rgb(200, 100, 50);
        let out = blend_over(src, dst);
        assert_eq!((out.r, out.g, out.b, out.a), (200, 100, 50, 255));
    }

    #[test]
    fn test_half_red_over_black() {
        // r = (255*128 + 0*127 + 127) / 255 = 128, a = 128 + (255*127 + 127) / 255 = 255
        let out = blend_over(Color::rgba(255, 0, 0, 128), Color::BLACK);
        assert_eq!(out, Color::rgba(128, 0, 0, 255));
    }

    #[test]
    fn test_fast_paths_match_formula() {
        // alpha 0 and 255 short-circuit; the general formula gives the same answer
        for dst in [0u8, 1, 128, 254, 255] {
            for src in [0u8, 3, 200, 255] {
                assert_eq!(blend_channel(src, dst, 0), dst);
                assert_eq!(blend_channel(src, dst, 255), src);
            }
            assert_eq!(blend_alpha(0, dst), dst);
            assert_eq!(blend_alpha(255, dst), 255);
        }
    }

    #[test]
    fn test_blend_packed_matches_blend_over() {
        let src = Color::rgba(90, 180, 30, 77);
        let dst = Color::rgba(5, 250, 128, 140);
        assert_eq!(blend_packed(src.pack(), dst.pack()), blend_over(src, dst).pack());
    }
}
