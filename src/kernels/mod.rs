//! Bulk pixel kernels
//!
//! Every hot loop in the pipeline (span fills, span and row blends, palette
//! conversion, 2x upscale) goes through a [`PixelKernels`] implementation.
//! The scalar set is the reference; the SIMD set batches pixels into lanes and
//! must produce identical output. The set is picked once when a renderer is
//! built and then shared by every buffer it owns.

mod scalar;
mod simd;

pub use scalar::ScalarKernels;
pub use simd::SimdKernels;

use crate::color::Color;
use crate::palette::Palette;
use log::debug;
use serde::{Deserialize, Serialize};

/// Bulk operations on packed `0xRRGGBBAA` pixels
pub trait PixelKernels: Send + Sync {
    fn name(&self) -> &'static str;

    /// Overwrite every pixel of `dst` with `packed`
    fn fill_span(&self, dst: &mut [u32], packed: u32);

    /// Source-over `color` onto every pixel of `dst`
    fn blend_span(&self, dst: &mut [u32], color: Color);

    /// Copy `src` into `dst` (same length)
    fn copy_row(&self, dst: &mut [u32], src: &[u32]);

    /// Source-over each `src` pixel onto the matching `dst` pixel (same length)
    fn blend_row(&self, dst: &mut [u32], src: &[u32]);

    /// `dst[i] = palette[src[i]]` for the common length of both slices
    fn convert_indices(&self, dst: &mut [u32], src: &[u8], palette: &Palette);

    /// Nearest-neighbor 2x magnification: `dst` is `2w x 2h`
    fn upscale2x(&self, dst: &mut [u32], src: &[u32], width: usize, height: usize);
}

/// Which kernel set to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// SIMD when the CPU supports it, scalar otherwise
    #[default]
    Auto,
    Scalar,
    Simd,
}

impl Backend {
    /// Replace `Auto` with the concrete backend for this machine
    pub fn resolve(self) -> Backend {
        match self {
            Backend::Auto => {
                if simd_supported() {
                    Backend::Simd
                } else {
                    Backend::Scalar
                }
            },
            other => other,
        }
    }
}

static SCALAR: ScalarKernels = ScalarKernels;
static SIMD: SimdKernels = SimdKernels;

/// Kernel set for `backend`, resolving `Auto` through CPU feature detection
pub fn kernels_for(backend: Backend) -> &'static dyn PixelKernels {
    let kernels: &'static dyn PixelKernels = match backend.resolve() {
        Backend::Simd => &SIMD,
        _ => &SCALAR,
    };
    debug!("pixel kernels: {} (requested {:?})", kernels.name(), backend);
    kernels
}

#[cfg(target_arch = "x86_64")]
fn simd_supported() -> bool {
    std::arch::is_x86_feature_detected!("sse2")
}

#[cfg(target_arch = "aarch64")]
fn simd_supported() -> bool {
    std::arch::is_aarch64_feature_detected!("neon")
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn simd_supported() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    /// xorshift32 so the comparisons below cover varied data deterministically
    struct Noise(u32);

    impl Noise {
        fn next(&mut self) -> u32 {
            self.0 ^= self.0 << 13;
            self.0 ^= self.0 >> 17;
            self.0 ^= self.0 << 5;
            self.0
        }

        fn pixels(&mut self, n: usize) -> Vec<u32> {
            (0..n).map(|_| self.next()).collect()
        }
    }

    fn with_alpha_extremes(mut pixels: Vec<u32>) -> Vec<u32> {
        // Sprinkle fully transparent and fully opaque sources between partial ones
        for (i, p) in pixels.iter_mut().enumerate() {
            match i % 5 {
                0 => *p &= 0xFFFF_FF00,
                1 => *p |= 0xFF,
                _ => {},
            }
        }
        pixels
    }

    #[test]
    fn test_auto_resolves_to_concrete_backend() {
        assert_ne!(Backend::Auto.resolve(), Backend::Auto);
        assert_eq!(Backend::Scalar.resolve(), Backend::Scalar);
        assert_eq!(kernels_for(Backend::Scalar).name(), "scalar");
        assert_eq!(kernels_for(Backend::Simd).name(), "simd");
    }

    #[test]
    fn test_fill_span_matches() {
        for len in [0usize, 1, 3, 4, 5, 15, 16, 17, 64] {
            let mut a = vec![7u32; len];
            let mut b = vec![7u32; len];
            SCALAR.fill_span(&mut a, 0xDEAD_BEEF);
            SIMD.fill_span(&mut b, 0xDEAD_BEEF);
            assert_eq!(a, b, "len {}", len);
            assert!(a.iter().all(|&p| p == 0xDEAD_BEEF));
        }
    }

    #[test]
    fn test_blend_span_matches() {
        let mut noise = Noise(0x1234_5678);
        for alpha in [0u8, 1, 64, 128, 200, 254, 255] {
            for len in [1usize, 4, 7, 8, 9, 33] {
                let dst = noise.pixels(len);
                let color = Color::rgba(250, 10, 128, alpha);
                let mut a = dst.clone();
                let mut b = dst;
                SCALAR.blend_span(&mut a, color);
                SIMD.blend_span(&mut b, color);
                assert_eq!(a, b, "alpha {} len {}", alpha, len);
            }
        }
    }

    #[test]
    fn test_blend_row_matches() {
        let mut noise = Noise(0xCAFE_F00D);
        for len in [1usize, 7, 8, 9, 16, 23, 100] {
            let src = with_alpha_extremes(noise.pixels(len));
            let dst = noise.pixels(len);
            let mut a = dst.clone();
            let mut b = dst;
            SCALAR.blend_row(&mut a, &src);
            SIMD.blend_row(&mut b, &src);
            assert_eq!(a, b, "len {}", len);
        }
    }

    #[test]
    fn test_blend_row_matches_for_every_alpha() {
        let mut noise = Noise(0x0BAD_5EED);
        for alpha in 0..=255u32 {
            let src: Vec<u32> = noise.pixels(16).iter().map(|p| (p & 0xFFFF_FF00) | alpha).collect();
            let mut dst = noise.pixels(16);
            // Channel extremes on both sides of the formula
            dst[0] = 0;
            dst[1] = u32::MAX;
            let mut a = dst.clone();
            let mut b = dst;
            SCALAR.blend_row(&mut a, &src);
            SIMD.blend_row(&mut b, &src);
            assert_eq!(a, b, "alpha {}", alpha);
        }
    }

    #[test]
    fn test_convert_indices_covers_all_table_quarters() {
        let mut palette = Palette::default();
        for i in 1..256u32 {
            palette.add_color(Color::rgba(i as u8, !(i as u8), (i * 7) as u8, (i * 13) as u8));
        }
        assert!(palette.is_full());
        let indices: Vec<u8> = (0..=255u8).rev().collect();
        let mut out = vec![0u32; 256];
        SIMD.convert_indices(&mut out, &indices, &palette);
        for (px, &idx) in out.iter().zip(&indices) {
            assert_eq!(*px, palette.packed()[idx as usize], "index {}", idx);
        }
    }

    #[test]
    fn test_copy_row_matches() {
        let mut noise = Noise(99);
        let src = noise.pixels(13);
        let mut a = vec![0u32; 13];
        let mut b = vec![0u32; 13];
        SCALAR.copy_row(&mut a, &src);
        SIMD.copy_row(&mut b, &src);
        assert_eq!(a, src);
        assert_eq!(b, src);
    }

    #[test]
    fn test_convert_indices_matches_for_every_tail_length() {
        let mut palette = Palette::default();
        for i in 1..200u32 {
            palette.add_color(Color::unpack(i.wrapping_mul(0x9E37_79B9)));
        }
        let mut noise = Noise(0xBEEF);
        // Lengths around the 16-wide batch exercise the scalar tail
        for len in (0..50).chain([255, 256, 257, 10_000]) {
            let indices: Vec<u8> = (0..len).map(|_| noise.next() as u8).collect();
            let mut a = vec![0u32; len];
            let mut b = vec![0u32; len];
            SCALAR.convert_indices(&mut a, &indices, &palette);
            SIMD.convert_indices(&mut b, &indices, &palette);
            assert_eq!(a, b, "len {}", len);
            for (out, &idx) in a.iter().zip(&indices) {
                assert_eq!(*out, palette.packed()[idx as usize]);
            }
        }
    }

    #[test]
    fn test_upscale2x_matches() {
        let mut noise = Noise(42);
        for (w, h) in [(4usize, 4usize), (8, 4), (12, 8), (100, 100), (6, 3)] {
            let src = noise.pixels(w * h);
            let mut a = vec![0u32; w * h * 4];
            let mut b = vec![0u32; w * h * 4];
            SCALAR.upscale2x(&mut a, &src, w, h);
            SIMD.upscale2x(&mut b, &src, w, h);
            assert_eq!(a, b, "{}x{}", w, h);
            for y in 0..h * 2 {
                for x in 0..w * 2 {
                    assert_eq!(a[y * w * 2 + x], src[(y / 2) * w + x / 2]);
                }
            }
        }
    }
}
