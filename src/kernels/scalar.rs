use super::PixelKernels;
use crate::color::{blend_packed, Color};
use crate::palette::Palette;

/// Reference kernels: one pixel per iteration
pub struct ScalarKernels;

impl PixelKernels for ScalarKernels {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn fill_span(&self, dst: &mut [u32], packed: u32) {
        for px in dst {
            *px = packed;
        }
    }

    fn blend_span(&self, dst: &mut [u32], color: Color) {
        if color.is_transparent() {
            return;
        }
        let src = color.pack();
        for px in dst {
            *px = blend_packed(src, *px);
        }
    }

    fn copy_row(&self, dst: &mut [u32], src: &[u32]) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d = *s;
        }
    }

    fn blend_row(&self, dst: &mut [u32], src: &[u32]) {
        for (d, s) in dst.iter_mut().zip(src) {
            *d = blend_packed(*s, *d);
        }
    }

    fn convert_indices(&self, dst: &mut [u32], src: &[u8], palette: &Palette) {
        let table = palette.packed();
        for (d, &i) in dst.iter_mut().zip(src) {
            *d = table[i as usize];
        }
    }

    fn upscale2x(&self, dst: &mut [u32], src: &[u32], width: usize, height: usize) {
        debug_assert!(src.len() >= width * height);
        debug_assert!(dst.len() >= width * height * 4);
        let dw = width * 2;
        for y in 0..height {
            for x in 0..width {
                let c = src[y * width + x];
                let (dx, dy) = (x * 2, y * 2);
                dst[dy * dw + dx] = c;
                dst[dy * dw + dx + 1] = c;
                dst[(dy + 1) * dw + dx] = c;
                dst[(dy + 1) * dw + dx + 1] = c;
            }
        }
    }
}
