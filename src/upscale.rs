//! Power-of-two nearest-neighbor upscaling
//!
//! Every factor is built from the kernel set's 2x pass: 4x runs it twice and
//! 8x three times, through scratch buffers that live only for the call. The
//! result is therefore pixel-identical to chaining 2x passes by hand.

use crate::error::RendererError;
use crate::kernels::PixelKernels;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum UpscaleFactor {
    X1,
    X2,
    X4,
    #[default]
    X8,
}

impl UpscaleFactor {
    /// Linear magnification
    #[inline]
    pub fn factor(self) -> u32 {
        match self {
            UpscaleFactor::X1 => 1,
            UpscaleFactor::X2 => 2,
            UpscaleFactor::X4 => 4,
            UpscaleFactor::X8 => 8,
        }
    }

    /// Number of 2x passes
    #[inline]
    pub fn passes(self) -> u32 {
        self.factor().trailing_zeros()
    }
}

impl TryFrom<u32> for UpscaleFactor {
    type Error = RendererError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(UpscaleFactor::X1),
            2 => Ok(UpscaleFactor::X2),
            4 => Ok(UpscaleFactor::X4),
            8 => Ok(UpscaleFactor::X8),
            other => Err(RendererError::InvalidUpscale(other)),
        }
    }
}

impl From<UpscaleFactor> for u32 {
    fn from(factor: UpscaleFactor) -> u32 {
        factor.factor()
    }
}

/// Magnify `src` (`width x height`) into `dst` by `factor`.
///
/// `dst` must hold `width * height * factor²` pixels.
pub fn upscale(
    kernels: &dyn PixelKernels,
    factor: UpscaleFactor,
    dst: &mut [u32],
    src: &[u32],
    width: usize,
    height: usize,
) {
    let f = factor.factor() as usize;
    assert!(src.len() >= width * height, "source smaller than {}x{}", width, height);
    assert!(
        dst.len() >= width * height * f * f,
        "destination smaller than {}x{}",
        width * f,
        height * f
    );

    match factor {
        UpscaleFactor::X1 => upscale1x(kernels, dst, src, width, height),
        UpscaleFactor::X2 => upscale2x(kernels, dst, src, width, height),
        UpscaleFactor::X4 => upscale4x(kernels, dst, src, width, height),
        UpscaleFactor::X8 => upscale8x(kernels, dst, src, width, height),
    }
}

/// Straight copy
pub fn upscale1x(kernels: &dyn PixelKernels, dst: &mut [u32], src: &[u32], width: usize, height: usize) {
    let n = width * height;
    kernels.copy_row(&mut dst[..n], &src[..n]);
}

pub fn upscale2x(kernels: &dyn PixelKernels, dst: &mut [u32], src: &[u32], width: usize, height: usize) {
    kernels.upscale2x(dst, src, width, height);
}

/// Two 2x passes through one scratch buffer
pub fn upscale4x(kernels: &dyn PixelKernels, dst: &mut [u32], src: &[u32], width: usize, height: usize) {
    let mut mid = vec![0u32; width * height * 4];
    kernels.upscale2x(&mut mid, src, width, height);
    kernels.upscale2x(dst, &mid, width * 2, height * 2);
}

/// Three 2x passes through two scratch buffers
pub fn upscale8x(kernels: &dyn PixelKernels, dst: &mut [u32], src: &[u32], width: usize, height: usize) {
    let mut x2 = vec![0u32; width * height * 4];
    kernels.upscale2x(&mut x2, src, width, height);
    let mut x4 = vec![0u32; width * height * 16];
    kernels.upscale2x(&mut x4, &x2, width * 2, height * 2);
    drop(x2);
    kernels.upscale2x(dst, &x4, width * 4, height * 4);
}
