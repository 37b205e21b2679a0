//! Frame pipeline
//!
//! One frame is: [`Renderer::clear`], any number of draw calls on
//! [`Renderer::indices`] and/or [`Renderer::framebuffer`], then
//! [`Renderer::upscale`] (or [`Renderer::present`], which upscales and hands
//! the output to a presenter). In indexed mode the index buffer is converted
//! to colors the first time the color buffer is touched, so color draws land
//! on top of index draws and call order is preserved.

use crate::config::{RendererConfig, StorageMode};
use crate::display::{IndexBuffer, PixelBuffer, Presenter};
use crate::error::RendererError;
use crate::kernels::{kernels_for, PixelKernels};
use crate::palette::Palette;
use crate::upscale::{self, UpscaleFactor};
use log::{debug, info};

/// Smallest accepted internal width and height
pub const MIN_DIMENSION: u32 = 100;

pub struct Renderer {
    width: u32,
    height: u32,
    factor: UpscaleFactor,
    storage: StorageMode,
    kernels: &'static dyn PixelKernels,
    palette: Palette,
    // Present only in indexed mode
    indices: Option<IndexBuffer>,
    framebuffer: PixelBuffer,
    output: PixelBuffer,
    // Index draws not yet converted into the framebuffer
    pending: bool,
}

impl Renderer {
    /// Validate the config and allocate every buffer.
    ///
    /// Checks run in a fixed order: upscale factor, minimum size, then
    /// divisibility by 4. Nothing is allocated unless all of them pass.
    pub fn new(config: &RendererConfig) -> Result<Self, RendererError> {
        let factor = UpscaleFactor::try_from(config.upscale)?;
        let (width, height) = (config.width, config.height);
        if width < MIN_DIMENSION || height < MIN_DIMENSION {
            return Err(RendererError::DimensionsTooSmall {
                width,
                height,
                min: MIN_DIMENSION,
            });
        }
        if width % 4 != 0 || height % 4 != 0 {
            return Err(RendererError::DimensionsNotDivisibleBy4 { width, height });
        }

        let kernels = kernels_for(config.backend);

        let indices = match config.storage {
            StorageMode::Indexed => {
                let mut buf = IndexBuffer::try_new(width, height)
                    .map_err(|_| RendererError::Allocation { buffer: "index" })?;
                buf.set_line_algorithm(config.line_algorithm);
                Some(buf)
            },
            StorageMode::Direct => None,
        };

        let mut framebuffer = PixelBuffer::try_with_kernels(width, height, kernels)
            .map_err(|_| RendererError::Allocation { buffer: "internal" })?;
        framebuffer.set_line_algorithm(config.line_algorithm);

        let f = factor.factor();
        let (out_w, out_h) = width
            .checked_mul(f)
            .zip(height.checked_mul(f))
            .ok_or(RendererError::Allocation { buffer: "output" })?;
        let mut output = PixelBuffer::try_with_kernels(out_w, out_h, kernels)
            .map_err(|_| RendererError::Allocation { buffer: "output" })?;
        output.set_line_algorithm(config.line_algorithm);

        info!(
            "renderer {}x{} -> {}x{} ({:?}, {} kernels)",
            width,
            height,
            out_w,
            out_h,
            config.storage,
            kernels.name()
        );

        let mut renderer = Self {
            width,
            height,
            factor,
            storage: config.storage,
            kernels,
            palette: Palette::new(config.background),
            indices,
            framebuffer,
            output,
            pending: false,
        };
        renderer.clear();
        Ok(renderer)
    }

    /// Reset the drawing surface to the background
    pub fn clear(&mut self) {
        match self.indices.as_mut() {
            Some(indices) => {
                indices.clear(0);
                self.pending = true;
            },
            None => {
                let background = self.palette.background();
                self.framebuffer.clear(background);
            },
        }
    }

    /// Index surface for this frame.
    ///
    /// `None` in direct mode, and in indexed mode once the frame has been
    /// converted to colors (call [`Renderer::clear`] to start a new frame).
    pub fn indices(&mut self) -> Option<&mut IndexBuffer> {
        if self.pending {
            self.indices.as_mut()
        } else {
            None
        }
    }

    /// Convert pending index draws into the color buffer. No-op when
    /// nothing is pending.
    pub fn resolve(&mut self) {
        if !self.pending {
            return;
        }
        if let Some(indices) = self.indices.as_ref() {
            self.kernels
                .convert_indices(self.framebuffer.as_mut_slice(), indices.as_slice(), &self.palette);
        }
        self.pending = false;
    }

    /// Color surface at internal resolution; resolves pending index draws first
    pub fn framebuffer(&mut self) -> &mut PixelBuffer {
        self.resolve();
        &mut self.framebuffer
    }

    /// Magnify the internal frame into the output buffer
    pub fn upscale(&mut self) {
        self.resolve();
        upscale::upscale(
            self.kernels,
            self.factor,
            self.output.as_mut_slice(),
            self.framebuffer.as_slice(),
            self.width as usize,
            self.height as usize,
        );
    }

    /// Output frame as of the last [`Renderer::upscale`]
    pub fn output(&self) -> &PixelBuffer {
        &self.output
    }

    /// Upscale, hand the frame to `presenter`, and report whether to keep running
    pub fn present(&mut self, presenter: &mut impl Presenter) -> Result<bool, String> {
        self.upscale();
        presenter.present(&self.output)?;
        Ok(presenter.should_run())
    }

    pub fn internal_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn output_size(&self) -> (u32, u32) {
        (self.output.width(), self.output.height())
    }

    pub fn upscale_factor(&self) -> UpscaleFactor {
        self.factor
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.storage
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Register colors here before drawing with their indices
    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    pub fn backend_name(&self) -> &'static str {
        self.kernels.name()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        debug!("renderer {}x{} released", self.width, self.height);
    }
}
