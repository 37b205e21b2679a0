mod index_buffer;
pub mod line;
mod pixel_buffer;
#[cfg(feature = "window")]
mod sdl;

pub use index_buffer::IndexBuffer;
pub use line::LineAlgorithm;
pub use pixel_buffer::PixelBuffer;
#[cfg(feature = "window")]
pub use sdl::{SdlPresenter, SdlWindow};

/// Cells in a `width x height` grid, computed without `u32` overflow.
/// Saturates on 32-bit targets so oversized grids fail to allocate.
#[inline]
pub(crate) fn pixel_count(width: u32, height: u32) -> usize {
    (width as usize).saturating_mul(height as usize)
}

/// Sink for finished frames
pub trait Presenter {
    /// Show one output-resolution frame
    fn present(&mut self, frame: &PixelBuffer) -> Result<(), String>;

    /// Drain pending window events; false once the user asked to quit
    fn should_run(&mut self) -> bool;
}
