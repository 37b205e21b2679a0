use super::line::{self, LineAlgorithm};
use super::pixel_count;
use std::collections::TryReserveError;

/// Grid of palette indices, one byte per pixel.
///
/// Drawing here is a quarter of the memory traffic of the packed color
/// buffer; the frame is turned into colors once by the palette conversion
/// step. Out-of-bounds writes are dropped like on [`super::PixelBuffer`].
pub struct IndexBuffer {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    line: LineAlgorithm,
}

impl IndexBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: vec![0; pixel_count(width, height)],
            width,
            height,
            line: LineAlgorithm::default(),
        }
    }

    pub fn try_new(width: u32, height: u32) -> Result<Self, TryReserveError> {
        let len = pixel_count(width, height);
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, 0);
        Ok(Self {
            pixels,
            width,
            height,
            line: LineAlgorithm::default(),
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_line_algorithm(&mut self, line: LineAlgorithm) {
        self.line = line;
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    #[inline]
    fn pixel_index(&self, x: i32, y: i32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn clear(&mut self, index: u8) {
        self.pixels.fill(index);
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if self.in_bounds(x, y) {
            Some(self.pixels[self.pixel_index(x, y)])
        } else {
            None
        }
    }

    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, index: u8) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x, y);
            self.pixels[idx] = index;
        }
    }

    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, index: u8) {
        let (w, h) = (self.width, self.height);
        line::walk(self.line, x0, y0, x1, y1, w, h, |x, y| self.set_pixel(x, y, index));
    }

    pub fn draw_line_parametric(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, index: u8) {
        let (w, h) = (self.width, self.height);
        line::parametric(x0, y0, x1, y1, w, h, |x, y| self.set_pixel(x, y, index));
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, index: u8) {
        if w <= 0 || h <= 0 {
            return;
        }
        let (right, bottom) = (x.saturating_add(w - 1), y.saturating_add(h - 1));
        self.draw_line(x, y, right, y, index);
        self.draw_line(x, y, x, bottom, index);
        self.draw_line(right, y, right, bottom, index);
        self.draw_line(x, bottom, right, bottom, index);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, index: u8) {
        if w <= 0 || h <= 0 {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return;
        }
        let stride = self.width as usize;
        for row in y0 as usize..y1 as usize {
            self.pixels[row * stride + x0 as usize..row * stride + x1 as usize].fill(index);
        }
    }

    /// Copy a `src_width`-wide block of indices with its top-left at (x, y).
    /// Index 0 is the background slot and leaves the destination untouched.
    pub fn blit_indices(&mut self, src: &[u8], src_width: u32, x: i32, y: i32) {
        if src_width == 0 {
            return;
        }
        for (row, chunk) in src.chunks_exact(src_width as usize).enumerate() {
            let dy = y.saturating_add(row as i32);
            for (col, &index) in chunk.iter().enumerate() {
                if index != 0 {
                    self.set_pixel(x.saturating_add(col as i32), dy, index);
                }
            }
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.pixels
    }
}
