use super::line::{self, LineAlgorithm};
use super::pixel_count;
use crate::color::{blend_over, Color};
use crate::kernels::{kernels_for, Backend, PixelKernels};
use crate::sprite::Sprite;
use std::collections::TryReserveError;

// ============================================================================
// PixelBuffer
// ============================================================================

/// Packed `0xRRGGBBAA` pixel grid for software rendering.
///
/// Every drawing call takes signed coordinates and silently drops pixels that
/// fall outside `[0, width) x [0, height)`. Bulk work (spans, rows) runs on
/// the buffer's kernel set.
pub struct PixelBuffer {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
    kernels: &'static dyn PixelKernels,
    line: LineAlgorithm,
}

impl PixelBuffer {
    /// Buffer cleared to transparent black, kernels picked for this CPU
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_kernels(width, height, kernels_for(Backend::Auto))
    }

    pub fn with_kernels(width: u32, height: u32, kernels: &'static dyn PixelKernels) -> Self {
        Self {
            pixels: vec![0; pixel_count(width, height)],
            width,
            height,
            kernels,
            line: LineAlgorithm::default(),
        }
    }

    /// Like [`PixelBuffer::with_kernels`] but reports allocation failure
    pub fn try_with_kernels(
        width: u32,
        height: u32,
        kernels: &'static dyn PixelKernels,
    ) -> Result<Self, TryReserveError> {
        let len = pixel_count(width, height);
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, 0);
        Ok(Self {
            pixels,
            width,
            height,
            kernels,
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

    #[inline]
    pub fn line_algorithm(&self) -> LineAlgorithm {
        self.line
    }

    pub fn set_line_algorithm(&mut self, line: LineAlgorithm) {
        self.line = line;
    }

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32
    }

    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Clip a rectangle to the buffer; returns (x0, y0, x1, y1) exclusive
    fn clip_rect(&self, x: i32, y: i32, w: i32, h: i32) -> Option<(usize, usize, usize, usize)> {
        if w <= 0 || h <= 0 {
            return None;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    /// Fill the whole buffer with one color
    pub fn clear(&mut self, color: Color) {
        self.kernels.fill_span(&mut self.pixels, color.pack());
    }

    /// Read a pixel (bounds checked)
    #[inline]
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<Color> {
        if self.in_bounds(x, y) {
            Some(Color::unpack(self.pixels[self.pixel_index(x as u32, y as u32)]))
        } else {
            None
        }
    }

    /// Overwrite a single pixel (bounds checked)
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if self.in_bounds(x, y) {
            let idx = self.pixel_index(x as u32, y as u32);
            self.pixels[idx] = color.pack();
        }
    }

    /// Source-over a single pixel (bounds checked)
    #[inline]
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color) {
        if color.is_transparent() || !self.in_bounds(x, y) {
            return;
        }
        let idx = self.pixel_index(x as u32, y as u32);
        self.pixels[idx] = blend_over(color, Color::unpack(self.pixels[idx])).pack();
    }

    // ========================================================================
    // Lines
    // ========================================================================

    /// Line with the buffer's configured algorithm
    pub fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let (w, h) = (self.width, self.height);
        line::walk(self.line, x0, y0, x1, y1, w, h, |x, y| self.set_pixel(x, y, color));
    }

    /// Blended line with the buffer's configured algorithm
    pub fn draw_line_blend(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let (w, h) = (self.width, self.height);
        line::walk(self.line, x0, y0, x1, y1, w, h, |x, y| self.blend_pixel(x, y, color));
    }

    /// Batched parametric line regardless of configuration
    pub fn draw_line_parametric(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let (w, h) = (self.width, self.height);
        line::parametric(x0, y0, x1, y1, w, h, |x, y| self.set_pixel(x, y, color));
    }

    pub fn draw_line_parametric_blend(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Color) {
        let (w, h) = (self.width, self.height);
        line::parametric(x0, y0, x1, y1, w, h, |x, y| self.blend_pixel(x, y, color));
    }

    // ========================================================================
    // Rectangles
    // ========================================================================

    /// 1px outline: top, left, right, bottom edges
    pub fn draw_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        if w <= 0 || h <= 0 {
            return;
        }
        let (right, bottom) = (x.saturating_add(w - 1), y.saturating_add(h - 1));
        self.draw_line(x, y, right, y, color);
        self.draw_line(x, y, x, bottom, color);
        self.draw_line(right, y, right, bottom, color);
        self.draw_line(x, bottom, right, bottom, color);
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        let Some((x0, y0, x1, y1)) = self.clip_rect(x, y, w, h) else {
            return;
        };
        let packed = color.pack();
        let stride = self.width as usize;
        for row in y0..y1 {
            let start = row * stride;
            self.kernels
                .fill_span(&mut self.pixels[start + x0..start + x1], packed);
        }
    }

    pub fn fill_rect_blend(&mut self, x: i32, y: i32, w: i32, h: i32, color: Color) {
        if color.is_transparent() {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.clip_rect(x, y, w, h) else {
            return;
        };
        let stride = self.width as usize;
        for row in y0..y1 {
            let start = row * stride;
            self.kernels
                .blend_span(&mut self.pixels[start + x0..start + x1], color);
        }
    }

    // ========================================================================
    // Sprites
    // ========================================================================

    /// Visible part of a `w x h` block placed at (x, y):
    /// (first source column, first source row, dest x, dest y, columns, rows)
    fn clip_block(&self, x: i32, y: i32, w: u32, h: u32) -> Option<(usize, usize, usize, usize, usize, usize)> {
        let (dx0, dy0, dx1, dy1) = self.clip_rect(x, y, w as i32, h as i32)?;
        let sx = (dx0 as i64 - x as i64) as usize;
        let sy = (dy0 as i64 - y as i64) as usize;
        Some((sx, sy, dx0, dy0, dx1 - dx0, dy1 - dy0))
    }

    /// Copy a sprite with its top-left corner at (x, y); edges clip
    pub fn blit(&mut self, sprite: &Sprite, x: i32, y: i32) {
        let Some((sx, sy, dx, dy, cols, rows)) = self.clip_block(x, y, sprite.width(), sprite.height()) else {
            return;
        };
        let stride = self.width as usize;
        for row in 0..rows {
            let src = &sprite.row(sy + row)[sx..sx + cols];
            let start = (dy + row) * stride + dx;
            self.kernels.copy_row(&mut self.pixels[start..start + cols], src);
        }
    }

    /// Source-over a sprite with its top-left corner at (x, y); edges clip
    pub fn blit_blend(&mut self, sprite: &Sprite, x: i32, y: i32) {
        let Some((sx, sy, dx, dy, cols, rows)) = self.clip_block(x, y, sprite.width(), sprite.height()) else {
            return;
        };
        let stride = self.width as usize;
        for row in 0..rows {
            let src = &sprite.row(sy + row)[sx..sx + cols];
            let start = (dy + row) * stride + dx;
            self.kernels.blend_row(&mut self.pixels[start..start + cols], src);
        }
    }

    // ========================================================================
    // Raw access
    // ========================================================================

    #[inline]
    pub fn as_slice(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Native-endian bytes of the packed words, for RGBA8888 texture upload
    pub fn as_bytes(&self) -> &[u8] {
        // Safety: u32 has no padding and u8 has alignment 1; the byte view
        // covers exactly the same allocation and borrows self immutably.
        unsafe {
            std::slice::from_raw_parts(self.pixels.as_ptr() as *const u8, self.pixels.len() * 4)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{ScalarKernels, SimdKernels};

    static SCALAR: ScalarKernels = ScalarKernels;
    static SIMD: SimdKernels = SimdKernels;

    const RED: Color = Color::rgb(255, 0, 0);

    fn buffer(kernels: &'static dyn PixelKernels) -> PixelBuffer {
        let mut buf = PixelBuffer::with_kernels(16, 12, kernels);
        buf.clear(Color::BLACK);
        buf
    }

    fn count(buf: &PixelBuffer, color: Color) -> usize {
        buf.as_slice().iter().filter(|&&p| p == color.pack()).count()
    }

    #[test]
    fn test_out_of_bounds_draws_are_dropped() {
        let mut buf = buffer(&SCALAR);
        let before = buf.as_slice().to_vec();
        let half = Color::rgba(255, 255, 255, 128);
        for &(x, y) in &[(-1, 0), (0, -1), (16, 0), (0, 12), (-50, -50), (i32::MAX, 3)] {
            buf.set_pixel(x, y, RED);
            buf.blend_pixel(x, y, half);
            buf.fill_rect(x, y, 1, 1, RED);
            buf.fill_rect_blend(x, y, 1, 1, half);
        }
        buf.draw_line(-10, -3, -1, -8, RED);
        buf.draw_line_parametric_blend(20, 0, 40, 11, half);
        buf.fill_rect(16, 0, 10, 10, RED);
        buf.fill_rect(0, -20, 10, 10, RED);
        assert_eq!(buf.as_slice(), &before[..]);
    }

    #[test]
    fn test_fill_rect_clips_at_edges() {
        let mut buf = buffer(&SCALAR);
        buf.fill_rect(-2, -2, 4, 4, RED);
        assert_eq!(count(&buf, RED), 4);
        buf.fill_rect(14, 10, 10, 10, RED);
        assert_eq!(count(&buf, RED), 8);
        buf.fill_rect(3, 3, 0, 5, RED);
        buf.fill_rect(3, 3, 5, -1, RED);
        assert_eq!(count(&buf, RED), 8);
    }

    #[test]
    fn test_fill_rect_blend_same_on_both_kernel_sets() {
        let mut a = buffer(&SCALAR);
        let mut b = buffer(&SIMD);
        for buf in [&mut a, &mut b] {
            buf.fill_rect(1, 1, 13, 9, Color::rgb(10, 200, 30));
            buf.fill_rect_blend(-3, 2, 11, 7, Color::rgba(255, 0, 128, 77));
            buf.fill_rect_blend(5, 0, 7, 12, Color::rgba(0, 90, 255, 201));
        }
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_rect_outline() {
        let mut buf = buffer(&SCALAR);
        buf.draw_rect(2, 2, 5, 4, RED);
        // 2 * 5 + 2 * (4 - 2) boundary pixels
        assert_eq!(count(&buf, RED), 14);
        assert_eq!(buf.get_pixel(3, 3), Some(Color::BLACK));
        assert_eq!(buf.get_pixel(6, 5), Some(RED));
    }

    #[test]
    fn test_blend_pixel_alpha_extremes() {
        let mut buf = buffer(&SCALAR);
        buf.set_pixel(1, 1, Color::rgba(10, 20, 30, 40));
        buf.blend_pixel(1, 1, Color::rgba(200, 200, 200, 0));
        assert_eq!(buf.get_pixel(1, 1), Some(Color::rgba(10, 20, 30, 40)));
        buf.blend_pixel(1, 1, Color::rgba(1, 2, 3, 255));
        assert_eq!(buf.get_pixel(1, 1), Some(Color::rgba(1, 2, 3, 255)));
    }

    #[test]
    fn test_blit_clips_partial_sprite() {
        let sprite = Sprite::from_colors(4, 4, vec![RED; 16]).unwrap();
        let mut buf = buffer(&SIMD);
        buf.blit(&sprite, -2, -1);
        assert_eq!(count(&buf, RED), 2 * 3);
        buf.blit(&sprite, 14, 10);
        assert_eq!(count(&buf, RED), 6 + 4);
        // Fully off-screen
        buf.blit(&sprite, 100, 0);
        buf.blit(&sprite, 0, -4);
        assert_eq!(count(&buf, RED), 10);
    }

    #[test]
    fn test_blit_blend_same_on_both_kernel_sets() {
        let pixels: Vec<Color> = (0..11 * 5)
            .map(|i| Color::rgba((i * 37) as u8, (i * 11) as u8, 255 - i as u8, (i * 23) as u8))
            .collect();
        let sprite = Sprite::from_colors(11, 5, pixels).unwrap();
        let mut a = buffer(&SCALAR);
        let mut b = buffer(&SIMD);
        for buf in [&mut a, &mut b] {
            buf.fill_rect(0, 0, 8, 12, Color::rgba(40, 80, 120, 160));
            buf.blit_blend(&sprite, -1, 3);
            buf.blit_blend(&sprite, 9, 8);
        }
        assert_eq!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_later_draws_win() {
        let mut buf = buffer(&SCALAR);
        buf.fill_rect(0, 0, 4, 4, RED);
        buf.draw_line(0, 0, 3, 3, Color::WHITE);
        assert_eq!(buf.get_pixel(2, 2), Some(Color::WHITE));
        assert_eq!(buf.get_pixel(2, 1), Some(RED));
    }

    #[test]
    fn test_extreme_coordinates_clip_without_overflow() {
        let mut buf = PixelBuffer::new(16, 12);
        buf.clear(Color::BLACK);
        buf.draw_line(i32::MIN, 0, i32::MAX, 0, RED);
        assert_eq!(count(&buf, RED), 16);
        assert!((0..16).all(|x| buf.get_pixel(x, 0) == Some(RED)));

        buf.draw_line_parametric(-2_000_000_000, 5, 2_000_000_000, 5, Color::WHITE);
        assert_eq!(count(&buf, Color::WHITE), 16);

        let before = buf.as_slice().to_vec();
        buf.draw_rect(i32::MAX - 1, 0, 5, 5, RED);
        buf.draw_line_blend(i32::MIN, i32::MIN, -1, i32::MAX, Color::rgba(0, 0, 255, 128));
        buf.draw_line_parametric_blend(i32::MAX, 0, i32::MAX, 11, Color::rgba(0, 0, 255, 128));
        buf.fill_rect(i32::MAX, i32::MAX, i32::MAX, i32::MAX, RED);
        buf.blit(&Sprite::from_colors(2, 2, vec![RED; 4]).unwrap(), i32::MAX, i32::MAX);
        assert_eq!(buf.as_slice(), &before[..]);
    }

    #[test]
    fn test_rect_outline_clipped_by_edge() {
        let mut buf = buffer(&SCALAR);
        buf.draw_rect(10, 8, i32::MAX, i32::MAX, RED);
        // Only the top and left edges are on the surface
        assert_eq!(count(&buf, RED), 6 + 4 - 1);
    }

    #[test]
    fn test_parametric_configuration_keeps_endpoints() {
        let mut buf = buffer(&SIMD);
        assert_eq!(buf.line_algorithm(), LineAlgorithm::Bresenham);
        buf.set_line_algorithm(LineAlgorithm::Parametric);
        buf.draw_line(1, 1, 14, 6, RED);
        assert_eq!(buf.get_pixel(1, 1), Some(RED));
        assert_eq!(buf.get_pixel(14, 6), Some(RED));
        assert_eq!(count(&buf, RED), 14);
    }

    #[test]
    fn test_as_bytes_covers_every_pixel() {
        let buf = buffer(&SCALAR);
        assert_eq!(buf.as_bytes().len(), 16 * 12 * 4);
    }
}
