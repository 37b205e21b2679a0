//! Sprites: owned RGBA images with a world placement
//!
//! Pixels are kept both as [`Color`]s and as packed words; the packed copy is
//! what the row kernels consume when a sprite is blitted. Pixel data is fixed
//! once the sprite is built; only its placement moves.

use crate::color::Color;
use crate::palette::Palette;

#[derive(Clone, Debug)]
pub struct Sprite {
    width: u32,
    height: u32,
    /// World placement of the top-left corner
    pub x: i32,
    pub y: i32,
    /// Height above the drawing plane. Light falloff is planar and ignores it.
    pub z: f32,
    pixels: Vec<Color>,
    packed: Vec<u32>,
}

impl Sprite {
    /// Sprite from a row-major color array; None when the length is not `width * height`
    pub fn from_colors(width: u32, height: u32, pixels: Vec<Color>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        let packed = pixels.iter().map(|c| c.pack()).collect();
        Some(Self {
            width,
            height,
            x: 0,
            y: 0,
            z: 0.0,
            pixels,
            packed,
        })
    }

    /// Sprite from raw RGBA bytes, 4 per pixel
    pub fn from_rgba(width: u32, height: u32, data: &[u8]) -> Option<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return None;
        }
        let pixels = data
            .chunks_exact(4)
            .map(|px| Color::rgba(px[0], px[1], px[2], px[3]))
            .collect();
        Self::from_colors(width, height, pixels)
    }

    /// Decode an image file (PNG) into a sprite
    #[cfg(feature = "png")]
    pub fn load(path: &str) -> Result<Self, String> {
        let img = image::open(path)
            .map_err(|e| format!("Failed to open {}: {}", path, e))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Self::from_rgba(width, height, &img.into_raw())
            .ok_or_else(|| format!("{}: pixel data does not match {}x{}", path, width, height))
    }

    pub fn with_position(mut self, x: i32, y: i32, z: f32) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self
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
    pub fn pixel(&self, col: u32, row: u32) -> Option<Color> {
        if col < self.width && row < self.height {
            Some(self.pixels[row as usize * self.width as usize + col as usize])
        } else {
            None
        }
    }

    #[inline]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Packed `0xRRGGBBAA` copy of the pixels
    #[inline]
    pub fn packed(&self) -> &[u32] {
        &self.packed
    }

    /// One packed row
    #[inline]
    pub(crate) fn row(&self, row: usize) -> &[u32] {
        let w = self.width as usize;
        &self.packed[row * w..(row + 1) * w]
    }

    /// Palette indices for drawing into an index buffer.
    /// Fully transparent pixels and colors missing from the palette map to 0.
    pub fn to_indices(&self, palette: &Palette) -> Vec<u8> {
        self.pixels
            .iter()
            .map(|&c| {
                if c.is_transparent() {
                    0
                } else {
                    palette.find_color(c).unwrap_or(0)
                }
            })
            .collect()
    }
}
