//! Fixed-capacity color palette
//!
//! Index 0 is reserved for the background color and is present from
//! construction. Colors are appended in insertion order and never removed.
//! Once all 256 slots are taken further inserts are ignored: callers that grow
//! the palette from arbitrary images see unmatched colors fall back to index 0
//! instead of an error.

use crate::color::Color;
use log::debug;

pub const PALETTE_CAPACITY: usize = 256;

/// Per-channel lookup tables, one byte per palette index
#[derive(Clone)]
pub struct ChannelTables {
    pub r: [u8; PALETTE_CAPACITY],
    pub g: [u8; PALETTE_CAPACITY],
    pub b: [u8; PALETTE_CAPACITY],
    pub a: [u8; PALETTE_CAPACITY],
}

#[derive(Clone)]
pub struct Palette {
    colors: Vec<Color>,
    // Packed copy of every slot; unused slots hold the background
    packed: [u32; PALETTE_CAPACITY],
    tables: ChannelTables,
}

impl Palette {
    /// Create a palette whose index 0 is `background`
    pub fn new(background: Color) -> Self {
        let mut colors = Vec::with_capacity(PALETTE_CAPACITY);
        colors.push(background);
        Self {
            colors,
            packed: [background.pack(); PALETTE_CAPACITY],
            tables: ChannelTables {
                r: [background.r; PALETTE_CAPACITY],
                g: [background.g; PALETTE_CAPACITY],
                b: [background.b; PALETTE_CAPACITY],
                a: [background.a; PALETTE_CAPACITY],
            },
        }
    }

    /// Number of registered colors, background included
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Never true: the background entry always exists
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.colors.len() >= PALETTE_CAPACITY
    }

    #[inline]
    pub fn background(&self) -> Color {
        self.colors[0]
    }

    /// Color at `index`, if that slot is in use
    #[inline]
    pub fn get(&self, index: u8) -> Option<Color> {
        self.colors.get(index as usize).copied()
    }

    /// Linear scan for an exact (r, g, b, a) match
    pub fn find_color(&self, color: Color) -> Option<u8> {
        self.colors
            .iter()
            .position(|&c| c == color)
            .map(|i| i as u8)
    }

    /// Register a color, returning its index.
    ///
    /// An existing entry is reused. Returns `None` only when the color is new
    /// and the palette is already full; the insert is then dropped.
    pub fn add_color(&mut self, color: Color) -> Option<u8> {
        if let Some(index) = self.find_color(color) {
            return Some(index);
        }
        if self.is_full() {
            debug!("palette full, ignoring {:?}", color);
            return None;
        }

        let index = self.colors.len();
        self.colors.push(color);
        self.packed[index] = color.pack();
        self.tables.r[index] = color.r;
        self.tables.g[index] = color.g;
        self.tables.b[index] = color.b;
        self.tables.a[index] = color.a;
        Some(index as u8)
    }

    /// Register every distinct color in `colors`.
    /// Returns how many new entries were added.
    pub fn learn_colors(&mut self, colors: impl IntoIterator<Item = Color>) -> usize {
        let before = self.len();
        let mut dropped = 0usize;
        for color in colors {
            if self.add_color(color).is_none() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!("palette learning dropped {} pixels with unregistered colors", dropped);
        }
        self.len() - before
    }

    /// [`Palette::learn_colors`] over a raw RGBA byte source
    pub fn learn_rgba(&mut self, rgba: &[u8]) -> usize {
        self.learn_colors(
            rgba.chunks_exact(4)
                .map(|px| Color::rgba(px[0], px[1], px[2], px[3])),
        )
    }

    /// Packed colors for all 256 indices
    #[inline]
    pub fn packed(&self) -> &[u32; PALETTE_CAPACITY] {
        &self.packed
    }

    /// Split R, G, B, A lookup tables for batched gathers
    #[inline]
    pub fn channel_tables(&self) -> &ChannelTables {
        &self.tables
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_is_index_zero() {
        let palette = Palette::new(Color::rgb(1, 2, 3));
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.find_color(Color::rgb(1, 2, 3)), Some(0));
        assert_eq!(palette.packed()[255], Color::rgb(1, 2, 3).pack());
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut palette = Palette::default();
        for r in 0..50u8 {
            let color = Color::rgba(r, 255 - r, r.wrapping_mul(3), 200);
            let first = palette.add_color(color).unwrap();
            let len = palette.len();
            assert_eq!(palette.add_color(color), Some(first));
            assert_eq!(palette.find_color(color), Some(first));
            assert_eq!(palette.len(), len);
        }
    }

    #[test]
    fn test_alpha_distinguishes_entries() {
        let mut palette = Palette::default();
        let a = palette.add_color(Color::rgba(9, 9, 9, 255)).unwrap();
        let b = palette.add_color(Color::rgba(9, 9, 9, 128)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_full_palette_ignores_new_colors() {
        let mut palette = Palette::default();
        for i in 1..PALETTE_CAPACITY {
            assert_eq!(palette.add_color(Color::rgb(i as u8, 0, 1)), Some(i as u8));
        }
        assert!(palette.is_full());
        assert_eq!(palette.add_color(Color::rgb(0, 7, 7)), None);
        assert_eq!(palette.find_color(Color::rgb(0, 7, 7)), None);
        assert_eq!(palette.len(), PALETTE_CAPACITY);
        // Existing colors still resolve
        assert_eq!(palette.add_color(Color::rgb(17, 0, 1)), Some(17));
    }

    #[test]
    fn test_tables_track_inserts() {
        let mut palette = Palette::default();
        let idx = palette.add_color(Color::rgba(10, 20, 30, 40)).unwrap() as usize;
        let t = palette.channel_tables();
        assert_eq!((t.r[idx], t.g[idx], t.b[idx], t.a[idx]), (10, 20, 30, 40));
        assert_eq!(palette.packed()[idx], 0x0A14_1E28);
    }

    #[test]
    fn test_learn_rgba_counts_new_colors() {
        let mut palette = Palette::default();
        let rgba = [
            255, 0, 0, 255, //
            255, 0, 0, 255, //
            0, 0, 0, 255, // background already present
            0, 255, 0, 128,
        ];
        assert_eq!(palette.learn_rgba(&rgba), 2);
        assert_eq!(palette.len(), 3);
    }
}
