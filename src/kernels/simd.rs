//! Lane-batched kernels
//!
//! 128-bit vector code on x86_64 (SSE2) and little-endian aarch64 (NEON).
//! Packed `0xRRGGBBAA` words sit in memory as bytes `A B G R`, so both ISAs
//! work on byte planes in that order. Blends widen to 16-bit lanes and divide
//! by 255 exactly through `(t + 1 + (t >> 8)) >> 8`, which holds for every
//! `t = s*a + d*(255-a) + 127`. The alpha lane blends like a color channel
//! whose source value is 255, so all four lanes share one formula.
//!
//! The palette gather is a `vqtbl4q_u8` table lookup on NEON. SSE2 has no
//! byte shuffle, so x86_64 reads the four channel tables lane by lane and
//! interleaves the planes in registers. Other targets run the same batch
//! shapes in portable code. Each batch loop ends in a scalar tail that uses
//! the same integer formula, so output never depends on the slice length.

use super::PixelKernels;
use crate::color::{blend_packed, Color};
use crate::palette::Palette;

/// Pixels per 128-bit register
const LANES: usize = 4;
/// Pixels per blend batch
const BLEND_LANES: usize = 8;
/// Indices per palette gather batch
const GATHER_LANES: usize = 16;

pub struct SimdKernels;

#[cfg(target_arch = "x86_64")]
mod arch {
    use super::{BLEND_LANES, GATHER_LANES};
    use crate::palette::Palette;
    use std::arch::x86_64::{
        __m128i, _mm_add_epi16, _mm_loadu_si128, _mm_mullo_epi16, _mm_or_si128, _mm_packus_epi16,
        _mm_set1_epi16, _mm_set1_epi32, _mm_setzero_si128, _mm_shufflehi_epi16, _mm_shufflelo_epi16,
        _mm_srli_epi16, _mm_storeu_si128, _mm_sub_epi16, _mm_unpackhi_epi16, _mm_unpackhi_epi32,
        _mm_unpackhi_epi8, _mm_unpacklo_epi16, _mm_unpacklo_epi32, _mm_unpacklo_epi8,
    };

    /// Write `packed` into `dst[0..4]`
    #[inline]
    pub fn splat4(dst: &mut [u32], packed: u32) {
        assert!(dst.len() >= 4);
        // Safety: SSE2 is part of the x86_64 baseline; dst holds at least 4 u32s.
        unsafe {
            _mm_storeu_si128(dst.as_mut_ptr() as *mut __m128i, _mm_set1_epi32(packed as i32));
        }
    }

    /// [p0 p1 p2 p3] -> [p0 p0 p1 p1 p2 p2 p3 p3] into both destination rows
    #[inline]
    pub fn zip4(src: &[u32], row0: &mut [u32], row1: &mut [u32]) {
        assert!(src.len() >= 4 && row0.len() >= 8 && row1.len() >= 8);
        // Safety: lengths checked above; unaligned loads and stores only.
        unsafe {
            let v = _mm_loadu_si128(src.as_ptr() as *const __m128i);
            let lo = _mm_unpacklo_epi32(v, v);
            let hi = _mm_unpackhi_epi32(v, v);
            let d0 = row0.as_mut_ptr() as *mut __m128i;
            let d1 = row1.as_mut_ptr() as *mut __m128i;
            _mm_storeu_si128(d0, lo);
            _mm_storeu_si128(d0.add(1), hi);
            _mm_storeu_si128(d1, lo);
            _mm_storeu_si128(d1.add(1), hi);
        }
    }

    /// Exact `t / 255` on eight u16 lanes, `t <= 65152`
    #[inline]
    unsafe fn div255(t: __m128i) -> __m128i {
        let t1 = _mm_add_epi16(_mm_add_epi16(t, _mm_set1_epi16(1)), _mm_srli_epi16(t, 8));
        _mm_srli_epi16(t1, 8)
    }

    /// Two pixels widened to `A B G R` u16 lanes. `src` supplies the alpha
    /// (words 0 and 4), `opaque` the per-lane source values.
    #[inline]
    unsafe fn blend_wide(src: __m128i, opaque: __m128i, dst: __m128i) -> __m128i {
        let a = _mm_shufflehi_epi16(_mm_shufflelo_epi16(src, 0), 0);
        let inv = _mm_sub_epi16(_mm_set1_epi16(255), a);
        let t = _mm_add_epi16(
            _mm_add_epi16(_mm_mullo_epi16(opaque, a), _mm_mullo_epi16(dst, inv)),
            _mm_set1_epi16(127),
        );
        div255(t)
    }

    /// Source-over four packed pixels
    #[inline]
    unsafe fn blend4(src: __m128i, dst: __m128i) -> __m128i {
        let zero = _mm_setzero_si128();
        let opaque = _mm_or_si128(src, _mm_set1_epi32(0xFF));
        let lo = blend_wide(
            _mm_unpacklo_epi8(src, zero),
            _mm_unpacklo_epi8(opaque, zero),
            _mm_unpacklo_epi8(dst, zero),
        );
        let hi = blend_wide(
            _mm_unpackhi_epi8(src, zero),
            _mm_unpackhi_epi8(opaque, zero),
            _mm_unpackhi_epi8(dst, zero),
        );
        _mm_packus_epi16(lo, hi)
    }

    /// Source-over `src[0..8]` onto `dst[0..8]`
    #[inline]
    pub fn blend8(dst: &mut [u32], src: &[u32]) {
        assert!(dst.len() >= BLEND_LANES && src.len() >= BLEND_LANES);
        // Safety: both slices hold at least 8 u32s; unaligned loads and stores only.
        unsafe {
            let s = src.as_ptr() as *const __m128i;
            let d = dst.as_mut_ptr() as *mut __m128i;
            for i in 0..2 {
                let out = blend4(_mm_loadu_si128(s.add(i)), _mm_loadu_si128(d.add(i) as *const __m128i));
                _mm_storeu_si128(d.add(i), out);
            }
        }
    }

    /// Palette lookup for whole batches; both slices are a multiple of 16 long
    pub fn gather(dst: &mut [u32], src: &[u8], palette: &Palette) {
        let t = palette.channel_tables();
        for (out, idx) in dst
            .chunks_exact_mut(GATHER_LANES)
            .zip(src.chunks_exact(GATHER_LANES))
        {
            let mut planes = [[0u8; GATHER_LANES]; 4];
            for (lane, &k) in idx.iter().enumerate() {
                let k = k as usize;
                planes[0][lane] = t.a[k];
                planes[1][lane] = t.b[k];
                planes[2][lane] = t.g[k];
                planes[3][lane] = t.r[k];
            }
            // Safety: each plane is 16 bytes and `out` holds 16 u32s.
            unsafe {
                let a = _mm_loadu_si128(planes[0].as_ptr() as *const __m128i);
                let b = _mm_loadu_si128(planes[1].as_ptr() as *const __m128i);
                let g = _mm_loadu_si128(planes[2].as_ptr() as *const __m128i);
                let r = _mm_loadu_si128(planes[3].as_ptr() as *const __m128i);
                let ab_lo = _mm_unpacklo_epi8(a, b);
                let ab_hi = _mm_unpackhi_epi8(a, b);
                let gr_lo = _mm_unpacklo_epi8(g, r);
                let gr_hi = _mm_unpackhi_epi8(g, r);
                let o = out.as_mut_ptr() as *mut __m128i;
                _mm_storeu_si128(o, _mm_unpacklo_epi16(ab_lo, gr_lo));
                _mm_storeu_si128(o.add(1), _mm_unpackhi_epi16(ab_lo, gr_lo));
                _mm_storeu_si128(o.add(2), _mm_unpacklo_epi16(ab_hi, gr_hi));
                _mm_storeu_si128(o.add(3), _mm_unpackhi_epi16(ab_hi, gr_hi));
            }
        }
    }
}

#[cfg(all(target_arch = "aarch64", target_endian = "little"))]
mod arch {
    use super::{BLEND_LANES, GATHER_LANES};
    use crate::palette::Palette;
    use std::arch::aarch64::{
        uint16x8_t, uint8x16_t, uint8x16x4_t, uint8x8_t, uint8x8x4_t, vaddq_u16, vdup_n_u8,
        vdupq_n_u16, vdupq_n_u32, vdupq_n_u8, vld1q_u32, vld1q_u8, vld4_u8, vmlaq_u16, vmovl_u8,
        vmovn_u16, vorrq_u8, vqtbl4q_u8, vshrq_n_u16, vst1q_u32, vst4_u8, vst4q_u8, vsubq_u16,
        vsubq_u8, vzip1q_u32, vzip2q_u32,
    };

    /// Write `packed` into `dst[0..4]`
    #[inline]
    pub fn splat4(dst: &mut [u32], packed: u32) {
        assert!(dst.len() >= 4);
        // Safety: NEON is mandatory on aarch64; dst holds at least 4 u32s.
        unsafe {
            vst1q_u32(dst.as_mut_ptr(), vdupq_n_u32(packed));
        }
    }

    /// [p0 p1 p2 p3] -> [p0 p0 p1 p1 p2 p2 p3 p3] into both destination rows
    #[inline]
    pub fn zip4(src: &[u32], row0: &mut [u32], row1: &mut [u32]) {
        assert!(src.len() >= 4 && row0.len() >= 8 && row1.len() >= 8);
        // Safety: lengths checked above.
        unsafe {
            let v = vld1q_u32(src.as_ptr());
            let lo = vzip1q_u32(v, v);
            let hi = vzip2q_u32(v, v);
            vst1q_u32(row0.as_mut_ptr(), lo);
            vst1q_u32(row0.as_mut_ptr().add(4), hi);
            vst1q_u32(row1.as_mut_ptr(), lo);
            vst1q_u32(row1.as_mut_ptr().add(4), hi);
        }
    }

    /// Exact `t / 255` on eight u16 lanes, `t <= 65152`
    #[inline]
    unsafe fn div255(t: uint16x8_t) -> uint16x8_t {
        vshrq_n_u16::<8>(vaddq_u16(vaddq_u16(t, vdupq_n_u16(1)), vshrq_n_u16::<8>(t)))
    }

    /// `(s * a + d * inv + 127) / 255` for one channel plane
    #[inline]
    unsafe fn mix(s: uint8x8_t, d: uint8x8_t, a: uint16x8_t, inv: uint16x8_t) -> uint8x8_t {
        let t = vmlaq_u16(vmlaq_u16(vdupq_n_u16(127), vmovl_u8(s), a), vmovl_u8(d), inv);
        vmovn_u16(div255(t))
    }

    /// Source-over `src[0..8]` onto `dst[0..8]`
    #[inline]
    pub fn blend8(dst: &mut [u32], src: &[u32]) {
        assert!(dst.len() >= BLEND_LANES && src.len() >= BLEND_LANES);
        // Safety: both slices hold at least 8 u32s (32 bytes each).
        unsafe {
            let s = vld4_u8(src.as_ptr() as *const u8);
            let d = vld4_u8(dst.as_ptr() as *const u8);
            let a = vmovl_u8(s.0);
            let inv = vsubq_u16(vdupq_n_u16(255), a);
            let out = uint8x8x4_t(
                mix(vdup_n_u8(255), d.0, a, inv),
                mix(s.1, d.1, a, inv),
                mix(s.2, d.2, a, inv),
                mix(s.3, d.3, a, inv),
            );
            vst4_u8(dst.as_mut_ptr() as *mut u8, out);
        }
    }

    #[inline]
    unsafe fn load_quarter(p: *const u8) -> uint8x16x4_t {
        uint8x16x4_t(vld1q_u8(p), vld1q_u8(p.add(16)), vld1q_u8(p.add(32)), vld1q_u8(p.add(48)))
    }

    /// A 256-entry table as four 64-byte `vqtbl4q_u8` operands
    #[inline]
    unsafe fn load_table(t: &[u8; 256]) -> [uint8x16x4_t; 4] {
        let p = t.as_ptr();
        [load_quarter(p), load_quarter(p.add(64)), load_quarter(p.add(128)), load_quarter(p.add(192))]
    }

    /// `t[idx]` on 16 lanes. Out-of-range lookups give 0, so each quarter
    /// answers only its own index range and the results OR together.
    #[inline]
    unsafe fn lookup(t: &[uint8x16x4_t; 4], idx: uint8x16_t) -> uint8x16_t {
        let step = vdupq_n_u8(64);
        let i1 = vsubq_u8(idx, step);
        let i2 = vsubq_u8(i1, step);
        let i3 = vsubq_u8(i2, step);
        vorrq_u8(
            vorrq_u8(vqtbl4q_u8(t[0], idx), vqtbl4q_u8(t[1], i1)),
            vorrq_u8(vqtbl4q_u8(t[2], i2), vqtbl4q_u8(t[3], i3)),
        )
    }

    /// Palette lookup for whole batches; both slices are a multiple of 16 long
    pub fn gather(dst: &mut [u32], src: &[u8], palette: &Palette) {
        let t = palette.channel_tables();
        // Safety: tables are 256 bytes; each batch reads 16 indices and
        // writes 16 u32s (64 bytes).
        unsafe {
            let (r, g, b, a) = (load_table(&t.r), load_table(&t.g), load_table(&t.b), load_table(&t.a));
            for (out, idx) in dst
                .chunks_exact_mut(GATHER_LANES)
                .zip(src.chunks_exact(GATHER_LANES))
            {
                let i = vld1q_u8(idx.as_ptr());
                let px = uint8x16x4_t(lookup(&a, i), lookup(&b, i), lookup(&g, i), lookup(&r, i));
                vst4q_u8(out.as_mut_ptr() as *mut u8, px);
            }
        }
    }
}

#[cfg(not(any(
    target_arch = "x86_64",
    all(target_arch = "aarch64", target_endian = "little")
)))]
mod arch {
    use super::{BLEND_LANES, GATHER_LANES};
    use crate::color::blend_packed;
    use crate::palette::Palette;

    #[inline]
    pub fn splat4(dst: &mut [u32], packed: u32) {
        dst[..4].copy_from_slice(&[packed; 4]);
    }

    #[inline]
    pub fn zip4(src: &[u32], row0: &mut [u32], row1: &mut [u32]) {
        let doubled = [
            src[0], src[0], src[1], src[1], src[2], src[2], src[3], src[3],
        ];
        row0[..8].copy_from_slice(&doubled);
        row1[..8].copy_from_slice(&doubled);
    }

    #[inline]
    pub fn blend8(dst: &mut [u32], src: &[u32]) {
        for (d, &s) in dst[..BLEND_LANES].iter_mut().zip(&src[..BLEND_LANES]) {
            *d = blend_packed(s, *d);
        }
    }

    pub fn gather(dst: &mut [u32], src: &[u8], palette: &Palette) {
        let table = palette.packed();
        for (out, idx) in dst
            .chunks_exact_mut(GATHER_LANES)
            .zip(src.chunks_exact(GATHER_LANES))
        {
            for (d, &k) in out.iter_mut().zip(idx) {
                *d = table[k as usize];
            }
        }
    }
}

impl PixelKernels for SimdKernels {
    fn name(&self) -> &'static str {
        "simd"
    }

    fn fill_span(&self, dst: &mut [u32], packed: u32) {
        let body = dst.len() - dst.len() % LANES;
        let (head, tail) = dst.split_at_mut(body);
        for chunk in head.chunks_exact_mut(LANES) {
            arch::splat4(chunk, packed);
        }
        for px in tail {
            *px = packed;
        }
    }

    fn blend_span(&self, dst: &mut [u32], color: Color) {
        match color.a {
            0 => return,
            255 => return self.fill_span(dst, color.pack()),
            _ => {},
        }

        let packed = color.pack();
        let src = [packed; BLEND_LANES];
        let body = dst.len() - dst.len() % BLEND_LANES;
        let (head, tail) = dst.split_at_mut(body);
        for chunk in head.chunks_exact_mut(BLEND_LANES) {
            arch::blend8(chunk, &src);
        }
        for px in tail {
            *px = blend_packed(packed, *px);
        }
    }

    fn copy_row(&self, dst: &mut [u32], src: &[u32]) {
        let n = dst.len().min(src.len());
        let body = n - n % LANES;
        for (d, s) in dst[..body]
            .chunks_exact_mut(LANES)
            .zip(src[..body].chunks_exact(LANES))
        {
            d.copy_from_slice(s);
        }
        for i in body..n {
            dst[i] = src[i];
        }
    }

    fn blend_row(&self, dst: &mut [u32], src: &[u32]) {
        let n = dst.len().min(src.len());
        let body = n - n % BLEND_LANES;
        for (d, s) in dst[..body]
            .chunks_exact_mut(BLEND_LANES)
            .zip(src[..body].chunks_exact(BLEND_LANES))
        {
            arch::blend8(d, s);
        }
        for i in body..n {
            dst[i] = blend_packed(src[i], dst[i]);
        }
    }

    fn convert_indices(&self, dst: &mut [u32], src: &[u8], palette: &Palette) {
        let n = dst.len().min(src.len());
        let body = n - n % GATHER_LANES;
        arch::gather(&mut dst[..body], &src[..body], palette);

        let table = palette.packed();
        for i in body..n {
            dst[i] = table[src[i] as usize];
        }
    }

    fn upscale2x(&self, dst: &mut [u32], src: &[u32], width: usize, height: usize) {
        debug_assert!(src.len() >= width * height);
        debug_assert!(dst.len() >= width * height * 4);
        let dw = width * 2;
        let body = width - width % LANES;

        for y in 0..height {
            let srow = &src[y * width..(y + 1) * width];
            let (row0, row1) = dst[y * 2 * dw..(y * 2 + 2) * dw].split_at_mut(dw);

            for x in (0..body).step_by(LANES) {
                arch::zip4(
                    &srow[x..x + LANES],
                    &mut row0[x * 2..x * 2 + LANES * 2],
                    &mut row1[x * 2..x * 2 + LANES * 2],
                );
            }
            for x in body..width {
                let c = srow[x];
                row0[x * 2] = c;
                row0[x * 2 + 1] = c;
                row1[x * 2] = c;
                row1[x * 2 + 1] = c;
            }
        }
    }
}
