//! Line sample generators shared by the color and index surfaces
//!
//! Both generators take the target surface size and only walk the stretch of
//! the major axis that lies inside it, so a line spanning the whole `i32`
//! range costs no more than one across the buffer. Samples outside the
//! buffer on the minor axis are still passed to `plot`; the surfaces drop
//! them. All stepping runs in `i64`, so any pair of `i32` endpoints is valid.

use serde::{Deserialize, Serialize};

/// Samples evaluated per batch by the parametric walker
const LINE_LANES: usize = 4;

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

/// Which rasterizer `draw_line` uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineAlgorithm {
    /// Integer midpoint walk, 8-connected, exact endpoints
    #[default]
    Bresenham,
    /// Batched `P0 + t * (P1 - P0) / steps` sampling. Not bit-identical to
    /// Bresenham: rounding can pick a different pixel on some columns.
    Parametric,
}

/// Cohen-Sutherland region code of a point against `[0, w) x [0, h)`
fn outcode(x: i64, y: i64, w: i64, h: i64) -> u8 {
    let mut code = INSIDE;
    if x < 0 {
        code |= LEFT;
    } else if x >= w {
        code |= RIGHT;
    }
    if y < 0 {
        code |= TOP;
    } else if y >= h {
        code |= BOTTOM;
    }
    code
}

/// Both endpoints beyond the same edge: nothing of the line can show
fn trivially_outside(x0: i64, y0: i64, x1: i64, y1: i64, w: i64, h: i64) -> bool {
    outcode(x0, y0, w, h) & outcode(x1, y1, w, h) != 0
}

/// Steps `[first, last]` of a walk from `start` moving `dir` (+1/-1) per
/// step for `steps` steps whose coordinate stays in `[0, limit)`
fn visible_steps(start: i64, dir: i64, steps: i64, limit: i64) -> Option<(i64, i64)> {
    let (lo, hi) = if dir > 0 {
        (-start, limit - 1 - start)
    } else {
        (start - (limit - 1), start)
    };
    let (first, last) = (lo.max(0), hi.min(steps));
    (first <= last).then_some((first, last))
}

/// Minor-axis moves Bresenham has made after `i` major-axis steps:
/// `ceil((2 * i * minor - major) / (2 * major))`
fn minor_moves(i: i64, major: i64, minor: i64) -> i64 {
    let num = 2 * i as i128 * minor as i128 - major as i128;
    let den = 2 * major as i128;
    -((-num).div_euclid(den)) as i64
}

/// Integer Bresenham from (x0, y0) to (x1, y1), both endpoints included.
///
/// Samples are identical to walking the whole line from (x0, y0); the walk
/// just starts at the first step whose major coordinate is on the surface.
pub fn bresenham(
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    width: u32,
    height: u32,
    mut plot: impl FnMut(i32, i32),
) {
    let (x0, y0, x1, y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
    let (w, h) = (width as i64, height as i64);
    if trivially_outside(x0, y0, x1, y1, w, h) {
        return;
    }

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (major, minor) = (dx.max(dy), dx.min(dy));
    if major == 0 {
        plot(x0 as i32, y0 as i32);
        return;
    }

    let x_major = dx >= dy;
    let visible = if x_major {
        visible_steps(x0, sx, major, w)
    } else {
        visible_steps(y0, sy, major, h)
    };
    let Some((first, last)) = visible else {
        return;
    };

    // Fast-forward position and error term to step `first`
    let skipped = minor_moves(first, major, minor);
    let (mut x, mut y, mut err) = if x_major {
        let err = (dx - dy) as i128 - first as i128 * dy as i128 + skipped as i128 * dx as i128;
        (x0 + sx * first, y0 + sy * skipped, err as i64)
    } else {
        let err = (dx - dy) as i128 - skipped as i128 * dy as i128 + first as i128 * dx as i128;
        (x0 + sx * skipped, y0 + sy * first, err as i64)
    };

    for i in first..=last {
        plot(x as i32, y as i32);
        if i == last {
            break;
        }
        let e2 = err * 2;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Parametric line walk, four samples per batch.
///
/// `steps = max(|dx|, |dy|)`; sample `t` lands on
/// `round(x0 + t * dx / steps), round(y0 + t * dy / steps)` with ties to even.
/// Lanes past the last visible sample in the final batch are masked off.
pub fn parametric(
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    width: u32,
    height: u32,
    mut plot: impl FnMut(i32, i32),
) {
    let (x0, y0, x1, y1) = (x0 as i64, y0 as i64, x1 as i64, y1 as i64);
    let (w, h) = (width as i64, height as i64);
    if trivially_outside(x0, y0, x1, y1, w, h) {
        return;
    }

    let (dx, dy) = (x1 - x0, y1 - y0);
    let steps = dx.abs().max(dy.abs());
    if steps == 0 {
        plot(x0 as i32, y0 as i32);
        return;
    }

    // The major axis moves exactly one pixel per sample
    let visible = if dx.abs() >= dy.abs() {
        visible_steps(x0, dx.signum(), steps, w)
    } else {
        visible_steps(y0, dy.signum(), steps, h)
    };
    let Some((first, last)) = visible else {
        return;
    };

    let step_x = dx as f64 / steps as f64;
    let step_y = dy as f64 / steps as f64;
    let (ox, oy) = (x0 as f64, y0 as f64);

    let mut t = first;
    while t <= last {
        let mut xs = [0i64; LINE_LANES];
        let mut ys = [0i64; LINE_LANES];
        for lane in 0..LINE_LANES {
            let s = (t + lane as i64) as f64;
            xs[lane] = (ox + s * step_x).round_ties_even() as i64;
            ys[lane] = (oy + s * step_y).round_ties_even() as i64;
        }

        let live = ((last - t + 1) as usize).min(LINE_LANES);
        for lane in 0..live {
            plot(xs[lane] as i32, ys[lane] as i32);
        }
        t += LINE_LANES as i64;
    }
}

/// Dispatch on `algorithm`
#[inline]
pub fn walk(
    algorithm: LineAlgorithm,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    width: u32,
    height: u32,
    plot: impl FnMut(i32, i32),
) {
    match algorithm {
        LineAlgorithm::Bresenham => bresenham(x0, y0, x1, y1, width, height, plot),
        LineAlgorithm::Parametric => parametric(x0, y0, x1, y1, width, height, plot),
    }
}
