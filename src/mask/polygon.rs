//! Polygon scan conversion.
//!
//! Produces the same pixels as the COCO reference tooling so that masks
//! rendered here line up with masks produced by pycocotools:
//!
//! 1. Vertices are upsampled by [`SCALE`] and rounded to integers.
//! 2. Every edge is walked along its major axis, producing a dense,
//!    8-connected boundary.
//! 3. Each horizontal step of the boundary that lands on a pixel centre
//!    column contributes a crossing at the first pixel centre below it.
//! 4. Sorted crossing offsets (column-major) are turned into run lengths.
//!
//! The fill therefore follows the even-odd rule per column.

const SCALE: f64 = 5.0;

/// Largest coordinate magnitude the rasterizer works with. Each edge is
/// walked point by point in upsampled space, so this also bounds the work
/// and memory spent on a single edge.
pub const MAX_COORDINATE: f64 = 65536.0;

fn upsample(c: f64) -> i64 {
    (SCALE * c.clamp(-MAX_COORDINATE, MAX_COORDINATE) + 0.5) as i64
}

/// Rasterizes one polygon ring (`[x0, y0, x1, y1, ...]`) into column-major
/// run lengths covering exactly `height * width` pixels.
///
/// Odd trailing coordinates are ignored and a ring without vertices covers
/// nothing. Coordinates beyond [`MAX_COORDINATE`] are clamped to it.
pub fn ring_to_runs(xy: &[f64], height: u32, width: u32) -> Vec<u32> {
    let h = height as i64;
    let w = width as i64;
    let k = xy.len() / 2;
    if k == 0 {
        return vec![(h * w) as u32];
    }

    let mut x: Vec<i64> = (0..k).map(|j| upsample(xy[2 * j])).collect();
    let mut y: Vec<i64> = (0..k).map(|j| upsample(xy[2 * j + 1])).collect();
    x.push(x[0]);
    y.push(y[0]);

    // dense boundary points in upsampled space
    let mut u: Vec<i64> = Vec::new();
    let mut v: Vec<i64> = Vec::new();
    for j in 0..k {
        let (mut xs, mut xe, mut ys, mut ye) = (x[j], x[j + 1], y[j], y[j + 1]);
        let dx = (xe - xs).abs();
        let dy = (ys - ye).abs();
        let flip = (dx >= dy && xs > xe) || (dx < dy && ys > ye);
        if flip {
            std::mem::swap(&mut xs, &mut xe);
            std::mem::swap(&mut ys, &mut ye);
        }

        if dx >= dy {
            let s = if dx == 0 { 0.0 } else { (ye - ys) as f64 / dx as f64 };
            for d in 0..=dx {
                let t = if flip { dx - d } else { d };
                u.push(t + xs);
                v.push((ys as f64 + s * t as f64 + 0.5) as i64);
            }
        } else {
            let s = (xe - xs) as f64 / dy as f64;
            for d in 0..=dy {
                let t = if flip { dy - d } else { d };
                v.push(t + ys);
                u.push((xs as f64 + s * t as f64 + 0.5) as i64);
            }
        }
    }

    // crossings, downsampled back to pixel centres
    let mut offsets: Vec<u64> = Vec::new();
    for j in 1..u.len() {
        if u[j] == u[j - 1] {
            continue;
        }
        let xd = if u[j] < u[j - 1] { u[j] } else { u[j] - 1 };
        let xd = (xd as f64 + 0.5) / SCALE - 0.5;
        if xd.floor() != xd || xd < 0.0 || xd > (w - 1) as f64 {
            continue;
        }
        let yd = if v[j] < v[j - 1] { v[j] } else { v[j - 1] };
        let yd = ((yd as f64 + 0.5) / SCALE - 0.5).clamp(0.0, h as f64).ceil();
        offsets.push((xd as i64 * h + yd as i64) as u64);
    }
    offsets.push((h * w) as u64);
    offsets.sort_unstable();

    // offsets -> deltas
    let mut prev = 0u64;
    for offset in offsets.iter_mut() {
        let current = *offset;
        *offset -= prev;
        prev = current;
    }

    // zero-length runs merge their neighbours
    let mut runs: Vec<u32> = Vec::with_capacity(offsets.len());
    runs.push(offsets[0] as u32);
    let mut j = 1;
    while j < offsets.len() {
        if offsets[j] > 0 {
            runs.push(offsets[j] as u32);
            j += 1;
        } else {
            j += 1;
            if j < offsets.len() {
                if let Some(last) = runs.last_mut() {
                    *last += offsets[j] as u32;
                }
                j += 1;
            }
        }
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_covers_canvas() {
        assert_eq!(ring_to_runs(&[0.0, 0.0, 0.0, 2.0, 2.0, 2.0, 2.0, 0.0], 2, 2), vec![0, 4]);
    }

    #[test]
    fn test_runs_always_cover_canvas() {
        let cases: [&[f64]; 3] = [
            &[1.0, 1.0, 6.0, 1.5, 4.0, 7.0],
            &[-3.0, -3.0, 20.0, -1.0, 20.0, 20.0, -2.0, 15.0],
            &[2.5, 2.5, 2.5, 2.5, 2.5, 2.5],
        ];
        for xy in cases {
            let runs = ring_to_runs(xy, 8, 10);
            let total: u64 = runs.iter().map(|&r| r as u64).sum();
            assert_eq!(total, 80, "polygon {xy:?}");
        }
    }

    #[test]
    fn test_degenerate_rings_cover_nothing() {
        let cases: [&[f64]; 3] = [&[], &[1.0, 1.0], &[1.0, 1.0, 1.0, 2.0]];
        for xy in cases {
            assert_eq!(ring_to_runs(xy, 3, 3), vec![9], "ring {xy:?}");
        }
    }

    #[test]
    fn test_huge_coordinates_are_clamped() {
        let runs = ring_to_runs(&[-1e18, 0.0, 1e18, 0.0, 0.0, f64::NAN], 4, 4);
        let total: u64 = runs.iter().map(|&r| r as u64).sum();
        assert_eq!(total, 16);
    }

    #[test]
    fn test_inner_rectangle() {
        // rectangle spanning pixel centres x in {1, 2}, y in {1, 2} on a 4x4 canvas
        let runs = ring_to_runs(&[1.0, 1.0, 3.0, 1.0, 3.0, 3.0, 1.0, 3.0], 4, 4);
        assert_eq!(runs, vec![5, 2, 2, 2, 5]);
    }
}
