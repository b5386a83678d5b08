//! Pure geometry on the arena floor (X/Z plane).
//!
//! Polygons are ordered point sequences treated as closed: the last point connects back to the
//! first. Nothing here keeps state between calls.

use crate::vec2::{self, Vec2};

/// Denominator guard for near-zero lengths.
const DEGENERATE_EPS: f64 = 1e-9;

/// Shoelace area. Positive when the points wind counter-clockwise in (x, z).
pub fn signed_area(points: &[Vec2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        sum += a.x * b.z - b.x * a.z;
    }
    sum / 2.0
}

/// Length of the closed outline.
pub fn perimeter(points: &[Vec2]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    points
        .iter()
        .enumerate()
        .map(|(i, &a)| vec2::distance(a, points[(i + 1) % points.len()]))
        .sum()
}

/// Arithmetic mean of the points.
pub fn centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    let sum = points.iter().fold(Vec2::ZERO, |acc, &p| vec2::add(acc, p));
    vec2::scale(sum, 1.0 / points.len() as f64)
}

/// Distance from `p` to the line through `a` and `b`.
/// Falls back to the distance to `a` when the two anchors coincide.
pub fn perpendicular_distance(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let ab = vec2::sub(b, a);
    let len = vec2::length(ab);
    if len < DEGENERATE_EPS {
        return vec2::distance(p, a);
    }
    vec2::cross(ab, vec2::sub(p, a)).abs() / len
}

/// Ramer-Douglas-Peucker simplification.
///
/// Keeps both end points and every point that deviates more than `epsilon` from the chord of
/// its sub-range. Inputs of two points or fewer are returned unchanged.
pub fn simplify(points: &[Vec2], epsilon: f64) -> Vec<Vec2> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;
    mark_kept(points, 0, last, epsilon, &mut keep);

    points
        .iter()
        .zip(keep)
        .filter_map(|(&p, kept)| kept.then_some(p))
        .collect()
}

fn mark_kept(points: &[Vec2], first: usize, last: usize, epsilon: f64, keep: &mut [bool]) {
    if last <= first + 1 {
        return;
    }
    let mut max_dist = 0.0;
    let mut split = first;
    for i in (first + 1)..last {
        let d = perpendicular_distance(points[i], points[first], points[last]);
        if d > max_dist {
            max_dist = d;
            split = i;
        }
    }
    if max_dist > epsilon {
        keep[split] = true;
        mark_kept(points, first, split, epsilon, keep);
        mark_kept(points, split, last, epsilon, keep);
    }
}

/// Resample the closed outline to `n` points evenly spaced by arc length, starting at the
/// first input point.
pub fn resample(points: &[Vec2], n: usize) -> Vec<Vec2> {
    if points.is_empty() || n == 0 {
        return Vec::new();
    }
    let m = points.len();
    let seg_lens: Vec<f64> = (0..m)
        .map(|i| vec2::distance(points[i], points[(i + 1) % m]))
        .collect();
    let total: f64 = seg_lens.iter().sum();
    if m < 2 || total < DEGENERATE_EPS {
        return vec![points[0]; n];
    }

    let step = total / n as f64;
    let mut out = Vec::with_capacity(n);
    let mut seg = 0;
    let mut seg_start = 0.0;
    for k in 0..n {
        let target = k as f64 * step;
        while seg < m - 1 && seg_start + seg_lens[seg] < target {
            seg_start += seg_lens[seg];
            seg += 1;
        }
        let len = seg_lens[seg];
        let t = if len > DEGENERATE_EPS {
            ((target - seg_start) / len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(vec2::lerp(points[seg], points[(seg + 1) % m], t));
    }
    out
}

/// Center on the centroid and scale so the RMS distance from the origin is 1.
pub fn normalize(points: &[Vec2]) -> Vec<Vec2> {
    let c = centroid(points);
    let centered: Vec<Vec2> = points.iter().map(|&p| vec2::sub(p, c)).collect();
    if centered.is_empty() {
        return centered;
    }
    let mean_sq = centered.iter().map(|&p| vec2::dot(p, p)).sum::<f64>() / centered.len() as f64;
    let rms = mean_sq.sqrt();
    if rms < DEGENERATE_EPS {
        return centered;
    }
    centered.iter().map(|&p| vec2::scale(p, 1.0 / rms)).collect()
}

/// Mean distance between points at equal indices. Extra points of the longer input are ignored.
/// Empty input yields infinity so it never wins a comparison.
pub fn average_point_distance(a: &[Vec2], b: &[Vec2]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return f64::INFINITY;
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&p, &q)| vec2::distance(p, q))
        .sum();
    sum / n as f64
}

/// Smallest `average_point_distance` over every cyclic start offset and both winding directions
/// of `candidate`. Makes the comparison independent of where and which way a loop was drawn.
pub fn aligned_distance(candidate: &[Vec2], reference: &[Vec2]) -> f64 {
    let n = candidate.len();
    if n == 0 || reference.is_empty() {
        return f64::INFINITY;
    }
    let reversed: Vec<Vec2> = candidate.iter().rev().copied().collect();
    let mut best = f64::INFINITY;
    let mut shifted = Vec::with_capacity(n);
    for outline in [candidate, reversed.as_slice()] {
        for offset in 0..n {
            shifted.clear();
            shifted.extend(outline[offset..].iter().chain(outline[..offset].iter()));
            best = best.min(average_point_distance(&shifted, reference));
        }
    }
    best
}

/// Ray-casting parity test.
pub fn point_in_polygon(p: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.z > p.z) != (b.z > p.z) {
            let x_cross = (b.x - a.x) * (p.z - a.z) / (b.z - a.z) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Axis-aligned bounds as (min, max).
pub fn bounds(points: &[Vec2]) -> Option<(Vec2, Vec2)> {
    let first = *points.first()?;
    Some(points.iter().fold((first, first), |(lo, hi), p| {
        (
            Vec2::new(lo.x.min(p.x), lo.z.min(p.z)),
            Vec2::new(hi.x.max(p.x), hi.z.max(p.z)),
        )
    }))
}

/// Placement of a cell grid on the floor. Cell (0, 0) has its corner at `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub cols: usize,
    pub rows: usize,
    pub cell_size: f64,
    pub origin: Vec2,
}

impl GridLayout {
    /// Grid centered on the world origin
    pub fn centered(cols: usize, rows: usize, cell_size: f64, width: f64, height: f64) -> Self {
        Self {
            cols,
            rows,
            cell_size,
            origin: Vec2::new(-width / 2.0, -height / 2.0),
        }
    }

    pub fn cell_center(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new(
            self.origin.x + (col as f64 + 0.5) * self.cell_size,
            self.origin.z + (row as f64 + 0.5) * self.cell_size,
        )
    }

    /// Cell containing `p`, or None outside the grid.
    pub fn cell_at(&self, p: Vec2) -> Option<(usize, usize)> {
        let fc = ((p.x - self.origin.x) / self.cell_size).floor();
        let fr = ((p.z - self.origin.z) / self.cell_size).floor();
        if !fc.is_finite() || !fr.is_finite() || fc < 0.0 || fr < 0.0 {
            return None;
        }
        let (col, row) = (fc as usize, fr as usize);
        (col < self.cols && row < self.rows).then_some((col, row))
    }

    /// Index range of cells whose centers lie within [lo, hi] along one axis.
    fn center_span(&self, lo: f64, hi: f64, origin: f64, count: usize) -> Option<(usize, usize)> {
        let first = ((lo - origin) / self.cell_size - 0.5).ceil().max(0.0);
        let last = ((hi - origin) / self.cell_size - 0.5).floor();
        if !first.is_finite() || !last.is_finite() || last < first || count == 0 {
            return None;
        }
        let last = (last as usize).min(count - 1);
        let first = first as usize;
        (first <= last).then_some((first, last))
    }
}

/// All cells whose center lies inside `polygon`, as (col, row).
///
/// Only cells inside the polygon's bounding box are tested.
pub fn cells_covered(polygon: &[Vec2], layout: &GridLayout) -> Vec<(usize, usize)> {
    let Some((lo, hi)) = bounds(polygon) else {
        return Vec::new();
    };
    let Some((c0, c1)) = layout.center_span(lo.x, hi.x, layout.origin.x, layout.cols) else {
        return Vec::new();
    };
    let Some((r0, r1)) = layout.center_span(lo.z, hi.z, layout.origin.z, layout.rows) else {
        return Vec::new();
    };

    let mut covered = Vec::new();
    for row in r0..=r1 {
        for col in c0..=c1 {
            if point_in_polygon(layout.cell_center(col, row), polygon) {
                covered.push((col, row));
            }
        }
    }
    covered
}

/// `n` points on a circle, counter-clockwise from angle 0.
pub fn circle_points(center: Vec2, radius: f64, n: usize) -> Vec<Vec2> {
    (0..n)
        .map(|i| {
            let a = std::f64::consts::TAU * i as f64 / n as f64;
            Vec2::new(center.x + radius * a.cos(), center.z + radius * a.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec2::vec2;

    fn square(size: f64) -> Vec<Vec2> {
        vec![
            vec2(0.0, 0.0),
            vec2(size, 0.0),
            vec2(size, size),
            vec2(0.0, size),
        ]
    }

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() < tol,
            "Expected {} to be within {} of {}",
            actual,
            tol,
            expected
        );
    }

    #[test]
    fn signed_area_of_square() {
        assert_close(signed_area(&square(10.0)), 100.0, 1e-9);
        let mut cw = square(10.0);
        cw.reverse();
        assert_close(signed_area(&cw), -100.0, 1e-9);
    }

    #[test]
    fn area_of_degenerate_input_is_zero() {
        assert_eq!(signed_area(&[]), 0.0);
        assert_eq!(signed_area(&[vec2(1.0, 1.0), vec2(2.0, 2.0)]), 0.0);
    }

    #[test]
    fn perimeter_of_square_includes_closing_edge() {
        assert_close(perimeter(&square(10.0)), 40.0, 1e-9);
    }

    #[test]
    fn simplify_keeps_short_input_verbatim() {
        let pts = vec![vec2(0.0, 0.0), vec2(1.0, 1.0)];
        assert_eq!(simplify(&pts, 5.0), pts);
        assert!(simplify(&[], 5.0).is_empty());
    }

    #[test]
    fn simplify_drops_collinear_points() {
        let pts: Vec<Vec2> = (0..=10).map(|i| vec2(i as f64, 0.0)).collect();
        let simplified = simplify(&pts, 0.5);
        assert_eq!(simplified, vec![vec2(0.0, 0.0), vec2(10.0, 0.0)]);
    }

    #[test]
    fn simplify_keeps_corners_and_drops_jitter() {
        // Dense square outline with small noise on the edges, closed back at the start
        let mut pts = Vec::new();
        for i in 0..10 {
            pts.push(vec2(i as f64 * 10.0, if i % 2 == 0 { 0.5 } else { -0.5 }));
        }
        for i in 0..10 {
            pts.push(vec2(100.0, i as f64 * 10.0));
        }
        for i in 0..10 {
            pts.push(vec2(100.0 - i as f64 * 10.0, 100.0));
        }
        for i in 0..10 {
            pts.push(vec2(0.0, 100.0 - i as f64 * 10.0));
        }
        pts.push(vec2(0.0, 0.0));
        let simplified = simplify(&pts, 2.0);
        assert!(simplified.len() <= 6, "got {} points", simplified.len());
        assert!(simplified.contains(&vec2(100.0, 0.0)));
        assert!(simplified.contains(&vec2(100.0, 100.0)));
        assert!(simplified.contains(&vec2(0.0, 100.0)));
    }

    #[test]
    fn simplify_handles_loop_with_coincident_ends() {
        let mut pts = circle_points(vec2(0.0, 0.0), 50.0, 40);
        pts.push(pts[0]);
        let simplified = simplify(&pts, 2.0);
        assert!(simplified.len() > 4);
        assert!(signed_area(&simplified).abs() > 5000.0);
    }

    #[test]
    fn resample_gives_requested_count_evenly_spaced() {
        let pts = resample(&square(10.0), 8);
        assert_eq!(pts.len(), 8);
        assert_eq!(pts[0], vec2(0.0, 0.0));
        assert_close(pts[1].x, 5.0, 1e-9);
        assert_close(pts[2].x, 10.0, 1e-9);
        assert_close(pts[4].z, 10.0, 1e-9);
        for i in 0..8 {
            let d = vec2::distance(pts[i], pts[(i + 1) % 8]);
            assert_close(d, 5.0, 1e-9);
        }
    }

    #[test]
    fn resample_of_single_point_repeats_it() {
        let pts = resample(&[vec2(3.0, 4.0)], 5);
        assert_eq!(pts, vec![vec2(3.0, 4.0); 5]);
    }

    #[test]
    fn normalize_centers_and_scales_to_unit_rms() {
        let pts = normalize(&circle_points(vec2(100.0, -40.0), 25.0, 32));
        let c = centroid(&pts);
        assert_close(c.x, 0.0, 1e-9);
        assert_close(c.z, 0.0, 1e-9);
        let rms = (pts.iter().map(|&p| vec2::dot(p, p)).sum::<f64>() / pts.len() as f64).sqrt();
        assert_close(rms, 1.0, 1e-9);
    }

    #[test]
    fn normalize_collapsed_input_stays_finite() {
        let pts = normalize(&[vec2(5.0, 5.0); 4]);
        assert!(pts.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn average_point_distance_truncates_to_shorter() {
        let a = vec![vec2(0.0, 0.0), vec2(1.0, 0.0), vec2(9.0, 9.0)];
        let b = vec![vec2(0.0, 1.0), vec2(1.0, 1.0)];
        assert_close(average_point_distance(&a, &b), 1.0, 1e-9);
        assert!(average_point_distance(&a, &[]).is_infinite());
    }

    #[test]
    fn aligned_distance_ignores_start_and_direction() {
        let reference = normalize(&resample(&circle_points(vec2(0.0, 0.0), 1.0, 64), 32));
        let mut drawn = circle_points(vec2(300.0, 300.0), 80.0, 64);
        drawn.rotate_left(21);
        drawn.reverse();
        let candidate = normalize(&resample(&drawn, 32));
        assert!(average_point_distance(&candidate, &reference) > 0.5);
        assert!(aligned_distance(&candidate, &reference) < 0.1);
    }

    #[test]
    fn point_in_polygon_parity() {
        let sq = square(10.0);
        assert!(point_in_polygon(vec2(5.0, 5.0), &sq));
        assert!(!point_in_polygon(vec2(15.0, 5.0), &sq));
        assert!(!point_in_polygon(vec2(-1.0, 5.0), &sq));
        assert!(!point_in_polygon(vec2(5.0, 5.0), &sq[..2]));
    }

    #[test]
    fn point_in_concave_polygon() {
        // U shape: the notch is outside
        let u = vec![
            vec2(0.0, 0.0),
            vec2(30.0, 0.0),
            vec2(30.0, 30.0),
            vec2(20.0, 30.0),
            vec2(20.0, 10.0),
            vec2(10.0, 10.0),
            vec2(10.0, 30.0),
            vec2(0.0, 30.0),
        ];
        assert!(point_in_polygon(vec2(5.0, 20.0), &u));
        assert!(!point_in_polygon(vec2(15.0, 20.0), &u));
        assert!(point_in_polygon(vec2(15.0, 5.0), &u));
    }

    #[test]
    fn grid_layout_cell_lookup() {
        let layout = GridLayout::centered(40, 26, 60.0, 2400.0, 1600.0);
        assert_eq!(layout.cell_center(0, 0), vec2(-1170.0, -770.0));
        assert_eq!(layout.cell_at(vec2(-1170.0, -770.0)), Some((0, 0)));
        assert_eq!(layout.cell_at(vec2(1199.0, 759.0)), Some((39, 25)));
        assert_eq!(layout.cell_at(vec2(1201.0, 0.0)), None);
        assert_eq!(layout.cell_at(vec2(0.0, 790.0)), None);
        assert_eq!(layout.cell_at(vec2(f64::NAN, 0.0)), None);
    }

    #[test]
    fn cells_covered_matches_full_scan() {
        let layout = GridLayout::centered(40, 26, 60.0, 2400.0, 1600.0);
        let polygon = vec![
            vec2(-300.0, -200.0),
            vec2(250.0, -120.0),
            vec2(100.0, 330.0),
            vec2(-50.0, 90.0),
            vec2(-280.0, 260.0),
        ];
        let mut expected = Vec::new();
        for row in 0..layout.rows {
            for col in 0..layout.cols {
                if point_in_polygon(layout.cell_center(col, row), &polygon) {
                    expected.push((col, row));
                }
            }
        }
        assert!(!expected.is_empty());
        assert_eq!(cells_covered(&polygon, &layout), expected);
    }

    #[test]
    fn cells_covered_outside_grid_is_empty() {
        let layout = GridLayout::centered(10, 10, 10.0, 100.0, 100.0);
        let far = vec![vec2(500.0, 500.0), vec2(600.0, 500.0), vec2(600.0, 600.0)];
        assert!(cells_covered(&far, &layout).is_empty());
        assert!(cells_covered(&[], &layout).is_empty());
    }

    #[test]
    fn cells_covered_clips_to_grid_edge() {
        let layout = GridLayout::centered(10, 10, 10.0, 100.0, 100.0);
        let huge = vec![
            vec2(-1000.0, -1000.0),
            vec2(1000.0, -1000.0),
            vec2(1000.0, 1000.0),
            vec2(-1000.0, 1000.0),
        ];
        assert_eq!(cells_covered(&huge, &layout).len(), 100);
    }
}
