//! Squarified row placement (Bruls, Huizing & van Wijk 2000).
//!
//! Items are appended to the current row while the row's worst aspect ratio
//! keeps improving; the row is then laid along the shorter side of the free
//! rectangle and the free rectangle shrinks by the row's thickness.

use super::LayoutRect;

/// Place `areas` (sorted descending, summing to roughly `bounds.area()`)
/// inside `bounds`. Returns one rectangle per area, in input order.
///
/// The last item of each row and the last row absorb floating error, so the
/// output tiles `bounds` exactly with no gaps or overlaps.
pub fn squarify(areas: &[f64], bounds: LayoutRect) -> Vec<LayoutRect> {
    let mut out = Vec::with_capacity(areas.len());
    let mut free = bounds;
    let mut start = 0usize;

    while start < areas.len() {
        let side = free.width().min(free.height());
        let first = areas[start];
        let (mut sum, mut min, mut max) = (first, first, first);
        let mut worst = worst_ratio(min, max, sum, side);
        let mut end = start + 1;

        while end < areas.len() {
            let a = areas[end];
            let next = worst_ratio(min.min(a), max.max(a), sum + a, side);
            if next > worst {
                break;
            }
            sum += a;
            min = min.min(a);
            max = max.max(a);
            worst = next;
            end += 1;
        }

        let last_row = end == areas.len();
        layout_row(&areas[start..end], sum, &mut free, last_row, &mut out);
        start = end;
    }

    out
}

fn layout_row(row: &[f64], row_sum: f64, free: &mut LayoutRect, last_row: bool, out: &mut Vec<LayoutRect>) {
    // Shortest side is the row's length; the row grows along the other axis.
    let horizontal = free.width() <= free.height();
    let (length, depth) = if horizontal {
        (free.width(), free.height())
    } else {
        (free.height(), free.width())
    };

    let thickness = if last_row || row_sum <= 0.0 || length <= 0.0 {
        depth
    } else {
        (row_sum / length).min(depth)
    };

    let mut cursor = if horizontal { free.x0 } else { free.y0 };
    for (i, &area) in row.iter().enumerate() {
        let end = if i + 1 == row.len() {
            if horizontal { free.x1 } else { free.y1 }
        } else if row_sum > 0.0 {
            cursor + length * area / row_sum
        } else {
            cursor
        };
        let rect = if horizontal {
            LayoutRect::new(cursor, free.y0, end, free.y0 + thickness)
        } else {
            LayoutRect::new(free.x0, cursor, free.x0 + thickness, end)
        };
        out.push(rect);
        cursor = end;
    }

    if horizontal {
        free.y0 = if last_row { free.y1 } else { free.y0 + thickness };
    } else {
        free.x0 = if last_row { free.x1 } else { free.x0 + thickness };
    }
}

/// Worst aspect ratio of a row with the given stats laid along `side`.
fn worst_ratio(min: f64, max: f64, sum: f64, side: f64) -> f64 {
    if sum <= 0.0 || side <= 0.0 || min <= 0.0 || max <= 0.0 {
        return f64::MAX;
    }
    let side_sq = side * side;
    let sum_sq = sum * sum;
    let a = (side_sq * max) / sum_sq;
    let b = sum_sq / (side_sq * min);
    a.max(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_sum(rects: &[LayoutRect]) -> f64 {
        rects.iter().map(|r| r.area()).sum()
    }

    #[test]
    fn single_item_fills_bounds() {
        let bounds = LayoutRect::new(0.0, 0.0, 192.0, 108.0);
        let rects = squarify(&[bounds.area()], bounds);
        assert_eq!(rects, vec![bounds]);
    }

    #[test]
    fn three_to_one_split() {
        let bounds = LayoutRect::new(0.0, 0.0, 100.0, 100.0);
        let rects = squarify(&[7500.0, 2500.0], bounds);
        assert_eq!(rects.len(), 2);
        assert!((rects[0].area() - 7500.0).abs() < 1e-9);
        assert!((rects[1].area() - 2500.0).abs() < 1e-9);
        assert_eq!(rects[0].overlap_area(&rects[1]), 0.0);
    }

    #[test]
    fn preserves_area() {
        let bounds = LayoutRect::new(10.0, 5.0, 60.0, 25.0);
        let weights = [400.0, 300.0, 200.0, 100.0];
        let total: f64 = weights.iter().sum();
        let areas: Vec<f64> = weights.iter().map(|w| w / total * bounds.area()).collect();
        let rects = squarify(&areas, bounds);
        assert!((area_sum(&rects) - bounds.area()).abs() < 1e-9);
        for (r, a) in rects.iter().zip(&areas) {
            assert!((r.area() - a).abs() < 1e-6, "{:?} vs {}", r, a);
            assert!(bounds.contains_rect(r));
        }
    }

    #[test]
    fn rows_prefer_square_cells() {
        let bounds = LayoutRect::new(0.0, 0.0, 60.0, 40.0);
        let areas = [600.0, 600.0, 400.0, 300.0, 200.0, 200.0, 100.0];
        let rects = squarify(&areas, bounds);
        let worst = rects
            .iter()
            .map(|r| (r.width() / r.height()).max(r.height() / r.width()))
            .fold(0.0, f64::max);
        assert!(worst < 4.0, "worst aspect {}", worst);
    }

    #[test]
    fn empty_input() {
        assert!(squarify(&[], LayoutRect::new(0.0, 0.0, 1.0, 1.0)).is_empty());
    }
}
