//! Min-max normalisation of the sparkline into panel coordinates

use embedded_graphics::geometry::Point;
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

use crate::telemetry::{SPARKLINE_CAPACITY, Sparkline};

/// Smallest value span used for scaling, so flat series never divide by zero
pub const MIN_VALUE_RANGE: f32 = 1.0;

/// Map every point into `area`, oldest on the left
///
/// The lowest value lands on the bottom edge and `min + range` on the top,
/// with `range = max(max - min, 1)`. Returns `None` for fewer than two
/// points.
pub fn plot(sparkline: &Sparkline, area: Rectangle) -> Option<Vec<Point, SPARKLINE_CAPACITY>> {
    if sparkline.len() < 2 {
        return None;
    }

    let (min, max) = sparkline.min_max()?;
    let range = (max - min).max(MIN_VALUE_RANGE);

    let left = area.top_left.x;
    let bottom = area.top_left.y + area.size.height.saturating_sub(1) as i32;
    let width = area.size.width.saturating_sub(1) as f32;
    let height = area.size.height.saturating_sub(1) as f32;
    let last = (sparkline.len() - 1) as f32;

    let mut points = Vec::new();
    for (index, value) in sparkline.iter().enumerate() {
        let x = left + (index as f32 * width / last) as i32;
        let y = bottom - ((value - min) / range * height) as i32;
        // Sparkline holds at most SPARKLINE_CAPACITY values
        let _ = points.push(Point::new(x, y));
    }
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::geometry::Size;

    fn area() -> Rectangle {
        Rectangle::new(Point::new(10, 100), Size::new(101, 51))
    }

    #[test]
    fn test_needs_two_points() {
        assert!(plot(&Sparkline::new(), area()).is_none());
        assert!(plot(&[1.0].into_iter().collect(), area()).is_none());
    }

    #[test]
    fn test_flat_series_is_single_height() {
        let points = plot(&[5.0, 5.0, 5.0].into_iter().collect(), area()).unwrap();

        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.y == points[0].y));
        assert_eq!(points[0].y, 150);
    }

    #[test]
    fn test_extremes_touch_edges() {
        let points = plot(&[100.0, 150.0, 200.0].into_iter().collect(), area()).unwrap();

        assert_eq!(points[0], Point::new(10, 150));
        assert_eq!(points[1], Point::new(60, 125));
        assert_eq!(points[2], Point::new(110, 100));
    }

    #[test]
    fn test_small_range_is_not_stretched() {
        let points = plot(&[0.0, 0.5].into_iter().collect(), area()).unwrap();
        assert_eq!(points[1].y, 125);
    }
}
