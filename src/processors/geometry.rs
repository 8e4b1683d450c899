//! Geometric utilities for skew estimation.
//!
//! This module provides point and polygon primitives together with the
//! algorithms the skew corrector needs: polygon area, convex hull and the
//! minimum-area enclosing rectangle.

use imageproc::contours::Contour;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A 2D point with floating-point coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X-coordinate of the point.
    pub x: f32,
    /// Y-coordinate of the point.
    pub y: f32,
}

impl Point {
    /// Creates a new point with the given coordinates.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A closed polygon, typically traced from a contour.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// The vertices of the polygon, in order.
    pub points: Vec<Point>,
}

impl Polygon {
    /// Creates a new polygon from a vector of points.
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Creates a polygon from a traced contour.
    pub fn from_contour(contour: &Contour<u32>) -> Self {
        let points = contour
            .points
            .iter()
            .map(|p| Point::new(p.x as f32, p.y as f32))
            .collect();
        Self { points }
    }

    /// Calculates the enclosed area using the shoelace formula.
    ///
    /// Returns 0.0 if the polygon has fewer than 3 points.
    pub fn area(&self) -> f32 {
        if self.points.len() < 3 {
            return 0.0;
        }

        let n = self.points.len();
        let twice_area: f32 = (0..n)
            .map(|i| {
                let j = (i + 1) % n;
                self.points[i].x * self.points[j].y - self.points[j].x * self.points[i].y
            })
            .sum();
        twice_area.abs() / 2.0
    }

    /// Computes the convex hull with Andrew's monotone chain.
    ///
    /// The hull is returned counter-clockwise (in a y-up frame) without the
    /// closing point. Duplicate and collinear points are dropped.
    pub fn convex_hull(&self) -> Polygon {
        let mut points = self.points.clone();
        points.sort_by(|a, b| {
            a.x.partial_cmp(&b.x)
                .unwrap_or(Ordering::Equal)
                .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
        });
        points.dedup();

        if points.len() < 3 {
            return Polygon::new(points);
        }

        let mut lower: Vec<Point> = Vec::with_capacity(points.len());
        for &p in &points {
            while lower.len() >= 2
                && cross_product(&lower[lower.len() - 2], &lower[lower.len() - 1], &p) <= 0.0
            {
                lower.pop();
            }
            lower.push(p);
        }

        let mut upper: Vec<Point> = Vec::with_capacity(points.len());
        for &p in points.iter().rev() {
            while upper.len() >= 2
                && cross_product(&upper[upper.len() - 2], &upper[upper.len() - 1], &p) <= 0.0
            {
                upper.pop();
            }
            upper.push(p);
        }

        lower.pop();
        upper.pop();
        lower.extend(upper);
        Polygon::new(lower)
    }

    /// Computes the minimum area rectangle that encloses the polygon.
    ///
    /// Uses rotating calipers over the edges of the convex hull. Degenerate
    /// inputs (fewer than 3 distinct, non-collinear points) produce the
    /// axis-aligned bounding rectangle with angle 0.
    pub fn min_area_rect(&self) -> MinAreaRect {
        let hull = self.convex_hull();
        let hull_points = &hull.points;

        if hull_points.len() < 3 {
            return self.axis_aligned_rect();
        }

        let mut min_area = f32::MAX;
        let mut min_rect = self.axis_aligned_rect();

        let n = hull_points.len();
        for i in 0..n {
            let j = (i + 1) % n;

            let edge_x = hull_points[j].x - hull_points[i].x;
            let edge_y = hull_points[j].y - hull_points[i].y;
            let edge_length = (edge_x * edge_x + edge_y * edge_y).sqrt();

            if edge_length < f32::EPSILON {
                continue;
            }

            // Unit vectors along and perpendicular to the edge.
            let nx = edge_x / edge_length;
            let ny = edge_y / edge_length;
            let px = -ny;
            let py = nx;

            let mut min_n = f32::MAX;
            let mut max_n = f32::MIN;
            let mut min_p = f32::MAX;
            let mut max_p = f32::MIN;

            for point in hull_points {
                let dx = point.x - hull_points[i].x;
                let dy = point.y - hull_points[i].y;

                let proj_n = nx * dx + ny * dy;
                min_n = min_n.min(proj_n);
                max_n = max_n.max(proj_n);

                let proj_p = px * dx + py * dy;
                min_p = min_p.min(proj_p);
                max_p = max_p.max(proj_p);
            }

            let width = max_n - min_n;
            let height = max_p - min_p;
            let area = width * height;

            if area < min_area {
                min_area = area;

                let center_n = (min_n + max_n) / 2.0;
                let center_p = (min_p + max_p) / 2.0;

                min_rect = MinAreaRect {
                    center: Point::new(
                        hull_points[i].x + center_n * nx + center_p * px,
                        hull_points[i].y + center_n * ny + center_p * py,
                    ),
                    width,
                    height,
                    angle: ny.atan2(nx).to_degrees(),
                };
            }
        }

        min_rect
    }

    fn axis_aligned_rect(&self) -> MinAreaRect {
        let (min_x, max_x) = self
            .points
            .iter()
            .map(|p| p.x)
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .into_option()
            .unwrap_or((0.0, 0.0));
        let (min_y, max_y) = self
            .points
            .iter()
            .map(|p| p.y)
            .minmax_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal))
            .into_option()
            .unwrap_or((0.0, 0.0));

        MinAreaRect {
            center: Point::new((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            width: max_x - min_x,
            height: max_y - min_y,
            angle: 0.0,
        }
    }
}

/// Cross product of `p1->p2` and `p1->p3`. Positive for a counter-clockwise turn.
fn cross_product(p1: &Point, p2: &Point, p3: &Point) -> f32 {
    (p2.x - p1.x) * (p3.y - p1.y) - (p2.y - p1.y) * (p3.x - p1.x)
}

/// A rotated rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinAreaRect {
    /// The center point of the rectangle.
    pub center: Point,
    /// Extent along the direction given by `angle`.
    pub width: f32,
    /// Extent perpendicular to `angle`.
    pub height: f32,
    /// Direction of the `width` side in degrees, measured in image coordinates
    /// (x right, y down), in `(-180, 180]`.
    pub angle: f32,
}

impl MinAreaRect {
    /// Area of the rectangle.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotated_rect_points(cx: f32, cy: f32, w: f32, h: f32, degrees: f32) -> Vec<Point> {
        let (sin, cos) = degrees.to_radians().sin_cos();
        [(-w / 2.0, -h / 2.0), (w / 2.0, -h / 2.0), (w / 2.0, h / 2.0), (-w / 2.0, h / 2.0)]
            .iter()
            .map(|&(x, y)| Point::new(cx + x * cos - y * sin, cy + x * sin + y * cos))
            .collect()
    }

    #[test]
    fn test_area_of_square() {
        let square = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]);
        assert_eq!(square.area(), 100.0);
        assert_eq!(Polygon::new(vec![Point::new(1.0, 1.0)]).area(), 0.0);
    }

    #[test]
    fn test_convex_hull_drops_interior_points() {
        let polygon = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(2.0, 1.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
            Point::new(2.0, 2.0),
            Point::new(4.0, 4.0),
        ]);
        let hull = polygon.convex_hull();
        assert_eq!(hull.points.len(), 4);
        assert_eq!(hull.area(), 16.0);
    }

    #[test]
    fn test_min_area_rect_recovers_rotation() {
        let polygon = Polygon::new(rotated_rect_points(50.0, 40.0, 60.0, 10.0, 12.0));
        let rect = polygon.min_area_rect();

        assert!((rect.area() - 600.0).abs() < 1.0);
        assert!((rect.center.x - 50.0).abs() < 1e-3);
        assert!((rect.center.y - 40.0).abs() < 1e-3);
        // The width side points along 12 degrees or one of its 90 degree multiples.
        let residual = (rect.angle - 12.0).rem_euclid(90.0);
        assert!(residual < 1e-3 || (90.0 - residual) < 1e-3);
    }

    #[test]
    fn test_min_area_rect_degenerate_line() {
        let polygon = Polygon::new(vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
        ]);
        let rect = polygon.min_area_rect();
        assert_eq!(rect.width, 10.0);
        assert_eq!(rect.height, 0.0);
        assert_eq!(rect.angle, 0.0);
    }
}
