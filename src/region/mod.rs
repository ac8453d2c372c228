//! # Region Selection
//!
//! Turns two pointer positions into a pixel rectangle the encoders accept.
//!
//! The normalizer orders the corners, clamps them to the frame and then
//! trims the far edge by one pixel on any axis whose span is odd. Encoding a
//! cropped region as 4:2:0 video needs even dimensions, and trimming never
//! pushes the rectangle past the frame boundary.

mod selector;

use std::fmt;
use std::str::FromStr;

use crate::error::SelectionError;

pub use selector::RegionSelector;

/// A pointer position in frame coordinates, scroll offset already applied
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Normalized selection rectangle in frame pixels
///
/// `start` is inclusive and `end` exclusive, so `end_x - start_x` is the width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
}

impl Region {
    /// Normalize two arbitrary corners against a `frame_width` x `frame_height` frame
    pub fn from_corners(a: Point, b: Point, frame_width: u32, frame_height: u32) -> Self {
        let (ax, ay) = (truncate(a.x), truncate(a.y));
        let (bx, by) = (truncate(b.x), truncate(b.y));

        let start_x = clamp_axis(ax.min(bx), frame_width);
        let end_x = clamp_axis(ax.max(bx), frame_width);
        let start_y = clamp_axis(ay.min(by), frame_height);
        let end_y = clamp_axis(ay.max(by), frame_height);

        Self {
            start_x,
            start_y,
            end_x: even_end(start_x, end_x),
            end_y: even_end(start_y, end_y),
        }
    }

    /// Zero when the corners are inverted
    pub fn width(&self) -> u32 {
        self.end_x.saturating_sub(self.start_x)
    }

    pub fn height(&self) -> u32 {
        self.end_y.saturating_sub(self.start_y)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains_pixel(&self, x: u32, y: u32) -> bool {
        (self.start_x..self.end_x).contains(&x) && (self.start_y..self.end_y).contains(&y)
    }

    /// Reject zero-area regions and regions that do not fit the frame
    pub fn validate(&self, frame_width: u32, frame_height: u32) -> Result<(), SelectionError> {
        if self.is_empty() {
            return Err(SelectionError::EmptyRegion {
                width: self.width(),
                height: self.height(),
            });
        }
        if self.end_x > frame_width || self.end_y > frame_height {
            return Err(SelectionError::OutOfBounds {
                region: self.to_string(),
                frame_width,
                frame_height,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{}) {}x{}",
            self.start_x, self.start_y, self.end_x, self.end_y,
            self.width(), self.height()
        )
    }
}

/// Raw corner pair as typed on the command line: `X0,Y0,X1,Y1`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerPair {
    pub a: Point,
    pub b: Point,
}

impl CornerPair {
    pub fn normalize(&self, frame_width: u32, frame_height: u32) -> Region {
        Region::from_corners(self.a, self.b, frame_width, frame_height)
    }
}

impl FromStr for CornerPair {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SelectionError::InvalidRectangle { input: s.to_string() };

        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            &[x0, y0, x1, y1] if values.iter().all(|v| v.is_finite()) => Ok(Self {
                a: Point::new(x0, y0),
                b: Point::new(x1, y1),
            }),
            _ => Err(invalid()),
        }
    }
}

fn truncate(value: f32) -> i64 {
    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}

fn clamp_axis(value: i64, limit: u32) -> u32 {
    value.clamp(0, i64::from(limit)) as u32
}

fn even_end(start: u32, end: u32) -> u32 {
    if (end - start) % 2 != 0 {
        end - 1
    } else {
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const W: u32 = 1920;
    const H: u32 = 1080;

    fn region(x0: f32, y0: f32, x1: f32, y1: f32) -> Region {
        Region::from_corners(Point::new(x0, y0), Point::new(x1, y1), W, H)
    }

    #[test]
    fn test_scenario_rectangle() {
        let r = region(100.0, 100.0, 301.0, 241.0);
        assert_eq!(r, Region { start_x: 100, start_y: 100, end_x: 300, end_y: 240 });
        assert_eq!((r.width(), r.height()), (200, 140));
    }

    #[test]
    fn test_flush_odd_edge_loses_a_pixel() {
        // 1919 - 0 is odd, the far edge moves inward rather than outward
        let r = Region::from_corners(Point::new(0.0, 0.0), Point::new(5000.0, 5000.0), 1919, 1079);
        assert_eq!((r.end_x, r.end_y), (1918, 1078));
    }

    #[test]
    fn test_outside_collapses_to_edge() {
        let r = region(2000.0, 10.0, 2500.0, 50.0);
        assert_eq!((r.start_x, r.end_x), (W, W));
        assert!(r.is_empty());
        assert!(matches!(r.validate(W, H), Err(SelectionError::EmptyRegion { .. })));

        let r = region(-50.0, -80.0, -10.0, -5.0);
        assert_eq!(r, Region { start_x: 0, start_y: 0, end_x: 0, end_y: 0 });
    }

    #[test]
    fn test_fractional_points_truncate() {
        let r = region(10.9, 20.2, 30.7, 40.99);
        assert_eq!(r, Region { start_x: 10, start_y: 20, end_x: 30, end_y: 40 });
    }

    #[test]
    fn test_validate_out_of_bounds() {
        let r = Region { start_x: 0, start_y: 0, end_x: 20, end_y: 20 };
        assert!(r.validate(20, 20).is_ok());
        assert!(matches!(r.validate(10, 20), Err(SelectionError::OutOfBounds { .. })));
    }

    #[test]
    fn test_inverted_fields_are_empty() {
        let r = Region { start_x: 50, start_y: 40, end_x: 10, end_y: 60 };
        assert_eq!((r.width(), r.height()), (0, 20));
        assert!(r.is_empty());
        assert!(matches!(r.validate(W, H), Err(SelectionError::EmptyRegion { width: 0, height: 20 })));
    }

    #[test]
    fn test_corner_pair_parse() {
        let pair: CornerPair = "100, 100,301,241".parse().unwrap();
        assert_eq!(pair.normalize(W, H).width(), 200);
        assert!("1,2,3".parse::<CornerPair>().is_err());
        assert!("a,b,c,d".parse::<CornerPair>().is_err());
        assert!("1,2,3,NaN".parse::<CornerPair>().is_err());
    }

    proptest! {
        #[test]
        fn prop_order_independent(x0 in -500i32..2500, y0 in -500i32..1500, x1 in -500i32..2500, y1 in -500i32..1500) {
            let (x0, y0, x1, y1) = (x0 as f32, y0 as f32, x1 as f32, y1 as f32);
            let base = region(x0, y0, x1, y1);
            prop_assert_eq!(base, region(x1, y0, x0, y1));
            prop_assert_eq!(base, region(x0, y1, x1, y0));
            prop_assert_eq!(base, region(x1, y1, x0, y0));
        }

        #[test]
        fn prop_bounds_and_parity(x0 in -500i32..2500, y0 in -500i32..1500, x1 in -500i32..2500, y1 in -500i32..1500) {
            let r = region(x0 as f32, y0 as f32, x1 as f32, y1 as f32);
            prop_assert!(r.start_x <= r.end_x && r.end_x <= W);
            prop_assert!(r.start_y <= r.end_y && r.end_y <= H);
            prop_assert_eq!(r.width() % 2, 0);
            prop_assert_eq!(r.height() % 2, 0);
        }

        #[test]
        fn prop_even_inside_is_identity(x in 0u32..1800, y in 0u32..1000, hw in 0u32..50, hh in 0u32..35) {
            let (w, h) = (hw * 2, hh * 2);
            let r = region(x as f32, y as f32, (x + w) as f32, (y + h) as f32);
            prop_assert_eq!(r, Region { start_x: x, start_y: y, end_x: x + w, end_y: y + h });
        }

        #[test]
        fn prop_odd_span_trims_far_edge(x in 0u32..1800, y in 0u32..1000, hw in 0u32..50, hh in 0u32..35) {
            let (w, h) = (hw * 2 + 1, hh * 2 + 1);
            let r = region(x as f32, y as f32, (x + w) as f32, (y + h) as f32);
            prop_assert_eq!(r, Region { start_x: x, start_y: y, end_x: x + w - 1, end_y: y + h - 1 });
        }

        #[test]
        fn prop_fully_outside_is_empty(x0 in 1921i32..4000, x1 in 1921i32..4000, y0 in 0i32..1080, y1 in 0i32..1080) {
            let r = region(x0 as f32, y0 as f32, x1 as f32, y1 as f32);
            prop_assert!(r.is_empty());
            prop_assert!(r.validate(W, H).is_err());
        }
    }
}
