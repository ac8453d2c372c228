use tracing::debug;

use crate::error::SelectionError;
use super::{Point, Region};

/// Press/drag/release tracker for the rectangle drawn over the preview frame
///
/// The selection only means something relative to the one preview frame it
/// was drawn on; loading another frame clears it.
#[derive(Debug, Default, Clone)]
pub struct RegionSelector {
    anchor: Option<Point>,
    current: Option<Point>,
    drawing: bool,
    committed: Option<(Point, Point)>,
}

impl RegionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new rectangle at `point`
    pub fn press(&mut self, point: Point) {
        debug!("Pointer down at x={}, y={}", point.x, point.y);
        self.anchor = Some(point);
        self.current = Some(point);
        self.drawing = true;
    }

    /// Move the live corner while the button is held
    pub fn drag(&mut self, point: Point) {
        if !self.drawing {
            return;
        }
        debug!("Pointer move at x={}, y={}", point.x, point.y);
        self.current = Some(point);
    }

    /// Freeze the rectangle
    ///
    /// Without a release position the last drag position is used. A release
    /// with no preceding press is ignored.
    pub fn release(&mut self, point: Option<Point>) {
        if !self.drawing {
            debug!("Pointer up without a press, ignoring");
            return;
        }
        self.drawing = false;

        let end = point.or(self.current);
        if let (Some(anchor), Some(end)) = (self.anchor, end) {
            debug!("Pointer up at x={}, y={}", end.x, end.y);
            self.current = Some(end);
            self.committed = Some((anchor, end));
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Corners to outline: the live rectangle while drawing, else the committed one
    pub fn overlay(&self) -> Option<(Point, Point)> {
        if self.drawing {
            self.anchor.zip(self.current)
        } else {
            self.committed
        }
    }

    pub fn committed(&self) -> Option<(Point, Point)> {
        self.committed
    }

    /// Normalized committed selection, rejected when missing or empty
    pub fn committed_region(&self, frame_width: u32, frame_height: u32) -> Result<Region, SelectionError> {
        let (a, b) = self.committed.ok_or(SelectionError::NoSelection)?;
        let region = Region::from_corners(a, b, frame_width, frame_height);
        region.validate(frame_width, frame_height)?;
        Ok(region)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
