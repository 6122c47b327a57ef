//! Region records.
//!
//! Region algebra is reduced to a single bounding rectangle: `wl_region.add`
//! grows the rectangle to contain the added one, `wl_region.subtract` is not
//! supported. Clients therefore cannot express concave input regions.

use crate::utils::{Area, Position, Size};

/// One region: an axis-aligned rectangle, empty until first inflated.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegionRecord {
    /// Top-left corner.
    pub pos: Position,
    /// Extent; empty (non-positive) until the first add.
    pub size: Size,
}

impl RegionRecord {
    /// A region with no area yet.
    pub fn new() -> Self {
        RegionRecord::default()
    }

    /// Whether the region has been given an extent.
    pub fn is_valid(&self) -> bool {
        !self.size.is_empty()
    }

    /// Grows the rectangle to the bounding box of itself and `area`.
    /// The first add simply sets the rectangle, so repeating an identical
    /// rectangle is idempotent.
    pub fn inflate(&mut self, area: Area) {
        if !self.is_valid() {
            self.pos = area.pos;
            self.size = area.size;
            return;
        }

        let left = self.pos.x.min(area.pos.x);
        let top = self.pos.y.min(area.pos.y);
        let right = (self.pos.x + self.size.width).max(area.pos.x + area.size.width);
        let bottom = (self.pos.y + self.size.height).max(area.pos.y + area.size.height);

        self.pos = Position::new(left, top);
        self.size = Size::new(right - left, bottom - top);
    }

    /// The rectangle as an [`Area`].
    pub fn area(&self) -> Area {
        Area {
            pos: self.pos,
            size: self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_add_sets_rectangle() {
        let mut region = RegionRecord::new();
        region.inflate(Area::new(10, 20, 30, 40));
        assert_eq!(region.area(), Area::new(10, 20, 30, 40));
    }

    #[test]
    fn inflation_is_idempotent() {
        let mut region = RegionRecord::new();
        region.inflate(Area::new(10, 20, 30, 40));
        let first = region.area();
        region.inflate(Area::new(10, 20, 30, 40));
        assert_eq!(region.area(), first);
    }

    #[test]
    fn inflation_takes_bounding_box() {
        let mut region = RegionRecord::new();
        region.inflate(Area::new(0, 0, 10, 10));
        region.inflate(Area::new(20, 30, 5, 5));
        assert_eq!(region.area(), Area::new(0, 0, 25, 35));
    }
}
