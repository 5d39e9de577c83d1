//! Projection of item spans onto the horizontal track, and the pixel
//! geometry used for hit testing

use crate::item::{ItemId, TimelineItem};
use crate::time_grid::{RecordingWindow, GRID_MINUTES};

/// Floor on the rendered width of blocks shorter than one grid step
pub const MIN_VISIBLE_WIDTH_PERCENT: f64 = 1.5;

/// Left edge of a block as a percentage of the track width
pub fn position_percent(start: i32, window: &RecordingWindow) -> f64 {
    let percent = (start - window.start) as f64 / window.duration() as f64 * 100.0;
    percent.clamp(0.0, 100.0)
}

/// Rendered width of a block as a percentage of the track width.
///
/// The width never runs past the right end of the track; sub-grid blocks are
/// widened to `min_visible` without touching their logical duration.
pub fn width_percent(start: i32, duration: i32, window: &RecordingWindow, min_visible: f64) -> f64 {
    let left = position_percent(start, window);
    let width = (duration as f64 / window.duration() as f64 * 100.0).min(100.0 - left);
    if duration < GRID_MINUTES {
        width.max(min_visible)
    } else {
        width.max(0.0)
    }
}

/// Horizontal placement of one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemLayout {
    pub left_percent: f64,
    pub width_percent: f64,
    pub lane: usize,
}

impl ItemLayout {
    pub fn project(item: &TimelineItem, lane: usize, window: &RecordingWindow, min_visible: f64) -> Self {
        Self {
            left_percent: position_percent(item.start, window),
            width_percent: width_percent(item.start, item.duration, window, min_visible),
            lane,
        }
    }
}

/// Assigns each item the first lane whose previous block has ended.
///
/// Returns lanes in the order of `items`.
pub fn assign_lanes(items: &[TimelineItem]) -> Vec<(ItemId, usize)> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&i| items[i].start);

    let mut lane_ends: Vec<i32> = Vec::new();
    let mut lanes = vec![0; items.len()];
    for i in order {
        let item = &items[i];
        let lane = match lane_ends.iter().position(|&end| end <= item.start) {
            Some(lane) => lane,
            None => {
                lane_ends.push(item.start);
                lane_ends.len() - 1
            }
        };
        lane_ends[lane] = item.end();
        lanes[i] = lane;
    }

    items.iter().map(|item| item.id.clone()).zip(lanes).collect()
}

/// Screen-space point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned screen-space rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// Normalized rectangle spanning two corners
    pub fn from_points(a: Point, b: Point) -> Self {
        Self {
            left: a.x.min(b.x),
            top: a.y.min(b.y),
            right: a.x.max(b.x),
            bottom: a.y.max(b.y),
        }
    }

    /// Overlap test; touching edges count as intersecting
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left <= other.right
            && other.left <= self.right
            && self.top <= other.bottom
            && other.top <= self.bottom
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

/// Pixel box of the timeline track
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackGeometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub lane_height: f64,
}

impl Default for TrackGeometry {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 1000.0,
            lane_height: 40.0,
        }
    }
}

impl TrackGeometry {
    /// Minutes covered by one horizontal pixel
    pub fn minutes_per_pixel(&self, window: &RecordingWindow) -> f64 {
        window.duration() as f64 / self.width.max(1.0)
    }

    /// Inverse of the position mapping: minute under a horizontal screen position
    pub fn minute_at(&self, x: f64, window: &RecordingWindow) -> f64 {
        window.start as f64 + (x - self.left) * self.minutes_per_pixel(window)
    }

    /// Horizontal screen position of a minute
    pub fn x_at(&self, minute: f64, window: &RecordingWindow) -> f64 {
        self.left + (minute - window.start as f64) / self.minutes_per_pixel(window)
    }

    /// Screen rectangle of a projected block
    pub fn item_rect(&self, layout: &ItemLayout) -> Rect {
        let left = self.left + self.width * layout.left_percent / 100.0;
        let top = self.top + self.lane_height * layout.lane as f64;
        Rect {
            left,
            top,
            right: left + self.width * layout.width_percent / 100.0,
            bottom: top + self.lane_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;

    fn item(id: &str, start: i32, duration: i32) -> TimelineItem {
        TimelineItem {
            id: ItemId::segment(id),
            kind: ItemKind::Segment,
            title: id.to_string(),
            start,
            duration,
            movable: true,
            participant_ids: Vec::new(),
            plan_id: Some(id.to_string()),
            external_id: None,
            confirmed: false,
        }
    }

    #[test]
    fn test_position_and_width() {
        let window = RecordingWindow::default(); // 540 minutes long
        assert_eq!(position_percent(540, &window), 0.0);
        assert_eq!(position_percent(810, &window), 50.0);
        assert_eq!(position_percent(400, &window), 0.0);
        assert_eq!(position_percent(2000, &window), 100.0);

        assert!((width_percent(540, 54, &window, 1.5) - 10.0).abs() < 1e-9);
        // Clamped at the right end of the track
        assert!((width_percent(1050, 60, &window, 1.5) - (100.0 - position_percent(1050, &window))).abs() < 1e-9);
        // Sub-grid blocks stay visible
        assert_eq!(width_percent(600, 5, &window, 1.5), 1.5);
    }

    #[test]
    fn test_lanes_stack_overlaps() {
        let items = vec![item("a", 600, 30), item("b", 610, 30), item("c", 630, 30), item("d", 615, 10)];
        let lanes: Vec<usize> = assign_lanes(&items).into_iter().map(|(_, lane)| lane).collect();
        assert_eq!(lanes, vec![0, 1, 0, 2]);
    }

    #[test]
    fn test_pixel_minute_mapping() {
        let window = RecordingWindow::default();
        let track = TrackGeometry {
            left: 100.0,
            top: 0.0,
            width: 540.0,
            lane_height: 20.0,
        };
        assert_eq!(track.minutes_per_pixel(&window), 1.0);
        assert_eq!(track.minute_at(160.0, &window), 600.0);
        assert_eq!(track.x_at(600.0, &window), 160.0);

        let layout = ItemLayout::project(&item("a", 600, 30), 1, &window, 1.5);
        let rect = track.item_rect(&layout);
        assert!((rect.left - 160.0).abs() < 1e-9);
        assert!((rect.width() - 30.0).abs() < 1e-9);
        assert_eq!(rect.top, 20.0);
    }

    #[test]
    fn test_rect_intersection_includes_touching_edges() {
        let a = Rect::from_points(Point::new(10.0, 10.0), Point::new(0.0, 0.0));
        assert_eq!(a.left, 0.0);
        assert!(a.intersects(&Rect { left: 10.0, top: 5.0, right: 20.0, bottom: 6.0 }));
        assert!(!a.intersects(&Rect { left: 10.5, top: 5.0, right: 20.0, bottom: 6.0 }));
    }
}
