//! Timetable Core Library
//!
//! This library provides the data structures and the interactive editing engine
//! for the recording timetable: a single time-of-day axis holding segments,
//! breaks, preparation and custom blocks.

pub mod availability;
pub mod duration;
pub mod editor;
pub mod item;
pub mod layout;
pub mod records;
pub mod selection;
pub mod store;
pub mod time_grid;
pub mod undo;

pub use availability::{AvailabilityMap, PerformerAvailability};
pub use editor::{Editor, Edge, Key, Notification};
pub use item::{ItemColor, ItemId, ItemKind, Span, TimelineItem};
pub use layout::{ItemLayout, Rect, TrackGeometry};
pub use records::{Participant, Performer, Project, ScheduleItem, ScheduleItemKind, ScheduleItemPatch, Segment};
pub use selection::{Modifiers, Selection, SelectionEvent};
pub use store::ItemStore;
pub use time_grid::{GridMark, RecordingWindow, GRID_MINUTES};
pub use undo::{UndoAction, UndoKind, UndoLog};

/// Result type for timetable-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for timetable-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid time of day: {0:?}")]
    InvalidTime(String),

    #[error("Invalid recording window: {0:?}")]
    InvalidWindow(String),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Item is not movable: {0}")]
    ItemNotMovable(ItemId),

    #[error("Segments cannot be removed from the timeline: {0}")]
    SegmentNotRemovable(ItemId),

    #[error("Segments cannot be created by the editor")]
    SegmentNotCreatable,

    #[error("Another gesture is already in progress")]
    GestureInProgress,
}

/// Editor configuration
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Maximum number of undo entries kept
    pub undo_limit: usize,
    /// Duration given to segments whose duration text cannot be parsed
    pub default_segment_minutes: i32,
    /// Duration of items created by the add actions
    pub new_item_minutes: i32,
    /// Minimum rendered width for blocks shorter than one grid step
    pub min_visible_width_percent: f64,
    /// Pixel box of the timeline track
    pub track: TrackGeometry,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            undo_limit: undo::UNDO_LIMIT,
            default_segment_minutes: 30,
            new_item_minutes: GRID_MINUTES,
            min_visible_width_percent: layout::MIN_VISIBLE_WIDTH_PERCENT,
            track: TrackGeometry::default(),
        }
    }
}
