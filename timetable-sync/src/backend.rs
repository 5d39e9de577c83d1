//! The asynchronous seam between the editor and the record store

use crate::Result;
use futures::future::BoxFuture;
use timetable_core::{Performer, Project, ScheduleItem, ScheduleItemKind, ScheduleItemPatch, Segment};

/// Fields of a schedule item the store has not assigned an id to yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewScheduleItem {
    pub kind: ScheduleItemKind,
    pub title: String,
    /// `HH:MM`
    pub start_time: String,
    pub duration_minutes: i32,
}

impl NewScheduleItem {
    pub fn into_record(self, id: String) -> ScheduleItem {
        ScheduleItem {
            id,
            kind: self.kind,
            title: self.title,
            start_time: self.start_time,
            duration_minutes: self.duration_minutes,
        }
    }
}

/// Record store owning one project's segments, schedule items and performers.
///
/// Every call may fail transiently; callers keep their local state when it does.
pub trait ScheduleBackend: Send + Sync {
    fn fetch_project(&self) -> BoxFuture<'_, Result<Project>>;

    fn fetch_segments(&self) -> BoxFuture<'_, Result<Vec<Segment>>>;

    fn fetch_schedule_items(&self) -> BoxFuture<'_, Result<Vec<ScheduleItem>>>;

    fn fetch_performers(&self) -> BoxFuture<'_, Result<Vec<Performer>>>;

    /// Stores a new schedule item and returns it with its assigned id
    fn create_schedule_item(&self, item: NewScheduleItem) -> BoxFuture<'_, Result<ScheduleItem>>;

    fn update_schedule_item(&self, id: String, patch: ScheduleItemPatch) -> BoxFuture<'_, Result<()>>;

    fn delete_schedule_item(&self, id: String) -> BoxFuture<'_, Result<()>>;

    /// `start_time` is `HH:MM`
    fn update_segment_time(&self, plan_id: String, start_time: String) -> BoxFuture<'_, Result<()>>;

    /// `duration_text` uses the hours/minutes form, e.g. `1時間30分`
    fn update_segment_duration(&self, plan_id: String, duration_text: String) -> BoxFuture<'_, Result<()>>;
}
