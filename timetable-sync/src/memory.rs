//! In-process backend over a JSON project snapshot

use crate::backend::{NewScheduleItem, ScheduleBackend};
use crate::{Error, Result};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use timetable_core::{Performer, Project, ScheduleItem, ScheduleItemPatch, Segment};

/// Every record of one project, as stored on disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSnapshot {
    pub project: Project,
    pub segments: Vec<Segment>,
    pub schedule_items: Vec<ScheduleItem>,
    pub performers: Vec<Performer>,
}

impl ProjectSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Backend holding the snapshot in memory.
///
/// Writes can be switched off with [`MemoryBackend::set_offline`] to make the
/// store behave like an unreachable remote.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<ProjectSnapshot>,
    offline: AtomicBool,
}

impl MemoryBackend {
    pub fn new(snapshot: ProjectSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
            offline: AtomicBool::new(false),
        }
    }

    /// Copy of the current records
    pub fn snapshot(&self) -> Result<ProjectSnapshot> {
        Ok(self.lock()?.clone())
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProjectSnapshot>> {
        self.state
            .lock()
            .map_err(|_| Error::Backend("snapshot lock poisoned".to_string()))
    }

    /// Locks the snapshot for a write, failing while offline
    fn write(&self) -> Result<MutexGuard<'_, ProjectSnapshot>> {
        if self.is_offline() {
            return Err(Error::Unavailable);
        }
        self.lock()
    }

    fn next_item_id(snapshot: &ProjectSnapshot) -> String {
        let mut n = snapshot.schedule_items.len() + 1;
        loop {
            let id = format!("item-{}", n);
            if !snapshot.schedule_items.iter().any(|item| item.id == id) {
                return id;
            }
            n += 1;
        }
    }
}

fn segment_mut<'a>(snapshot: &'a mut ProjectSnapshot, plan_id: &str) -> Result<&'a mut Segment> {
    snapshot
        .segments
        .iter_mut()
        .find(|segment| segment.id == plan_id)
        .ok_or_else(|| Error::NotFound(format!("segment {}", plan_id)))
}

impl ScheduleBackend for MemoryBackend {
    fn fetch_project(&self) -> BoxFuture<'_, Result<Project>> {
        Box::pin(async move { Ok(self.lock()?.project.clone()) })
    }

    fn fetch_segments(&self) -> BoxFuture<'_, Result<Vec<Segment>>> {
        Box::pin(async move { Ok(self.lock()?.segments.clone()) })
    }

    fn fetch_schedule_items(&self) -> BoxFuture<'_, Result<Vec<ScheduleItem>>> {
        Box::pin(async move { Ok(self.lock()?.schedule_items.clone()) })
    }

    fn fetch_performers(&self) -> BoxFuture<'_, Result<Vec<Performer>>> {
        Box::pin(async move { Ok(self.lock()?.performers.clone()) })
    }

    fn create_schedule_item(&self, item: NewScheduleItem) -> BoxFuture<'_, Result<ScheduleItem>> {
        Box::pin(async move {
            let mut snapshot = self.write()?;
            let id = Self::next_item_id(&snapshot);
            let record = item.into_record(id);
            snapshot.schedule_items.push(record.clone());
            log::debug!("Created schedule item {}", record.id);
            Ok(record)
        })
    }

    fn update_schedule_item(&self, id: String, patch: ScheduleItemPatch) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut snapshot = self.write()?;
            let record = snapshot
                .schedule_items
                .iter_mut()
                .find(|item| item.id == id)
                .ok_or_else(|| Error::NotFound(format!("schedule item {}", id)))?;
            patch.apply_to(record);
            Ok(())
        })
    }

    fn delete_schedule_item(&self, id: String) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut snapshot = self.write()?;
            let before = snapshot.schedule_items.len();
            snapshot.schedule_items.retain(|item| item.id != id);
            if snapshot.schedule_items.len() == before {
                return Err(Error::NotFound(format!("schedule item {}", id)));
            }
            Ok(())
        })
    }

    fn update_segment_time(&self, plan_id: String, start_time: String) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut snapshot = self.write()?;
            segment_mut(&mut snapshot, &plan_id)?.scheduled_time = Some(start_time);
            Ok(())
        })
    }

    fn update_segment_duration(&self, plan_id: String, duration_text: String) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut snapshot = self.write()?;
            segment_mut(&mut snapshot, &plan_id)?.duration_text = duration_text;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use timetable_core::ScheduleItemKind;

    const SNAPSHOT: &str = r#"{
        "project": { "id": "p1", "title": "Pilot", "recordingTime": "10:00-17:00" },
        "segments": [
            { "id": "s1", "title": "Opening", "scheduledTime": "10:00", "durationText": "30分",
              "participants": [{ "performerId": "alice" }] }
        ],
        "scheduleItems": [
            { "id": "item-1", "kind": "break", "title": "休憩", "startTime": "12:00", "durationMinutes": 60 }
        ],
        "performers": [{ "id": "alice", "name": "Alice", "startTime": "10:00" }]
    }"#;

    #[test]
    fn test_snapshot_parses_camel_case() {
        let snapshot = ProjectSnapshot::from_json(SNAPSHOT).unwrap();
        assert_eq!(snapshot.project.recording_time.as_deref(), Some("10:00-17:00"));
        assert_eq!(snapshot.segments[0].participants[0].performer_id, "alice");
        assert_eq!(snapshot.schedule_items[0].kind, ScheduleItemKind::Break);
        assert_eq!(snapshot.performers[0].start_time.as_deref(), Some("10:00"));
        assert!(snapshot.performers[0].end_time.is_none());

        let reparsed = ProjectSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, snapshot);
    }

    #[test]
    fn test_create_assigns_fresh_id() {
        let backend = MemoryBackend::new(ProjectSnapshot::from_json(SNAPSHOT).unwrap());
        let created = block_on(backend.create_schedule_item(NewScheduleItem {
            kind: ScheduleItemKind::Preparation,
            title: "準備".to_string(),
            start_time: "13:00".to_string(),
            duration_minutes: 10,
        }))
        .unwrap();

        assert_eq!(created.id, "item-2");
        assert_eq!(block_on(backend.fetch_schedule_items()).unwrap().len(), 2);
    }

    #[test]
    fn test_segment_and_item_updates() {
        let backend = MemoryBackend::new(ProjectSnapshot::from_json(SNAPSHOT).unwrap());
        block_on(backend.update_segment_time("s1".into(), "10:30".into())).unwrap();
        block_on(backend.update_segment_duration("s1".into(), "1時間".into())).unwrap();
        block_on(backend.update_schedule_item(
            "item-1".into(),
            ScheduleItemPatch {
                duration_minutes: Some(30),
                ..Default::default()
            },
        ))
        .unwrap();

        let snapshot = backend.snapshot().unwrap();
        assert_eq!(snapshot.segments[0].scheduled_time.as_deref(), Some("10:30"));
        assert_eq!(snapshot.segments[0].duration_text, "1時間");
        assert_eq!(snapshot.schedule_items[0].duration_minutes, 30);
        assert_eq!(snapshot.schedule_items[0].title, "休憩");

        assert!(matches!(
            block_on(backend.update_segment_time("missing".into(), "10:00".into())),
            Err(Error::NotFound(_))
        ));
        block_on(backend.delete_schedule_item("item-1".into())).unwrap();
        assert!(block_on(backend.delete_schedule_item("item-1".into())).is_err());
    }

    #[test]
    fn test_offline_rejects_writes_only() {
        let backend = MemoryBackend::new(ProjectSnapshot::from_json(SNAPSHOT).unwrap());
        backend.set_offline(true);
        assert!(matches!(
            block_on(backend.update_segment_time("s1".into(), "11:00".into())),
            Err(Error::Unavailable)
        ));
        assert_eq!(block_on(backend.fetch_segments()).unwrap().len(), 1);

        backend.set_offline(false);
        block_on(backend.update_segment_time("s1".into(), "11:00".into())).unwrap();
    }
}
