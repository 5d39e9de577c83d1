//! Performer availability windows and conflict detection

use crate::item::{ItemId, TimelineItem};
use crate::records::Performer;
use crate::time_grid::{time_to_minutes, RecordingWindow};
use std::collections::HashMap;

/// A performer's resolved allowed time range
#[derive(Debug, Clone, PartialEq)]
pub struct PerformerAvailability {
    pub performer_id: String,
    pub name: String,
    pub start: i32,
    pub end: i32,
    pub confirmed: bool,
}

impl PerformerAvailability {
    /// Resolves the window: explicit adjustment, then confirmed arrival and
    /// departure, then the whole recording window
    pub fn resolve(performer: &Performer, window: &RecordingWindow) -> Self {
        let (start, end) = parse_pair(&performer.available_start_time, &performer.available_end_time)
            .or_else(|| parse_pair(&performer.start_time, &performer.end_time))
            .unwrap_or((window.start, window.end));

        Self {
            performer_id: performer.id.clone(),
            name: performer.name.clone(),
            start,
            end,
            confirmed: performer.confirmed,
        }
    }

    /// Checks whether `[start, start + duration)` fits inside this window
    pub fn covers(&self, start: i32, duration: i32) -> bool {
        start >= self.start && start + duration <= self.end
    }
}

fn parse_pair(start: &Option<String>, end: &Option<String>) -> Option<(i32, i32)> {
    let start = time_to_minutes(start.as_deref()?).ok()?;
    let end = time_to_minutes(end.as_deref()?).ok()?;
    Some((start, end))
}

/// Resolved availability for every performer of a project
#[derive(Debug, Clone, Default)]
pub struct AvailabilityMap {
    by_id: HashMap<String, PerformerAvailability>,
}

impl AvailabilityMap {
    pub fn new(performers: &[Performer], window: &RecordingWindow) -> Self {
        let by_id = performers
            .iter()
            .map(|p| (p.id.clone(), PerformerAvailability::resolve(p, window)))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, performer_id: &str) -> Option<&PerformerAvailability> {
        self.by_id.get(performer_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Names of participants whose window does not contain the segment, in
    /// participant order. Non-segment items never conflict.
    pub fn conflicts(&self, item: &TimelineItem) -> Vec<String> {
        if !item.is_segment() {
            return Vec::new();
        }

        let mut names = Vec::new();
        for performer_id in &item.participant_ids {
            let Some(availability) = self.by_id.get(performer_id) else {
                log::debug!("No availability for performer {} in {}", performer_id, item.id);
                continue;
            };
            if !availability.covers(item.start, item.duration) && !names.contains(&availability.name) {
                names.push(availability.name.clone());
            }
        }
        names
    }

    /// Every conflicting segment with the names of its conflicting participants
    pub fn report<'a>(&self, items: impl IntoIterator<Item = &'a TimelineItem>) -> Vec<(ItemId, Vec<String>)> {
        items
            .into_iter()
            .filter_map(|item| {
                let names = self.conflicts(item);
                (!names.is_empty()).then(|| (item.id.clone(), names))
            })
            .collect()
    }
}
