//! In-memory collection of timeline items and its reconciliation with
//! freshly fetched schedule records

use crate::duration::{normalize_duration, parse_duration_text};
use crate::item::{ItemId, ItemKind, Span, TimelineItem};
use crate::records::{ScheduleItem, Segment};
use crate::time_grid::{snap_to_grid, time_to_minutes, RecordingWindow, GRID_MINUTES};
use crate::{Error, Result};

/// Owns every item of one editor session
#[derive(Debug, Clone)]
pub struct ItemStore {
    items: Vec<TimelineItem>,
    window: RecordingWindow,
    next_local: u32,
}

impl ItemStore {
    /// Creates an empty store
    pub fn new(window: RecordingWindow) -> Self {
        Self {
            items: Vec::new(),
            window,
            next_local: 1,
        }
    }

    /// Builds the initial item set: one segment per plan, then one item per schedule record
    pub fn seed(
        window: RecordingWindow,
        segments: &[Segment],
        schedule_items: &[ScheduleItem],
        default_segment_minutes: i32,
    ) -> Self {
        let mut store = Self::new(window);
        store.items.reserve(segments.len() + schedule_items.len());

        for segment in segments {
            let start = segment
                .scheduled_time
                .as_deref()
                .and_then(|t| time_to_minutes(t).ok())
                .map(snap_to_grid)
                .unwrap_or(window.start);
            let duration = match parse_duration_text(&segment.duration_text) {
                Some(minutes) => normalize_duration(minutes),
                None => {
                    log::debug!(
                        "Segment {} has unparseable duration {:?}",
                        segment.id,
                        segment.duration_text
                    );
                    default_segment_minutes
                }
            };

            store.items.push(TimelineItem {
                id: ItemId::segment(&segment.id),
                kind: ItemKind::Segment,
                title: segment.title.clone(),
                start,
                duration,
                movable: true,
                participant_ids: segment
                    .participants
                    .iter()
                    .map(|p| p.performer_id.clone())
                    .collect(),
                plan_id: Some(segment.id.clone()),
                external_id: None,
                confirmed: segment.confirmed,
            });
        }

        store
            .items
            .extend(schedule_items.iter().map(|record| item_from_record(record, &window)));
        store
    }

    /// Merges a fresh fetch of schedule records without clobbering local edits.
    ///
    /// Segments are kept untouched. A fetched record matching a local item by
    /// external id keeps the local id, start and duration and takes everything
    /// else from the record; unmatched records are adopted as fetched. Local
    /// non-segment items absent from the fetch are dropped.
    pub fn reconcile(&mut self, fetched: &[ScheduleItem]) {
        let (segments, locals): (Vec<_>, Vec<_>) =
            self.items.drain(..).partition(|item| item.is_segment());

        let merged: Vec<TimelineItem> = fetched
            .iter()
            .map(|record| {
                let mut item = item_from_record(record, &self.window);
                if let Some(local) = locals
                    .iter()
                    .find(|local| local.external_id.as_deref() == Some(record.id.as_str()))
                {
                    item.id = local.id.clone();
                    item.start = local.start;
                    item.duration = local.duration;
                }
                item
            })
            .collect();

        log::debug!(
            "Reconciled {} schedule records against {} local items",
            merged.len(),
            locals.len()
        );
        self.items = segments;
        self.items.extend(merged);
    }

    pub fn window(&self) -> &RecordingWindow {
        &self.window
    }

    pub fn items(&self) -> &[TimelineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&TimelineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.get(id).is_some()
    }

    /// Looks up an item, reporting a missing id as an error
    pub fn require(&self, id: &ItemId) -> Result<&TimelineItem> {
        self.get(id).ok_or_else(|| Error::ItemNotFound(id.clone()))
    }

    pub(crate) fn get_mut(&mut self, id: &ItemId) -> Result<&mut TimelineItem> {
        self.items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| Error::ItemNotFound(id.clone()))
    }

    /// Item ids ordered by start time; ties keep store order
    pub fn sorted_ids(&self) -> Vec<ItemId> {
        let mut sorted: Vec<&TimelineItem> = self.items.iter().collect();
        sorted.sort_by_key(|item| item.start);
        sorted.into_iter().map(|item| item.id.clone()).collect()
    }

    /// Latest end of any item, or the window start when empty
    /// Non-segment items that have no external record yet
    pub fn unpersisted(&self) -> impl Iterator<Item = &TimelineItem> {
        self.items
            .iter()
            .filter(|item| !item.is_segment() && item.external_id.is_none())
    }

    pub fn rightmost_end(&self) -> i32 {
        self.items
            .iter()
            .map(TimelineItem::end)
            .max()
            .unwrap_or(self.window.start)
    }

    /// Snaps a moved block and pulls it back inside the window, keeping its duration
    pub fn commit_move(&self, span: Span) -> Span {
        let duration = normalize_duration(span.duration).min(self.window.duration().max(GRID_MINUTES));
        let start = self.window.clamp_start(snap_to_grid(span.start), duration);
        Span::new(start, duration)
    }

    /// Snaps a resized block, keeping its start in the window and cutting the
    /// duration to what fits
    pub fn commit_resize(&self, span: Span) -> Span {
        let (start, duration) = self
            .window
            .clamp_span(snap_to_grid(span.start), normalize_duration(span.duration));
        Span::new(start, duration)
    }

    /// Writes a span without snapping or clamping; used for in-gesture previews
    pub(crate) fn set_span_unchecked(&mut self, id: &ItemId, span: Span) -> Result<()> {
        self.get_mut(id)?.set_span(span);
        Ok(())
    }

    /// Moves an item to a new start, returning the committed span
    pub fn set_time(&mut self, id: &ItemId, new_start: i32) -> Result<Span> {
        let item = self.require(id)?;
        if !item.movable {
            return Err(Error::ItemNotMovable(id.clone()));
        }
        let committed = self.commit_move(Span::new(new_start, item.duration));
        self.get_mut(id)?.set_span(committed);
        Ok(committed)
    }

    /// Changes an item's duration, returning the committed span
    pub fn set_duration(&mut self, id: &ItemId, new_duration: i32) -> Result<Span> {
        let item = self.require(id)?;
        if !item.movable {
            return Err(Error::ItemNotMovable(id.clone()));
        }
        let start = item.start;
        let committed = self.commit_resize(Span::new(start, new_duration));
        self.get_mut(id)?.set_span(committed);
        Ok(committed)
    }

    /// Removes a break, preparation or custom item
    pub fn remove_non_segment(&mut self, id: &ItemId) -> Result<TimelineItem> {
        let index = self
            .items
            .iter()
            .position(|item| &item.id == id)
            .ok_or_else(|| Error::ItemNotFound(id.clone()))?;
        if self.items[index].is_segment() {
            return Err(Error::SegmentNotRemovable(id.clone()));
        }
        Ok(self.items.remove(index))
    }

    /// Adds a local, not yet persisted item and returns its id
    pub fn add_non_segment(
        &mut self,
        kind: ItemKind,
        title: &str,
        start: i32,
        duration: i32,
    ) -> Result<ItemId> {
        if kind == ItemKind::Segment {
            return Err(Error::SegmentNotCreatable);
        }
        let span = self.commit_move(Span::new(start, duration));
        let id = ItemId::local(self.next_local);
        self.next_local += 1;

        self.items.push(TimelineItem {
            id: id.clone(),
            kind,
            title: title.to_string(),
            start: span.start,
            duration: span.duration,
            movable: true,
            participant_ids: Vec::new(),
            plan_id: None,
            external_id: None,
            confirmed: false,
        });
        Ok(id)
    }
}

fn item_from_record(record: &ScheduleItem, window: &RecordingWindow) -> TimelineItem {
    let start = match time_to_minutes(&record.start_time) {
        Ok(minutes) => snap_to_grid(minutes),
        Err(err) => {
            log::debug!("Schedule item {}: {}, placing at window start", record.id, err);
            window.start
        }
    };

    TimelineItem {
        id: ItemId::schedule(&record.id),
        kind: record.kind.into(),
        title: record.title.clone(),
        start,
        duration: normalize_duration(record.duration_minutes),
        movable: true,
        participant_ids: Vec::new(),
        plan_id: None,
        external_id: Some(record.id.clone()),
        confirmed: false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::records::{Participant, ScheduleItemKind};

    pub(crate) fn segment(id: &str, time: Option<&str>, duration: &str, participants: &[&str]) -> Segment {
        Segment {
            id: id.to_string(),
            title: format!("Segment {}", id),
            scheduled_time: time.map(str::to_string),
            duration_text: duration.to_string(),
            participants: participants
                .iter()
                .map(|p| Participant {
                    performer_id: p.to_string(),
                    role: None,
                })
                .collect(),
            confirmed: true,
        }
    }

    pub(crate) fn record(id: &str, kind: ScheduleItemKind, title: &str, start: &str, duration: i32) -> ScheduleItem {
        ScheduleItem {
            id: id.to_string(),
            kind,
            title: title.to_string(),
            start_time: start.to_string(),
            duration_minutes: duration,
        }
    }

    #[test]
    fn test_seed_builds_segments_and_schedule_items() {
        let window = RecordingWindow::default();
        let store = ItemStore::seed(
            window,
            &[
                segment("a", Some("10:00"), "30分", &["p1"]),
                segment("b", None, "???", &[]),
                segment("c", Some("10:03:00"), "1時間", &[]),
            ],
            &[record("9", ScheduleItemKind::Break, "Lunch", "12:00", 60)],
            30,
        );

        assert_eq!(store.len(), 4);
        let a = store.get(&ItemId::segment("a")).unwrap();
        assert_eq!((a.start, a.duration), (600, 30));
        assert_eq!(a.participant_ids, vec!["p1".to_string()]);
        let b = store.get(&ItemId::segment("b")).unwrap();
        assert_eq!((b.start, b.duration), (540, 30));
        assert_eq!(store.get(&ItemId::segment("c")).unwrap().start, 600);
        let lunch = store.get(&ItemId::schedule("9")).unwrap();
        assert_eq!(lunch.kind, ItemKind::Break);
        assert_eq!(lunch.external_id.as_deref(), Some("9"));
    }

    #[test]
    fn test_reconcile_keeps_local_span_and_adopts_fields() {
        let window = RecordingWindow::default();
        let mut store = ItemStore::seed(
            window,
            &[segment("a", Some("10:00"), "30分", &[])],
            &[
                record("1", ScheduleItemKind::Break, "Break", "11:00", 10),
                record("2", ScheduleItemKind::Custom, "Gone", "13:00", 20),
            ],
            30,
        );
        store.set_time(&ItemId::schedule("1"), 700).unwrap();
        store.set_time(&ItemId::segment("a"), 800).unwrap();

        store.reconcile(&[
            record("1", ScheduleItemKind::Preparation, "Setup", "11:00", 10),
            record("3", ScheduleItemKind::Custom, "New", "15:00", 30),
        ]);

        assert_eq!(store.len(), 3);
        assert_eq!(store.items()[0].id, ItemId::segment("a"));
        assert_eq!(store.items()[0].start, 800);

        let kept = store.get(&ItemId::schedule("1")).unwrap();
        assert_eq!(kept.start, 700);
        assert_eq!(kept.title, "Setup");
        assert_eq!(kept.kind, ItemKind::Preparation);

        assert!(store.get(&ItemId::schedule("2")).is_none());
        assert_eq!(store.get(&ItemId::schedule("3")).unwrap().start, 900);
    }

    #[test]
    fn test_reconcile_replaces_unpersisted_local_items() {
        let mut store = ItemStore::new(RecordingWindow::default());
        let local = store.add_non_segment(ItemKind::Break, "Break", 600, 10).unwrap();

        store.reconcile(&[record("7", ScheduleItemKind::Break, "Break", "10:00", 10)]);

        assert!(store.get(&local).is_none());
        assert!(store.get(&ItemId::schedule("7")).is_some());
    }

    #[test]
    fn test_set_time_and_duration_commit_inside_window() {
        let mut store = ItemStore::seed(
            RecordingWindow::default(),
            &[segment("a", Some("10:00"), "30", &[])],
            &[],
            30,
        );
        let id = ItemId::segment("a");

        assert_eq!(store.set_time(&id, 613).unwrap(), Span::new(610, 30));
        assert_eq!(store.set_time(&id, 2000).unwrap(), Span::new(1050, 30));
        assert_eq!(store.set_time(&id, 0).unwrap(), Span::new(540, 30));
        assert_eq!(store.set_duration(&id, 44).unwrap(), Span::new(540, 40));
        assert_eq!(store.set_duration(&id, 1).unwrap(), Span::new(540, 10));
        assert!(matches!(store.set_time(&ItemId::segment("x"), 600), Err(Error::ItemNotFound(_))));
    }

    #[test]
    fn test_remove_and_add_rules() {
        let mut store = ItemStore::seed(
            RecordingWindow::default(),
            &[segment("a", Some("10:00"), "30", &[])],
            &[],
            30,
        );
        assert!(matches!(
            store.remove_non_segment(&ItemId::segment("a")),
            Err(Error::SegmentNotRemovable(_))
        ));
        assert!(matches!(
            store.add_non_segment(ItemKind::Segment, "x", 600, 10),
            Err(Error::SegmentNotCreatable)
        ));

        let id = store.add_non_segment(ItemKind::Custom, "Photo", 1075, 30).unwrap();
        assert_eq!(store.get(&id).unwrap().span(), Span::new(1050, 30));
        assert_eq!(store.rightmost_end(), 1080);
        assert_eq!(store.remove_non_segment(&id).unwrap().title, "Photo");
        assert_eq!(store.rightmost_end(), 630);
    }

    #[test]
    fn test_unpersisted_lists_unbound_locals() {
        let mut store = ItemStore::seed(
            RecordingWindow::default(),
            &[segment("a", Some("10:00"), "30", &[])],
            &[record("1", ScheduleItemKind::Break, "Break", "11:00", 10)],
            30,
        );
        assert_eq!(store.unpersisted().count(), 0);
        let local = store.add_non_segment(ItemKind::Custom, "Photo", 700, 10).unwrap();
        let ids: Vec<&ItemId> = store.unpersisted().map(|item| &item.id).collect();
        assert_eq!(ids, vec![&local]);
    }

    #[test]
    fn test_sorted_ids_is_stable() {
        let store = ItemStore::seed(
            RecordingWindow::default(),
            &[
                segment("late", Some("11:00"), "30", &[]),
                segment("first", Some("10:00"), "30", &[]),
                segment("tie", Some("10:00"), "30", &[]),
            ],
            &[],
            30,
        );
        assert_eq!(
            store.sorted_ids(),
            vec![ItemId::segment("first"), ItemId::segment("tie"), ItemId::segment("late")]
        );
    }
}
