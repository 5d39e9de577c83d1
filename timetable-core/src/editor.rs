//! Interactive editing session
//!
//! `Editor` owns the item store, selection, undo log and availability map of
//! one timeline. Pointer and keyboard input arrive as method calls; every
//! committed change is queued as a [`Notification`] for the persistence
//! collaborator to drain with [`Editor::take_notifications`].

use crate::availability::AvailabilityMap;
use crate::duration::{format_duration_text, parse_duration_input};
use crate::item::{ItemId, Span, TimelineItem};
use crate::layout::{assign_lanes, ItemLayout, Point, Rect, TrackGeometry};
use crate::records::{Performer, ScheduleItem, ScheduleItemKind, ScheduleItemPatch, Segment};
use crate::selection::{Modifiers, Selection, SelectionEvent};
use crate::store::ItemStore;
use crate::time_grid::{build_grid, minutes_to_time, snap_to_grid, time_to_minutes, GridMark, RecordingWindow, GRID_MINUTES};
use crate::undo::{UndoAction, UndoKind, UndoLog};
use crate::{EditorConfig, Error, Result};

/// Which edge of a block is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Left,
    Right,
}

/// Keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

/// A change the external collaborator must persist
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    SegmentTime {
        plan_id: String,
        start_time: String,
    },
    SegmentDuration {
        plan_id: String,
        duration_text: String,
    },
    CreateScheduleItem {
        local_id: ItemId,
        kind: ScheduleItemKind,
        title: String,
        start_time: String,
        duration_minutes: i32,
    },
    UpdateScheduleItem {
        external_id: String,
        patch: ScheduleItemPatch,
    },
    DeleteScheduleItem {
        external_id: String,
    },
}

impl Notification {
    /// Whether the change touches schedule records, which calls for a re-fetch
    pub fn touches_schedule_items(&self) -> bool {
        !matches!(
            self,
            Notification::SegmentTime { .. } | Notification::SegmentDuration { .. }
        )
    }
}

#[derive(Debug, Clone)]
enum Gesture {
    Move {
        item_id: ItemId,
        baseline: Span,
        /// Minutes between the block start and the grab point
        grab_offset: f64,
        /// Spans of every selected item when the drag began
        origins: Vec<(ItemId, Span)>,
    },
    Resize {
        item_id: ItemId,
        edge: Edge,
        baseline: Span,
        origin_x: f64,
    },
}

/// One timeline editing session
#[derive(Debug, Clone)]
pub struct Editor {
    config: EditorConfig,
    store: ItemStore,
    selection: Selection,
    undo: UndoLog,
    availability: AvailabilityMap,
    gesture: Option<Gesture>,
    outbox: Vec<Notification>,
}

impl Editor {
    /// Creates an editor over an existing store
    pub fn new(config: EditorConfig, store: ItemStore, availability: AvailabilityMap) -> Self {
        let undo = UndoLog::with_limit(config.undo_limit);
        Self {
            config,
            store,
            selection: Selection::new(),
            undo,
            availability,
            gesture: None,
            outbox: Vec::new(),
        }
    }

    /// Seeds an editor from freshly fetched records
    pub fn load(
        config: EditorConfig,
        window: RecordingWindow,
        segments: &[Segment],
        schedule_items: &[ScheduleItem],
        performers: &[Performer],
    ) -> Self {
        let store = ItemStore::seed(window, segments, schedule_items, config.default_segment_minutes);
        let availability = AvailabilityMap::new(performers, &window);
        log::info!(
            "Loaded timeline {}: {} items, {} performers",
            window.to_field(),
            store.len(),
            availability.len()
        );
        Self::new(config, store, availability)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &ItemStore {
        &self.store
    }

    pub fn window(&self) -> &RecordingWindow {
        self.store.window()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn undo_log(&self) -> &UndoLog {
        &self.undo
    }

    pub fn availability(&self) -> &AvailabilityMap {
        &self.availability
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Queued changes, oldest first
    pub fn pending_notifications(&self) -> &[Notification] {
        &self.outbox
    }

    /// Drains the queued changes
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    /// Puts changes the collaborator failed to persist back in front of the queue
    pub fn requeue(&mut self, notifications: Vec<Notification>) {
        let newer = std::mem::replace(&mut self.outbox, notifications);
        self.outbox.extend(newer);
    }

    /// Merges re-fetched schedule records, keeping local spans of known items
    pub fn reconcile(&mut self, fetched: &[ScheduleItem]) {
        self.store.reconcile(fetched);
        let store = &self.store;
        self.selection.retain(|id| store.contains(id));

        let gesture_item = match &self.gesture {
            Some(Gesture::Move { item_id, .. }) | Some(Gesture::Resize { item_id, .. }) => Some(item_id),
            None => None,
        };
        if gesture_item.is_some_and(|id| !self.store.contains(id)) {
            log::debug!("Gesture item vanished during reconciliation, dropping gesture");
            self.gesture = None;
        }
    }

    /// Records the id the record store assigned to a locally created item
    pub fn bind_external_id(&mut self, local_id: &ItemId, external_id: String) -> Result<()> {
        let item = self.store.get_mut(local_id)?;
        log::debug!("{} persisted as {}", local_id, external_id);
        item.external_id = Some(external_id);
        Ok(())
    }

    // Selection

    /// Click on an item
    pub fn click_item(&mut self, id: &ItemId, modifiers: Modifiers) -> Result<()> {
        self.store.require(id)?;
        let sorted = self.store.sorted_ids();
        self.selection.apply(&SelectionEvent::click(id.clone(), modifiers), &sorted);
        Ok(())
    }

    /// Press on the empty track: clears the selection (unless a modifier is
    /// held) and starts a rubber band
    pub fn background_down(&mut self, point: Point, modifiers: Modifiers) {
        let event = SelectionEvent::background(modifiers);
        let sorted = self.store.sorted_ids();
        self.selection.apply(&event, &sorted);
        self.selection.begin_band(point, modifiers.any());
    }

    /// Pointer motion while the rubber band is tracked
    pub fn pointer_move(&mut self, point: Point) {
        if !self.selection.band_active() {
            return;
        }
        let candidates: Vec<(ItemId, Rect)> = self
            .item_rects()
            .into_iter()
            .filter(|(id, _)| self.store.get(id).is_some_and(TimelineItem::is_segment))
            .collect();
        self.selection.update_band(point, |band| {
            candidates
                .iter()
                .filter(|(_, rect)| rect.intersects(band))
                .map(|(id, _)| id.clone())
                .collect()
        });
    }

    /// Pointer release ending the rubber band
    pub fn pointer_up(&mut self) {
        self.selection.finish_band();
    }

    // Move

    /// Starts dragging `id` grabbed at horizontal screen position `pointer_x`
    pub fn begin_move(&mut self, id: &ItemId, pointer_x: f64) -> Result<()> {
        if self.gesture.is_some() {
            return Err(Error::GestureInProgress);
        }
        let item = self.store.require(id)?;
        if !item.movable {
            return Err(Error::ItemNotMovable(id.clone()));
        }
        let baseline = item.span();
        let grab_offset = self.config.track.minute_at(pointer_x, self.window()) - baseline.start as f64;

        if !self.selection.contains(id) {
            self.selection.select_only(id.clone());
        }
        let origins = self
            .selection
            .ids()
            .filter_map(|sel| self.store.get(sel).map(|item| (sel.clone(), item.span())))
            .collect();

        self.gesture = Some(Gesture::Move {
            item_id: id.clone(),
            baseline,
            grab_offset,
            origins,
        });
        Ok(())
    }

    /// Drag-over at `pointer_x`: moves every selected item by the snapped
    /// offset of the dragged one, each clamped to the window on its own
    pub fn drag_to(&mut self, pointer_x: f64) -> Result<()> {
        let Some(Gesture::Move {
            item_id, grab_offset, ..
        }) = &self.gesture
        else {
            return Ok(());
        };

        let window = *self.window();
        let raw_target = self.config.track.minute_at(pointer_x, &window) - grab_offset;
        let snapped = snap_to_grid(raw_target.round() as i32);
        let offset = snapped.saturating_sub(self.store.require(item_id)?.start);
        if offset == 0 {
            return Ok(());
        }

        let moves: Vec<(ItemId, Span)> = self
            .selection
            .ids()
            .filter_map(|id| self.store.get(id))
            .filter(|item| item.movable)
            .map(|item| {
                let start = window.clamp_start(item.start.saturating_add(offset), item.duration);
                (item.id.clone(), Span::new(start, item.duration))
            })
            .collect();
        for (id, span) in moves {
            self.store.set_span_unchecked(&id, span)?;
        }
        Ok(())
    }

    /// Drop: commits every moved item and records undo for the dragged one
    pub fn drop_move(&mut self) -> Result<Option<UndoAction>> {
        let Some(Gesture::Move {
            item_id,
            baseline,
            origins,
            ..
        }) = self.gesture.take()
        else {
            return Ok(None);
        };

        for (id, before) in &origins {
            let Some(item) = self.store.get(id) else {
                continue;
            };
            let committed = self.store.commit_move(item.span());
            self.store.set_span_unchecked(id, committed)?;
            if committed != *before {
                self.notify_change(id, Some(*before));
            }
        }

        let after = self.store.require(&item_id)?.span();
        if after == baseline {
            return Ok(None);
        }
        log::info!(
            "Moved {} from {} to {}",
            item_id,
            minutes_to_time(baseline.start),
            minutes_to_time(after.start)
        );
        Ok(Some(self.record(UndoKind::Move, item_id, baseline, after)))
    }

    // Resize

    /// Starts an edge drag on `id` at horizontal screen position `pointer_x`
    pub fn begin_resize(&mut self, id: &ItemId, edge: Edge, pointer_x: f64) -> Result<()> {
        if self.gesture.is_some() {
            return Err(Error::GestureInProgress);
        }
        let item = self.store.require(id)?;
        if !item.movable {
            return Err(Error::ItemNotMovable(id.clone()));
        }
        self.gesture = Some(Gesture::Resize {
            item_id: id.clone(),
            edge,
            baseline: item.span(),
            origin_x: pointer_x,
        });
        Ok(())
    }

    /// Edge drag to `pointer_x`; only the resized item changes
    pub fn resize_to(&mut self, pointer_x: f64) -> Result<()> {
        let Some(Gesture::Resize {
            item_id,
            edge,
            baseline,
            origin_x,
        }) = &self.gesture
        else {
            return Ok(());
        };

        let window = *self.window();
        let delta_minutes = (pointer_x - origin_x) * self.config.track.minutes_per_pixel(&window);
        let delta = snap_to_grid(delta_minutes.round() as i32);

        let span = match edge {
            Edge::Right => Span::new(
                baseline.start,
                baseline.duration.saturating_add(delta).max(GRID_MINUTES),
            ),
            Edge::Left => {
                let start = baseline
                    .start
                    .saturating_add(delta)
                    .clamp(window.start, window.end - GRID_MINUTES);
                let duration = (baseline.duration - (start - baseline.start)).max(GRID_MINUTES);
                Span::new(start, duration)
            }
        };
        let item_id = item_id.clone();
        self.store.set_span_unchecked(&item_id, span)
    }

    /// Resize-end: commits the span and records undo when it changed
    pub fn end_resize(&mut self) -> Result<Option<UndoAction>> {
        let Some(Gesture::Resize { item_id, baseline, .. }) = self.gesture.take() else {
            return Ok(None);
        };

        let current = self.store.require(&item_id)?.span();
        let committed = self.store.commit_resize(current);
        self.store.set_span_unchecked(&item_id, committed)?;
        if committed == baseline {
            return Ok(None);
        }

        self.notify_change(&item_id, Some(baseline));
        log::info!(
            "Resized {} to {} for {} minutes",
            item_id,
            minutes_to_time(committed.start),
            committed.duration
        );
        Ok(Some(self.record(UndoKind::Resize, item_id, baseline, committed)))
    }

    /// Abandons the current drag, resize or rubber band, restoring what it changed
    pub fn cancel_gesture(&mut self) -> bool {
        let band = self.selection.band_active();
        self.selection.cancel_band();

        match self.gesture.take() {
            Some(Gesture::Move { origins, .. }) => {
                for (id, span) in origins {
                    if self.store.set_span_unchecked(&id, span).is_err() {
                        log::debug!("Cannot restore {} after cancel, item is gone", id);
                    }
                }
                true
            }
            Some(Gesture::Resize { item_id, baseline, .. }) => {
                if self.store.set_span_unchecked(&item_id, baseline).is_err() {
                    log::debug!("Cannot restore {} after cancel, item is gone", item_id);
                }
                true
            }
            None => band,
        }
    }

    // Undo

    /// Reverts the most recent move or resize; a no-op on an empty log
    pub fn undo(&mut self) -> Option<UndoAction> {
        if self.gesture.is_some() {
            log::debug!("Undo ignored while a gesture is in progress");
            return None;
        }
        let action = self.undo.pop()?;
        if self.store.set_span_unchecked(&action.item_id, action.before).is_err() {
            log::debug!("Undo target {} no longer exists, discarding", action.item_id);
            return Some(action);
        }
        self.notify_change(&action.item_id, None);
        log::info!("Undid {:?} of {}", action.kind, action.item_id);
        Some(action)
    }

    /// Global shortcuts: Ctrl/Cmd+Z undoes, Escape cancels the current
    /// gesture. Nothing fires while a text input has focus.
    pub fn handle_key(&mut self, key: Key, modifiers: Modifiers, in_text_input: bool) -> bool {
        if in_text_input {
            return false;
        }
        match key {
            Key::Char('z') | Key::Char('Z') if modifiers.command() && !modifiers.shift => {
                self.undo();
                true
            }
            Key::Escape => self.cancel_gesture(),
            _ => false,
        }
    }

    // Manual edits

    /// Sets a start time typed as `HH:MM`
    pub fn edit_time(&mut self, id: &ItemId, text: &str) -> Result<Span> {
        let minutes = time_to_minutes(text)?;
        let before = self.store.require(id)?.span();
        let committed = self.store.set_time(id, minutes)?;
        if committed != before {
            self.notify_change(id, Some(before));
            self.record(UndoKind::Move, id.clone(), before, committed);
        }
        Ok(committed)
    }

    /// Sets a duration typed by hand; invalid input is clamped to the grid
    pub fn edit_duration(&mut self, id: &ItemId, text: &str) -> Result<Span> {
        let minutes = parse_duration_input(text);
        let before = self.store.require(id)?.span();
        let committed = self.store.set_duration(id, minutes)?;
        if committed != before {
            self.notify_change(id, Some(before));
            self.record(UndoKind::Resize, id.clone(), before, committed);
        }
        Ok(committed)
    }

    /// Adds a break, preparation or custom block after the last occupied minute
    pub fn add_item(&mut self, kind: ScheduleItemKind, title: Option<&str>) -> Result<ItemId> {
        let title = title.unwrap_or_else(|| kind.default_title());
        let start = snap_to_grid(self.store.rightmost_end());
        let id = self
            .store
            .add_non_segment(kind.into(), title, start, self.config.new_item_minutes)?;

        let item = self.store.require(&id)?;
        self.outbox.push(Notification::CreateScheduleItem {
            local_id: id.clone(),
            kind,
            title: item.title.clone(),
            start_time: item.start_time(),
            duration_minutes: item.duration,
        });
        log::info!("Added {:?} {} at {}", kind, id, item.start_time());
        Ok(id)
    }

    /// Removes a break, preparation or custom block
    pub fn remove_item(&mut self, id: &ItemId) -> Result<TimelineItem> {
        if self.gesture.is_some() {
            return Err(Error::GestureInProgress);
        }
        let removed = self.store.remove_non_segment(id)?;
        self.selection.retain(|sel| sel != id);
        match &removed.external_id {
            Some(external_id) => self.outbox.push(Notification::DeleteScheduleItem {
                external_id: external_id.clone(),
            }),
            None => log::debug!("Removed unsaved item {}", id),
        }
        Ok(removed)
    }

    // Queries

    pub fn conflicts(&self, id: &ItemId) -> Vec<String> {
        self.store
            .get(id)
            .map(|item| self.availability.conflicts(item))
            .unwrap_or_default()
    }

    pub fn conflict_report(&self) -> Vec<(ItemId, Vec<String>)> {
        self.availability.report(self.store.items())
    }

    pub fn grid(&self) -> Vec<GridMark> {
        build_grid(self.window())
    }

    /// Projected placement of every item, in store order
    pub fn layouts(&self) -> Vec<(ItemId, ItemLayout)> {
        let window = self.window();
        assign_lanes(self.store.items())
            .into_iter()
            .zip(self.store.items())
            .map(|((id, lane), item)| {
                let layout = ItemLayout::project(item, lane, window, self.config.min_visible_width_percent);
                (id, layout)
            })
            .collect()
    }

    pub fn layout(&self, id: &ItemId) -> Option<ItemLayout> {
        self.layouts()
            .into_iter()
            .find(|(item_id, _)| item_id == id)
            .map(|(_, layout)| layout)
    }

    /// Screen rectangles of every item on the configured track
    pub fn item_rects(&self) -> Vec<(ItemId, Rect)> {
        self.layouts()
            .into_iter()
            .map(|(id, layout)| (id, self.config.track.item_rect(&layout)))
            .collect()
    }

    /// Full-state requests for every held item, used by bulk save
    pub fn save_all_requests(&self) -> Vec<Notification> {
        let mut requests = Vec::new();
        for item in self.store.items() {
            if let Some(plan_id) = &item.plan_id {
                requests.push(Notification::SegmentTime {
                    plan_id: plan_id.clone(),
                    start_time: item.start_time(),
                });
                requests.push(Notification::SegmentDuration {
                    plan_id: plan_id.clone(),
                    duration_text: format_duration_text(item.duration),
                });
                continue;
            }
            match (&item.external_id, item.kind.schedule_kind()) {
                (Some(external_id), _) => requests.push(Notification::UpdateScheduleItem {
                    external_id: external_id.clone(),
                    patch: ScheduleItemPatch {
                        title: Some(item.title.clone()),
                        start_time: Some(item.start_time()),
                        duration_minutes: Some(item.duration),
                    },
                }),
                (None, Some(kind)) => requests.push(Notification::CreateScheduleItem {
                    local_id: item.id.clone(),
                    kind,
                    title: item.title.clone(),
                    start_time: item.start_time(),
                    duration_minutes: item.duration,
                }),
                (None, None) => {}
            }
        }
        requests
    }

    fn record(&mut self, kind: UndoKind, item_id: ItemId, before: Span, after: Span) -> UndoAction {
        let action = UndoAction {
            kind,
            item_id,
            before,
            after,
        };
        self.undo.push(action.clone());
        action
    }

    /// Queues the persisted fields of `id` that differ from `before`; `None`
    /// sends the whole span
    fn notify_change(&mut self, id: &ItemId, before: Option<Span>) {
        let Some(item) = self.store.get(id) else {
            return;
        };
        let time_changed = before.map_or(true, |b| b.start != item.start);
        let duration_changed = before.map_or(true, |b| b.duration != item.duration);

        if let Some(plan_id) = &item.plan_id {
            if time_changed {
                self.outbox.push(Notification::SegmentTime {
                    plan_id: plan_id.clone(),
                    start_time: item.start_time(),
                });
            }
            if duration_changed {
                self.outbox.push(Notification::SegmentDuration {
                    plan_id: plan_id.clone(),
                    duration_text: format_duration_text(item.duration),
                });
            }
            return;
        }

        let Some(external_id) = &item.external_id else {
            log::debug!("{} is not persisted yet, change stays local", id);
            return;
        };
        let patch = ScheduleItemPatch {
            title: None,
            start_time: time_changed.then(|| item.start_time()),
            duration_minutes: duration_changed.then_some(item.duration),
        };
        if !patch.is_empty() {
            self.outbox.push(Notification::UpdateScheduleItem {
                external_id: external_id.clone(),
                patch,
            });
        }
    }
}
