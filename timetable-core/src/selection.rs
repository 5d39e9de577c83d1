//! Selection state and its click/rubber-band transitions

use crate::item::ItemId;
use crate::layout::{Point, Rect};
use indexmap::IndexSet;

/// Keyboard modifiers held during a pointer or key event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    /// Cmd on macOS
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl or Cmd
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn any(&self) -> bool {
        self.shift || self.command()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    PlainClick(ItemId),
    /// Ctrl/Cmd click
    ModifierClick(ItemId),
    ShiftClick(ItemId),
    /// Press on the empty track; `additive` keeps the current selection
    BackgroundDown { additive: bool },
}

impl SelectionEvent {
    /// Classifies a click on an item; Shift wins over Ctrl/Cmd
    pub fn click(id: ItemId, modifiers: Modifiers) -> Self {
        if modifiers.shift {
            SelectionEvent::ShiftClick(id)
        } else if modifiers.command() {
            SelectionEvent::ModifierClick(id)
        } else {
            SelectionEvent::PlainClick(id)
        }
    }

    pub fn background(modifiers: Modifiers) -> Self {
        SelectionEvent::BackgroundDown {
            additive: modifiers.any(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct RubberBand {
    origin: Point,
    current: Point,
    /// Selection held when the band started; empty unless additive
    base: IndexSet<ItemId>,
}

impl RubberBand {
    fn rect(&self) -> Rect {
        Rect::from_points(self.origin, self.current)
    }
}

/// Selected item ids in insertion order plus the range anchor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: IndexSet<ItemId>,
    anchor: Option<ItemId>,
    band: Option<RubberBand>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the selection after `event`.
    ///
    /// `sorted_ids` lists every item ordered by start time; shift ranges are
    /// taken by position in that order.
    pub fn reduce(&self, event: &SelectionEvent, sorted_ids: &[ItemId]) -> Selection {
        let mut next = self.clone();
        match event {
            SelectionEvent::PlainClick(id) => next.select_only(id.clone()),
            SelectionEvent::ModifierClick(id) => {
                if next.ids.shift_remove(id) {
                    return next;
                }
                next.ids.insert(id.clone());
                next.anchor = Some(id.clone());
            }
            SelectionEvent::ShiftClick(id) => {
                let range = self.anchor.as_ref().and_then(|anchor| {
                    let from = sorted_ids.iter().position(|x| x == anchor)?;
                    let to = sorted_ids.iter().position(|x| x == id)?;
                    Some(from.min(to)..=from.max(to))
                });
                match range {
                    Some(range) => next.ids = sorted_ids[range].iter().cloned().collect(),
                    None => next.select_only(id.clone()),
                }
            }
            SelectionEvent::BackgroundDown { additive } => {
                if !additive {
                    next.ids.clear();
                    next.anchor = None;
                }
            }
        }
        next
    }

    /// Applies `event` in place
    pub fn apply(&mut self, event: &SelectionEvent, sorted_ids: &[ItemId]) {
        *self = self.reduce(event, sorted_ids);
    }

    pub fn select_only(&mut self, id: ItemId) {
        self.ids.clear();
        self.ids.insert(id.clone());
        self.anchor = Some(id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.anchor = None;
        self.band = None;
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.ids.iter()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn anchor(&self) -> Option<&ItemId> {
        self.anchor.as_ref()
    }

    /// Drops ids for which `keep` is false, including a stale anchor
    pub fn retain(&mut self, mut keep: impl FnMut(&ItemId) -> bool) {
        self.ids.retain(|id| keep(id));
        if let Some(band) = &mut self.band {
            band.base.retain(|id| keep(id));
        }
        if self.anchor.as_ref().is_some_and(|anchor| !keep(anchor)) {
            self.anchor = None;
        }
    }

    /// Starts rubber-band tracking at `origin`
    pub fn begin_band(&mut self, origin: Point, additive: bool) {
        let base = if additive { self.ids.clone() } else { IndexSet::new() };
        if !additive {
            self.ids.clear();
            self.anchor = None;
        }
        self.band = Some(RubberBand {
            origin,
            current: origin,
            base,
        });
    }

    pub fn band_active(&self) -> bool {
        self.band.is_some()
    }

    /// Moves the band corner and replaces the selection with the base plus
    /// whatever `hit_test` reports inside the new rectangle
    pub fn update_band(&mut self, current: Point, hit_test: impl FnOnce(&Rect) -> Vec<ItemId>) {
        let Some(band) = &mut self.band else {
            return;
        };
        band.current = current;
        let hits = hit_test(&band.rect());
        let mut ids = band.base.clone();
        ids.extend(hits);
        self.ids = ids;
    }

    /// Stops tracking; the anchor becomes the last selected id
    pub fn finish_band(&mut self) {
        if self.band.take().is_some() {
            self.anchor = self.ids.last().cloned();
        }
    }

    /// Abandons the band and restores the selection it started from
    pub fn cancel_band(&mut self) {
        if let Some(band) = self.band.take() {
            self.ids = band.base;
            if self.anchor.as_ref().is_some_and(|a| !self.ids.contains(a)) {
                self.anchor = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ItemId> {
        names.iter().map(|n| ItemId::segment(n)).collect()
    }

    fn selected(selection: &Selection) -> Vec<ItemId> {
        selection.ids().cloned().collect()
    }

    #[test]
    fn test_plain_click_selects_alone() {
        let sorted = ids(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.apply(&SelectionEvent::PlainClick(sorted[0].clone()), &sorted);
        selection.apply(&SelectionEvent::PlainClick(sorted[1].clone()), &sorted);
        assert_eq!(selected(&selection), ids(&["b"]));
        assert_eq!(selection.anchor(), Some(&sorted[1]));
    }

    #[test]
    fn test_modifier_click_toggles() {
        let sorted = ids(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.apply(&SelectionEvent::PlainClick(sorted[0].clone()), &sorted);
        selection.apply(&SelectionEvent::click(sorted[2].clone(), Modifiers::ctrl()), &sorted);
        assert_eq!(selected(&selection), ids(&["a", "c"]));
        assert_eq!(selection.anchor(), Some(&sorted[2]));

        selection.apply(&SelectionEvent::ModifierClick(sorted[0].clone()), &sorted);
        assert_eq!(selected(&selection), ids(&["c"]));
        assert_eq!(selection.anchor(), Some(&sorted[2]));
    }

    #[test]
    fn test_shift_click_selects_sorted_range() {
        // Sorted by start: A(10:00), B(10:20), C(11:00)
        let sorted = ids(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.apply(&SelectionEvent::PlainClick(sorted[0].clone()), &sorted);
        selection.apply(&SelectionEvent::click(sorted[2].clone(), Modifiers::shift()), &sorted);
        assert_eq!(selected(&selection), ids(&["a", "b", "c"]));
        assert_eq!(selection.anchor(), Some(&sorted[0]));

        // Backwards from the same anchor
        selection.apply(&SelectionEvent::ShiftClick(sorted[0].clone()), &sorted);
        assert_eq!(selected(&selection), ids(&["a"]));
    }

    #[test]
    fn test_shift_click_without_anchor_acts_as_plain() {
        let sorted = ids(&["a", "b"]);
        let selection = Selection::new().reduce(&SelectionEvent::ShiftClick(sorted[1].clone()), &sorted);
        assert_eq!(selected(&selection), ids(&["b"]));
        assert_eq!(selection.anchor(), Some(&sorted[1]));
    }

    #[test]
    fn test_background_down_clears_unless_additive() {
        let sorted = ids(&["a"]);
        let mut selection = Selection::new();
        selection.apply(&SelectionEvent::PlainClick(sorted[0].clone()), &sorted);

        let kept = selection.reduce(&SelectionEvent::background(Modifiers::shift()), &sorted);
        assert_eq!(kept.len(), 1);

        selection.apply(&SelectionEvent::background(Modifiers::NONE), &sorted);
        assert!(selection.is_empty());
        assert!(selection.anchor().is_none());
    }

    #[test]
    fn test_rubber_band_replaces_and_sets_anchor() {
        let all = ids(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.select_only(all[2].clone());

        selection.begin_band(Point::new(0.0, 0.0), false);
        assert!(selection.is_empty());
        selection.update_band(Point::new(50.0, 10.0), |rect| {
            assert_eq!(rect.right, 50.0);
            all[..2].to_vec()
        });
        assert_eq!(selected(&selection), ids(&["a", "b"]));
        selection.update_band(Point::new(5.0, 10.0), |_| all[..1].to_vec());
        assert_eq!(selected(&selection), ids(&["a"]));

        selection.finish_band();
        assert!(!selection.band_active());
        assert_eq!(selection.anchor(), Some(&all[0]));
    }

    #[test]
    fn test_additive_band_and_cancel() {
        let all = ids(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.select_only(all[0].clone());

        selection.begin_band(Point::new(0.0, 0.0), true);
        selection.update_band(Point::new(9.0, 9.0), |_| vec![all[2].clone()]);
        assert_eq!(selected(&selection), ids(&["a", "c"]));

        selection.cancel_band();
        assert_eq!(selected(&selection), ids(&["a"]));
        assert_eq!(selection.anchor(), Some(&all[0]));
    }

    #[test]
    fn test_retain_drops_stale_anchor() {
        let all = ids(&["a", "b"]);
        let mut selection = Selection::new();
        selection.select_only(all[0].clone());
        selection.apply(&SelectionEvent::ModifierClick(all[1].clone()), &all);
        selection.retain(|id| id != &all[1]);
        assert_eq!(selected(&selection), ids(&["a"]));
        assert!(selection.anchor().is_none());
    }
}
