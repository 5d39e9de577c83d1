//! Blocks placed on the timeline

use crate::records::ScheduleItemKind;
use crate::time_grid::minutes_to_time;
use std::fmt;

/// Identifier of a timeline item, unique within one item set
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId(String);

impl ItemId {
    const SEGMENT_PREFIX: &'static str = "segment:";
    const SCHEDULE_PREFIX: &'static str = "item:";
    const LOCAL_PREFIX: &'static str = "local:";

    /// Id of the item backed by a plan record
    pub fn segment(plan_id: &str) -> Self {
        Self(format!("{}{}", Self::SEGMENT_PREFIX, plan_id))
    }

    /// Id of the item backed by a stored schedule record
    pub fn schedule(external_id: &str) -> Self {
        Self(format!("{}{}", Self::SCHEDULE_PREFIX, external_id))
    }

    /// Id of an item not yet persisted
    pub fn local(seq: u32) -> Self {
        Self(format!("{}{}", Self::LOCAL_PREFIX, seq))
    }

    /// Parses a printed id; a bare string is taken as a plan id
    pub fn parse(text: &str) -> Self {
        if text.starts_with(Self::SEGMENT_PREFIX)
            || text.starts_with(Self::SCHEDULE_PREFIX)
            || text.starts_with(Self::LOCAL_PREFIX)
        {
            Self(text.to_string())
        } else {
            Self::segment(text)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ItemKind {
    Segment,
    Break,
    Preparation,
    Custom,
}

impl ItemKind {
    /// Schedule record kind, `None` for segments
    pub fn schedule_kind(&self) -> Option<ScheduleItemKind> {
        match self {
            ItemKind::Segment => None,
            ItemKind::Break => Some(ScheduleItemKind::Break),
            ItemKind::Preparation => Some(ScheduleItemKind::Preparation),
            ItemKind::Custom => Some(ScheduleItemKind::Custom),
        }
    }
}

impl From<ScheduleItemKind> for ItemKind {
    fn from(kind: ScheduleItemKind) -> Self {
        match kind {
            ScheduleItemKind::Break => ItemKind::Break,
            ScheduleItemKind::Preparation => ItemKind::Preparation,
            ScheduleItemKind::Custom => ItemKind::Custom,
        }
    }
}

/// Presentation color class of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemColor {
    ConfirmedSegment,
    UnconfirmedSegment,
    Break,
    Preparation,
    Custom,
}

impl ItemColor {
    pub fn hex(&self) -> &'static str {
        match self {
            ItemColor::ConfirmedSegment => "#3b82f6",
            ItemColor::UnconfirmedSegment => "#93c5fd",
            ItemColor::Break => "#9ca3af",
            ItemColor::Preparation => "#f59e0b",
            ItemColor::Custom => "#8b5cf6",
        }
    }
}

/// Start and duration of a block in minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub start: i32,
    pub duration: i32,
}

impl Span {
    pub fn new(start: i32, duration: i32) -> Self {
        Self { start, duration }
    }

    pub fn end(&self) -> i32 {
        self.start.saturating_add(self.duration)
    }
}

/// A schedulable block on the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineItem {
    pub id: ItemId,
    pub kind: ItemKind,
    pub title: String,
    /// Minutes from midnight
    pub start: i32,
    /// Length in minutes
    pub duration: i32,
    pub movable: bool,
    /// Performer ids in participant order; segments only
    pub participant_ids: Vec<String>,
    /// Backing plan record; segments only
    pub plan_id: Option<String>,
    /// Backing schedule record; `None` until persisted
    pub external_id: Option<String>,
    pub confirmed: bool,
}

impl TimelineItem {
    pub fn is_segment(&self) -> bool {
        self.kind == ItemKind::Segment
    }

    pub fn end(&self) -> i32 {
        self.start.saturating_add(self.duration)
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.duration)
    }

    pub fn set_span(&mut self, span: Span) {
        self.start = span.start;
        self.duration = span.duration;
    }

    /// Start as `HH:MM`
    pub fn start_time(&self) -> String {
        minutes_to_time(self.start)
    }

    pub fn color(&self) -> ItemColor {
        match self.kind {
            ItemKind::Segment if self.confirmed => ItemColor::ConfirmedSegment,
            ItemKind::Segment => ItemColor::UnconfirmedSegment,
            ItemKind::Break => ItemColor::Break,
            ItemKind::Preparation => ItemColor::Preparation,
            ItemKind::Custom => ItemColor::Custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_parse() {
        assert_eq!(ItemId::parse("p1"), ItemId::segment("p1"));
        assert_eq!(ItemId::parse("item:42"), ItemId::schedule("42"));
        assert_eq!(ItemId::parse("local:3"), ItemId::local(3));
        assert_eq!(ItemId::schedule("42").to_string(), "item:42");
    }

    #[test]
    fn test_color_follows_kind_and_confirmation() {
        let mut item = TimelineItem {
            id: ItemId::segment("p1"),
            kind: ItemKind::Segment,
            title: "Opening".to_string(),
            start: 600,
            duration: 30,
            movable: true,
            participant_ids: Vec::new(),
            plan_id: Some("p1".to_string()),
            external_id: None,
            confirmed: false,
        };
        assert_eq!(item.color(), ItemColor::UnconfirmedSegment);
        item.confirmed = true;
        assert_eq!(item.color(), ItemColor::ConfirmedSegment);
        item.kind = ItemKind::Preparation;
        assert_eq!(item.color(), ItemColor::Preparation);
        assert_eq!(item.color().hex(), "#f59e0b");
        assert_eq!(item.start_time(), "10:00");
        assert_eq!(item.end(), 630);
    }
}
