//! Records exchanged with the external persistence collaborator

/// Project record; only the recording window field matters to the editor
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Project {
    pub id: String,
    pub title: String,
    /// `HH:MM-HH:MM`
    #[cfg_attr(feature = "serde", serde(default))]
    pub recording_time: Option<String>,
}

/// A performer taking part in a segment
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Participant {
    pub performer_id: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub role: Option<String>,
}

/// A planned recording segment
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Segment {
    pub id: String,
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scheduled_time: Option<String>,
    /// Composite text such as `1時間30分`
    pub duration_text: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub participants: Vec<Participant>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScheduleItemKind {
    Break,
    Preparation,
    Custom,
}

impl ScheduleItemKind {
    /// Title given to freshly added items of this kind
    pub fn default_title(&self) -> &'static str {
        match self {
            ScheduleItemKind::Break => "休憩",
            ScheduleItemKind::Preparation => "準備",
            ScheduleItemKind::Custom => "その他",
        }
    }
}

impl std::str::FromStr for ScheduleItemKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "break" => Ok(ScheduleItemKind::Break),
            "preparation" => Ok(ScheduleItemKind::Preparation),
            "custom" => Ok(ScheduleItemKind::Custom),
            other => Err(format!("unknown schedule item kind: {}", other)),
        }
    }
}

/// A break, preparation or custom block stored independently of segments
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScheduleItem {
    pub id: String,
    pub kind: ScheduleItemKind,
    pub title: String,
    /// `HH:MM`
    pub start_time: String,
    pub duration_minutes: i32,
}

/// Partial update of a schedule item
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ScheduleItemPatch {
    pub title: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i32>,
}

impl ScheduleItemPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.start_time.is_none() && self.duration_minutes.is_none()
    }

    /// Applies the patch onto a stored record
    pub fn apply_to(&self, item: &mut ScheduleItem) {
        if let Some(title) = &self.title {
            item.title = title.clone();
        }
        if let Some(start_time) = &self.start_time {
            item.start_time = start_time.clone();
        }
        if let Some(duration) = self.duration_minutes {
            item.duration_minutes = duration;
        }
    }
}

/// A performer and their time constraints
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct Performer {
    pub id: String,
    pub name: String,
    /// Confirmed arrival time
    pub start_time: Option<String>,
    /// Confirmed departure time
    pub end_time: Option<String>,
    /// Explicitly adjusted availability start
    pub available_start_time: Option<String>,
    /// Explicitly adjusted availability end
    pub available_end_time: Option<String>,
    pub confirmed: bool,
}
