//! Time-of-day arithmetic and the 10-minute ruler

use crate::{Error, Result};

/// Step of the timeline grid in minutes
pub const GRID_MINUTES: i32 = 10;

/// Minutes in one day; `24:00` is accepted as an end of day
pub const MINUTES_PER_DAY: i32 = 24 * 60;

const DEFAULT_WINDOW_START: i32 = 9 * 60;
const DEFAULT_WINDOW_END: i32 = 18 * 60;

/// Parses `HH:MM` (optionally `HH:MM:SS`) into minutes from midnight
pub fn time_to_minutes(hhmm: &str) -> Result<i32> {
    let invalid = || Error::InvalidTime(hhmm.to_string());
    let mut parts = hhmm.trim().split(':');

    let hours: i32 = parts
        .next()
        .filter(|p| !p.is_empty() && p.len() <= 2)
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    let minutes: i32 = parts
        .next()
        .filter(|p| p.len() == 2)
        .and_then(|p| p.parse().ok())
        .ok_or_else(invalid)?;
    // Seconds are accepted and dropped
    if let Some(seconds) = parts.next() {
        if seconds.len() != 2 || seconds.parse::<u8>().map_or(true, |s| s >= 60) {
            return Err(invalid());
        }
    }
    if parts.next().is_some() || minutes >= 60 || hours < 0 {
        return Err(invalid());
    }

    let total = hours * 60 + minutes;
    if total > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(total)
}

/// Formats minutes from midnight as `HH:MM`, clamped to one day
pub fn minutes_to_time(minutes: i32) -> String {
    let minutes = minutes.clamp(0, MINUTES_PER_DAY);
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Rounds to the nearest grid step, ties rounding up; saturates at the `i32` range
pub fn snap_to_grid(minutes: i32) -> i32 {
    minutes
        .saturating_add(GRID_MINUTES / 2)
        .div_euclid(GRID_MINUTES)
        .saturating_mul(GRID_MINUTES)
}

/// Start and end of the whole recording day, in minutes from midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordingWindow {
    pub start: i32,
    pub end: i32,
}

impl Default for RecordingWindow {
    fn default() -> Self {
        Self {
            start: DEFAULT_WINDOW_START,
            end: DEFAULT_WINDOW_END,
        }
    }
}

impl RecordingWindow {
    /// Creates a window shrunk inward onto the grid, falling back to the
    /// default when less than one grid step remains
    pub fn new(start: i32, end: i32) -> Self {
        Self::aligned(start, end).unwrap_or_else(|| {
            log::debug!("Empty recording window {}..{}, using default", start, end);
            Self::default()
        })
    }

    /// Parses an `HH:MM-HH:MM` field, reporting malformed input. Bounds off
    /// the grid are moved inward to the nearest grid step.
    pub fn try_parse(text: &str) -> Result<Self> {
        let invalid = || Error::InvalidWindow(text.to_string());
        let (start, end) = text.split_once('-').ok_or_else(invalid)?;
        let start = time_to_minutes(start).map_err(|_| invalid())?;
        let end = time_to_minutes(end).map_err(|_| invalid())?;
        Self::aligned(start, end).ok_or_else(invalid)
    }

    /// Start rounded up and end rounded down to the grid; `None` when that
    /// leaves less than one grid step
    fn aligned(start: i32, end: i32) -> Option<Self> {
        let start = start
            .saturating_add(GRID_MINUTES - 1)
            .div_euclid(GRID_MINUTES)
            .saturating_mul(GRID_MINUTES);
        let end = end.div_euclid(GRID_MINUTES).saturating_mul(GRID_MINUTES);
        (end.saturating_sub(start) >= GRID_MINUTES).then_some(Self { start, end })
    }

    /// Parses an `HH:MM-HH:MM` field; absent or malformed input yields 09:00-18:00
    pub fn parse(text: Option<&str>) -> Self {
        match text.map(Self::try_parse) {
            Some(Ok(window)) => window,
            Some(Err(err)) => {
                log::debug!("{}, using default window", err);
                Self::default()
            }
            None => Self::default(),
        }
    }

    /// Length of the window in minutes
    pub fn duration(&self) -> i32 {
        self.end - self.start
    }

    /// Checks whether `[start, start + duration]` lies inside the window
    pub fn contains_span(&self, start: i32, duration: i32) -> bool {
        start >= self.start && start + duration <= self.end
    }

    /// Pulls a block of fixed `duration` back inside the window
    pub fn clamp_start(&self, start: i32, duration: i32) -> i32 {
        start.min(self.end - duration).max(self.start)
    }

    /// Keeps the start inside the window, at least one grid step before its
    /// end, and cuts the duration to what still fits
    pub fn clamp_span(&self, start: i32, duration: i32) -> (i32, i32) {
        let start = start.clamp(self.start, self.end - GRID_MINUTES);
        let room = ((self.end - start) / GRID_MINUTES * GRID_MINUTES).max(GRID_MINUTES);
        (start, duration.clamp(GRID_MINUTES, room))
    }

    /// Formats the window back into its `HH:MM-HH:MM` field form
    pub fn to_field(&self) -> String {
        format!("{}-{}", minutes_to_time(self.start), minutes_to_time(self.end))
    }
}

/// One tick of the timeline ruler
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GridMark {
    pub time: String,
    pub minutes: i32,
    pub position_percent: f64,
    pub is_hour_mark: bool,
    pub is_half_hour_mark: bool,
}

/// Builds the ruler at grid steps from `window.start` (inclusive) to `window.end` (exclusive)
pub fn build_grid(window: &RecordingWindow) -> Vec<GridMark> {
    let span = window.duration() as f64;
    (window.start..window.end)
        .step_by(GRID_MINUTES as usize)
        .map(|minutes| GridMark {
            time: minutes_to_time(minutes),
            minutes,
            position_percent: (minutes - window.start) as f64 / span * 100.0,
            is_hour_mark: minutes % 60 == 0,
            is_half_hour_mark: minutes % 60 == 30,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_roundtrip_whole_day() {
        for minutes in 0..MINUTES_PER_DAY {
            let text = minutes_to_time(minutes);
            assert_eq!(time_to_minutes(&text).unwrap(), minutes, "{}", text);
        }
    }

    #[test]
    fn test_time_parsing_variants() {
        assert_eq!(time_to_minutes("9:05").unwrap(), 545);
        assert_eq!(time_to_minutes("10:30:00").unwrap(), 630);
        assert_eq!(time_to_minutes("24:00").unwrap(), MINUTES_PER_DAY);
        assert!(time_to_minutes("24:10").is_err());
        assert!(time_to_minutes("10:60").is_err());
        assert!(time_to_minutes("10").is_err());
        assert!(time_to_minutes("ab:cd").is_err());
        assert!(time_to_minutes("").is_err());
    }

    #[test]
    fn test_snap_to_grid() {
        for m in -100..2000 {
            let snapped = snap_to_grid(m);
            assert_eq!(snapped % GRID_MINUTES, 0);
            assert!((snapped - m).abs() <= 5, "{} -> {}", m, snapped);
        }
        assert_eq!(snap_to_grid(604), 600);
        assert_eq!(snap_to_grid(605), 610);
        assert_eq!(snap_to_grid(-5), 0);
        assert_eq!(snap_to_grid(-6), -10);
        assert_eq!(snap_to_grid(i32::MAX), 2_147_483_640);
        assert_eq!(snap_to_grid(i32::MIN), i32::MIN);
    }

    #[test]
    fn test_window_parse_and_fallback() {
        let window = RecordingWindow::parse(Some("10:00-17:30"));
        assert_eq!(window, RecordingWindow { start: 600, end: 1050 });
        assert_eq!(window.to_field(), "10:00-17:30");

        let default = RecordingWindow::default();
        assert_eq!(RecordingWindow::parse(None), default);
        assert_eq!(RecordingWindow::parse(Some("garbage")), default);
        assert_eq!(RecordingWindow::parse(Some("18:00-09:00")), default);
        assert_eq!(RecordingWindow::parse(Some("10:00-10:00")), default);
        assert!(RecordingWindow::try_parse("10:00-").is_err());
    }

    #[test]
    fn test_window_bounds_move_onto_grid() {
        let window = RecordingWindow::parse(Some("09:05-17:55"));
        assert_eq!(window, RecordingWindow { start: 550, end: 1070 });
        assert_eq!(window.clamp_start(500, 30), 550);
        assert_eq!(window.clamp_start(1060, 30), 1040);
        assert_eq!(window.clamp_span(1070, 30), (1060, 10));

        // Nothing left once both ends are aligned
        assert_eq!(RecordingWindow::parse(Some("09:05-09:14")), RecordingWindow::default());
        assert!(RecordingWindow::try_parse("09:05-09:14").is_err());
        assert_eq!(RecordingWindow::new(i32::MIN, i32::MAX).start % GRID_MINUTES, 0);
    }

    #[test]
    fn test_clamp_start_keeps_duration() {
        let window = RecordingWindow::default();
        assert_eq!(window.clamp_start(500, 30), 540);
        assert_eq!(window.clamp_start(1070, 30), 1050);
        assert_eq!(window.clamp_start(600, 30), 600);
        assert_eq!(window.clamp_start(600, 10_000), 540);
    }

    #[test]
    fn test_clamp_span_cuts_duration() {
        let window = RecordingWindow::default();
        assert_eq!(window.clamp_span(500, 30), (540, 30));
        assert_eq!(window.clamp_span(1070, 30), (1070, 10));
        assert_eq!(window.clamp_span(600, 0), (600, 10));
        assert_eq!(window.clamp_span(600, 10_000), (600, 480));
    }

    #[test]
    fn test_build_grid() {
        let window = RecordingWindow::parse(Some("09:00-10:00"));
        let grid = build_grid(&window);

        assert_eq!(grid.len(), 6);
        assert_eq!(grid[0].time, "09:00");
        assert!(grid[0].is_hour_mark);
        assert_eq!(grid[0].position_percent, 0.0);
        assert!(grid[3].is_half_hour_mark);
        assert!(!grid[3].is_hour_mark);
        assert_eq!(grid[5].minutes, 590);
        assert!((grid[3].position_percent - 50.0).abs() < 1e-9);
    }
}
