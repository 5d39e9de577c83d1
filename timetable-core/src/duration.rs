//! Conversion between integer minutes and the composite duration text
//! (`1時間30分`) that segment records carry.

use crate::time_grid::{snap_to_grid, GRID_MINUTES};

const HOUR_SUFFIX: &str = "時間";
const MINUTE_SUFFIX: &str = "分";

/// Formats minutes as `{h}時間{m}分`, omitting the hour part when it is zero
pub fn format_duration_text(minutes: i32) -> String {
    let minutes = minutes.max(0);
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours == 0 {
        format!("{}{}", rest, MINUTE_SUFFIX)
    } else {
        format!("{}{}{}{}", hours, HOUR_SUFFIX, rest, MINUTE_SUFFIX)
    }
}

/// Parses composite duration text back into minutes.
///
/// Accepts `1時間30分`, `2時間`, `45分`, bare minute counts (`90`) and the
/// latin forms `1h30m` / `45min`.
pub fn parse_duration_text(text: &str) -> Option<i32> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        return Some(text.parse().unwrap_or(i32::MAX));
    }
    if let Ok(minutes) = text.parse::<i32>() {
        return Some(minutes);
    }

    let mut total = 0;
    let mut number = String::new();
    let mut seen_unit = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if c.is_ascii_digit() {
            number.push(c);
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }

        let (factor, unit_len) = [
            (HOUR_SUFFIX, 60),
            (MINUTE_SUFFIX, 1),
            ("min", 1),
            ("h", 60),
            ("m", 1),
        ]
        .iter()
        .find(|(unit, _)| rest.starts_with(unit))
        .map(|(unit, factor)| (*factor, unit.len()))?;

        // Too many digits for i32 counts as the largest duration
        let value: i32 = number.parse().unwrap_or(i32::MAX);
        total = value.saturating_mul(factor).saturating_add(total);
        number.clear();
        seen_unit = true;
        rest = &rest[unit_len..];
    }

    if !number.is_empty() || !seen_unit {
        return None;
    }
    Some(total)
}

/// Forces a duration onto the grid with a floor of one grid step
pub fn normalize_duration(minutes: i32) -> i32 {
    snap_to_grid(minutes).max(GRID_MINUTES)
}

/// Interprets a manually typed duration; invalid input is clamped, never rejected
pub fn parse_duration_input(text: &str) -> i32 {
    match parse_duration_text(text) {
        Some(minutes) => normalize_duration(minutes),
        None => {
            log::debug!("Unparseable duration input {:?}, using minimum", text);
            GRID_MINUTES
        }
    }
}
