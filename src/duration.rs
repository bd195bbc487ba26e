//! Free-text duration handling
//!
//! Study-history and resource-time exports encode time as `"Xh Ym Zs"` text.
//! Parsing is strict per component: any malformed component fails the whole
//! cell, letting the normalizer degrade it to zero with a warning.

/// Parse a `"Xh Ym Zs"` duration to total seconds.
///
/// All components are optional ("45m", "2h 5s", "30s" are all valid); an empty
/// or whitespace-only string is zero. Returns `None` on any malformed
/// component.
pub fn parse_duration(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0);
    }

    let mut total: u64 = 0;
    let mut seen_any = false;
    for part in trimmed.split_whitespace() {
        let split = part.len().checked_sub(1)?;
        if !part.is_char_boundary(split) {
            return None;
        }
        let (digits, unit) = part.split_at(split);
        let value: u64 = digits.parse().ok()?;
        let factor = match unit {
            "h" => 3600,
            "m" => 60,
            "s" => 1,
            _ => return None,
        };
        total = total.checked_add(value.checked_mul(factor)?)?;
        seen_any = true;
    }

    seen_any.then_some(total)
}

/// Format seconds as `"Xh Ym Zs"`, omitting leading zero components.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}
