//! Shared formatting helpers for hostwatch
//!
//! Byte sizes, uptimes, durations and width-aware truncation used by both the
//! terminal screens and the `--dump` output.

use std::path::{Path, PathBuf};
use std::time::Duration;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Default mount point for disk figures
pub fn get_root_disk_path() -> PathBuf {
    PathBuf::from("/")
}

/// Lossy path rendering for display.
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Human-readable byte size ("1.5 GiB")
pub fn format_bytes(bytes: u64) -> String {
    bytesize::to_string(bytes, true)
}

/// Format an uptime as "3d 4h 12m", "4h 12m" or "12m"
pub fn format_uptime(uptime: Duration) -> String {
    let seconds = uptime.as_secs();
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Short elapsed-time rendering for command results ("850ms", "2.4s")
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed < Duration::from_secs(1) {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}

/// Percentage of `part` in `total`, 0 when total is 0
pub fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Truncate to at most `width` display columns, appending '…' when cut.
pub fn truncate_to_width(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut used = 0usize;
    for ch in s.chars() {
        let char_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        // Leave one column for the ellipsis
        if used + char_width > width - 1 {
            break;
        }
        result.push(ch);
        used += char_width;
    }
    result.push('…');
    result
}
