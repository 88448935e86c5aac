//! Human-readable formatting for byte counts and durations.

const UNIT_STEP: f64 = 1024.0;

/// Display unit for byte counts (base 1024).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SizeUnit {
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
}

impl SizeUnit {
    /// Largest unit in which `bytes` is at least 1.
    pub fn for_bytes(bytes: i64) -> Self {
        let magnitude = bytes.unsigned_abs() as f64;
        if magnitude >= UNIT_STEP.powi(3) {
            SizeUnit::Gigabytes
        } else if magnitude >= UNIT_STEP.powi(2) {
            SizeUnit::Megabytes
        } else if magnitude >= UNIT_STEP {
            SizeUnit::Kilobytes
        } else {
            SizeUnit::Bytes
        }
    }

    fn exponent(self) -> i32 {
        match self {
            SizeUnit::Bytes => 0,
            SizeUnit::Kilobytes => 1,
            SizeUnit::Megabytes => 2,
            SizeUnit::Gigabytes => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeUnit::Bytes => "Bytes",
            SizeUnit::Kilobytes => "KB",
            SizeUnit::Megabytes => "MB",
            SizeUnit::Gigabytes => "GB",
        }
    }
}

/// Format `bytes` in a fixed unit with at most two decimals, trailing zeros dropped.
pub fn format_size_in(bytes: i64, unit: SizeUnit) -> String {
    let value = bytes as f64 / UNIT_STEP.powi(unit.exponent());
    let rendered = format!("{:.2}", value);
    let trimmed = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, unit.label())
}

/// Format a byte count, e.g. `0 Bytes`, `1.5 KB`, `2 MB`.
pub fn format_file_size(bytes: i64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    format_size_in(bytes, SizeUnit::for_bytes(bytes))
}

/// Format a duration in seconds as `M:SS`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_size_zero() {
        assert_eq!(format_file_size(0), "0 Bytes");
    }

    #[test]
    fn file_size_picks_largest_whole_unit() {
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1 GB");
    }

    #[test]
    fn file_size_rounds_to_two_decimals() {
        assert_eq!(format_file_size(1_234_567), "1.18 MB");
    }

    #[test]
    fn size_in_fixed_unit() {
        let mb = 1024 * 1024;
        assert_eq!(format_size_in(1024 * mb, SizeUnit::Megabytes), "1024 MB");
        assert_eq!(format_size_in(150 * mb, SizeUnit::Megabytes), "150 MB");
    }

    #[test]
    fn duration_formats_minutes_and_seconds() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(5.9), "0:05");
        assert_eq!(format_duration(65.0), "1:05");
        assert_eq!(format_duration(3600.0), "60:00");
    }

    #[test]
    fn duration_handles_invalid_input() {
        assert_eq!(format_duration(f64::NAN), "0:00");
        assert_eq!(format_duration(-3.0), "0:00");
    }
}
