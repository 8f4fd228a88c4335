//! 通用工具函数

use chrono::{DateTime, Utc};

/// Long human-readable date, e.g. `Monday 19 October 2026, 14:05`
pub fn format_long_date(at: DateTime<Utc>) -> String {
    at.format("%A %-d %B %Y, %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_long_date() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 14, 5, 0).unwrap();
        assert_eq!(format_long_date(at), "Monday 19 October 2026, 14:05");
    }
}
