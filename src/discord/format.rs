// Formatting helpers shared by the command files.

/// Format a number with commas for readability.
pub fn format_number(n: i64) -> String {
    let s = n.to_string();
    let negative = s.starts_with('-');
    let s = if negative { &s[1..] } else { &s };

    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }

    if negative {
        result.insert(0, '-');
    }

    result
}

/// Human-readable duration: "45s", "4m 10s", "3h 25m", "2d 3h".
pub fn format_duration(d: std::time::Duration) -> String {
    let total = d.as_secs();
    if total < 60 {
        format!("{}s", total)
    } else if total < 3600 {
        format!("{}m {}s", total / 60, total % 60)
    } else if total < 86400 {
        format!("{}h {}m", total / 3600, (total % 3600) / 60)
    } else {
        format!("{}d {}h", total / 86400, (total % 86400) / 3600)
    }
}

/// Parse a user-supplied amount. "all" and "max" resolve to `available`;
/// plain numbers must be at least 1.
pub fn parse_amount(input: &str, available: i64) -> Option<i64> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") || input.eq_ignore_ascii_case("max") {
        return Some(available);
    }
    match input.replace(',', "").parse::<i64>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(100), "100");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-1234567), "-1,234,567");
    }

    #[test]
    fn test_format_duration() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_duration(Duration::from_secs(250)), "4m 10s");
        assert_eq!(format_duration(Duration::from_secs(12300)), "3h 25m");
        assert_eq!(format_duration(Duration::from_secs(183600)), "2d 3h");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("250", 1000), Some(250));
        assert_eq!(parse_amount("1,000", 5000), Some(1000));
        assert_eq!(parse_amount("all", 321), Some(321));
        assert_eq!(parse_amount("MAX", 0), Some(0));
        assert_eq!(parse_amount("0", 100), None);
        assert_eq!(parse_amount("-5", 100), None);
        assert_eq!(parse_amount("lots", 100), None);
    }
}
