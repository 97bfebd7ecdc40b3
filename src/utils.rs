/// Parses an integer from a loosely formatted string: the whole trimmed
/// string first, then its first whitespace-separated part (`"4000 pixels"`).
/// Decimal values are truncated.
pub fn parse_leading_i64(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(num) = value.parse::<i64>() {
        return Some(num);
    }
    let first_part = value.split_whitespace().next()?;
    first_part.parse::<i64>().ok().or_else(|| {
        first_part
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64)
    })
}

/// Float counterpart of [`parse_leading_i64`]. Exiftool's `"undef"` reads as `None`.
pub fn parse_leading_f64(value: &str) -> Option<f64> {
    let value = value.trim();
    if value == "undef" {
        return None;
    }
    if let Ok(num) = value.parse::<f64>() {
        return Some(num).filter(|f| f.is_finite());
    }
    let first_part = value.split_whitespace().next()?;
    first_part.parse::<f64>().ok().filter(|f| f.is_finite())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_leading_i64() {
        assert_eq!(parse_leading_i64(" 42 "), Some(42));
        assert_eq!(parse_leading_i64("-7"), Some(-7));
        assert_eq!(parse_leading_i64("1920 pixels"), Some(1920));
        assert_eq!(parse_leading_i64("72.8"), Some(72));
        assert_eq!(parse_leading_i64(""), None);
        assert_eq!(parse_leading_i64("inches"), None);
    }

    #[test]
    fn test_parse_leading_f64() {
        assert_eq!(parse_leading_f64("12.5 m"), Some(12.5));
        assert_eq!(parse_leading_f64("undef"), None);
        assert_eq!(parse_leading_f64("NaN"), None);
        assert_eq!(parse_leading_f64("abc"), None);
    }
}
