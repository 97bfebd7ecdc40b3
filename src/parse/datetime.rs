use crate::error::ExifToolError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, ParseError};

/// Timestamp layouts exiftool uses for date tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    Date,
    Naive,
    NaiveSubsec,
    Zoned,
    ZonedSubsec,
}

impl DateFormat {
    /// The `chrono` format string for this layout.
    pub fn as_str(self) -> &'static str {
        match self {
            DateFormat::Date => "%Y:%m:%d",
            DateFormat::Naive => "%Y:%m:%d %H:%M:%S",
            DateFormat::NaiveSubsec => "%Y:%m:%d %H:%M:%S%.f",
            DateFormat::Zoned => "%Y:%m:%d %H:%M:%S%:z",
            DateFormat::ZonedSubsec => "%Y:%m:%d %H:%M:%S%.f%:z",
        }
    }

    /// Parses an already normalized string. Values without an offset are
    /// taken as UTC.
    pub fn parse(self, normalized: &str) -> Result<DateTime<FixedOffset>, ParseError> {
        match self {
            DateFormat::Date => {
                let date = NaiveDate::parse_from_str(normalized, self.as_str())?;
                Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
            }
            DateFormat::Naive | DateFormat::NaiveSubsec => {
                let naive = NaiveDateTime::parse_from_str(normalized, self.as_str())?;
                Ok(naive.and_utc().fixed_offset())
            }
            DateFormat::Zoned | DateFormat::ZonedSubsec => {
                DateTime::parse_from_str(normalized, self.as_str())
            }
        }
    }
}

/// Normalizes the separators of an exiftool timestamp and detects its layout.
///
/// Accepts `YYYY:MM:DD`, `YYYY:MM:DD HH:MM:SS` with optional fractional
/// seconds and offset (`Z`, `+HH:MM`, `+HHMM`, `+HH`), ISO `-`/`T`
/// separators, and a trailing ` DST` marker.
pub fn detect_format(raw: &str) -> (DateFormat, String) {
    let mut s = raw.trim().trim_end_matches(" DST").trim_end().to_string();

    // 2010-06-15T10:20:30 -> 2010:06:15 10:20:30
    if s.len() >= 10 && s.is_char_boundary(10) {
        let (date, rest) = s.split_at(10);
        let date = date.replacen('-', ":", 2);
        let rest = rest.strip_prefix('T').map(|r| format!(" {r}"));
        s = format!("{}{}", date, rest.as_deref().unwrap_or(&s[10..]));
    }

    if let Some(stripped) = s.strip_suffix('Z') {
        s = format!("{stripped}+00:00");
    }

    let Some(tail) = s.get(19..) else {
        let format = if s.len() == 10 {
            DateFormat::Date
        } else {
            DateFormat::Naive
        };
        return (format, s);
    };

    let subsec = tail.starts_with('.');
    let Some(offset_at) = tail.find(['+', '-']) else {
        let format = if subsec {
            DateFormat::NaiveSubsec
        } else {
            DateFormat::Naive
        };
        return (format, s);
    };

    let split = 19 + offset_at;
    let offset = normalize_offset(&s[split..]);
    s = format!("{}{}", &s[..split], offset);
    let format = if subsec {
        DateFormat::ZonedSubsec
    } else {
        DateFormat::Zoned
    };
    (format, s)
}

// "+0200" -> "+02:00", "+02" -> "+02:00"
fn normalize_offset(offset: &str) -> String {
    let (sign, digits) = offset.split_at(1);
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return offset.to_string();
    }
    match digits.len() {
        2 => format!("{sign}{digits}:00"),
        4 => format!("{sign}{}:{}", &digits[..2], &digits[2..]),
        _ => offset.to_string(),
    }
}

/// Detects the layout of `raw` and parses it.
pub fn parse_exif_datetime(raw: &str) -> Result<DateTime<FixedOffset>, ExifToolError> {
    let (format, normalized) = detect_format(raw);
    format
        .parse(&normalized)
        .map_err(|source| ExifToolError::DateParse {
            value: normalized,
            format: format.as_str(),
            source,
        })
}

/// Exiftool writes `0000:00:00 00:00:00` (and similar) for unset dates.
/// Anything that does not start with a nonzero digit is such a placeholder.
pub fn is_zero_date(raw: &str) -> bool {
    !matches!(raw.as_bytes().first(), Some(b'1'..=b'9'))
}
