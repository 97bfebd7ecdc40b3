use crate::parse::datetime::{is_zero_date, parse_exif_datetime};
use crate::utils::parse_leading_f64;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// GPS location decoded from exiftool's composite `GPSPosition`,
/// `GPSAltitude` and `GPSDateTime` tags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GpsData {
    /// Decimal degrees, negative south of the equator.
    pub latitude: Option<f64>,
    /// Decimal degrees, negative west of Greenwich.
    pub longitude: Option<f64>,
    /// Metres, negative below sea level.
    pub altitude: Option<f64>,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

impl GpsData {
    /// Decodes the three tag strings. Each component that cannot be read
    /// (missing, placeholder, malformed) is left as `None`.
    ///
    /// ```
    /// use exiftool_session::GpsData;
    ///
    /// let gps = GpsData::parse(
    ///     r#"51 deg 30' 0.00" N, 0 deg 15' 0.00" W"#,
    ///     "12 m Below Sea Level",
    ///     "",
    /// );
    /// assert_eq!(gps.latitude, Some(51.5));
    /// assert_eq!(gps.longitude, Some(-0.25));
    /// assert_eq!(gps.altitude, Some(-12.0));
    /// assert!(gps.timestamp.is_none());
    /// ```
    pub fn parse(position: &str, altitude: &str, datetime: &str) -> Self {
        let (latitude, longitude) = parse_position(position).unzip();
        Self {
            latitude,
            longitude,
            altitude: parse_altitude(altitude),
            timestamp: parse_timestamp(datetime),
        }
    }

    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}

/// `51 deg 30' 26.00" N, 0 deg 7' 39.00" W` or a decimal pair like `51.5 -0.12`.
fn parse_position(position: &str) -> Option<(f64, f64)> {
    let position = position.trim();
    if position.is_empty() {
        return None;
    }

    let (lat, lon) = match position.split_once(',') {
        Some(pair) => pair,
        None => {
            // Without a comma, split after the latitude's hemisphere letter,
            // or between two plain numbers.
            match position.find(['N', 'S']) {
                Some(idx) => position.split_at(idx + 1),
                None => {
                    let mut parts = position.split_whitespace();
                    let pair = (parts.next()?, parts.next()?);
                    if parts.next().is_some() {
                        return None;
                    }
                    pair
                }
            }
        }
    };

    let latitude = parse_coordinate(lat, 'S')?;
    let longitude = parse_coordinate(lon, 'W')?;
    if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
        return None;
    }
    Some((latitude, longitude))
}

/// Degrees, minutes and seconds (any trailing parts optional) plus an
/// optional hemisphere letter, `negative` marking the southern/western one.
fn parse_coordinate(coordinate: &str, negative: char) -> Option<f64> {
    let coordinate = coordinate.trim();
    let numbers: Vec<f64> = coordinate
        .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .filter(|part| !part.is_empty())
        .map(str::parse::<f64>)
        .collect::<Result<_, _>>()
        .ok()?;

    let (&degrees, rest) = numbers.split_first()?;
    if rest.len() > 2 {
        return None;
    }
    let minutes = rest.first().copied().unwrap_or(0.0);
    let seconds = rest.get(1).copied().unwrap_or(0.0);
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;

    let signed = if degrees.is_sign_negative() || coordinate.ends_with(negative) {
        -magnitude
    } else {
        magnitude
    };
    Some(signed)
}

/// `12.3 m`, `12.3 m Above Sea Level`, `12.3 m Below Sea Level` or `12.3`.
fn parse_altitude(altitude: &str) -> Option<f64> {
    let metres = parse_leading_f64(altitude)?;
    if altitude.contains("Below") {
        Some(-metres.abs())
    } else {
        Some(metres)
    }
}

fn parse_timestamp(datetime: &str) -> Option<DateTime<FixedOffset>> {
    if is_zero_date(datetime) {
        return None;
    }
    parse_exif_datetime(datetime).ok()
}
