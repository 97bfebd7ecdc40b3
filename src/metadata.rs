use crate::error::{CreationDateIssue, ExifToolError};
use crate::parse::datetime::{is_zero_date, parse_exif_datetime};
use crate::parse::gps::GpsData;
use crate::tag_value::TagValue;
use chrono::{DateTime, Datelike, FixedOffset};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Date tags consulted for the creation date, in tie-break order.
pub const CREATION_DATE_TAGS: [&str; 6] = [
    "CreateDate",
    "ModifyDate",
    "DateTimeOriginal",
    "DateTimeDigitized",
    "GPSDateTime",
    "FileModifyDate",
];

/// Tags that may carry a media duration, in order of preference.
pub const DURATION_TAGS: [&str; 3] = ["Duration", "MediaDuration", "TrackDuration"];

/// Creation dates in or before this year are treated as placeholders.
const EPOCH_YEAR: i32 = 1970;

/// Metadata exiftool reported for one file.
///
/// Lookups never fail: a missing tag reads as `""` or `0`. Only the
/// date accessors return errors, since a date that is present but unusable
/// is worth knowing about.
#[derive(Debug, Clone, PartialEq)]
pub struct ExifToolMetadata {
    source_file: PathBuf,
    fields: HashMap<String, TagValue>,
    raw_json: Vec<u8>,
}

impl ExifToolMetadata {
    /// Parses exiftool's `-json` output for a single file: an array holding
    /// exactly one object.
    pub fn parse(source_file: impl AsRef<Path>, json: &[u8]) -> Result<Self, ExifToolError> {
        let source_file = source_file.as_ref();
        let decode_error = |json_path: String, source: serde_json::Error| ExifToolError::Decode {
            path: source_file.to_path_buf(),
            json_path,
            payload: String::from_utf8_lossy(json).into_owned(),
            source,
        };

        let mut deserializer = serde_json::Deserializer::from_slice(json);
        let mut records: Vec<HashMap<String, TagValue>> =
            serde_path_to_error::deserialize(&mut deserializer)
                .map_err(|e| decode_error(e.path().to_string(), e.into_inner()))?;
        deserializer
            .end()
            .map_err(|e| decode_error(".".to_string(), e))?;

        if records.len() != 1 {
            return Err(ExifToolError::UnexpectedFormat {
                path: source_file.to_path_buf(),
                found: records.len(),
            });
        }
        let fields = records.remove(0);

        if let Some(reported) = fields.get("SourceFile").map(TagValue::to_clean_string) {
            if Path::new(&reported) != source_file {
                warn!(
                    "exiftool reported SourceFile {:?} for request {:?}",
                    reported, source_file
                );
            }
        }

        Ok(Self {
            source_file: source_file.to_path_buf(),
            fields,
            raw_json: json.to_vec(),
        })
    }

    /// The path this record was requested for.
    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn fields(&self) -> &HashMap<String, TagValue> {
        &self.fields
    }

    /// The exact bytes this record was parsed from.
    pub fn raw_json(&self) -> &[u8] {
        &self.raw_json
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// The raw value of `key`, if exiftool reported it.
    pub fn get_value(&self, key: &str) -> Option<&TagValue> {
        self.fields.get(key)
    }

    /// String form of a tag, `""` when absent.
    pub fn get(&self, key: &str) -> String {
        self.fields
            .get(key)
            .map(TagValue::to_clean_string)
            .unwrap_or_default()
    }

    /// Integer form of a tag, `0` when absent or not numeric.
    pub fn get_int(&self, key: &str) -> i64 {
        self.fields
            .get(key)
            .and_then(TagValue::as_i64)
            .unwrap_or_default()
    }

    /// Float form of a tag, `0.0` when absent or not numeric.
    pub fn get_float(&self, key: &str) -> f64 {
        self.fields
            .get(key)
            .and_then(TagValue::as_f64)
            .unwrap_or_default()
    }

    /// Parses a date tag.
    ///
    /// Empty values and exiftool's zero placeholders (`0000:00:00 ...`)
    /// yield [`ExifToolError::ZeroDate`]; anything else that does not parse
    /// yields [`ExifToolError::DateParse`].
    pub fn get_time(&self, key: &str) -> Result<DateTime<FixedOffset>, ExifToolError> {
        let value = self.get(key);
        if is_zero_date(&value) {
            return Err(ExifToolError::ZeroDate {
                tag: key.to_string(),
            });
        }
        parse_exif_datetime(&value)
    }

    /// Resolves the earliest plausible creation date across the
    /// [`CREATION_DATE_TAGS`].
    ///
    /// Unusable candidates are skipped. When nothing usable is left, or the
    /// earliest date falls in or before 1970, the returned error is
    /// [fatal](ExifToolError::is_fatal): the file's date cannot be trusted.
    /// Among identical instants the tag listed first wins.
    pub fn get_earliest_creation_date(&self) -> Result<DateTime<FixedOffset>, ExifToolError> {
        let earliest = CREATION_DATE_TAGS
            .iter()
            .filter_map(|&tag| match self.get_time(tag) {
                Ok(date) => Some(date),
                Err(e) => {
                    debug!("{}: skipping {}: {}", self.source_file.display(), tag, e);
                    None
                }
            })
            .min();

        let Some(earliest) = earliest else {
            return Err(self.creation_date_not_found(CreationDateIssue::NoCandidates));
        };

        if earliest.year() <= EPOCH_YEAR {
            return Err(self.creation_date_not_found(CreationDateIssue::Placeholder(
                earliest.year(),
            )));
        }

        Ok(earliest)
    }

    fn creation_date_not_found(&self, reason: CreationDateIssue) -> ExifToolError {
        error!("{}", self.source_file.display());
        ExifToolError::CreationDateNotFound {
            path: self.source_file.clone(),
            reason,
        }
    }

    /// `MIMEType`, such as `image/jpeg`.
    pub fn get_mime_type(&self) -> String {
        self.get("MIMEType")
    }

    pub fn get_media_width(&self) -> i64 {
        self.get_int("ImageWidth")
    }

    pub fn get_media_height(&self) -> i64 {
        self.get_int("ImageHeight")
    }

    /// Horizontal resolution, falling back to the vertical one.
    pub fn get_media_dpi(&self) -> i64 {
        match self.get_int("XResolution") {
            0 => self.get_int("YResolution"),
            dpi => dpi,
        }
    }

    /// First non-empty duration tag, without spaces or the `(approx)` marker:
    /// `"10.5 s (approx)"` becomes `"10.5s"`.
    pub fn get_media_duration(&self) -> String {
        DURATION_TAGS
            .iter()
            .map(|tag| self.get(tag).replace("(approx)", "").replace(' ', ""))
            .find(|duration| !duration.is_empty())
            .map(|duration| duration.trim().to_string())
            .unwrap_or_default()
    }

    /// `CreatorTool`, with `Software` appended in parentheses when it differs.
    pub fn get_full_creation_software(&self) -> String {
        combine_names(&self.get("CreatorTool"), &self.get("Software"))
    }

    /// `Make`, with `Model` appended in parentheses when it differs.
    pub fn get_full_camera_name(&self) -> String {
        combine_names(&self.get("Make"), &self.get("Model"))
    }

    /// Position, altitude and timestamp from the composite GPS tags.
    pub fn get_gps_data(&self) -> GpsData {
        GpsData::parse(
            &self.get("GPSPosition"),
            &self.get("GPSAltitude"),
            &self.get("GPSDateTime"),
        )
    }
}

fn combine_names(primary: &str, secondary: &str) -> String {
    let combined = match (primary.is_empty(), secondary.is_empty()) {
        (_, true) => primary.to_string(),
        (true, false) => secondary.to_string(),
        (false, false) if primary == secondary => primary.to_string(),
        (false, false) => format!("{} ({})", primary, secondary),
    };
    combined.trim().to_string()
}
