use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Token exiftool prints after finishing each `-execute`.
#[cfg(windows)]
pub const READY_TOKEN: &[u8] = b"{ready}\r\n";
#[cfg(not(windows))]
pub const READY_TOKEN: &[u8] = b"{ready}\n";

/// Tags that can be very big strings and are never worth the transfer.
pub const EXCLUDED_TAGS: [&str; 6] = [
    "HistoryChanged",
    "HistoryWhen",
    "HistorySoftwareAgent",
    "HistoryInstanceID",
    "HistoryAction",
    "ThumbnailImage",
];

/// Command grammar and buffering settings for an [`ExifTool`](crate::ExifTool) session.
///
/// `Default` yields the standard stay-open grammar. Every field is optional
/// when deserializing, so a partial JSON document only overrides what it names:
///
/// ```
/// use exiftool_session::ExifToolConfig;
///
/// let config: ExifToolConfig =
///     serde_json::from_str(r#"{ "executable": "/opt/exiftool/exiftool" }"#).unwrap();
/// assert_eq!(config.execute_arg, "-execute");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifToolConfig {
    /// Name or path of the exiftool executable.
    pub executable: PathBuf,
    /// Arguments that put exiftool into stay-open mode, reading commands from stdin.
    pub open_args: Vec<String>,
    /// Byte sequence terminating each response on the merged output stream.
    pub ready_token: Vec<u8>,
    /// Commands that make exiftool leave stay-open mode.
    pub close_args: Vec<String>,
    /// Commands sent before the file path of every metadata request.
    pub extract_args: Vec<String>,
    /// Command that flushes one batch of work.
    pub execute_arg: String,
    /// Upper bound for the response buffer; `None` grows without limit.
    pub max_buffer_size: Option<usize>,
}

impl Default for ExifToolConfig {
    fn default() -> Self {
        let mut extract_args = vec![
            "-json".to_string(),
            "-api".to_string(),
            "largefilesupport=1".to_string(),
            "-extractEmbedded".to_string(),
        ];
        for tag in EXCLUDED_TAGS {
            extract_args.push("-x".to_string());
            extract_args.push(tag.to_string());
        }

        Self {
            executable: PathBuf::from("exiftool"),
            open_args: to_strings(&["-stay_open", "True", "-@", "-", "-common_args"]),
            ready_token: READY_TOKEN.to_vec(),
            close_args: to_strings(&["-stay_open", "False", "-execute"]),
            extract_args,
            execute_arg: "-execute".to_string(),
            max_buffer_size: None,
        }
    }
}

impl ExifToolConfig {
    /// Runs exiftool from `executable` instead of looking it up on `PATH`.
    pub fn with_executable(mut self, executable: impl AsRef<Path>) -> Self {
        self.executable = executable.as_ref().to_path_buf();
        self
    }

    /// Caps how many bytes a single response may occupy before it is
    /// reported as truncated.
    pub fn with_max_buffer_size(mut self, max: usize) -> Self {
        self.max_buffer_size = Some(max);
        self
    }

    /// Excludes one more tag from every metadata request (`-x TAG`).
    pub fn exclude_tag(mut self, tag: &str) -> Self {
        self.extract_args.push("-x".to_string());
        self.extract_args.push(tag.to_string());
        self
    }

    /// Appends a raw argument to every metadata request, before the path.
    pub fn with_extract_arg(mut self, arg: &str) -> Self {
        self.extract_args.push(arg.to_string());
        self
    }
}

fn to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}
