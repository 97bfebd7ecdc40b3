//! # ExifTool session
//!
//! Reads metadata from media files through one long-running ExifTool process.
//!
//! [`ExifTool`] starts `exiftool -stay_open True -@ -` once and reuses it for
//! every request. Each request writes its arguments to the process's stdin and
//! reads back exactly one JSON record, framed by the `{ready}` token exiftool
//! prints after each `-execute`. A session can be shared between threads;
//! requests are serialized internally.
//!
//! [`ExifToolMetadata`] wraps one record and derives the commonly needed
//! values from it: dimensions, duration, camera and software names, GPS data,
//! and the earliest trustworthy creation date.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use exiftool_session::{ExifTool, ExifToolError};
//!
//! fn main() -> Result<(), ExifToolError> {
//!     let exiftool = ExifTool::new()?; // Starts the background ExifTool process
//!     let meta = exiftool.read_metadata("path/to/your/image.jpg")?;
//!
//!     println!("Camera: {}", meta.get_full_camera_name());
//!     println!("Size: {}x{}", meta.get_media_width(), meta.get_media_height());
//!     println!("GPS: {:?}", meta.get_gps_data());
//!
//!     match meta.get_earliest_creation_date() {
//!         Ok(date) => println!("Created: {}", date),
//!         Err(e) if e.is_fatal() => eprintln!("No usable date: {}", e),
//!         Err(e) => return Err(e),
//!     }
//!
//!     exiftool.close()
//! }
//! ```
//!
//! ## Custom configuration
//!
//! ```no_run
//! use exiftool_session::{ExifTool, ExifToolConfig, ExifToolError};
//!
//! fn main() -> Result<(), ExifToolError> {
//!     let config = ExifToolConfig::default()
//!         .with_executable("/opt/exiftool/exiftool")
//!         .with_max_buffer_size(64 * 1024 * 1024)
//!         .exclude_tag("PreviewImage");
//!     let exiftool = ExifTool::open(config)?;
//!     let meta = exiftool.read_metadata("clip.mp4")?;
//!     println!("Duration: {}", meta.get_media_duration());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod exiftool;
mod metadata;
mod tag_value;

pub use config::{ExifToolConfig, EXCLUDED_TAGS, READY_TOKEN};
pub use error::{CreationDateIssue, ExifToolError};
pub use exiftool::ExifTool;
pub use metadata::{ExifToolMetadata, CREATION_DATE_TAGS, DURATION_TAGS};
pub use parse::gps::GpsData;
pub use tag_value::TagValue;

pub mod parse;
pub mod scanner;

mod utils;
