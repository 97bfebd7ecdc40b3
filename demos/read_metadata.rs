//! Reads every file under a directory through one exiftool session and prints
//! the derived fields.
//!
//! `cargo run --example read_metadata -- data/valid`
use exiftool_session::{ExifTool, ExifToolError};
use walkdir::WalkDir;

fn main() -> Result<(), ExifToolError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let et = ExifTool::new()?;

    for entry in WalkDir::new(&dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let meta = match et.read_metadata(path) {
            Ok(meta) => meta,
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                continue;
            }
        };

        let created = match meta.get_earliest_creation_date() {
            Ok(date) => date.to_rfc3339(),
            Err(e) => format!("<{}>", e),
        };
        println!("{}", path.display());
        println!("  type:     {}", meta.get_mime_type());
        println!("  size:     {}x{} @ {} dpi", meta.get_media_width(), meta.get_media_height(), meta.get_media_dpi());
        println!("  duration: {}", meta.get_media_duration());
        println!("  camera:   {}", meta.get_full_camera_name());
        println!("  software: {}", meta.get_full_creation_software());
        println!("  created:  {}", created);
        let gps = meta.get_gps_data();
        if gps.has_position() {
            println!("  gps:      {:?}, {:?} ({:?} m)", gps.latitude, gps.longitude, gps.altitude);
        }
    }

    et.close()
}
