use crate::config::ExifToolConfig;
use crate::error::ExifToolError;
use crate::metadata::ExifToolMetadata;
use crate::scanner::TokenScanner;
use log::{debug, warn};
use std::io::{BufWriter, PipeReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Mutex, MutexGuard};

/// A persistent `exiftool` process in `-stay_open` mode.
///
/// Requests are written to the process's stdin; its stdout and stderr share
/// one pipe, and the ready token exiftool prints after every `-execute`
/// splits that stream into one record per request.
///
/// All methods take `&self`. One lock covers the whole write-then-read cycle
/// of a request, so an `ExifTool` can be shared between threads (for example
/// in an `Arc`) and requests are answered one at a time. There is no timeout:
/// if exiftool hangs, so does the caller.
///
/// The process is shut down by [`close`](Self::close), or killed when the
/// session is dropped without being closed.
#[derive(Debug)]
pub struct ExifTool {
    config: ExifToolConfig,
    io: Mutex<Option<SessionIo>>,
}

#[derive(Debug)]
struct SessionIo {
    stdin: BufWriter<ChildStdin>,
    output: TokenScanner<PipeReader>,
    child: Child,
}

impl ExifTool {
    /// Launches `exiftool` from `PATH` with the default command grammar.
    pub fn new() -> Result<Self, ExifToolError> {
        Self::open(ExifToolConfig::default())
    }

    /// Launches exiftool from a specific path with the default command grammar.
    pub fn with_executable(exiftool_path: impl AsRef<Path>) -> Result<Self, ExifToolError> {
        Self::open(ExifToolConfig::default().with_executable(exiftool_path))
    }

    /// Launches exiftool as described by `config`.
    pub fn open(config: ExifToolConfig) -> Result<Self, ExifToolError> {
        // stdout and stderr both write into one pipe; the parent keeps only
        // the read end, so EOF shows up once the child is gone.
        let (reader, writer) = std::io::pipe().map_err(ExifToolError::Pipe)?;
        let stderr_writer = writer.try_clone().map_err(ExifToolError::Pipe)?;

        let mut child = Command::new(&config.executable)
            .args(&config.open_args)
            .stdin(Stdio::piped())
            .stdout(writer)
            .stderr(stderr_writer)
            .spawn()
            .map_err(|source| ExifToolError::ExifToolNotFound {
                executable: config.executable.clone(),
                source,
            })?;

        let Some(stdin) = child.stdin.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExifToolError::Pipe(std::io::Error::other(
                "Failed to capture stdin",
            )));
        };

        debug!(
            "started {} (pid {}) in stay-open mode",
            config.executable.display(),
            child.id()
        );

        let output = TokenScanner::new(reader, config.ready_token.clone())
            .with_max_size(config.max_buffer_size);

        Ok(Self {
            io: Mutex::new(Some(SessionIo {
                stdin: BufWriter::new(stdin),
                output,
                child,
            })),
            config,
        })
    }

    /// The configuration this session was opened with.
    pub fn config(&self) -> &ExifToolConfig {
        &self.config
    }

    /// Reads all metadata exiftool can extract from `file_path`.
    ///
    /// Sends the configured extraction arguments, the path and `-execute`,
    /// then blocks until exiftool's response is complete.
    ///
    /// # Example
    /// ```no_run
    /// # use exiftool_session::{ExifTool, ExifToolError};
    /// # fn main() -> Result<(), ExifToolError> {
    /// let exiftool = ExifTool::new()?;
    /// let meta = exiftool.read_metadata("data/image.jpg")?;
    /// println!("{} {}", meta.get_full_camera_name(), meta.get_mime_type());
    /// exiftool.close()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn read_metadata(
        &self,
        file_path: impl AsRef<Path>,
    ) -> Result<ExifToolMetadata, ExifToolError> {
        let file_path = file_path.as_ref();
        // Commands are line based, so the path must be one clean line.
        let path_str = file_path
            .to_str()
            .filter(|p| !p.is_empty() && !p.contains(['\n', '\r']))
            .ok_or_else(|| ExifToolError::InvalidPath {
                path: file_path.to_path_buf(),
            })?;

        let record = {
            let mut guard = self.lock()?;
            let io = guard.as_mut().ok_or(ExifToolError::SessionClosed)?;
            debug!("reading metadata for {}", file_path.display());

            for arg in &self.config.extract_args {
                writeln!(io.stdin, "{}", arg)?;
            }
            writeln!(io.stdin, "{}", path_str)?;
            writeln!(io.stdin, "{}", self.config.execute_arg)?;
            io.stdin.flush()?;

            match io.output.next_record() {
                Ok(Some(record)) => record,
                Ok(None) => {
                    return Err(ExifToolError::EmptyResponse {
                        path: file_path.to_path_buf(),
                    })
                }
                Err(e) => {
                    return Err(ExifToolError::Scan {
                        path: file_path.to_path_buf(),
                        source: Box::new(e),
                    })
                }
            }
        };

        ExifToolMetadata::parse(file_path, &record)
    }

    /// Releases the output pipe, asks exiftool to leave stay-open mode, closes
    /// its stdin and waits for the process to exit.
    ///
    /// Failures from each step are collected into [`ExifToolError::Close`].
    /// The session cannot be used afterwards.
    pub fn close(&self) -> Result<(), ExifToolError> {
        let io = self.lock()?.take().ok_or(ExifToolError::SessionClosed)?;
        debug!("closing {}", self.config.executable.display());
        io.shutdown(&self.config.close_args)
    }

    /// Whether [`close`](Self::close) has already run. A poisoned lock
    /// counts as closed.
    pub fn is_closed(&self) -> bool {
        self.io.lock().map_or(true, |io| io.is_none())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<SessionIo>>, ExifToolError> {
        // A panic mid-request may leave a response half read.
        self.io.lock().map_err(|_| ExifToolError::Poisoned)
    }
}

impl SessionIo {
    fn shutdown(self, close_args: &[String]) -> Result<(), ExifToolError> {
        let SessionIo {
            mut stdin,
            output,
            mut child,
        } = self;
        // Release the read end first: a child still writing an unread
        // response gets a broken pipe instead of blocking on a full one.
        drop(output);

        let mut errors = Vec::new();
        if let Err(e) = send(&mut stdin, close_args) {
            errors.push(ExifToolError::Io(e));
        }
        if let Err(e) = stdin.into_inner().map_err(|e| e.into_error()) {
            errors.push(ExifToolError::Io(e));
        }

        match child.wait() {
            Ok(status) => debug!("exiftool exited with {}", status),
            Err(e) => errors.push(ExifToolError::Io(e)),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ExifToolError::Close(errors))
        }
    }

    fn kill(self, close_args: &[String]) {
        let SessionIo {
            mut stdin,
            output,
            mut child,
        } = self;
        drop(output);
        // Graceful request first; the kill below covers a process that ignores it.
        let _ = send(&mut stdin, close_args);
        drop(stdin);
        if let Err(e) = child.kill() {
            debug!("exiftool already gone: {}", e);
        }
        if let Err(e) = child.wait() {
            warn!("failed to reap exiftool: {}", e);
        }
    }
}

fn send(stdin: &mut BufWriter<ChildStdin>, args: &[String]) -> std::io::Result<()> {
    for arg in args {
        writeln!(stdin, "{}", arg)?;
    }
    stdin.flush()
}

impl Drop for ExifTool {
    fn drop(&mut self) {
        let io = match self.io.get_mut() {
            Ok(io) => io.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(io) = io {
            io.kill(&self.config.close_args);
        }
    }
}
