//! Append-only file destination.
//!
//! Each formatted item is written as one line. With the default
//! [`JsonLogItemFormatter`] the file is JSONL and can be read back with
//! [`read_json_lines`](crate::item_format::read_json_lines).

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{FailureHandler, LogDestination, Metadata, MinLevel};
use crate::error::{DestinationError, LogResult};
use crate::item::LogItem;
use crate::item_format::{JsonLogItemFormatter, LogItemFormatter};
use crate::level::Level;
use crate::queue::DeliveryQueue;

/// Encodes attached metadata into a line for the log file, or nothing.
pub type FileMetadataEncoder = Arc<dyn Fn(&Metadata) -> Option<Vec<u8>> + Send + Sync>;

#[derive(Default)]
struct FileState {
    /// Opened lazily on the first write, and again after `clear`.
    writer: Option<BufWriter<File>>,
    written_items: usize,
}

/// Appends formatted items to a file, one per line.
///
/// Missing parent directories are created on the first write. Items that
/// format to nothing are skipped and not counted.
pub struct FileLogDestination<F = JsonLogItemFormatter> {
    id: String,
    min_level: MinLevel,
    formatter: Arc<F>,
    path: Arc<PathBuf>,
    metadata_encoder: Option<FileMetadataEncoder>,
    state: Arc<Mutex<FileState>>,
    queue: DeliveryQueue,
}

impl<F> FileLogDestination<F>
where
    F: LogItemFormatter + 'static,
    F::Output: AsRef<[u8]>,
{
    /// A destination appending to `path`. The file is not touched until
    /// the first write.
    pub fn new(path: impl Into<PathBuf>, min_level: Level, formatter: F) -> LogResult<Self> {
        let path = path.into();
        Ok(Self {
            id: format!("{}_{}", std::any::type_name::<Self>(), path.display()),
            min_level: MinLevel::new(min_level),
            formatter: Arc::new(formatter),
            path: Arc::new(path),
            metadata_encoder: None,
            state: Arc::new(Mutex::new(FileState::default())),
            queue: DeliveryQueue::new("logline-file")?,
        })
    }

    /// Write a line whenever metadata is attached.
    pub fn with_metadata_encoder(
        mut self,
        encoder: impl Fn(&Metadata) -> Option<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        self.metadata_encoder = Some(Arc::new(encoder));
        self
    }

    /// Replace the path-based id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Change the floor for items dispatched from now on.
    pub fn set_min_level(&self, level: Level) {
        self.min_level.set(level);
    }

    /// The file items are appended to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of items appended since creation or the last `clear`.
    pub fn written_items(&self) -> usize {
        self.state.lock().written_items
    }

    /// Delete the log file after delivering pending writes.
    ///
    /// Writes submitted afterwards start a fresh file.
    pub fn clear(&self) -> Result<(), DestinationError> {
        self.queue.flush();

        let mut state = self.state.lock();
        state.writer = None;
        state.written_items = 0;

        match fs::remove_file(self.path.as_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(DestinationError::Clear {
                path: self.path.to_path_buf(),
                source,
            }),
        }
    }
}

fn open_append(path: &Path) -> io::Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(BufWriter::new(file))
}

fn append_line(path: &Path, state: &mut FileState, data: &[u8]) -> io::Result<()> {
    let writer = match state.writer.take() {
        Some(writer) => writer,
        None => open_append(path)?,
    };
    let writer = state.writer.insert(writer);

    let result = writer
        .write_all(data)
        .and_then(|()| writer.write_all(b"\n"))
        .and_then(|()| writer.flush());
    if result.is_err() {
        // Reopen on the next write.
        state.writer = None;
    }
    result
}

impl<F> LogDestination for FileLogDestination<F>
where
    F: LogItemFormatter + 'static,
    F::Output: AsRef<[u8]>,
{
    fn min_level(&self) -> Level {
        self.min_level.get()
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn write(&self, item: LogItem, on_failure: FailureHandler) {
        let formatter = Arc::clone(&self.formatter);
        let state = Arc::clone(&self.state);
        let path = Arc::clone(&self.path);
        let id = self.id.clone();

        self.queue.dispatch(move || {
            let data = match formatter.format(&item) {
                Ok(data) if data.as_ref().is_empty() => return,
                Ok(data) => data,
                Err(source) => {
                    on_failure(DestinationError::Format {
                        destination: id,
                        item: Box::new(item),
                        source,
                    });
                    return;
                }
            };

            let mut state = state.lock();
            match append_line(&path, &mut state, data.as_ref()) {
                Ok(()) => state.written_items += 1,
                Err(source) => {
                    drop(state);
                    on_failure(DestinationError::Write {
                        destination: id,
                        path: path.to_path_buf(),
                        item: Box::new(item),
                        source,
                    });
                }
            }
        });
    }

    fn set_metadata(&self, metadata: &Metadata, on_failure: FailureHandler) {
        let Some(encoder) = self.metadata_encoder.clone() else {
            return;
        };
        let state = Arc::clone(&self.state);
        let path = Arc::clone(&self.path);
        let id = self.id.clone();
        let metadata = metadata.clone();

        self.queue.dispatch(move || {
            let Some(data) = encoder(&metadata) else {
                return;
            };
            let result = append_line(&path, &mut state.lock(), &data);
            if let Err(source) = result {
                on_failure(DestinationError::MetadataWrite {
                    destination: id,
                    path: path.to_path_buf(),
                    source,
                });
            }
        });
    }

    fn flush(&self) {
        self.queue.flush();
    }
}
