//! Append-only storage of outcome records.
//!
//! Records are stored as pretty-printed JSON objects concatenated back to back, without a
//! separator and without an enclosing array. Writers can therefore append blindly, and
//! the reader relies on each JSON value being self-delimiting:
//! ```json
//! {
//!   "url": "https://svc-a.com/api/v1/patients",
//!   "method": "GET",
//!   "status": 200,
//!   "duration": 120.0
//! }{
//!   "url": "https://svc-a.com/api/v1/patients",
//!   "method": "GET",
//!   "status": 500,
//!   "duration": 900.0
//! }
//! ```
//!
//! The results file is shared by every virtual user of a load test. Appends to the same
//! path from within one process are serialized by a lock held for the whole
//! open-append-close of a single record, so records never interleave.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::record::OutcomeRecord;
use crate::HttpAggError;

lazy_static! {
    // One write lock per results file, shared by every RecordStore opened on that path.
    // Entries are never removed, the map holds one entry per results file ever opened.
    static ref WRITE_LOCKS: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>> = Mutex::new(HashMap::new());
}

// Key the lock registry by the canonical directory and the file name, so that
// `httpagg.json`, `./httpagg.json` and the absolute path all share one lock. The file
// itself may not exist yet, so only its directory is canonicalized.
fn lock_key(path: &Path) -> PathBuf {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (directory.canonicalize(), path.file_name()) {
        (Ok(directory), Some(file_name)) => directory.join(file_name),
        _ => path.to_path_buf(),
    }
}

// A poisoned lock only means another writer panicked, the guarded data is `()`.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A results file that outcome records are appended to and read back from.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl RecordStore {
    /// Open a store backed by `path`. The file isn't created until the first append.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let write_lock = lock(&WRITE_LOCKS)
            .entry(lock_key(&path))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        RecordStore { path, write_lock }
    }

    /// The path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record to the end of the results file, creating it if necessary.
    ///
    /// Safe to call concurrently. Errors are returned to the caller, a record that could
    /// not be written is never silently dropped. Invalid records are rejected with
    /// [`HttpAggError::InvalidRecord`] before anything is written, as they couldn't be
    /// read back.
    pub fn append(&self, record: &OutcomeRecord) -> Result<(), HttpAggError> {
        record.validate()?;

        // Serialize before taking the lock, the critical section is only file io.
        let buffer = serde_json::to_vec_pretty(record)?;

        let _guard = lock(&self.write_lock);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let length = file.metadata()?.len();

        if let Err(e) = file.write_all(&buffer) {
            // Don't leave half a record behind for the reader to choke on.
            if let Err(truncate_error) = file.set_len(length) {
                warn!(
                    "failed to remove partial record from {}: {}",
                    self.path.display(),
                    truncate_error
                );
            }
            return Err(e.into());
        }
        trace!(
            "appended {} bytes to {}: {} {} {}",
            buffer.len(),
            self.path.display(),
            record.method,
            record.url,
            record.status
        );

        Ok(())
    }

    /// Open the results file for streaming reads.
    ///
    /// Returns `None` if the file doesn't exist yet, which is expected before the first
    /// load test has recorded anything.
    pub fn reader<P: AsRef<Path>>(path: P) -> Result<Option<RecordReader>, HttpAggError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("no results yet, {} does not exist", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        debug!("reading results from {}", path.display());

        Ok(Some(RecordReader {
            stream: serde_json::Deserializer::from_reader(BufReader::new(file)).into_iter(),
            index: 0,
            failed: false,
        }))
    }

    /// Read every record in the results file, in the order they were written.
    ///
    /// A missing file is read as an empty sequence. A record that fails to decode
    /// aborts the read.
    pub fn read_all<P: AsRef<Path>>(path: P) -> Result<Vec<OutcomeRecord>, HttpAggError> {
        match RecordStore::reader(path)? {
            Some(reader) => reader.collect(),
            None => Ok(Vec::new()),
        }
    }
}

/// Streams outcome records out of a results file.
///
/// Iteration ends at the clean end of the file, or after the first error.
pub struct RecordReader {
    stream: serde_json::StreamDeserializer<
        'static,
        serde_json::de::IoRead<BufReader<File>>,
        OutcomeRecord,
    >,
    index: usize,
    failed: bool,
}

impl Iterator for RecordReader {
    type Item = Result<OutcomeRecord, HttpAggError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = match self.stream.next()? {
            Ok(record) => Ok(record),
            Err(source) if source.is_io() => Err(HttpAggError::Io(source.into())),
            Err(source) => Err(HttpAggError::MalformedRecord {
                index: self.index,
                source,
            }),
        };
        if result.is_err() {
            self.failed = true;
        }
        self.index += 1;
        Some(result)
    }
}
