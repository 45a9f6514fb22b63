//! Optional asynchronous writer task for outcome records.
//!
//! Load tests running on a tokio runtime may prefer not to block a virtual user on file
//! io for every completed call. [`RecordLogger::spawn`] starts a single task that owns the
//! results file: virtual users clone the returned [`RecordLoggerTx`] and send records to
//! it over an unbounded [`flume`](https://docs.rs/flume) channel, and the task appends
//! them to the [`RecordStore`] one at a time.
//!
//! Sending `None`, or dropping every sender, stops the task after all records already
//! sent have been written. The task returns how many records it wrote.
//!
//! ```rust
//! use httpagg::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), HttpAggError> {
//! # let dir = tempfile::tempdir()?;
//! # let results_file = dir.path().join("httpagg.json");
//! let (logger, handle) = RecordLogger::spawn(RecordStore::new(&results_file));
//!
//! let record = OutcomeRecord::new("https://svc-a.com/api/v1/patients", "GET", 503, 87.3)?;
//! logger.send(Some(record)).expect("logger stopped");
//!
//! // Flush and stop the logger.
//! logger.send(None).expect("logger stopped");
//! let written = handle.await.expect("logger panicked")?;
//! assert_eq!(written, 1);
//! # Ok(())
//! # }
//! ```
//!
//! Records are written on tokio's blocking thread pool with [`RecordStore::append`], so
//! records sent to the logger and records appended directly (for example by
//! [`check_request`](crate::ingest::check_request)) never interleave.

use tokio::task::JoinHandle;

use crate::record::OutcomeRecord;
use crate::store::RecordStore;
use crate::HttpAggError;

/// Sending side of the record logger channel. `None` stops the logger.
pub type RecordLoggerTx = flume::Sender<Option<OutcomeRecord>>;

/// A task writing outcome records to a [`RecordStore`].
pub struct RecordLogger {
    store: RecordStore,
    receiver: flume::Receiver<Option<OutcomeRecord>>,
}

impl RecordLogger {
    /// Start a logger task writing to `store` on the current tokio runtime.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(store: RecordStore) -> (RecordLoggerTx, JoinHandle<Result<u64, HttpAggError>>) {
        let (sender, receiver) = flume::unbounded();
        let logger = RecordLogger { store, receiver };
        (sender, tokio::spawn(logger.logger_main()))
    }

    /// Logger task, waits for records and appends them to the results file.
    async fn logger_main(self) -> Result<u64, HttpAggError> {
        info!("writing outcome records to {}", self.store.path().display());
        let mut written: u64 = 0;

        // Loop waiting for records until told to exit or every sender is dropped.
        while let Ok(message) = self.receiver.recv_async().await {
            if let Some(record) = message {
                let store = self.store.clone();
                match tokio::task::spawn_blocking(move || store.append(&record)).await {
                    Ok(result) => result?,
                    Err(e) => {
                        return Err(HttpAggError::Io(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            format!("record writer failed: {}", e),
                        )))
                    }
                }
                written += 1;
            } else {
                // Empty message means it's time to exit.
                break;
            }
        }

        info!(
            "wrote {} outcome records to {}",
            written,
            self.store.path().display()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(status: u16) -> OutcomeRecord {
        OutcomeRecord::new("https://svc-a.com/api/v1/patients", "GET", status, 10.0).unwrap()
    }

    #[tokio::test]
    async fn stops_on_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let (logger, handle) = RecordLogger::spawn(RecordStore::new(&path));

        logger.send(Some(record(200))).unwrap();
        logger.send(Some(record(500))).unwrap();
        logger.send(None).unwrap();
        // Sent after the stop message, never written.
        let _ = logger.send(Some(record(404)));

        assert_eq!(handle.await.unwrap().unwrap(), 2);
        assert_eq!(
            RecordStore::read_all(&path).unwrap(),
            vec![record(200), record(500)]
        );
    }

    #[tokio::test]
    async fn stops_when_senders_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let (logger, handle) = RecordLogger::spawn(RecordStore::new(&path));

        let users: Vec<_> = (0..4)
            .map(|_| {
                let logger = logger.clone();
                tokio::spawn(async move {
                    for _ in 0..25 {
                        logger.send(Some(record(503))).unwrap();
                    }
                })
            })
            .collect();
        drop(logger);
        for user in users {
            user.await.unwrap();
        }

        assert_eq!(handle.await.unwrap().unwrap(), 100);
        assert_eq!(RecordStore::read_all(&path).unwrap().len(), 100);
    }

    #[tokio::test]
    async fn invalid_records_stop_the_logger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        let (logger, handle) = RecordLogger::spawn(RecordStore::new(&path));

        logger.send(Some(record(200))).unwrap();
        logger
            .send(Some(OutcomeRecord {
                duration: f64::NAN,
                ..record(500)
            }))
            .unwrap();

        assert!(matches!(
            handle.await.unwrap(),
            Err(HttpAggError::InvalidRecord { .. })
        ));
        // Everything written before the invalid record can still be read.
        assert_eq!(RecordStore::read_all(&path).unwrap(), vec![record(200)]);
    }

    #[tokio::test]
    async fn write_errors_stop_the_logger() {
        let dir = tempfile::tempdir().unwrap();
        // A directory can't be opened for appending.
        let (logger, handle) = RecordLogger::spawn(RecordStore::new(dir.path()));

        logger.send(Some(record(200))).unwrap();
        assert!(matches!(
            handle.await.unwrap(),
            Err(HttpAggError::Io(_))
        ));
    }
}
