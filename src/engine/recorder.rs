use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::core::messages::ParsedMessage;
use crate::memory::mpmc_ring::MpmcRing;
use crate::storage::sink::{FileSink, SinkError, WriteMode, DIRECT_ALIGNMENT};

// Recorder lifecycle: Idle -> Running -> Stopping -> Closed.
const STATE_IDLE: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPING: u8 = 2;
const STATE_CLOSED: u8 = 3;

/// Sizing knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Ring capacity in records; must be a power of 2.
    pub ring_capacity: usize,
    /// Bounce-buffer size in bytes; must be a positive multiple of the
    /// direct-I/O alignment.
    pub write_buffer_size: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            ring_capacity: 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
        }
    }
}

/// Asynchronous feed recorder.
///
/// Decoded messages published here land in a lock-free ring; a single
/// background worker drains the ring and appends each record to the sink
/// file. Publishing never blocks: a full ring reports `false` and leaves
/// the backoff policy to the caller.
pub struct Recorder {
    ring: Arc<MpmcRing<ParsedMessage>>,
    state: Arc<AtomicU8>,
    worker: Mutex<Option<JoinHandle<()>>>,
    total_written: Arc<AtomicU64>,
    write_errors: Arc<AtomicU64>,
    path: PathBuf,
    mode: WriteMode,
    config: RecorderConfig,
}

impl Recorder {
    /// Creates a recorder for `path` with default sizing.
    pub fn new<P: AsRef<Path>>(path: P, mode: WriteMode) -> Self {
        Self::with_config(path, mode, RecorderConfig::default())
    }

    pub fn with_config<P: AsRef<Path>>(path: P, mode: WriteMode, config: RecorderConfig) -> Self {
        assert!(
            config.ring_capacity.is_power_of_two(),
            "ring capacity must be a power of 2"
        );
        assert!(
            config.write_buffer_size >= DIRECT_ALIGNMENT
                && config.write_buffer_size % DIRECT_ALIGNMENT == 0,
            "write buffer size must be a positive multiple of {}",
            DIRECT_ALIGNMENT
        );
        Self {
            ring: Arc::new(MpmcRing::new(config.ring_capacity)),
            state: Arc::new(AtomicU8::new(STATE_IDLE)),
            worker: Mutex::new(None),
            total_written: Arc::new(AtomicU64::new(0)),
            write_errors: Arc::new(AtomicU64::new(0)),
            path: path.as_ref().to_path_buf(),
            mode,
            config,
        }
    }

    /// Opens the sink and spawns the writer worker.
    ///
    /// A sink-open failure is fatal here and surfaces to the caller; the
    /// worker is not spawned and the recorder returns to idle. Calling
    /// `start` on a recorder that is not idle is a no-op.
    pub fn start(&self) -> Result<(), SinkError> {
        if self
            .state
            .compare_exchange(STATE_IDLE, STATE_RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }

        let sink = match FileSink::open(
            &self.path,
            self.mode,
            self.config.write_buffer_size,
            Arc::clone(&self.total_written),
            Arc::clone(&self.write_errors),
        ) {
            Ok(sink) => sink,
            Err(e) => {
                self.state.store(STATE_IDLE, Ordering::Release);
                return Err(e);
            }
        };

        let ring = Arc::clone(&self.ring);
        let state = Arc::clone(&self.state);
        let handle = thread::spawn(move || worker_loop(sink, ring, state));
        *self.worker.lock() = Some(handle);

        tracing::debug!("recorder started for {}", self.path.display());
        Ok(())
    }

    /// Publishes one decoded message to the pipeline.
    ///
    /// Returns false when the recorder is not running or the ring is
    /// full; the message is dropped in both cases and the caller decides
    /// whether to retry, back off, or discard.
    #[inline(always)]
    pub fn publish(&self, msg: ParsedMessage) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING && self.ring.try_push(msg)
    }

    /// Signals the worker, waits for it to drain the ring, flush, and
    /// close the sink. Idempotent; safe to call from several threads.
    pub fn stop(&self) {
        if self
            .state
            .compare_exchange(
                STATE_RUNNING,
                STATE_STOPPING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
            && self.state.load(Ordering::Acquire) != STATE_STOPPING
        {
            return;
        }

        // The lock is held across the join: a concurrent stop that lost
        // the race blocks here until the winning caller has joined the
        // worker, so every returning caller sees the sink drained,
        // flushed, and closed. The worker itself never takes this lock.
        let mut worker = self.worker.lock();
        if let Some(handle) = worker.take() {
            if handle.join().is_err() {
                tracing::error!("recorder worker panicked for {}", self.path.display());
            }
            tracing::debug!("recorder stopped for {}", self.path.display());
        }
        self.state.store(STATE_CLOSED, Ordering::Release);
    }

    /// Bytes committed to the sink so far. Advisory while running; exact
    /// after `stop` returns.
    #[inline(always)]
    pub fn total_written(&self) -> u64 {
        self.total_written.load(Ordering::Relaxed)
    }

    /// Write failures absorbed by the worker so far.
    #[inline(always)]
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// Approximate number of records waiting in the ring.
    #[inline(always)]
    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(mut sink: FileSink, ring: Arc<MpmcRing<ParsedMessage>>, state: Arc<AtomicU8>) {
    loop {
        match ring.try_pop() {
            Some(msg) => sink.write_record(&msg),
            None => {
                if state.load(Ordering::Acquire) != STATE_RUNNING {
                    break;
                }
                sink.flush();
                thread::yield_now();
            }
        }
    }

    // Drain anything published before the stop signal landed.
    while let Some(msg) = ring.try_pop() {
        sink.write_record(&msg);
    }
    sink.finalize();
}
