use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use thiserror::Error;

use crate::decode::domain::jpeg_decoder::JpegDecoder;
use crate::decode::infrastructure::image_jpeg_decoder::ImageJpegDecoder;
use crate::demux::domain::demux_error::OpenError;
use crate::demux::domain::frame_reader::FrameReader;
use crate::demux::infrastructure::reader_factory::open_reader;
use crate::pipeline::frame_scheduler::{FrameScheduler, SchedulerExit, SchedulerParts, SchedulerSettings};
use crate::pipeline::frame_sink::FrameSink;
use crate::pipeline::pipeline_logger::{LogPipelineLogger, PipelineLogger};
use crate::pipeline::session_stats::{SessionCounters, SessionStats};
use crate::pipeline::stop_signal::{stop_pair, StopHandle};
use crate::shared::pump_config::PumpConfig;
use crate::shared::stream_metadata::StreamMetadata;
use crate::source::domain::source_descriptor::{ContainerKind, SourceDescriptor};

#[derive(Error, Debug)]
pub enum StartError {
    #[error("playback is already running")]
    AlreadyRunning,
    #[error("failed to reopen source: {0}")]
    Open(#[from] OpenError),
    #[error("failed to spawn scheduler thread: {0}")]
    Spawn(#[source] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Starting,
    Running,
    Stopping,
}

struct Worker {
    handle: JoinHandle<SchedulerParts>,
    stop: StopHandle,
    done: Receiver<()>,
}

/// One playback session: owns the reader, decoder and the worker thread
/// that drives them.
///
/// `stop()` waits up to `stop_grace_ms` for the worker. A worker stuck in a
/// blocking read (a hung HTTP request, for instance) cannot be interrupted;
/// it is detached instead and frees its reader and buffers when the read
/// finally returns, bounded by the HTTP timeout.
pub struct PlaybackSession {
    descriptor: SourceDescriptor,
    hint: Option<ContainerKind>,
    config: PumpConfig,
    metadata: StreamMetadata,
    reader: Option<Box<dyn FrameReader>>,
    decoder: Option<Box<dyn JpegDecoder>>,
    logger: Option<Box<dyn PipelineLogger>>,
    running: Arc<AtomicBool>,
    stats: Arc<SessionCounters>,
    worker: Option<Worker>,
    state: SchedulerState,
    last_exit: Option<SchedulerExit>,
}

impl PlaybackSession {
    /// Opens the source, detects its container and, for AVI, parses the
    /// header. Any failure here is fatal and nothing is spawned.
    pub fn open(
        source: SourceDescriptor,
        hint: Option<ContainerKind>,
        config: &PumpConfig,
    ) -> Result<Self, OpenError> {
        Self::open_with(source, hint, config, Box::new(ImageJpegDecoder))
    }

    pub fn open_with(
        source: SourceDescriptor,
        hint: Option<ContainerKind>,
        config: &PumpConfig,
        decoder: Box<dyn JpegDecoder>,
    ) -> Result<Self, OpenError> {
        let reader = open_reader(&source, hint, config)?;
        let mut session = Self::from_reader(reader, config, decoder);
        session.descriptor = source;
        session.hint = hint;
        Ok(session)
    }

    /// Wraps an already-built reader.
    pub fn from_reader(
        reader: Box<dyn FrameReader>,
        config: &PumpConfig,
        decoder: Box<dyn JpegDecoder>,
    ) -> Self {
        let metadata = reader.metadata().clone();
        log::info!(
            "Opened {} ({}, {}x{})",
            metadata.source,
            metadata.container,
            metadata.width,
            metadata.height
        );
        Self {
            descriptor: metadata.source.clone(),
            hint: Some(metadata.container),
            config: config.clone(),
            metadata,
            reader: Some(reader),
            decoder: Some(decoder),
            logger: None,
            running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(SessionCounters::default()),
            worker: None,
            state: SchedulerState::Idle,
            last_exit: None,
        }
    }

    /// Replaces the observer used by the next `start()`.
    pub fn set_logger(&mut self, logger: Box<dyn PipelineLogger>) {
        self.logger = Some(logger);
    }

    /// Spawns the worker and begins delivering frames to `sink`.
    ///
    /// After a `stop()` playback resumes where it paused; after the stream
    /// ended on its own the source is reopened from the start.
    pub fn start<K: FrameSink + 'static>(&mut self, sink: K) -> Result<(), StartError> {
        self.reap();
        if self.worker.is_some() {
            return Err(StartError::AlreadyRunning);
        }
        self.state = SchedulerState::Starting;

        let mut reader = match self.reader.take() {
            Some(reader) => reader,
            None => match open_reader(&self.descriptor, self.hint, &self.config) {
                Ok(reader) => reader,
                Err(e) => {
                    self.state = SchedulerState::Idle;
                    return Err(StartError::Open(e));
                }
            },
        };
        let decoder = self
            .decoder
            .take()
            .unwrap_or_else(|| Box::new(ImageJpegDecoder));
        let logger = self
            .logger
            .take()
            .unwrap_or_else(|| Box::new(LogPipelineLogger::new(self.config.progress_interval)));

        // One flag per worker. A detached predecessor keeps its own, cleared one.
        self.running = Arc::new(AtomicBool::new(false));
        let (stop, signal) = stop_pair(self.running.clone());
        reader.set_sleeper(Arc::new(signal.clone()));
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);

        let scheduler = FrameScheduler::new(
            reader,
            decoder,
            Box::new(sink),
            logger,
            signal,
            self.stats.clone(),
            SchedulerSettings {
                pacing: self.config.pacing_interval(),
                error_threshold: self.config.read_error_threshold,
            },
        );

        let spawned = std::thread::Builder::new()
            .name("mjpeg-pump".to_string())
            .spawn(move || {
                let parts = scheduler.run();
                let _ = done_tx.send(());
                parts
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.running.store(false, Ordering::Release);
                self.state = SchedulerState::Idle;
                return Err(StartError::Spawn(e));
            }
        };

        self.worker = Some(Worker {
            handle,
            stop,
            done: done_rx,
        });
        self.state = SchedulerState::Running;
        log::info!(
            "Scheduler running at {} fps ({} ms pacing)",
            self.config.target_fps,
            self.config.pacing_interval().as_millis()
        );
        Ok(())
    }

    /// Requests a stop and waits for the worker. Safe to call at any time,
    /// any number of times.
    pub fn stop(&mut self) {
        let Some(mut worker) = self.worker.take() else {
            return;
        };
        self.state = SchedulerState::Stopping;
        worker.stop.request_stop();

        match worker.done.recv_timeout(self.config.stop_grace()) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => match worker.handle.join() {
                Ok(parts) => self.restore(parts),
                Err(_) => log::error!("Scheduler thread panicked"),
            },
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Scheduler did not exit within {} ms; detaching it",
                    self.config.stop_grace_ms
                );
            }
        }
        self.state = SchedulerState::Idle;
    }

    /// Whether the most recently started worker is still playing.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn state(&self) -> SchedulerState {
        match self.state {
            SchedulerState::Running if !self.is_running() => SchedulerState::Idle,
            state => state,
        }
    }

    /// How the last worker ended, once it has been joined.
    pub fn last_exit(&self) -> Option<SchedulerExit> {
        self.last_exit
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.snapshot()
    }

    pub fn metadata(&self) -> &StreamMetadata {
        &self.metadata
    }

    pub fn config(&self) -> &PumpConfig {
        &self.config
    }

    /// Joins a worker that has already ended on its own.
    fn reap(&mut self) {
        if self.worker.is_some() && !self.is_running() {
            self.stop();
        }
    }

    fn restore(&mut self, parts: SchedulerParts) {
        self.last_exit = Some(parts.exit);
        self.reader = parts.reader;
        self.decoder = Some(parts.decoder);
        self.logger = Some(parts.logger);
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}
