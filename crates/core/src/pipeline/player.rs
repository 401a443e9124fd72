use std::path::Path;

use thiserror::Error;

use crate::demux::domain::demux_error::OpenError;
use crate::pipeline::frame_scheduler::SchedulerExit;
use crate::pipeline::frame_sink::FrameSink;
use crate::pipeline::playback_session::{PlaybackSession, StartError};
use crate::pipeline::session_stats::SessionStats;
use crate::shared::pump_config::PumpConfig;
use crate::source::domain::source_descriptor::{ContainerKind, SourceDescriptor};

#[derive(Error, Debug)]
pub enum PlayError {
    #[error(transparent)]
    Open(#[from] OpenError),
    #[error(transparent)]
    Start(#[from] StartError),
}

/// Outcome of a session that ended on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finished {
    pub exit: Option<SchedulerExit>,
    pub stats: SessionStats,
}

/// At most one session at a time; starting a new one stops the old one.
pub struct Player {
    config: PumpConfig,
    session: Option<PlaybackSession>,
}

impl Player {
    pub fn new(config: PumpConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn play<K: FrameSink + 'static>(
        &mut self,
        source: SourceDescriptor,
        hint: Option<ContainerKind>,
        sink: K,
    ) -> Result<(), PlayError> {
        self.stop();
        log::info!("Playing {source}");
        let mut session = PlaybackSession::open(source, hint, &self.config)?;
        session.start(sink)?;
        self.session = Some(session);
        Ok(())
    }

    pub fn play_file<K: FrameSink + 'static>(&mut self, path: &Path, sink: K) -> Result<(), PlayError> {
        self.play(SourceDescriptor::Path(path.to_path_buf()), None, sink)
    }

    pub fn play_url<K: FrameSink + 'static>(&mut self, url: &str, sink: K) -> Result<(), PlayError> {
        self.play(SourceDescriptor::Url(url.to_string()), None, sink)
    }

    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stop();
            log::info!("Playback stopped ({})", session.stats());
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session.as_ref().is_some_and(PlaybackSession::is_running)
    }

    pub fn stats(&self) -> Option<SessionStats> {
        self.session.as_ref().map(PlaybackSession::stats)
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    /// Call periodically. Reaps a session whose stream has ended and reports
    /// it exactly once.
    pub fn poll(&mut self) -> Option<Finished> {
        if self.session.as_ref()?.is_running() {
            return None;
        }
        let mut session = self.session.take()?;
        session.stop();
        let finished = Finished {
            exit: session.last_exit(),
            stats: session.stats(),
        };
        log::info!("Playback completed ({})", finished.stats);
        Some(finished)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}
