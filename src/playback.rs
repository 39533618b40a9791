//! Playback clock and seek control for one lecture view
//!
//! The controller is driven by two sides: the viewer issues commands (play,
//! pause, seek) and the media backend reports events (metadata loaded, time
//! updates, seek confirmed). Every time change is pushed to subscribers
//! through a watch channel.

use crate::error::{LectureGraphError, Result};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackPhase {
    /// No media loaded
    Idle,
    /// Metadata loaded, time known
    Ready,
    Playing,
    Paused,
    /// Seek issued, not yet confirmed by the media backend
    Seeking,
}

/// An explicit seek command.
///
/// Each request carries a fresh sequence number, so two seeks to the same
/// target are still two distinct commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeekRequest {
    pub target: f64,
    pub sequence: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub current_time: f64,
    pub pending_seek: Option<SeekRequest>,
}

#[derive(Debug)]
pub struct PlaybackController {
    phase: PlaybackPhase,
    state: PlaybackState,
    duration: Option<f64>,
    next_sequence: u64,
    time_tx: watch::Sender<f64>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        let (time_tx, _) = watch::channel(0.0);
        Self {
            phase: PlaybackPhase::Idle,
            state: PlaybackState::default(),
            duration: None,
            next_sequence: 0,
            time_tx,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn pending_seek(&self) -> Option<SeekRequest> {
        self.state.pending_seek
    }

    /// Receive every time change; the receiver always sees the latest value
    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.time_tx.subscribe()
    }

    /// Media metadata arrived: `Idle -> Ready`
    pub fn load_metadata(&mut self, duration: f64) -> Result<()> {
        if self.phase != PlaybackPhase::Idle {
            return Err(self.invalid("load metadata"));
        }
        if !duration.is_finite() || duration < 0.0 {
            return Err(LectureGraphError::Validation(format!(
                "media duration must be a non-negative number, got {}",
                duration
            )));
        }
        self.duration = Some(duration);
        self.phase = PlaybackPhase::Ready;
        self.emit(self.state.current_time);
        debug!("Media ready, duration {:.1}s", duration);
        Ok(())
    }

    /// `Ready/Paused -> Playing`; no-op while already playing
    pub fn play(&mut self) -> Result<()> {
        match self.phase {
            PlaybackPhase::Ready | PlaybackPhase::Paused => {
                self.phase = PlaybackPhase::Playing;
                Ok(())
            }
            PlaybackPhase::Playing => Ok(()),
            _ => Err(self.invalid("play")),
        }
    }

    /// `Playing -> Paused`; no-op while already paused
    pub fn pause(&mut self) -> Result<()> {
        match self.phase {
            PlaybackPhase::Playing => {
                self.phase = PlaybackPhase::Paused;
                Ok(())
            }
            PlaybackPhase::Paused => Ok(()),
            _ => Err(self.invalid("pause")),
        }
    }

    /// Play/pause toggle as bound to a click on the video surface
    pub fn toggle(&mut self) -> Result<PlaybackPhase> {
        if self.phase == PlaybackPhase::Playing {
            self.pause()?;
        } else {
            self.play()?;
        }
        Ok(self.phase)
    }

    /// Issue a seek from any state. Playback resumes once the media backend
    /// confirms the jump with [`confirm_seek`](Self::confirm_seek).
    pub fn request_seek(&mut self, target: f64) -> SeekRequest {
        let target = self.clamp_time(target);
        self.next_sequence += 1;
        let request = SeekRequest {
            target,
            sequence: self.next_sequence,
        };
        self.state.pending_seek = Some(request);
        self.phase = PlaybackPhase::Seeking;
        debug!("Seek #{} to {:.2}s", request.sequence, target);
        request
    }

    /// Hand the outstanding seek to the media backend, clearing it
    pub fn take_pending_seek(&mut self) -> Option<SeekRequest> {
        self.state.pending_seek.take()
    }

    /// Media backend landed at `time`: `Seeking -> Playing`
    pub fn confirm_seek(&mut self, time: f64) -> Result<()> {
        if self.phase != PlaybackPhase::Seeking {
            return Err(self.invalid("confirm seek"));
        }
        self.state.pending_seek = None;
        self.state.current_time = self.clamp_time(time);
        self.phase = PlaybackPhase::Playing;
        self.emit(self.state.current_time);
        Ok(())
    }

    /// Periodic time report from the media backend.
    ///
    /// Only accepted while playing; returns whether it was applied.
    pub fn time_update(&mut self, time: f64) -> bool {
        if self.phase != PlaybackPhase::Playing || !time.is_finite() {
            return false;
        }
        self.state.current_time = self.clamp_time(time);
        self.emit(self.state.current_time);
        true
    }

    /// Jump to a fraction of the duration (progress-bar click) without
    /// changing the play state
    pub fn scrub(&mut self, fraction: f64) -> Result<f64> {
        let duration = self
            .duration
            .ok_or_else(|| self.invalid("scrub without known duration"))?;
        let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
        let time = fraction * duration;
        self.state.current_time = time;
        self.emit(time);
        Ok(time)
    }

    /// Percent of the media played, 0 when the duration is unknown or zero
    pub fn progress(&self) -> f64 {
        match self.duration {
            Some(d) if d > 0.0 => (self.state.current_time / d * 100.0).clamp(0.0, 100.0),
            _ => 0.0,
        }
    }

    fn clamp_time(&self, time: f64) -> f64 {
        let time = if time.is_finite() { time.max(0.0) } else { 0.0 };
        match self.duration {
            Some(d) => time.min(d),
            None => time,
        }
    }

    fn emit(&self, time: f64) {
        self.time_tx.send_replace(time);
    }

    fn invalid(&self, action: &str) -> LectureGraphError {
        LectureGraphError::InvalidTransition(format!("cannot {} while {:?}", action, self.phase))
    }
}
