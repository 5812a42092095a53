//! Playback clock
//!
//! Pure position-extrapolation logic for a shared player. The stored
//! position is only a true snapshot while paused; while playing, the real
//! position is the stored anchor plus wall-clock time elapsed since it was
//! taken. Every mutation first resolves the effective position and then
//! re-anchors, so the pair (`position`, `anchored_at`) is self-consistent
//! after any operation.
//!
//! Wall-clock instants are `f64` unix seconds supplied by the caller, never
//! read from the system clock here.

/// Playback position state for one room
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackClock {
    /// Position in seconds at the instant of `anchored_at`
    position: f64,
    /// Whether playback is running
    playing: bool,
    /// Wall-clock instant (unix seconds) the position was last authoritative
    anchored_at: f64,
}

impl PlaybackClock {
    /// Create a paused clock at position zero
    pub fn new(now: f64) -> Self {
        Self {
            position: 0.0,
            playing: false,
            anchored_at: now,
        }
    }

    /// Whether playback is currently running
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Stored anchor position (not extrapolated)
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Extrapolate the current playback position
    ///
    /// While playing this is `position + (now - anchored_at)`; while paused
    /// the stored position is already exact.
    pub fn effective_time(&self, now: f64) -> f64 {
        if self.playing {
            (self.position + (now - self.anchored_at)).max(0.0)
        } else {
            self.position
        }
    }

    /// Start playback, re-anchoring at `now`
    pub fn play(&mut self, now: f64) {
        self.position = self.effective_time(now);
        self.playing = true;
        self.anchored_at = now;
    }

    /// Pause playback, folding elapsed time into the stored position
    pub fn pause(&mut self, now: f64) {
        self.position = self.effective_time(now);
        self.playing = false;
        self.anchored_at = now;
    }

    /// Jump to an absolute position, preserving the play/pause state
    ///
    /// Negative targets clamp to zero; there is no upper bound (clients
    /// clamp to media duration).
    pub fn seek(&mut self, time: f64, now: f64) {
        self.position = time.max(0.0);
        self.anchored_at = now;
    }

    /// Apply a control action
    pub fn apply(&mut self, action: PlaybackAction, now: f64) {
        match action {
            PlaybackAction::Play => self.play(now),
            PlaybackAction::Pause => self.pause(now),
            PlaybackAction::Seek(time) => self.seek(time, now),
        }
    }
}

/// A validated playback control action
///
/// Seek carries its target; play and pause need no payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackAction {
    Play,
    Pause,
    Seek(f64),
}

/// Current wall-clock time as unix seconds
///
/// Convenience for transports; core operations take `now` explicitly.
pub fn unix_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
