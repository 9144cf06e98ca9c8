//! Last-saved respawn point.
//!
//! Save points overwrite the store unconditionally: there is no "best of"
//! comparison, so walking back through an earlier save point moves the
//! checkpoint back too. Loading before anything was saved is an error rather
//! than a silent respawn at the origin.

use serde::{Deserialize, Serialize};

use crate::math::Position;
use crate::timer::CountdownTimer;
use crate::MazeError;

/// A saved position and the countdown value at the time of saving.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Where the player stood.
    pub position: Position,
    /// Seconds that were left on the countdown.
    pub time_remaining: f32,
}

/// Holds at most one [`Checkpoint`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckpointStore {
    saved: Option<Checkpoint>,
}

impl CheckpointStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored checkpoint.
    pub fn save(&mut self, position: Position, time_remaining: f32) {
        self.saved = Some(Checkpoint {
            position,
            time_remaining,
        });
        tracing::debug!(
            x = position.x,
            y = position.y,
            z = position.z,
            time_remaining,
            "checkpoint saved"
        );
    }

    /// The stored checkpoint.
    pub fn load(&self) -> Result<Checkpoint, MazeError> {
        self.saved.ok_or(MazeError::NoCheckpoint)
    }

    /// Copy the stored position into `target` and the stored time into `timer`.
    /// Neither is touched when nothing was saved.
    pub fn restore(
        &self,
        target: &mut Position,
        timer: &mut CountdownTimer,
    ) -> Result<Checkpoint, MazeError> {
        let checkpoint = self.load()?;
        *target = checkpoint.position;
        timer.set_time(checkpoint.time_remaining);
        Ok(checkpoint)
    }

    /// Whether a checkpoint exists.
    pub fn has_checkpoint(&self) -> bool {
        self.saved.is_some()
    }
}
