use serde::{Deserialize, Serialize};

use crate::error::{PlutusError, Result};

/// Linear epsilon decay schedule for epsilon-greedy exploration.
///
/// Epsilon moves linearly from `init` to `final_value` over
/// `decay_frames` frames, then holds at `final_value`. The value is a
/// pure function of the frame count and carries no state of its own.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EpsilonSchedule {
    init: f32,
    final_value: f32,
    decay_frames: usize,
    increment: f32,
}

impl EpsilonSchedule {
    pub fn new(init: f32, final_value: f32, decay_frames: usize) -> Result<Self> {
        for (name, value) in [("epsilon_init", init), ("epsilon_final", final_value)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PlutusError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("must be in [0, 1], got {}", value),
                });
            }
        }
        if decay_frames == 0 {
            return Err(PlutusError::InvalidParameter {
                name: "epsilon_decay_frames".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(EpsilonSchedule {
            init,
            final_value,
            decay_frames,
            increment: (final_value - init) / decay_frames as f32,
        })
    }

    /// Epsilon at the given frame count.
    pub fn value(&self, frame: usize) -> f32 {
        if frame >= self.decay_frames {
            self.final_value
        } else {
            self.init + self.increment * frame as f32
        }
    }
}
