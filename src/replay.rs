use std::collections::VecDeque;

use rand::Rng;

use crate::error::{PlutusError, Result};
use crate::market::{Action, State};

/// The unit of experience replay.
///
/// `next_state` is `None` when the episode ended on this step. `goal` is
/// only populated in goal-conditioned (HER) mode: the achieved-goal
/// candidate on the live append, the episode's final state after the
/// hindsight relabeling pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub state: State,
    pub action: Action,
    pub reward: f32,
    pub done: bool,
    pub next_state: Option<State>,
    pub goal: Option<State>,
}

/// Fixed-capacity replay memory with overwrite-oldest semantics.
pub struct ReplayMemory {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayMemory {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PlutusError::InvalidParameter {
                name: "capacity".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(ReplayMemory {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a transition, overwriting the oldest once full.
    pub fn append(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Sample `batch_size` transitions uniformly at random with
    /// replacement across positions, fresh on every call.
    ///
    /// Sampling more than `len()` transitions is a programming error: the
    /// trainer must guarantee warm-up before training begins.
    pub fn sample<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Vec<&Transition> {
        assert!(
            batch_size <= self.buffer.len(),
            "sampled {} transitions from a memory holding {}",
            batch_size,
            self.buffer.len()
        );
        (0..batch_size)
            .map(|_| &self.buffer[rng.gen_range(0..self.buffer.len())])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over the stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }
}
