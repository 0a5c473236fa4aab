use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;

use crate::agent::TradingAgent;
use crate::error::{PlutusError, Result};
use crate::metrics::MovingAverager;
use crate::network::ValueFunction;

/// Number of recent episodes the stopping criterion averages over.
const AVERAGE_WINDOW: usize = 100;

/// Training-loop configuration, validated by [`Trainer::new`].
#[derive(Clone, Debug)]
pub struct TrainerConfig {
    /// Transitions per training batch. Must not exceed the agent's
    /// replay capacity, so warm-up guarantees the sampling precondition.
    pub batch_size: usize,
    /// Reward discount rate, in [0, 1].
    pub gamma: f32,
    /// Learning rate handed to the online network's optimizer.
    pub learning_rate: f32,
    /// Stop once the moving-average episode reward reaches this value.
    pub reward_threshold: f32,
    /// Stop once this many frames have been played.
    pub max_frames: usize,
    /// Copy online weights into the target network every this many frames.
    pub sync_every_frames: usize,
    /// Where to save the online network whenever the moving-average
    /// reward improves. `None` disables checkpointing.
    pub checkpoint_path: Option<PathBuf>,
}

/// What a completed training run looked like.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct TrainingSummary {
    pub frames: usize,
    pub episodes: usize,
    pub best_average_reward: f32,
    pub stopped_by_threshold: bool,
}

#[derive(Serialize)]
struct CheckpointMetadata {
    frame_count: usize,
    average_reward: f32,
}

/// Orchestrates the fill-train-act cycle: replay warm-up, interleaved
/// training and play steps, periodic target sync, moving-average
/// stopping, and best-checkpoint persistence.
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Result<Self> {
        if config.batch_size == 0 {
            return Err(PlutusError::invalid_parameter(
                "batch_size",
                "must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&config.gamma) {
            return Err(PlutusError::InvalidParameter {
                name: "gamma".to_string(),
                reason: format!("must be in [0, 1], got {}", config.gamma),
            });
        }
        if !(config.learning_rate > 0.0) {
            return Err(PlutusError::invalid_parameter(
                "learning_rate",
                "must be positive",
            ));
        }
        if config.max_frames == 0 {
            return Err(PlutusError::invalid_parameter(
                "max_frames",
                "must be greater than 0",
            ));
        }
        if config.sync_every_frames == 0 {
            return Err(PlutusError::invalid_parameter(
                "sync_every_frames",
                "must be greater than 0",
            ));
        }
        Ok(Trainer { config })
    }

    /// Run the training loop to completion.
    ///
    /// Fills the replay memory with one play step per slot, then
    /// alternates one training batch with one play step. Stopping is
    /// checked only at episode boundaries: either the moving-average
    /// reward crossed the threshold or the frame budget ran out.
    pub fn train<V: ValueFunction>(&self, agent: &mut TradingAgent<V>) -> Result<TrainingSummary> {
        if self.config.batch_size > agent.replay.capacity() {
            return Err(PlutusError::InvalidParameter {
                name: "batch_size".to_string(),
                reason: format!(
                    "batch size {} exceeds replay capacity {}",
                    self.config.batch_size,
                    agent.replay.capacity()
                ),
            });
        }

        for _ in 0..agent.replay.capacity() {
            agent.play_step();
        }

        let mut reward_averager = MovingAverager::new(AVERAGE_WINDOW);
        let mut trades_averager = MovingAverager::new(AVERAGE_WINDOW);
        let mut best_average_reward = f32::NEG_INFINITY;
        let mut episodes = 0usize;
        let mut stopped_by_threshold = false;
        let mut time_previous = Instant::now();
        let mut frames_previous = agent.frame_count();

        loop {
            agent.train_on_replay_batch(
                self.config.batch_size,
                self.config.gamma,
                self.config.learning_rate,
            )?;
            let report = agent.play_step();

            if report.done {
                episodes += 1;

                let now = Instant::now();
                let elapsed = now.duration_since(time_previous).as_secs_f64();
                let frames_per_second =
                    (agent.frame_count() - frames_previous) as f64 / elapsed.max(f64::EPSILON);
                time_previous = now;
                frames_previous = agent.frame_count();

                reward_averager.append(report.cumulative_reward);
                trades_averager.append(report.trades_made as f32);
                let average_reward = reward_averager.average();
                let average_trades = trades_averager.average();

                log::info!(
                    "frame #{}: reward{}={:.1}; trades{}={:.2} (epsilon={:.3}) ({:.1} frames/s)",
                    agent.frame_count(),
                    AVERAGE_WINDOW,
                    average_reward,
                    AVERAGE_WINDOW,
                    average_trades,
                    agent.epsilon(),
                    frames_per_second
                );

                if average_reward >= self.config.reward_threshold {
                    stopped_by_threshold = true;
                    best_average_reward = best_average_reward.max(average_reward);
                    break;
                }
                if agent.frame_count() >= self.config.max_frames {
                    break;
                }

                if average_reward > best_average_reward {
                    best_average_reward = average_reward;
                    if let Some(path) = &self.config.checkpoint_path {
                        match save_checkpoint(agent, path, average_reward) {
                            Ok(()) => log::info!("saved network to {}", path.display()),
                            // Checkpoint failures must not stop training.
                            Err(err) => {
                                log::warn!("checkpoint write to {} failed: {}", path.display(), err)
                            }
                        }
                    }
                }
            }

            if agent.frame_count() % self.config.sync_every_frames == 0 {
                agent.sync_target_network();
                log::debug!(
                    "synced online weights into the target network at frame {}",
                    agent.frame_count()
                );
            }
        }

        Ok(TrainingSummary {
            frames: agent.frame_count(),
            episodes,
            best_average_reward,
            stopped_by_threshold,
        })
    }
}

fn save_checkpoint<V: ValueFunction>(
    agent: &TradingAgent<V>,
    path: &Path,
    average_reward: f32,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    agent.online.save(path)?;

    let metadata = CheckpointMetadata {
        frame_count: agent.frame_count(),
        average_reward,
    };
    fs::write(
        path.with_extension("json"),
        serde_json::to_string_pretty(&metadata)?,
    )?;
    Ok(())
}
