//! # Plutus - Deep Q-Learning for Synthetic-Asset Trading
//!
//! Plutus is a small off-policy reinforcement-learning core that trains a
//! DQN agent to trade a single synthetic asset. It provides the full
//! training loop: a deterministic market simulator, experience replay,
//! epsilon-greedy exploration with a linear decay schedule,
//! temporal-difference targets bootstrapped from a lagged target network,
//! and optional goal-conditioned replay (hindsight relabeling).
//!
//! ## Key Features
//!
//! - **Replay memory**: fixed-capacity ring buffer with uniform sampling
//! - **Two-network DQN**: gradient updates on the online network only,
//!   periodic atomic weight copies into the target network
//! - **Hindsight experience replay**: episode trajectories relabeled
//!   against the state actually reached
//! - **Pluggable value function**: the networks sit behind a trait, so
//!   the learning core never depends on one architecture
//! - **Type safety**: configuration validated at construction, not
//!   somewhere down the training loop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plutus::agent::{AgentConfig, TradingAgent};
//! use plutus::market::TradingEnv;
//! use plutus::network::build_q_network;
//! use plutus::optimizer::{OptimizerWrapper, SGD};
//! use plutus::trainer::{Trainer, TrainerConfig};
//!
//! let config = AgentConfig {
//!     replay_capacity: 1000,
//!     epsilon_init: 0.5,
//!     epsilon_final: 0.01,
//!     epsilon_decay_frames: 1000,
//!     her: false,
//! };
//! let online = build_q_network(3, false, OptimizerWrapper::SGD(SGD::new())).unwrap();
//! let target = build_q_network(3, false, OptimizerWrapper::SGD(SGD::new())).unwrap();
//! let mut agent = TradingAgent::new(TradingEnv::default(), online, target, config).unwrap();
//!
//! let trainer = Trainer::new(TrainerConfig {
//!     batch_size: 64,
//!     gamma: 0.99,
//!     learning_rate: 0.01,
//!     reward_threshold: 10000.0,
//!     max_frames: 1_000_000,
//!     sync_every_frames: 100,
//!     checkpoint_path: Some("models/dqn.bin".into()),
//! })
//! .unwrap();
//!
//! let summary = trainer.train(&mut agent).unwrap();
//! println!("trained for {} frames", summary.frames);
//! ```
//!
//! ## Module Organization
//!
//! - [`agent`] - Epsilon-greedy policy controller and batch training
//! - [`error`] - Error types and result handling
//! - [`features`] - State-to-feature-vector mapping
//! - [`market`] - Deterministic trading environment
//! - [`metrics`] - Moving-average reward tracking
//! - [`network`] - Value-function trait and the reference MLP
//! - [`optimizer`] - SGD and Adam parameter updates
//! - [`replay`] - Experience replay memory
//! - [`schedule`] - Linear epsilon decay
//! - [`trainer`] - The fill-train-act orchestration loop

pub mod agent;
pub mod error;
pub mod features;
pub mod market;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay;
pub mod schedule;
pub mod trainer;

#[cfg(test)]
mod tests;
