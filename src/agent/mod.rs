//! # Policy Controller Module
//!
//! The trading agent drives the environment with an epsilon-greedy
//! policy, records experience through a two-phase replay write, and
//! trains the online value function against temporal-difference targets
//! bootstrapped from a lagged target copy.
//!
//! ## Core Concepts
//!
//! - **Epsilon-greedy**: random action with probability epsilon, else the
//!   action with the highest predicted value
//! - **Experience replay**: past transitions are stored and re-sampled to
//!   decorrelate updates
//! - **Target network**: a lagged parameter copy evaluates the bootstrap
//!   term, stabilizing training
//! - **Hindsight relabeling (HER)**: at episode end the stored trajectory
//!   is relabeled against the state actually reached, so failed episodes
//!   still teach the goal-conditioned policy something
//!
//! ## Example
//!
//! ```rust,no_run
//! use plutus::agent::{AgentConfig, TradingAgent};
//! use plutus::market::TradingEnv;
//! use plutus::network::build_q_network;
//! use plutus::optimizer::{OptimizerWrapper, SGD};
//!
//! let config = AgentConfig {
//!     replay_capacity: 1000,
//!     epsilon_init: 0.5,
//!     epsilon_final: 0.01,
//!     epsilon_decay_frames: 1000,
//!     her: true,
//! };
//! let online = build_q_network(3, true, OptimizerWrapper::SGD(SGD::new())).unwrap();
//! let target = build_q_network(3, true, OptimizerWrapper::SGD(SGD::new())).unwrap();
//! let mut agent = TradingAgent::new(TradingEnv::default(), online, target, config).unwrap();
//!
//! let report = agent.play_step();
//! if agent.replay.len() >= 64 {
//!     let loss = agent.train_on_replay_batch(64, 0.99, 0.01).unwrap();
//! }
//! ```

mod dqn;

pub use dqn::{AgentConfig, StepReport, TradingAgent, GOAL_REWARD};
