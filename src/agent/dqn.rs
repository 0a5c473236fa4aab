use ndarray::{concatenate, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PlutusError, Result};
use crate::features::{featurize_batch, FEATURES};
use crate::market::{Action, State, TradingEnv};
use crate::network::ValueFunction;
use crate::replay::{ReplayMemory, Transition};
use crate::schedule::EpsilonSchedule;

/// Reward written over a relabeled transition whose reached portfolio
/// matches the hindsight goal exactly.
pub const GOAL_REWARD: f32 = 10.0;

/// Configuration of the policy controller, validated at construction.
#[derive(Clone, Copy, Debug)]
pub struct AgentConfig {
    /// Capacity of the replay memory. Must be a positive integer.
    pub replay_capacity: usize,
    /// Initial epsilon for the epsilon-greedy policy, in [0, 1].
    pub epsilon_init: f32,
    /// Final epsilon after decay, in [0, 1].
    pub epsilon_final: f32,
    /// Number of frames over which epsilon decays linearly.
    pub epsilon_decay_frames: usize,
    /// Goal-conditioned (HER) mode: the value function sees state and
    /// goal features concatenated, and episode-end relabeling is active.
    pub her: bool,
}

/// What one [`TradingAgent::play_step`] call produced.
#[derive(Clone, Copy, Debug)]
pub struct StepReport {
    pub action: Action,
    pub cumulative_reward: f32,
    pub done: bool,
    pub trades_made: usize,
}

/// DQN policy controller over a [`TradingEnv`].
///
/// Owns the epsilon schedule, both value-function instances, the replay
/// memory, and the in-progress episode trajectory. All randomness
/// (exploration and replay sampling) draws from one shared generator.
pub struct TradingAgent<V: ValueFunction> {
    pub online: V,
    pub target: V,
    pub replay: ReplayMemory,
    env: TradingEnv,
    schedule: EpsilonSchedule,
    her: bool,
    frame_count: usize,
    epsilon: f32,
    cumulative_reward: f32,
    trades_made: usize,
    trajectory: Vec<Transition>,
    rng: StdRng,
}

impl<V: ValueFunction> TradingAgent<V> {
    /// Create an agent. Fails fast on an invalid epsilon schedule, a
    /// zero-capacity replay memory, or a value function whose shape does
    /// not match the configured mode.
    pub fn new(mut env: TradingEnv, online: V, target: V, config: AgentConfig) -> Result<Self> {
        let schedule = EpsilonSchedule::new(
            config.epsilon_init,
            config.epsilon_final,
            config.epsilon_decay_frames,
        )?;
        let replay = ReplayMemory::new(config.replay_capacity)?;

        let expected_width = FEATURES * if config.her { 2 } else { 1 };
        for (name, network) in [("online", &online), ("target", &target)] {
            if network.input_width() != expected_width {
                return Err(PlutusError::DimensionMismatch {
                    expected: format!("{} network input width {}", name, expected_width),
                    actual: format!("{}", network.input_width()),
                });
            }
            if network.num_actions() != Action::COUNT {
                return Err(PlutusError::InvalidParameter {
                    name: "num_actions".to_string(),
                    reason: format!(
                        "{} network produces {} action values, the market has {}",
                        name,
                        network.num_actions(),
                        Action::COUNT
                    ),
                });
            }
        }

        env.reset();

        Ok(TradingAgent {
            online,
            target,
            replay,
            env,
            schedule,
            her: config.her,
            frame_count: 0,
            epsilon: config.epsilon_init,
            cumulative_reward: 0.0,
            trades_made: 0,
            trajectory: Vec::new(),
            rng: StdRng::from_entropy(),
        })
    }

    /// Seed the shared random source, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Play one step of the trading game.
    ///
    /// Records the live transition immediately (with `done` always false,
    /// see the hindsight pass below) and buffers the raw transition on
    /// the episode trajectory. When the step ends the episode, the
    /// trajectory is relabeled against the final state and appended to
    /// replay, then the episode state resets.
    pub fn play_step(&mut self) -> StepReport {
        self.epsilon = self.schedule.value(self.frame_count);
        self.frame_count += 1;

        let state = self.env.state();
        let action = if self.rng.gen::<f32>() < self.epsilon {
            Action::random(&mut self.rng)
        } else {
            self.greedy_action(&state)
        };

        let outcome = self.env.step(action);
        // Achieved-goal candidate: the reached portfolio scaled 2x.
        let goal = outcome.state.map(|s| scaled_goal(&s));

        self.replay.append(Transition {
            state,
            action,
            reward: outcome.reward,
            done: false,
            next_state: outcome.state,
            goal,
        });
        self.trajectory.push(Transition {
            state,
            action,
            reward: outcome.reward,
            done: false,
            next_state: outcome.state,
            goal: None,
        });

        self.cumulative_reward += outcome.reward;
        if outcome.trade_made {
            self.trades_made += 1;
        }

        let report = StepReport {
            action,
            cumulative_reward: self.cumulative_reward,
            done: outcome.done,
            trades_made: self.trades_made,
        };

        if outcome.done {
            // The final observed state of the episode becomes the
            // hindsight goal for the whole trajectory.
            self.relabel_trajectory(state);
            self.reset_episode();
        }

        report
    }

    /// Perform one training step on a batch sampled from replay memory.
    ///
    /// Targets are `reward + gamma * max_a target(next)[a]` with the
    /// bootstrap term masked out on terminal transitions; the loss is a
    /// mean squared error on the taken action's value, and only the
    /// online network is updated. Returns the monitored loss.
    pub fn train_on_replay_batch(
        &mut self,
        batch_size: usize,
        gamma: f32,
        learning_rate: f32,
    ) -> Result<f32> {
        if batch_size == 0 {
            return Err(PlutusError::EmptyBuffer(
                "cannot train on an empty batch".to_string(),
            ));
        }

        let batch = self.replay.sample(batch_size, &mut self.rng);

        let states = column(&batch, |t| Some(&t.state));
        let next_states = column(&batch, |t| t.next_state.as_ref());
        let actions = column(&batch, |t| t.action.index());
        let rewards = column(&batch, |t| t.reward);
        let dones = column(&batch, |t| t.done);

        let mut state_features = featurize_batch(&states);
        let mut next_features = featurize_batch(&next_states);
        if self.her {
            let goals = column(&batch, |t| t.goal.as_ref());
            let goal_features = featurize_batch(&goals);
            state_features = concatenate![Axis(1), state_features, goal_features];
            next_features = concatenate![Axis(1), next_features, goal_features];
        }

        let predictions = self.online.predict_batch(state_features.view());
        let next_q = self.target.predict_batch(next_features.view());

        let mut targets = predictions;
        for i in 0..batch_size {
            let target = if dones[i] {
                rewards[i]
            } else {
                let max_next = next_q
                    .row(i)
                    .iter()
                    .fold(f32::NEG_INFINITY, |max, &v| max.max(v));
                rewards[i] + gamma * max_next
            };
            targets[[i, actions[i]]] = target;
        }

        self.online
            .fit_batch(state_features.view(), targets.view(), learning_rate);

        let refreshed = self.online.predict_batch(state_features.view());
        let loss = (&refreshed - &targets)
            .mapv(|x| x * x)
            .mean()
            .unwrap_or(f32::INFINITY);
        Ok(loss)
    }

    /// Copy all online parameters into the target network. A discrete,
    /// atomic replacement; no interpolation.
    pub fn sync_target_network(&mut self) {
        self.target.clone_weights_from(&self.online);
    }

    fn greedy_action(&mut self, state: &State) -> Action {
        let features = self.policy_features(state);
        let values = self.online.predict_batch(features.view());
        let best = values
            .row(0)
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(index, _)| index)
            .unwrap_or(Action::Hold.index());
        Action::from_index(best).unwrap_or(Action::Hold)
    }

    fn policy_features(&self, state: &State) -> Array2<f32> {
        let state_features = featurize_batch(&[Some(state)]);
        if self.her {
            let goal = scaled_goal(state);
            let goal_features = featurize_batch(&[Some(&goal)]);
            concatenate![Axis(1), state_features, goal_features]
        } else {
            state_features
        }
    }

    fn relabel_trajectory(&mut self, hindsight_goal: State) {
        let trajectory = std::mem::take(&mut self.trajectory);
        for mut transition in trajectory {
            transition.goal = Some(hindsight_goal);
            if let Some(next) = &transition.next_state {
                if next.assets == hindsight_goal.assets && next.currency == hindsight_goal.currency {
                    log::debug!(
                        "hindsight goal reached (assets={}, currency={})",
                        next.assets,
                        next.currency
                    );
                    transition.reward = GOAL_REWARD;
                }
            }
            self.replay.append(transition);
        }
    }

    fn reset_episode(&mut self) {
        self.cumulative_reward = 0.0;
        self.trades_made = 0;
        self.trajectory.clear();
        self.env.reset();
    }
}

/// The achieved-goal candidate for a state: the same snapshot with the
/// portfolio (assets, currency) scaled 2x.
fn scaled_goal(state: &State) -> State {
    State {
        assets: state.assets * 2.0,
        currency: state.currency * 2.0,
        ..*state
    }
}

/// Extract one column of a sampled batch through a field selector.
fn column<'a, T, F>(batch: &[&'a Transition], select: F) -> Vec<T>
where
    F: Fn(&'a Transition) -> T,
{
    batch.iter().map(|&transition| select(transition)).collect()
}
