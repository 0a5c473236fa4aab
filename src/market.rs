use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{PlutusError, Result};

/// Trading actions available to the agent, encoded as 0, 1, 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Hold = 0,
    Buy = 1,
    Sell = 2,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::Hold, Action::Buy, Action::Sell];
    pub const COUNT: usize = 3;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Action> {
        Action::ALL.get(index).copied()
    }

    /// Pick an action uniformly at random.
    pub fn random<R: Rng>(rng: &mut R) -> Action {
        Action::ALL[rng.gen_range(0..Action::COUNT)]
    }
}

/// Immutable snapshot of the market and portfolio at one step.
///
/// `last_buy_price` stays `None` until the first buy of the episode.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub price: f32,
    pub next_price: f32,
    pub last_buy_price: Option<f32>,
    pub assets: f32,
    pub currency: f32,
}

/// Result of a single environment step.
///
/// `state` is `None` when the episode ended on this step, in which case
/// `reward` is the final portfolio value minus the starting currency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    pub state: Option<State>,
    pub done: bool,
    pub trade_made: bool,
}

/// Immediate reward shaping applied to a trade at a given price.
///
/// Kept behind a trait so the sentinel-price bonus of the default
/// environment can be swapped without touching the learning core.
pub trait RewardShaping: Send + Sync {
    fn trade_bonus(&self, action: Action, price: f32) -> f32;
}

/// Pays a fixed bonus for buying at `buy_price` and selling at
/// `sell_price`, zero otherwise. The default values (1, 2, +10) match the
/// two-valued oscillating price series of [`TradingEnv::default`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SentinelBonus {
    pub buy_price: f32,
    pub sell_price: f32,
    pub bonus: f32,
}

impl Default for SentinelBonus {
    fn default() -> Self {
        SentinelBonus {
            buy_price: 1.0,
            sell_price: 2.0,
            bonus: 10.0,
        }
    }
}

impl RewardShaping for SentinelBonus {
    fn trade_bonus(&self, action: Action, price: f32) -> f32 {
        match action {
            Action::Buy if price == self.buy_price => self.bonus,
            Action::Sell if price == self.sell_price => self.bonus,
            _ => 0.0,
        }
    }
}

/// Deterministic step simulator over a fixed, precomputed price series.
///
/// Position sizing is all-in/all-out: a buy converts the entire currency
/// balance to assets, a sell converts the entire asset balance back. The
/// episode terminates when the cursor reaches `len - 2`.
pub struct TradingEnv {
    prices: Vec<f32>,
    cursor: usize,
    assets: f32,
    currency: f32,
    starting_currency: f32,
    last_buy_price: Option<f32>,
    shaping: Box<dyn RewardShaping>,
}

impl TradingEnv {
    /// Create an environment over the given price series.
    ///
    /// The series needs at least 3 points so the initial state is never
    /// already terminal.
    pub fn new(prices: Vec<f32>, starting_currency: f32) -> Result<Self> {
        if prices.len() < 3 {
            return Err(PlutusError::InvalidParameter {
                name: "prices".to_string(),
                reason: format!("series must have at least 3 points, got {}", prices.len()),
            });
        }
        if !(starting_currency > 0.0) {
            return Err(PlutusError::InvalidParameter {
                name: "starting_currency".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(TradingEnv {
            prices,
            cursor: 0,
            assets: 0.0,
            currency: starting_currency,
            starting_currency,
            last_buy_price: None,
            shaping: Box::new(SentinelBonus::default()),
        })
    }

    /// Replace the reward shaping applied to trades.
    pub fn with_shaping(mut self, shaping: Box<dyn RewardShaping>) -> Self {
        self.shaping = shaping;
        self
    }

    /// The reference price series: 40 points of `ceil(1 + cos(i))`, a
    /// two-valued oscillation between 1 and 2.
    pub fn default_series() -> Vec<f32> {
        (0..40).map(|i| (1.0 + (i as f32).cos()).ceil()).collect()
    }

    /// Reset the cursor and portfolio to their starting values.
    pub fn reset(&mut self) -> State {
        self.cursor = 0;
        self.assets = 0.0;
        self.currency = self.starting_currency;
        self.last_buy_price = None;
        self.state()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> State {
        State {
            price: self.prices[self.cursor],
            next_price: self.prices[self.cursor + 1],
            last_buy_price: self.last_buy_price,
            assets: self.assets,
            currency: self.currency,
        }
    }

    /// Advance one step. The terminal check happens before the action is
    /// applied, so the action passed on a terminal step is ignored.
    pub fn step(&mut self, action: Action) -> StepOutcome {
        if self.cursor >= self.prices.len() - 2 {
            let reward =
                (self.currency + self.assets * self.prices[self.cursor]) - self.starting_currency;
            return StepOutcome {
                reward,
                state: None,
                done: true,
                trade_made: false,
            };
        }

        let price = self.prices[self.cursor];
        let reward = self.shaping.trade_bonus(action, price);

        match action {
            Action::Buy => {
                if self.currency > 0.0 {
                    self.assets += self.currency / price;
                    self.currency = 0.0;
                    self.last_buy_price = Some(price);
                }
            }
            Action::Sell => {
                if self.assets > 0.0 {
                    self.currency += self.assets * price;
                    self.assets = 0.0;
                }
            }
            Action::Hold => {}
        }

        self.cursor += 1;

        StepOutcome {
            reward,
            state: Some(self.state()),
            done: false,
            trade_made: action != Action::Hold,
        }
    }
}

impl Default for TradingEnv {
    fn default() -> Self {
        TradingEnv {
            prices: Self::default_series(),
            cursor: 0,
            assets: 0.0,
            currency: 50.0,
            starting_currency: 50.0,
            last_buy_price: None,
            shaping: Box::new(SentinelBonus::default()),
        }
    }
}
