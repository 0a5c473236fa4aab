use ndarray::{Array1, Array2};

use crate::market::State;

/// Width of the feature vector produced for a single state.
pub const FEATURES: usize = 5;

/// Feature vector for a single state.
///
/// Layout: `[price, next_price, last_buy_price, assets, currency]`. The
/// order is what the value function was trained against, so it must match
/// between training and inference.
pub fn featurize(state: &State) -> Array1<f32> {
    let batch = featurize_batch(&[Some(state)]);
    batch.row(0).to_owned()
}

/// Feature matrix for a batch of optional states, one row per entry.
///
/// Rows for `None` entries stay at the 0.0 neutral default. Terminal
/// transitions have no next state, and this keeps them valid batch members
/// without any branching at the call site. A `last_buy_price` of `None`
/// contributes the same neutral 0.0.
pub fn featurize_batch(states: &[Option<&State>]) -> Array2<f32> {
    let mut features = Array2::zeros((states.len(), FEATURES));
    for (i, state) in states.iter().enumerate() {
        if let Some(state) = state {
            let mut row = features.row_mut(i);
            row[0] = state.price;
            row[1] = state.next_price;
            row[2] = state.last_buy_price.unwrap_or(0.0);
            row[3] = state.assets;
            row[4] = state.currency;
        }
    }
    features
}
