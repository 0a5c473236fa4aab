use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Applies one gradient update to a single layer's parameters.
///
/// `layer` keys any per-layer optimizer state, so the same optimizer
/// instance serves every layer of a network. One call is one atomic
/// update; gradients are never partially applied.
pub trait Optimizer {
    fn apply(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        weight_gradients: &Array2<f32>,
        biases: &mut Array1<f32>,
        bias_gradients: &Array1<f32>,
        learning_rate: f32,
    );
}

#[derive(Serialize, Deserialize, Clone)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn apply(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        weight_gradients: &Array2<f32>,
        biases: &mut Array1<f32>,
        bias_gradients: &Array1<f32>,
        learning_rate: f32,
    ) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.apply(
                layer,
                weights,
                weight_gradients,
                biases,
                bias_gradients,
                learning_rate,
            ),
            OptimizerWrapper::Adam(optimizer) => optimizer.apply(
                layer,
                weights,
                weight_gradients,
                biases,
                bias_gradients,
                learning_rate,
            ),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Default)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Optimizer for SGD {
    fn apply(
        &mut self,
        _layer: usize,
        weights: &mut Array2<f32>,
        weight_gradients: &Array2<f32>,
        biases: &mut Array1<f32>,
        bias_gradients: &Array1<f32>,
        learning_rate: f32,
    ) {
        weights.zip_mut_with(weight_gradients, |w, &g| *w -= learning_rate * g);
        biases.zip_mut_with(bias_gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// Per-layer first and second moment estimates with a per-layer step
/// counter for bias correction.
#[derive(Serialize, Deserialize, Clone)]
struct AdamSlot {
    m_weights: Array2<f32>,
    v_weights: Array2<f32>,
    m_biases: Array1<f32>,
    v_biases: Array1<f32>,
    t: usize,
}

impl AdamSlot {
    fn zeros(weight_dim: (usize, usize), bias_dim: usize) -> Self {
        AdamSlot {
            m_weights: Array2::zeros(weight_dim),
            v_weights: Array2::zeros(weight_dim),
            m_biases: Array1::zeros(bias_dim),
            v_biases: Array1::zeros(bias_dim),
            t: 0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    slots: Vec<AdamSlot>,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            slots: Vec::new(),
        }
    }

    // Slots are created on first touch so the optimizer can be built
    // before the network's layer shapes are known.
    fn slot(&mut self, layer: usize, weight_dim: (usize, usize), bias_dim: usize) -> &mut AdamSlot {
        while self.slots.len() <= layer {
            self.slots.push(AdamSlot::zeros((0, 0), 0));
        }
        if self.slots[layer].m_weights.dim() != weight_dim
            || self.slots[layer].m_biases.dim() != bias_dim
        {
            self.slots[layer] = AdamSlot::zeros(weight_dim, bias_dim);
        }
        &mut self.slots[layer]
    }
}

impl Default for Adam {
    fn default() -> Self {
        Adam::new(0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn apply(
        &mut self,
        layer: usize,
        weights: &mut Array2<f32>,
        weight_gradients: &Array2<f32>,
        biases: &mut Array1<f32>,
        bias_gradients: &Array1<f32>,
        learning_rate: f32,
    ) {
        let beta1 = self.beta1;
        let beta2 = self.beta2;
        let epsilon = self.epsilon;
        let slot = self.slot(layer, weights.dim(), biases.dim());

        slot.t += 1;
        let t = slot.t as i32;

        slot.m_weights = &slot.m_weights * beta1 + weight_gradients * (1.0 - beta1);
        slot.v_weights =
            &slot.v_weights * beta2 + &(weight_gradients * weight_gradients) * (1.0 - beta2);
        slot.m_biases = &slot.m_biases * beta1 + bias_gradients * (1.0 - beta1);
        slot.v_biases =
            &slot.v_biases * beta2 + &(bias_gradients * bias_gradients) * (1.0 - beta2);

        let m_hat_w = slot.m_weights.mapv(|m| m / (1.0 - beta1.powi(t)));
        let v_hat_w = slot.v_weights.mapv(|v| v / (1.0 - beta2.powi(t)));
        *weights -= &((&m_hat_w / &(v_hat_w.mapv(f32::sqrt) + epsilon)) * learning_rate);

        let m_hat_b = slot.m_biases.mapv(|m| m / (1.0 - beta1.powi(t)));
        let v_hat_b = slot.v_biases.mapv(|v| v / (1.0 - beta2.powi(t)));
        *biases -= &((&m_hat_b / &(v_hat_b.mapv(f32::sqrt) + epsilon)) * learning_rate);
    }
}
