use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use bincode::{deserialize, serialize};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use serde::{Deserialize, Serialize};

use crate::error::{PlutusError, Result};
use crate::features::FEATURES;
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// The value-function collaborator the learning core trains against.
///
/// The core needs two independently-owned instances (online and target)
/// of the same shape. Only `fit_batch` touches parameters, and a call is
/// one atomic gradient step; `clone_weights_from` is a full parameter
/// copy with no interpolation, leaving any optimizer state alone.
pub trait ValueFunction {
    /// Width of the feature vector this function expects.
    fn input_width(&self) -> usize;

    /// Number of per-action values produced for each input row.
    fn num_actions(&self) -> usize;

    /// Per-action values for a batch of feature rows.
    fn predict_batch(&mut self, features: ArrayView2<f32>) -> Array2<f32>;

    /// One gradient step towards `targets` on this instance only.
    fn fit_batch(&mut self, features: ArrayView2<f32>, targets: ArrayView2<f32>, learning_rate: f32);

    /// Replace this instance's parameters with a copy of `source`'s.
    fn clone_weights_from(&mut self, source: &Self);

    /// Persist the parameters; the serialization format is this
    /// collaborator's business.
    fn save(&self, path: &Path) -> Result<()>;
}

/// An enumeration of the possible activation functions.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Tanh,
    Linear,
}

impl Activation {
    fn apply_minibatch(&self, inputs: &mut Array2<f32>) {
        match self {
            Activation::Relu => inputs.mapv_inplace(|v| v.max(0.0)),
            Activation::Tanh => inputs.mapv_inplace(f32::tanh),
            Activation::Linear => {}
        }
    }

    fn derivative_minibatch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => inputs.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Tanh => inputs.mapv(|v| 1.0 - v.tanh() * v.tanh()),
            Activation::Linear => Array2::ones(inputs.dim()),
        }
    }
}

/// A fully connected layer: weights, biases, and an activation function.
#[derive(Serialize, Deserialize, Clone)]
pub struct Layer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl Layer {
    /// Weights start uniform in [-0.1, 0.1], biases at zero.
    pub fn new(input_size: usize, output_size: usize, activation: Activation) -> Self {
        let weights = Array2::random((input_size, output_size), Uniform::new(-0.1, 0.1));
        let biases = Array1::zeros(output_size);
        Layer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    fn forward_minibatch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        self.inputs = Some(inputs.to_owned());
        let mut outputs = inputs.dot(&self.weights) + &self.biases.to_owned().insert_axis(Axis(0));
        self.pre_activation_output = Some(outputs.clone());
        self.activation.apply_minibatch(&mut outputs);
        outputs
    }

    /// Gradients for this layer given the error flowing out of it.
    /// `forward_minibatch` must have run first so the cached inputs and
    /// pre-activation outputs are present.
    fn backward_minibatch(&self, output_errors: ArrayView2<f32>) -> (Array2<f32>, Array2<f32>, Array1<f32>) {
        let pre_activation = self
            .pre_activation_output
            .as_ref()
            .expect("forward_minibatch() must be called before backward_minibatch()");
        let inputs = self
            .inputs
            .as_ref()
            .expect("forward_minibatch() must be called before backward_minibatch()");
        let activation_deriv = self.activation.derivative_minibatch(pre_activation.view());
        let adjusted_error = output_errors.to_owned() * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));
        (adjusted_error, weight_gradients, bias_gradients)
    }
}

/// A feed-forward network of fully connected layers with an optimizer.
#[derive(Serialize, Deserialize, Clone)]
pub struct NeuralNetwork {
    pub layers: Vec<Layer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// Build a network from consecutive layer sizes and one activation
    /// per weight layer.
    pub fn new(layer_sizes: &[usize], activations: &[Activation], optimizer: OptimizerWrapper) -> Self {
        assert_eq!(layer_sizes.len() - 1, activations.len());

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| Layer::new(window[0], window[1], activation))
            .collect::<Vec<_>>();

        NeuralNetwork { layers, optimizer }
    }

    /// Forward pass for a single input vector.
    pub fn forward(&mut self, input: ArrayView1<f32>) -> Array1<f32> {
        let input = input.insert_axis(Axis(0));
        let output = self.forward_minibatch(input.view());
        let output_shape = output.shape()[1];
        output.into_shape((output_shape,)).unwrap()
    }

    /// Forward pass for a batch of input vectors.
    pub fn forward_minibatch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_minibatch(current_output.view());
        }
        current_output
    }

    fn backward_minibatch(&mut self, output_errors: ArrayView2<f32>) -> Vec<(Array2<f32>, Array1<f32>)> {
        let mut gradients: Vec<(Array2<f32>, Array1<f32>)> = Vec::new();
        let mut current_error = output_errors.to_owned();

        let length = self.layers.len();
        for i in (0..length).rev() {
            let layer = &mut self.layers[i];
            let (adjusted_error, weight_gradients, bias_gradients) =
                layer.backward_minibatch(current_error.view());
            gradients.push((weight_gradients, bias_gradients));

            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        gradients
    }

    /// One training step on a batch: forward, squared-error output error,
    /// backpropagation, optimizer update. The whole call is atomic with
    /// respect to the parameters.
    pub fn train_minibatch(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>, learning_rate: f32) {
        let outputs = self.forward_minibatch(inputs);
        let output_errors = &outputs - &targets;
        let gradients = self.backward_minibatch(output_errors.view());

        for (index, (layer, (weight_gradients, bias_gradients))) in
            self.layers.iter_mut().zip(gradients).enumerate()
        {
            self.optimizer.apply(
                index,
                &mut layer.weights,
                &weight_gradients,
                &mut layer.biases,
                &bias_gradients,
                learning_rate,
            );
        }
    }

    /// Serialize the network (layers and optimizer state) to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serialize(self)?;
        let mut file = fs::File::create(path)?;
        file.write_all(&serialized)?;
        Ok(())
    }

    /// Load a network previously written by [`NeuralNetwork::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let mut file = fs::File::open(path)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        let deserialized: Self = deserialize(&buffer)?;
        Ok(deserialized)
    }
}

impl ValueFunction for NeuralNetwork {
    fn input_width(&self) -> usize {
        self.layers.first().map(|l| l.weights.dim().0).unwrap_or(0)
    }

    fn num_actions(&self) -> usize {
        self.layers.last().map(|l| l.biases.len()).unwrap_or(0)
    }

    fn predict_batch(&mut self, features: ArrayView2<f32>) -> Array2<f32> {
        self.forward_minibatch(features)
    }

    fn fit_batch(&mut self, features: ArrayView2<f32>, targets: ArrayView2<f32>, learning_rate: f32) {
        self.train_minibatch(features, targets, learning_rate);
    }

    // Parameters are copied layer by layer, field by field, so the copy
    // cannot depend on any flattened parameter ordering.
    fn clone_weights_from(&mut self, source: &Self) {
        debug_assert_eq!(self.layers.len(), source.layers.len());
        for (dest, src) in self.layers.iter_mut().zip(&source.layers) {
            dest.weights.assign(&src.weights);
            dest.biases.assign(&src.biases);
        }
    }

    fn save(&self, path: &Path) -> Result<()> {
        NeuralNetwork::save(self, path)
    }
}

/// Build the reference Q-network: 128 and 256 unit ReLU layers, a 64 unit
/// tanh layer, and a linear head with one output per action.
///
/// In goal-conditioned (HER) mode the input row is a state feature vector
/// with a goal feature vector appended, doubling the input width; the
/// flag is threaded through here so a width mismatch is impossible to
/// construct.
pub fn build_q_network(num_actions: usize, her: bool, optimizer: OptimizerWrapper) -> Result<NeuralNetwork> {
    if num_actions <= 1 {
        return Err(PlutusError::InvalidParameter {
            name: "num_actions".to_string(),
            reason: format!("expected an integer greater than 1, got {}", num_actions),
        });
    }
    let input_width = FEATURES * if her { 2 } else { 1 };
    let layer_sizes = [input_width, 128, 256, 64, num_actions];
    let activations = [
        Activation::Relu,
        Activation::Relu,
        Activation::Tanh,
        Activation::Linear,
    ];
    Ok(NeuralNetwork::new(&layer_sizes, &activations, optimizer))
}
