use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::activation::{relu, softmax};
use crate::data::TEST_FRACTION;
use crate::loss::softmax_cross_entropy_grad;
use crate::matrix::sub_scaled;
use crate::metrics::argmax;
use crate::schedule::PlateauSchedule;
use crate::{Dataset, Error, Matrix, MlpConfig, Result};

/// The four trainable tensors of the network.
///
/// Shapes:
/// - `weights_hidden`: `(input_size, hidden_size)`
/// - `bias_hidden`: `(hidden_size,)`
/// - `weights_output`: `(hidden_size, output_size)`
/// - `bias_output`: `(output_size,)`
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub weights_hidden: Matrix,
    pub bias_hidden: Vec<f64>,
    pub weights_output: Matrix,
    pub bias_output: Vec<f64>,
}

impl Params {
    /// He initialization: `N(0, 1) * sqrt(2 / fan_in)` weights, zero biases.
    pub fn he_init<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        output_size: usize,
        rng: &mut R,
    ) -> Self {
        Self {
            weights_hidden: he_matrix(input_size, hidden_size, rng),
            bias_hidden: vec![0.0; hidden_size],
            weights_output: he_matrix(hidden_size, output_size, rng),
            bias_output: vec![0.0; output_size],
        }
    }

    /// `(input_size, hidden_size, output_size)` implied by the tensors.
    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (
            self.weights_hidden.rows(),
            self.weights_hidden.cols(),
            self.weights_output.cols(),
        )
    }

    /// Checks the cross-tensor shape invariants.
    pub fn validate(&self) -> Result<()> {
        let (input, hidden, output) = self.dims();
        if input == 0 || hidden == 0 || output == 0 {
            return Err(Error::InvalidShape(format!(
                "dims must be > 0, got {input}x{hidden}x{output}"
            )));
        }
        if self.bias_hidden.len() != hidden {
            return Err(Error::InvalidShape(format!(
                "bias_hidden len {} does not match hidden_size {hidden}",
                self.bias_hidden.len()
            )));
        }
        if self.weights_output.rows() != hidden {
            return Err(Error::InvalidShape(format!(
                "weights_output rows {} do not match hidden_size {hidden}",
                self.weights_output.rows()
            )));
        }
        if self.bias_output.len() != output {
            return Err(Error::InvalidShape(format!(
                "bias_output len {} does not match output_size {output}",
                self.bias_output.len()
            )));
        }
        Ok(())
    }
}

fn he_matrix<R: Rng + ?Sized>(fan_in: usize, fan_out: usize, rng: &mut R) -> Matrix {
    let scale = (2.0 / fan_in as f64).sqrt();
    let mut m = Matrix::zeros(fan_in, fan_out);
    for w in m.as_mut_slice() {
        let z: f64 = StandardNormal.sample(rng);
        *w = z * scale;
    }
    m
}

/// Intermediate values of one forward pass, kept for backprop.
#[derive(Debug, Clone)]
pub struct Forward {
    /// `data · weights_hidden + bias_hidden`
    pub hidden_preact: Matrix,
    /// `relu(hidden_preact)`
    pub hidden_out: Matrix,
    /// `softmax(hidden_out · weights_output + bias_output)`
    pub predictions: Matrix,
}

/// Parameter gradients for one mini-batch.
#[derive(Debug, Clone)]
pub struct Gradients {
    pub weights_hidden: Matrix,
    pub bias_hidden: Vec<f64>,
    pub weights_output: Matrix,
    pub bias_output: Vec<f64>,
}

/// One-hidden-layer ReLU/softmax classifier together with its training state.
///
/// The engine owns its train/test partitions, its parameters, the best-so-far snapshot and
/// the random source used for shuffling. Nothing is shared between instances.
#[derive(Debug, Clone)]
pub struct Mlp {
    pub(crate) params: Params,
    pub(crate) best_params: Params,
    pub(crate) schedule: PlateauSchedule,
    pub(crate) epochs: usize,
    pub(crate) loss_history: Vec<f64>,
    pub(crate) train: Dataset,
    pub(crate) test: Dataset,
    pub(crate) checkpoint_path: Option<PathBuf>,
    pub(crate) rng: StdRng,
}

impl Mlp {
    /// Split `data` 80/20, derive the layer sizes and He-initialize the parameters.
    ///
    /// `output_size` is the number of distinct labels in `data`; labels must be dense
    /// (`0..output_size`).
    pub fn new(data: &Dataset, config: &MlpConfig, mut rng: StdRng) -> Result<Self> {
        config.validate()?;

        let output_size = data.n_classes();
        if let Some(&bad) = data.labels().iter().find(|&&l| l >= output_size) {
            return Err(Error::InvalidShape(format!(
                "label {bad} out of range for {output_size} distinct classes"
            )));
        }

        let (train, test) = data.split(TEST_FRACTION, &mut rng)?;
        let params = Params::he_init(data.n_features(), config.hidden_size, output_size, &mut rng);

        Ok(Self {
            best_params: params.clone(),
            params,
            schedule: PlateauSchedule::new(config.learning_rate, config.plateau),
            epochs: config.epochs,
            loss_history: Vec::new(),
            train,
            test,
            checkpoint_path: config.checkpoint_path.clone(),
            rng,
        })
    }

    /// Deterministic construction.
    pub fn new_with_seed(data: &Dataset, config: &MlpConfig, seed: u64) -> Result<Self> {
        Self::new(data, config, StdRng::seed_from_u64(seed))
    }

    /// Non-deterministic construction seeded from the OS.
    pub fn from_entropy(data: &Dataset, config: &MlpConfig) -> Result<Self> {
        Self::new(data, config, StdRng::from_entropy())
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.params.weights_hidden.rows()
    }

    #[inline]
    pub fn hidden_size(&self) -> usize {
        self.params.weights_hidden.cols()
    }

    #[inline]
    pub fn output_size(&self) -> usize {
        self.params.weights_output.cols()
    }

    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Parameters at the best test accuracy seen so far.
    #[inline]
    pub fn best_params(&self) -> &Params {
        &self.best_params
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.schedule.learning_rate()
    }

    #[inline]
    pub fn best_accuracy(&self) -> f64 {
        self.schedule.best()
    }

    #[inline]
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Mean batch loss of every completed epoch, oldest first.
    #[inline]
    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    #[inline]
    pub fn train_set(&self) -> &Dataset {
        &self.train
    }

    #[inline]
    pub fn test_set(&self) -> &Dataset {
        &self.test
    }

    /// Replace the live parameters with the best snapshot.
    pub fn restore_best(&mut self) {
        self.params = self.best_params.clone();
    }

    /// Forward pass over a batch of any size.
    ///
    /// Panics if `data.cols() != self.input_size()`.
    pub fn forward(&self, data: &Matrix) -> Forward {
        assert_eq!(
            data.cols(),
            self.input_size(),
            "data cols {} do not match model input_size {}",
            data.cols(),
            self.input_size()
        );

        let mut hidden_preact = data.matmul(&self.params.weights_hidden);
        hidden_preact.add_row_inplace(&self.params.bias_hidden);
        let hidden_out = relu(&hidden_preact, false);

        let mut logits = hidden_out.matmul(&self.params.weights_output);
        logits.add_row_inplace(&self.params.bias_output);
        let predictions = softmax(&logits);

        Forward {
            hidden_preact,
            hidden_out,
            predictions,
        }
    }

    /// Gradients of the mean cross-entropy for one batch.
    ///
    /// `pass` must come from `forward(data)` with the current parameters.
    pub fn gradients(&self, data: &Matrix, labels: &[usize], pass: Forward) -> Gradients {
        assert_eq!(
            data.rows(),
            labels.len(),
            "batch rows {} do not match labels len {}",
            data.rows(),
            labels.len()
        );
        let Forward {
            hidden_preact,
            hidden_out,
            predictions,
        } = pass;

        let delta_out = softmax_cross_entropy_grad(predictions, labels);
        let weights_output = hidden_out.t_matmul(&delta_out);
        let bias_output = delta_out.sum_rows();

        let mut hidden_err = delta_out.matmul_t(&self.params.weights_output);
        hidden_err.hadamard_inplace(&relu(&hidden_preact, true));

        Gradients {
            weights_hidden: data.t_matmul(&hidden_err),
            bias_hidden: hidden_err.sum_rows(),
            weights_output,
            bias_output,
        }
    }

    /// Vanilla gradient descent: `param -= lr * grad` on all four tensors.
    pub fn apply_gradients(&mut self, grads: &Gradients, lr: f64) {
        let p = &mut self.params;
        p.weights_hidden.sub_scaled_inplace(&grads.weights_hidden, lr);
        sub_scaled(&mut p.bias_hidden, &grads.bias_hidden, lr);
        p.weights_output.sub_scaled_inplace(&grads.weights_output, lr);
        sub_scaled(&mut p.bias_output, &grads.bias_output, lr);
    }

    /// Backprop one batch and update the parameters with the current learning rate.
    pub fn backward(&mut self, data: &Matrix, labels: &[usize], pass: Forward) {
        let grads = self.gradients(data, labels, pass);
        let lr = self.learning_rate();
        self.apply_gradients(&grads, lr);
    }

    /// Class probabilities for a batch, shape `(rows, output_size)`.
    pub fn predict_proba(&self, data: &Matrix) -> Result<Matrix> {
        if data.rows() == 0 {
            return Err(Error::InvalidData("inputs must not be empty".to_owned()));
        }
        if data.cols() != self.input_size() {
            return Err(Error::InvalidShape(format!(
                "inputs have {} columns, model input_size is {}",
                data.cols(),
                self.input_size()
            )));
        }
        if !data.is_finite() {
            return Err(Error::InvalidData(
                "inputs must contain only finite values".to_owned(),
            ));
        }
        Ok(self.forward(data).predictions)
    }

    /// Most likely class index per row.
    pub fn predict(&self, data: &Matrix) -> Result<Vec<usize>> {
        let proba = self.predict_proba(data)?;
        Ok((0..proba.rows()).map(|r| argmax(proba.row(r))).collect())
    }

    /// Most likely class index for a single feature row.
    pub fn predict_row(&self, features: &[f64]) -> Result<usize> {
        let row = Matrix::from_flat(1, features.len(), features.to_vec())?;
        Ok(self.predict(&row)?[0])
    }
}
