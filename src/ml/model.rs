use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{log_softmax, relu},
};

/// Number of output classes: 0 = keep the LM, 1 = trust retrieval
pub const NUM_CLASSES: usize = 2;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TokenClassifierConfig {
    pub n_features:   usize,
    #[config(default = 32)]
    pub hidden_units: usize,
    #[config(default = 3)]
    pub nlayers:      usize,
    #[config(default = 0.0)]
    pub dropout:      f64,
}

impl TokenClassifierConfig {
    /// nlayers hidden Linear layers (the first maps n_features → hidden),
    /// then a Linear head to 2 logits.
    pub fn init<B: Backend>(&self, device: &B::Device) -> TokenClassifier<B> {
        let hidden: Vec<Linear<B>> = (0..self.nlayers.max(1))
            .map(|i| {
                let d_in = if i == 0 { self.n_features } else { self.hidden_units };
                LinearConfig::new(d_in, self.hidden_units).init(device)
            })
            .collect();
        let output  = LinearConfig::new(self.hidden_units, NUM_CLASSES).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        TokenClassifier { hidden, output, dropout }
    }
}

/// Feed-forward retrieval-trust classifier:
/// (Linear → ReLU → Dropout) × nlayers → Linear(hidden, 2)
#[derive(Module, Debug)]
pub struct TokenClassifier<B: Backend> {
    pub hidden:  Vec<Linear<B>>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> TokenClassifier<B> {
    /// features: [batch, n_features] → logits: [batch, 2]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut x = features;
        for layer in &self.hidden {
            x = self.dropout.forward(relu(layer.forward(x)));
        }
        self.output.forward(x)
    }

    /// Weighted cross-entropy: class 0 weighs `negative_weight`, class 1 weighs 1.
    pub fn forward_loss(
        &self,
        features:        Tensor<B, 2>,
        labels:          Tensor<B, 1, Int>,
        negative_weight: f32,
    ) -> (Tensor<B, 1>, Tensor<B, 2>) {
        let logits = self.forward(features);
        let loss = weighted_cross_entropy(logits.clone(), labels, negative_weight);
        (loss, logits)
    }
}

/// Mean cross-entropy with class weights [negative_weight, 1.0]:
/// -Σ w[y]·log p(y) / Σ w[y], the same reduction as a weighted
/// `CrossEntropyLoss`. Written out by hand because burn's config
/// rejects a zero class weight, and 0 is a valid negative weight here.
/// A batch whose weights sum to zero contributes a loss of 0.
pub fn weighted_cross_entropy<B: Backend>(
    logits:          Tensor<B, 2>,
    labels:          Tensor<B, 1, Int>,
    negative_weight: f32,
) -> Tensor<B, 1> {
    let [batch_size, _] = logits.dims();
    let device = logits.device();

    let log_probs = log_softmax(logits, 1)
        .gather(1, labels.clone().reshape([batch_size, 1]))
        .reshape([batch_size]);

    let weights = Tensor::<B, 1>::from_floats([negative_weight, 1.0], &device)
        .gather(0, labels);

    (log_probs * weights.clone()).sum().neg() / weights.sum().clamp_min(1e-12)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_output_shape() {
        let device = Default::default();
        let model: TokenClassifier<TestBackend> = TokenClassifierConfig::new(5)
            .with_hidden_units(8)
            .with_nlayers(3)
            .init(&device);
        assert_eq!(model.hidden.len(), 3);

        let x = Tensor::<TestBackend, 2>::zeros([4, 5], &device);
        assert_eq!(model.forward(x).dims(), [4, NUM_CLASSES]);
    }

    #[test]
    fn test_single_layer() {
        let device = Default::default();
        let model: TokenClassifier<TestBackend> = TokenClassifierConfig::new(3)
            .with_nlayers(1)
            .init(&device);
        assert_eq!(model.hidden.len(), 1);
        let x = Tensor::<TestBackend, 2>::ones([2, 3], &device);
        assert_eq!(model.forward(x).dims(), [2, 2]);
    }

    #[test]
    fn test_zero_negative_weight_ignores_negatives() {
        let device = Default::default();
        // confidently wrong on the negative example only
        let logits = Tensor::<TestBackend, 2>::from_floats([[-5.0, 5.0], [0.0, 0.0]], &device);
        let labels = Tensor::<TestBackend, 1, Int>::from_ints([0, 1], &device);

        let loss: f64 = weighted_cross_entropy(logits, labels, 0.0)
            .into_scalar()
            .elem::<f64>();
        // only the positive row counts: -ln(0.5)
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-4);
    }
}
