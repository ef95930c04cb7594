use burn::tensor::{Tensor, TensorData};
use inference::predictor::upsample_logits;
use inference::prelude::*;
use models::SegmentationNetConfig;
use std::cell::Cell;

type TestBackend = InferenceBackend;

/// Emits logits at half resolution strongly favouring one class per call,
/// cycling through `favoured` on successive forward passes.
struct ScriptedModel {
    classes: usize,
    favoured: Vec<usize>,
    calls: Cell<usize>,
}

impl SegmentationModel<TestBackend> for ScriptedModel {
    fn num_classes(&self) -> usize {
        self.classes
    }

    fn forward_logits(&self, images: Tensor<TestBackend, 4>) -> Tensor<TestBackend, 4> {
        let [batch, _, h, w] = images.dims();
        let (h, w) = (h.div_ceil(2), w.div_ceil(2));
        let call = self.calls.get();
        self.calls.set(call + 1);
        let winner = self.favoured[call % self.favoured.len()];
        let plane = h * w;
        let mut data = vec![0f32; batch * self.classes * plane];
        for b in 0..batch {
            let base = (b * self.classes + winner) * plane;
            data[base..base + plane].fill(50.0);
        }
        Tensor::from_data(
            TensorData::new(data, [batch, self.classes, h, w]),
            &images.device(),
        )
    }
}

fn images(batch: usize, h: usize, w: usize) -> Tensor<TestBackend, 4> {
    Tensor::zeros([batch, 3, h, w], &Default::default())
}

#[test]
fn zero_samples_is_rejected() {
    let model = ScriptedModel {
        classes: 2,
        favoured: vec![0],
        calls: Cell::new(0),
    };
    assert!(matches!(
        McDropoutPredictor::<TestBackend, _>::new(model, 0),
        Err(InferenceError::InvalidSamples)
    ));
}

#[test]
fn consistent_passes_give_confident_low_entropy_predictions() {
    let model = ScriptedModel {
        classes: 3,
        favoured: vec![2],
        calls: Cell::new(0),
    };
    let predictor = McDropoutPredictor::<TestBackend, _>::new(model, 4).unwrap();
    let dist = predictor.predict(images(2, 4, 6)).unwrap();
    assert_eq!(predictor.model().calls.get(), 4);
    assert_eq!((dist.batch(), dist.classes(), dist.height(), dist.width()), (2, 3, 4, 6));
    assert!(dist.argmax().iter().all(|c| *c == 2));
    assert!(dist.entropy().iter().all(|h| *h < 1e-3));
}

#[test]
fn disagreeing_passes_average_into_uncertainty() {
    let model = ScriptedModel {
        classes: 4,
        favoured: vec![0, 1],
        calls: Cell::new(0),
    };
    let predictor = McDropoutPredictor::<TestBackend, _>::new(model, 2).unwrap();
    let dist = predictor.predict(images(1, 3, 3)).unwrap();
    // Half the mass on class 0, half on class 1.
    assert!((dist.prob(0, 0, 1, 1) - 0.5).abs() < 1e-3);
    assert!((dist.prob(0, 1, 1, 1) - 0.5).abs() < 1e-3);
    // Ties resolve to the lower class index.
    assert!(dist.argmax().iter().all(|c| *c == 0));
    let ln2 = std::f32::consts::LN_2;
    assert!(dist.entropy().iter().all(|h| (*h - ln2).abs() < 1e-3));
    assert!(ln2 < max_entropy(4));
}

#[test]
fn probabilities_sum_to_one_for_real_network() {
    let device = Default::default();
    let model = SegmentationNetConfig {
        num_classes: 5,
        base_channels: 4,
        aspp_channels: 4,
        dropout_prob: 0.5,
    }
    .init::<TestBackend>(&device);
    let predictor = McDropoutPredictor::new(model, 3).unwrap();
    let input = Tensor::<TestBackend, 4>::random(
        [1, 3, 100, 97],
        burn::tensor::Distribution::Uniform(-1.0, 1.0),
        &device,
    );
    let dist = predictor.predict(input).unwrap();
    assert_eq!((dist.height(), dist.width()), (100, 97));
    for y in [0, 37, 99] {
        for x in [0, 50, 96] {
            let total: f32 = (0..5).map(|c| dist.prob(0, c, y, x)).sum();
            assert!((total - 1.0).abs() < 1e-4, "sum at ({y},{x}) = {total}");
        }
    }
    assert!(dist
        .entropy()
        .iter()
        .all(|h| *h >= -1e-6 && *h <= max_entropy(5) + 1e-4));
}

#[test]
fn default_network_rejects_inputs_below_its_minimum_size() {
    let device = Default::default();
    let model = SegmentationNetConfig::default().init::<TestBackend>(&device);
    let min = model.min_input_size();
    let predictor = McDropoutPredictor::new(model, 1).unwrap();

    for (h, w) in [(16, 16), (64, 64), (min - 1, 200), (200, min - 1)] {
        match predictor.predict(images(1, h, w)) {
            Err(InferenceError::InputTooSmall { height, width, min: m }) => {
                assert_eq!((height, width, m), (h, w, min));
            }
            other => panic!("{h}x{w}: expected InputTooSmall, got {:?}", other.map(|d| d.batch())),
        }
    }

    let dist = predictor.predict(images(1, 100, 100)).unwrap();
    assert_eq!((dist.classes(), dist.height(), dist.width()), (19, 100, 100));
}

#[test]
fn upsampling_is_bilinear_with_aligned_corners() {
    let ramp = Tensor::<TestBackend, 4>::from_data(
        TensorData::new(vec![0.0f32, 3.0], [1, 1, 2, 1]),
        &Default::default(),
    );
    let up = upsample_logits(ramp, 4, 1);
    assert_eq!(up.dims(), [1, 1, 4, 1]);
    let values = up.into_data().to_vec::<f32>().unwrap();
    for (got, want) in values.iter().zip([0.0f32, 1.0, 2.0, 3.0]) {
        assert!((got - want).abs() < 1e-5, "{values:?}");
    }

    // Matching sizes pass through untouched.
    let same = Tensor::<TestBackend, 4>::ones([1, 2, 3, 3], &Default::default());
    assert_eq!(upsample_logits(same, 3, 3).dims(), [1, 2, 3, 3]);
}
