//! Candle classifier round trip on a generated SafeTensors file
//!
//! The fixture head has one class per colour channel, with weights that
//! sum that channel over every pixel, so a solid-colour image must be
//! classified as its dominant channel.

use candle_core::{Device, Tensor};
use cropcheck_classifiers::{
    rank, CandleLeafClassifier, ClassifierDispatcher, DispatchConfig, LeafClassifier,
    ModelConfig,
};
use cropcheck_core::Error;
use image::{ImageBuffer, ImageFormat, Rgb};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

const INPUT_SIZE: usize = 4;
const CLASSES: [&str; 3] = ["Demo___Red_rot", "Demo___Green_mold", "Demo___Blue_mildew"];

fn write_channel_head(path: &Path, input_size: usize) {
    let features = 3 * input_size * input_size;
    let mut weight = vec![0f32; CLASSES.len() * features];
    for class in 0..CLASSES.len() {
        for pixel in 0..input_size * input_size {
            weight[class * features + pixel * 3 + class] = 1.0;
        }
    }

    let device = Device::Cpu;
    let mut tensors = HashMap::new();
    tensors.insert(
        "head.weight".to_string(),
        Tensor::from_vec(weight, (CLASSES.len(), features), &device).unwrap(),
    );
    tensors.insert(
        "head.bias".to_string(),
        Tensor::zeros(CLASSES.len(), candle_core::DType::F32, &device).unwrap(),
    );

    candle_core::safetensors::save(&tensors, path).unwrap();
}

fn solid_png(pixel: [u8; 3]) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(32, 24, Rgb(pixel));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

fn load_fixture(dir: &tempfile::TempDir) -> CandleLeafClassifier {
    let path = dir.path().join("channel_head.safetensors");
    write_channel_head(&path, INPUT_SIZE);

    let config = ModelConfig::from_local(&path).with_input_size(INPUT_SIZE);
    CandleLeafClassifier::load(&config).unwrap()
}

#[tokio::test]
async fn test_candle_classifier_shapes() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = load_fixture(&dir);

    assert_eq!(classifier.name(), "channel_head");
    assert_eq!(classifier.input_shape(), vec![1, INPUT_SIZE, INPUT_SIZE, 3]);
    assert_eq!(classifier.output_shape(), vec![1, CLASSES.len()]);
    assert_eq!(classifier.num_classes(), 3);
}

#[tokio::test]
async fn test_candle_classifier_predicts_dominant_channel() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = load_fixture(&dir);

    let probabilities = classifier.predict(&solid_png([0, 255, 0])).await.unwrap();
    assert_eq!(probabilities.len(), 3);

    let total: f32 = probabilities.iter().sum();
    assert!((total - 1.0).abs() < 1e-4);

    let ranking = rank(&probabilities, &CLASSES).unwrap();
    assert_eq!(ranking.top().unwrap().raw_label, "Demo___Green_mold");
    assert!(ranking.top().unwrap().probability > 0.99);
}

#[tokio::test]
async fn test_candle_classifier_through_dispatcher() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = Arc::new(load_fixture(&dir));
    let dispatcher = ClassifierDispatcher::new(classifier, DispatchConfig::default());

    let output = dispatcher.classify(solid_png([200, 10, 10])).await.unwrap();
    let ranking = rank(&output.probabilities, &CLASSES).unwrap();
    assert_eq!(ranking.top().unwrap().class_index, 0);
}

#[tokio::test]
async fn test_candle_classifier_rejects_undecodable_upload() {
    let dir = tempfile::tempdir().unwrap();
    let classifier = load_fixture(&dir);

    let err = classifier.predict(b"GIF89a-but-not-really").await.unwrap_err();
    assert!(matches!(err, Error::InputValidation(_)));
}

#[test]
fn test_input_size_must_match_head() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("small.safetensors");
    write_channel_head(&path, INPUT_SIZE);

    let config = ModelConfig::from_local(&path).with_input_size(8);
    let err = CandleLeafClassifier::load(&config).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_missing_head_tensor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("headless.safetensors");

    let mut tensors = HashMap::new();
    tensors.insert(
        "backbone.weight".to_string(),
        Tensor::zeros((2, 2), candle_core::DType::F32, &Device::Cpu).unwrap(),
    );
    candle_core::safetensors::save(&tensors, &path).unwrap();

    let err = CandleLeafClassifier::load(&ModelConfig::from_local(&path)).err().unwrap();
    assert!(matches!(err, Error::Classifier(_)));
}
