use std::io::Write;
use std::path::Path;

use crop_serve::{
    ClassifyError, DiseaseClassifier, InferenceBackend, LabelStore, LoadError, Prediction,
};

struct FixedBackend {
    scores: Vec<f32>,
}

impl InferenceBackend for FixedBackend {
    fn class_count(&self) -> usize {
        self.scores.len()
    }

    fn infer(&self, _pixels: &[f32]) -> Result<Vec<f32>, ClassifyError> {
        Ok(self.scores.clone())
    }
}

fn ready_classifier(scores: Vec<f32>, labels: &[&str]) -> DiseaseClassifier {
    DiseaseClassifier::with_backend(
        Box::new(FixedBackend { scores }),
        LabelStore::from_labels(labels.iter().map(|l| l.to_string()).collect()),
    )
}

fn png_bytes(width: u32, height: u32, pixel: [u8; 3]) -> Vec<u8> {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb(pixel),
    ));

    let mut buf = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    buf
}

#[test]
fn classify_reports_the_top_class_as_a_rounded_percentage() {
    let classifier = ready_classifier(vec![0.1, 0.7, 0.2], &["Healthy", "Leaf_Spot", "Blight"]);

    let prediction = classifier
        .classify(&png_bytes(8, 8, [80, 160, 40]))
        .unwrap();

    assert_eq!(
        prediction,
        Prediction {
            label: "Leaf Spot".to_owned(),
            confidence: 70.0,
        }
    );
}

#[test]
fn confidence_is_rounded_to_two_decimals() {
    let classifier = ready_classifier(vec![0.876544, 0.123456], &["Blight", "Healthy"]);

    let prediction = classifier
        .classify(&png_bytes(4, 4, [10, 20, 30]))
        .unwrap();

    assert_eq!(prediction.confidence, 87.65);
}

#[test]
fn classification_is_deterministic() {
    let classifier = ready_classifier(vec![0.3, 0.6, 0.1], &["A", "B", "C"]);
    let bytes = png_bytes(16, 16, [200, 50, 50]);

    let first = classifier.classify(&bytes).unwrap();
    let second = classifier.classify(&bytes).unwrap();

    assert_eq!(first, second);
}

#[test]
fn ties_resolve_to_the_earliest_class() {
    let classifier = ready_classifier(vec![0.5, 0.5], &["Apple_Scab", "Black_Rot"]);

    let prediction = classifier
        .classify(&png_bytes(4, 4, [90, 90, 90]))
        .unwrap();

    assert_eq!(prediction.label, "Apple Scab");
    assert_eq!(prediction.confidence, 50.0);
}

#[test]
fn out_of_range_winner_is_an_error() {
    let classifier = ready_classifier(
        vec![0.0, 0.0, 0.0, 0.0, 1.0],
        &["Healthy", "Leaf_Spot", "Blight"],
    );

    match classifier.classify(&png_bytes(4, 4, [0, 128, 0])) {
        Err(ClassifyError::LabelIndex { index, label_count }) => {
            assert_eq!(index, 4);
            assert_eq!(label_count, 3);
        }
        other => panic!("expected LabelIndex error, got {:?}", other),
    }
}

#[test]
fn undecodable_bytes_are_a_decode_error() {
    let classifier = ready_classifier(vec![1.0], &["Healthy"]);

    assert!(matches!(
        classifier.classify(b"definitely not an image"),
        Err(ClassifyError::Decode(_))
    ));
}

#[test]
fn uninitialized_classifier_rejects_valid_images() {
    let classifier = DiseaseClassifier::new();

    assert!(matches!(
        classifier.classify(&png_bytes(8, 8, [1, 2, 3])),
        Err(ClassifyError::NotInitialized)
    ));
}

#[test]
fn empty_weights_file_fails_to_load() {
    let weights = tempfile::NamedTempFile::new().unwrap();
    let mut labels = tempfile::NamedTempFile::new().unwrap();
    labels.write_all(br#"["Healthy"]"#).unwrap();

    let mut classifier = DiseaseClassifier::new();

    assert!(matches!(
        classifier.initialize(weights.path(), labels.path()),
        Err(LoadError::Model { .. })
    ));

    // The failed load leaves the classifier unusable.
    assert!(matches!(
        classifier.classify(&png_bytes(2, 2, [0, 0, 0])),
        Err(ClassifyError::NotInitialized)
    ));
}

#[test]
fn missing_label_file_fails_to_load() {
    assert!(matches!(
        LabelStore::load(Path::new("/no/such/class_labels.json")),
        Err(LoadError::Labels { .. })
    ));
}

#[test]
fn malformed_label_json_fails_to_load() {
    let mut labels = tempfile::NamedTempFile::new().unwrap();
    labels.write_all(b"these are not labels").unwrap();

    assert!(matches!(
        LabelStore::load(labels.path()),
        Err(LoadError::Labels { .. })
    ));
}

#[test]
fn a_ready_classifier_cannot_be_initialized_again() {
    let mut classifier = ready_classifier(vec![1.0], &["Healthy"]);

    assert!(matches!(
        classifier.initialize(
            Path::new("/never/read.tflite"),
            Path::new("/never/read.json")
        ),
        Err(LoadError::AlreadyInitialized)
    ));

    // The rejected call leaves the original state untouched.
    let prediction = classifier
        .classify(&png_bytes(2, 2, [255, 255, 255]))
        .unwrap();
    assert_eq!(prediction.label, "Healthy");
}
