use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use log::info;
use serde::Serialize;

use crate::backend::{InferenceBackend, TfliteBackend, INPUT_HEIGHT, INPUT_WIDTH};
use crate::error::{ClassifyError, LoadError};
use crate::labels::LabelStore;
use crate::timing::Timer;

/// Outcome of classifying one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Disease label of the winning class
    pub label: String,

    /// Winning score as a percentage, rounded to two decimals
    pub confidence: f32,
}

/// Image classifier over a fixed set of disease classes.
///
/// A fresh classifier holds no model and refuses to classify. It becomes
/// ready once `initialize` has loaded both the weights and the label file,
/// and stays ready for the rest of its life.
pub struct DiseaseClassifier {
    /// Compiled model, absent until initialized
    model: Option<Box<dyn InferenceBackend>>,

    /// Class labels, absent until initialized
    labels: Option<LabelStore>,
}

impl DiseaseClassifier {
    pub fn new() -> Self {
        DiseaseClassifier {
            model: None,
            labels: None,
        }
    }

    /// Assemble a ready classifier from parts.
    ///
    /// The caller is responsible for the backend and the label table
    /// agreeing on the number of classes.
    pub fn with_backend(backend: Box<dyn InferenceBackend>, labels: LabelStore) -> Self {
        DiseaseClassifier {
            model: Some(backend),
            labels: Some(labels),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some() && self.labels.is_some()
    }

    /// Load the model weights and the class labels.
    ///
    /// Nothing is stored unless every step succeeds, so a failed call
    /// leaves the classifier as it was. Succeeds at most once.
    pub fn initialize(&mut self, weights_path: &Path, labels_path: &Path) -> Result<(), LoadError> {
        if self.is_ready() {
            return Err(LoadError::AlreadyInitialized);
        }

        let mut t = Timer::new_start("Loading model");
        let backend = TfliteBackend::load(weights_path)?;
        t.stop();

        let labels = LabelStore::load(labels_path)?;

        self.install(Box::new(backend), labels)
    }

    /// Final initialization step. The model and the label table must agree
    /// on the number of classes before either is stored.
    fn install(
        &mut self,
        backend: Box<dyn InferenceBackend>,
        labels: LabelStore,
    ) -> Result<(), LoadError> {
        let model_classes = backend.class_count();
        if model_classes != labels.len() {
            return Err(LoadError::ClassCountMismatch {
                model_classes,
                label_count: labels.len(),
            });
        }

        info!("Classifier ready with {} classes", labels.len());

        self.model = Some(backend);
        self.labels = Some(labels);

        Ok(())
    }

    /// Classify one image given as raw encoded bytes.
    pub fn classify(&self, data: &[u8]) -> Result<Prediction, ClassifyError> {
        let model = self.model.as_ref().ok_or(ClassifyError::NotInitialized)?;
        let labels = self.labels.as_ref().ok_or(ClassifyError::NotInitialized)?;

        let mut t = Timer::new_start("Load image from memory");
        let image = image::load_from_memory(data)?;
        t.stop();

        let mut t = Timer::new_start("Resizing image");
        let pixels = preprocess(&image);
        t.stop();

        let mut t = Timer::new_start("Running model");
        let scores = model.infer(&pixels)?;
        t.stop();

        let (index, score) = argmax(&scores)
            .ok_or_else(|| ClassifyError::Inference("Model returned no scores".to_owned()))?;
        let label = labels.display_label(index)?;

        Ok(Prediction {
            label,
            confidence: to_percent(score),
        })
    }
}

impl Default for DiseaseClassifier {
    fn default() -> Self {
        DiseaseClassifier::new()
    }
}

/// Resize to the model's input geometry and flatten to NHWC floats.
///
/// Pixel values stay in the 0..=255 range. The model's leading Rescaling
/// layer divides by 255 itself.
fn preprocess(image: &DynamicImage) -> Vec<f32> {
    let rgb = image.to_rgb8();

    let resized = image::imageops::resize(
        &rgb,
        INPUT_WIDTH as u32,
        INPUT_HEIGHT as u32,
        FilterType::CatmullRom,
    );

    resized.into_raw().into_iter().map(f32::from).collect()
}

/// Index and value of the highest score. Ties go to the earliest index.
fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;

    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }

    best
}

/// Score in [0, 1] as a percentage rounded to two decimals.
fn to_percent(score: f32) -> f32 {
    (score * 100.0 * 100.0).round() / 100.0
}
