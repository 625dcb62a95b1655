use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while bringing the classifier up.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not load model from '{}': {reason}", path.display())]
    Model { path: PathBuf, reason: String },

    #[error("Could not load class labels from '{}': {reason}", path.display())]
    Labels { path: PathBuf, reason: String },

    #[error("Model predicts {model_classes} classes but the label file lists {label_count}")]
    ClassCountMismatch {
        model_classes: usize,
        label_count: usize,
    },

    #[error("Classifier is already initialized")]
    AlreadyInitialized,
}

/// Errors raised while classifying a single image.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Classifier is not initialized. Call initialize() first")]
    NotInitialized,

    #[error("Could not decode image from raw data: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Predicted class index {index} is out of range for {label_count} labels")]
    LabelIndex { index: usize, label_count: usize },
}
