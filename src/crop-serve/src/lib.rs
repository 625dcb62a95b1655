mod advisory;
mod backend;
mod classifier;
mod error;
mod labels;
mod recommend;
mod timing;

pub use advisory::{AdvisoryClient, AdvisoryError, ASSISTANT_FALLBACK, DISEASE_FALLBACK};
pub use backend::{InferenceBackend, TfliteBackend, INPUT_HEIGHT, INPUT_WIDTH};
pub use classifier::{DiseaseClassifier, Prediction};
pub use error::{ClassifyError, LoadError};
pub use labels::LabelStore;
pub use recommend::{recommend_crop, recommend_fertilizer, CropFeatures, FertilizerFeatures};
pub use timing::Timer;
