use std::fs;
use std::io::Cursor;
use std::path::Path;

use tract_tflite::prelude::*;

use crate::error::{ClassifyError, LoadError};

/// Model input geometry. The network takes one RGB image in NHWC order.
pub const INPUT_WIDTH: usize = 224;
pub const INPUT_HEIGHT: usize = 224;

/// Produces the raw score vector for one preprocessed image.
pub trait InferenceBackend: Send + Sync {
    /// Number of classes in the model's output vector.
    fn class_count(&self) -> usize;

    /// Run the model on a flat NHWC pixel buffer and return its scores.
    fn infer(&self, pixels: &[f32]) -> Result<Vec<f32>, ClassifyError>;
}

/// TFLite model compiled into a tract execution plan.
pub struct TfliteBackend {
    plan: TypedRunnableModel<TypedModel>,
    class_count: usize,
}

impl TfliteBackend {
    /// Read a `.tflite` flatbuffer from disk and compile it for the fixed
    /// `[1, 224, 224, 3]` input.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let load_err = |reason: String| LoadError::Model {
            path: path.to_path_buf(),
            reason,
        };

        let raw = fs::read(path).map_err(|e| load_err(e.to_string()))?;
        if raw.is_empty() {
            return Err(load_err("Model file is empty".to_owned()));
        }

        let mut cursor = Cursor::new(raw);
        let model = tract_tflite::tflite()
            .model_for_read(&mut cursor)
            .map_err(|e| load_err(format!("TFLite parse error: {e}")))?;

        let inlet = *model
            .input_outlets()
            .map_err(|e| load_err(e.to_string()))?
            .first()
            .ok_or_else(|| load_err("Model has no inputs".to_owned()))?;
        let input_fact = model
            .outlet_fact(inlet)
            .map_err(|e| load_err(e.to_string()))?;
        if input_fact.datum_type != f32::datum_type() {
            return Err(load_err(format!(
                "Unsupported input dtype: {:?}",
                input_fact.datum_type
            )));
        }

        let model = model
            .with_input_fact(
                0,
                TypedFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, INPUT_HEIGHT, INPUT_WIDTH, 3),
                ),
            )
            .map_err(|e| load_err(e.to_string()))?
            .into_optimized()
            .map_err(|e| load_err(e.to_string()))?;

        let outlet = *model
            .output_outlets()
            .map_err(|e| load_err(e.to_string()))?
            .first()
            .ok_or_else(|| load_err("Model has no outputs".to_owned()))?;
        let output_fact = model
            .outlet_fact(outlet)
            .map_err(|e| load_err(e.to_string()))?;
        let output_shape = output_fact
            .shape
            .as_concrete()
            .ok_or_else(|| load_err("Output shape is not fully determined".to_owned()))?;
        let class_count = *output_shape
            .last()
            .ok_or_else(|| load_err("Output tensor has no dimensions".to_owned()))?;

        let plan = model
            .into_runnable()
            .map_err(|e| load_err(e.to_string()))?;

        Ok(TfliteBackend { plan, class_count })
    }
}

impl InferenceBackend for TfliteBackend {
    fn class_count(&self) -> usize {
        self.class_count
    }

    fn infer(&self, pixels: &[f32]) -> Result<Vec<f32>, ClassifyError> {
        let input: Tensor = tract_ndarray::Array4::from_shape_vec(
            (1, INPUT_HEIGHT, INPUT_WIDTH, 3),
            pixels.to_vec(),
        )
        .map_err(|e| ClassifyError::Inference(format!("Bad input buffer: {e}")))?
        .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| ClassifyError::Inference(e.to_string()))?;

        let scores = outputs
            .first()
            .ok_or_else(|| ClassifyError::Inference("Model produced no outputs".to_owned()))?
            .to_array_view::<f32>()
            .map_err(|e| ClassifyError::Inference(format!("Output is not f32: {e}")))?;

        Ok(scores.iter().copied().collect())
    }
}
