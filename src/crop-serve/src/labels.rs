use std::fs;
use std::path::Path;

use crate::error::{ClassifyError, LoadError};

/// Class labels in model output order.
pub struct LabelStore {
    labels: Vec<String>,
}

impl LabelStore {
    /// Load labels from a JSON array of strings.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let data = fs::read(path).map_err(|e| LoadError::Labels {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let labels: Vec<String> = serde_json::from_slice(&data).map_err(|e| LoadError::Labels {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(LabelStore { labels })
    }

    pub fn from_labels(labels: Vec<String>) -> Self {
        LabelStore { labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Presentation form of the label at `index`, with underscores spelled
    /// out as spaces.
    pub fn display_label(&self, index: usize) -> Result<String, ClassifyError> {
        self.labels
            .get(index)
            .map(|label| label.replace('_', " "))
            .ok_or(ClassifyError::LabelIndex {
                index,
                label_count: self.labels.len(),
            })
    }
}
