//! JSON persistence for models: load by name, save, or let the registry
//! fall back to a fresh default.

use std::fs;
use std::path::{Path, PathBuf};

use crate::model::classifier::ClassifierMlp;
use crate::model::enhancer::EnhancerNet;
use crate::model::{Category, ModelError};

pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the application models directory.
    pub fn default_location() -> Result<Self, crate::app_dirs::AppDirError> {
        Ok(Self::new(crate::app_dirs::models_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn enhancer_path(&self, category: Category) -> PathBuf {
        self.dir.join(format!("enhancer_{category}.json"))
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.dir.join("classifier.json")
    }

    /// Load a persisted enhancer, or `None` when the category has never
    /// been saved.
    pub fn load_enhancer(&self, category: Category) -> Result<Option<EnhancerNet>, ModelError> {
        let path = self.enhancer_path(category);
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        let net: EnhancerNet = serde_json::from_str(&text).map_err(|source| ModelError::Parse {
            path: path.clone(),
            source,
        })?;
        net.validate().map_err(|message| ModelError::Invalid {
            name: format!("enhancer_{category}"),
            message,
        })?;
        Ok(Some(net))
    }

    pub fn save_enhancer(&self, net: &EnhancerNet) -> Result<(), ModelError> {
        net.validate().map_err(|message| ModelError::Invalid {
            name: format!("enhancer_{}", net.category),
            message,
        })?;
        let path = self.enhancer_path(net.category);
        write_json(&path, net)
    }

    pub fn load_classifier(&self) -> Result<Option<ClassifierMlp>, ModelError> {
        let path = self.classifier_path();
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        let model: ClassifierMlp =
            serde_json::from_str(&text).map_err(|source| ModelError::Parse {
                path: path.clone(),
                source,
            })?;
        model.validate().map_err(|message| ModelError::Invalid {
            name: "classifier".to_string(),
            message,
        })?;
        Ok(Some(model))
    }

    pub fn save_classifier(&self, model: &ClassifierMlp) -> Result<(), ModelError> {
        model.validate().map_err(|message| ModelError::Invalid {
            name: "classifier".to_string(),
            message,
        })?;
        write_json(&self.classifier_path(), model)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, ModelError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ModelError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ModelError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let text = serde_json::to_string(value).map_err(|source| ModelError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| ModelError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_model_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        assert!(store.load_enhancer(Category::Voice).unwrap().is_none());
        assert!(store.load_classifier().unwrap().is_none());
    }

    #[test]
    fn enhancer_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let net = EnhancerNet::fresh(Category::Music);
        store.save_enhancer(&net).unwrap();
        let loaded = store.load_enhancer(Category::Music).unwrap().unwrap();
        assert_eq!(loaded.weights1, net.weights1);
        assert_eq!(loaded.category, Category::Music);
    }

    #[test]
    fn corrupt_model_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        std::fs::write(store.classifier_path(), "not json").unwrap();
        assert!(matches!(
            store.load_classifier(),
            Err(ModelError::Parse { .. })
        ));
    }
}
