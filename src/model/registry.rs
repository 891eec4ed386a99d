//! Process-scoped model cache.
//!
//! Constructed once at startup, read-only during inference. The only
//! mutation path is `install_*`, which swaps a whole replacement model
//! under a write lock, so a model serving requests is never trained in
//! place.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::model::classifier::ClassifierMlp;
use crate::model::enhancer::EnhancerNet;
use crate::model::store::ModelStore;
use crate::model::{Category, ModelError, SegmentModel};

pub struct ModelRegistry {
    enhancers: RwLock<HashMap<Category, Arc<dyn SegmentModel>>>,
    classifier: RwLock<Arc<ClassifierMlp>>,
}

impl ModelRegistry {
    /// Registry with fresh default models for every category.
    pub fn fresh() -> Self {
        let mut enhancers: HashMap<Category, Arc<dyn SegmentModel>> = HashMap::new();
        for category in Category::ALL {
            enhancers.insert(category, Arc::new(EnhancerNet::fresh(category)));
        }
        Self {
            enhancers: RwLock::new(enhancers),
            classifier: RwLock::new(Arc::new(ClassifierMlp::fresh())),
        }
    }

    /// Load persisted models where they exist, falling back to fresh
    /// defaults per category.
    pub fn load_or_default(store: &ModelStore) -> Result<Self, ModelError> {
        let mut enhancers: HashMap<Category, Arc<dyn SegmentModel>> = HashMap::new();
        for category in Category::ALL {
            match store.load_enhancer(category)? {
                Some(net) => {
                    tracing::info!(%category, "loaded persisted enhancer");
                    enhancers.insert(category, Arc::new(net));
                }
                None => {
                    tracing::info!(%category, "no persisted enhancer, constructing fresh");
                    enhancers.insert(category, Arc::new(EnhancerNet::fresh(category)));
                }
            }
        }
        let classifier = match store.load_classifier()? {
            Some(model) => {
                tracing::info!("loaded persisted classifier");
                Arc::new(model)
            }
            None => {
                tracing::info!("no persisted classifier, constructing fresh");
                Arc::new(ClassifierMlp::fresh())
            }
        };
        Ok(Self {
            enhancers: RwLock::new(enhancers),
            classifier: RwLock::new(classifier),
        })
    }

    /// Resolve the model serving a category, falling back to `General`.
    /// Returns the category actually used alongside the model.
    pub fn select(
        &self,
        category: Category,
    ) -> Result<(Category, Arc<dyn SegmentModel>), ModelError> {
        let enhancers = self
            .enhancers
            .read()
            .map_err(|_| poisoned("enhancer registry"))?;
        if let Some(model) = enhancers.get(&category) {
            return Ok((category, Arc::clone(model)));
        }
        tracing::warn!(%category, "no model for category, falling back to general");
        enhancers
            .get(&Category::General)
            .map(|model| (Category::General, Arc::clone(model)))
            .ok_or_else(|| ModelError::Unavailable {
                category: Category::General.to_string(),
            })
    }

    pub fn classifier(&self) -> Result<Arc<ClassifierMlp>, ModelError> {
        self.classifier
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| poisoned("classifier registry"))
    }

    /// Swap in a replacement enhancer, e.g. after external fine-tuning.
    pub fn install_enhancer(&self, net: EnhancerNet) -> Result<(), ModelError> {
        net.validate().map_err(|message| ModelError::Invalid {
            name: format!("enhancer_{}", net.category),
            message,
        })?;
        let category = net.category;
        let mut enhancers = self
            .enhancers
            .write()
            .map_err(|_| poisoned("enhancer registry"))?;
        enhancers.insert(category, Arc::new(net));
        tracing::info!(%category, "installed replacement enhancer");
        Ok(())
    }

    pub fn install_classifier(&self, model: ClassifierMlp) -> Result<(), ModelError> {
        model.validate().map_err(|message| ModelError::Invalid {
            name: "classifier".to_string(),
            message,
        })?;
        let mut guard = self
            .classifier
            .write()
            .map_err(|_| poisoned("classifier registry"))?;
        *guard = Arc::new(model);
        tracing::info!("installed replacement classifier");
        Ok(())
    }
}

fn poisoned(what: &str) -> ModelError {
    ModelError::Inference {
        message: format!("{what} lock poisoned"),
    }
}
