use std::collections::BTreeMap;

use config::BackendConfig;

use crate::messages::{Model, ObjectType};

// Models have no creation date of their own.
const MODEL_CREATED: u64 = 1719475200;

/// Maps front-facing model names to backend model identifiers.
///
/// Unknown names are routed to the default model, so an empty table sends every
/// request to a single backend model.
#[derive(Debug, Clone)]
pub(crate) struct ModelRouter {
    models: BTreeMap<String, String>,
    default_model: String,
}

impl ModelRouter {
    pub fn new(models: BTreeMap<String, String>, default_model: impl Into<String>) -> Self {
        Self {
            models,
            default_model: default_model.into(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.models.clone(), config.default_model.clone())
    }

    /// Resolve the backend model identifier for a requested model name.
    pub fn resolve(&self, requested_model: &str) -> &str {
        match self.models.get(requested_model) {
            Some(model) => model,
            None => {
                log::debug!(
                    "No route for model '{requested_model}', using default '{}'",
                    self.default_model
                );

                &self.default_model
            }
        }
    }

    /// Front-facing models for the listing endpoint.
    ///
    /// Without a routing table every name resolves to the default model, which is
    /// then the only one listed.
    pub fn list(&self, owner: &str) -> Vec<Model> {
        let model = |id: &str| Model {
            id: id.to_string(),
            object: ObjectType::Model,
            created: MODEL_CREATED,
            owned_by: owner.to_string(),
        };

        if self.models.is_empty() {
            return vec![model(&self.default_model)];
        }

        self.models.keys().map(|id| model(id.as_str())).collect()
    }
}
