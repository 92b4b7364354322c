//! Shared state for one resource's routes: the model and its view settings.

use crate::config::ViewConfig;
use crate::error::AppError;
use crate::model::Model;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct ResourceView {
    model: Arc<Model>,
    config: Arc<ViewConfig>,
}

impl ResourceView {
    pub fn new(model: Model) -> Self {
        Self::with_config(Arc::new(model), ViewConfig::default())
    }

    pub fn with_config(model: Arc<Model>, config: ViewConfig) -> Self {
        ResourceView {
            model,
            config: Arc::new(config),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Identifier from the detail route's path parameters.
    pub fn id_param<'a>(&self, params: &'a HashMap<String, String>) -> Result<&'a str, AppError> {
        params
            .get(&self.config.id_param)
            .map(String::as_str)
            .ok_or_else(|| AppError::BadRequest(format!("missing path parameter '{}'", self.config.id_param)))
    }
}
