pub mod finalize;
pub mod resolve;

use crate::config::FusionConfig;
use crate::core::model::{FieldName, FusedField, ValidatedField};

pub use resolve::FusionPolicy;

pub trait FusionEngine {
    fn fuse(&self, field_name: FieldName, candidates: Vec<ValidatedField>) -> FusedField;
}

#[derive(Debug, Clone)]
pub struct SimpleFusionEngine {
    policy: FusionPolicy,
}

impl SimpleFusionEngine {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            policy: FusionPolicy::from(config),
        }
    }
}

impl Default for SimpleFusionEngine {
    fn default() -> Self {
        Self::new(&FusionConfig::default())
    }
}

impl FusionEngine for SimpleFusionEngine {
    fn fuse(&self, field_name: FieldName, candidates: Vec<ValidatedField>) -> FusedField {
        resolve::resolve_field(field_name, candidates, &self.policy)
    }
}
