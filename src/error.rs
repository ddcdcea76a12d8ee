use thiserror::Error;

use crate::core::model::{FieldName, Source};

/// Contract violations in the candidate list handed to the assembler.
///
/// These signal a defect in an upstream extractor and abort the request;
/// a rejected record is reported through `RecordStatus` instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("unrecognized field name: {0}")]
    UnknownField(String),

    #[error("confidence {confidence} for {field} from {provider} is outside [0, 1]")]
    InvalidConfidence {
        field: FieldName,
        provider: Source,
        confidence: f32,
    },
}
