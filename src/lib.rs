pub mod assembler;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod fusion;
pub mod normalize;
pub mod pipeline;
pub mod sources;
pub mod validate;

pub use assembler::RecordAssembler;
pub use config::FusionConfig;
pub use core::model::{FieldCandidate, FieldName, PatientRecord, RecordStatus, Source};
pub use error::InputError;
