pub mod bridge;
pub mod document_ai;

use std::path::Path;

use anyhow::Result;
use tracing::warn;

use crate::core::model::{FieldCandidate, Source};
use crate::error::InputError;

pub use bridge::DetectorBridge;
pub use document_ai::DocumentAiResponse;

/// Anything that reads confidence-scored field candidates off an ID image.
pub trait ExtractionSource {
    fn source(&self) -> Source;
    fn extract(&self, image: &Path) -> Result<Vec<FieldCandidate>>;
}

/// Runs every source on the image. A source that fails for any other reason
/// contributes no candidates and the failure is logged. An `InputError`
/// (e.g. an undeclared field name) is a broken extractor and aborts the
/// request.
pub fn collect_candidates(
    sources: &[&dyn ExtractionSource],
    image: &Path,
) -> Result<Vec<FieldCandidate>> {
    let mut candidates = Vec::new();
    for source in sources {
        match source.extract(image) {
            Ok(found) => candidates.extend(found),
            Err(err) if err.downcast_ref::<InputError>().is_some() => {
                return Err(err.context(format!("{} emitted malformed candidates", source.source())));
            }
            Err(err) => warn!(source = %source.source(), "extraction failed, treating as no candidates: {err:#}"),
        }
    }
    Ok(candidates)
}
