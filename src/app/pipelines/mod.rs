pub mod add_samples_pipeline;
pub mod overlap_pipeline;
pub mod prepare_pipeline;

use crate::domain::model::AnnotationItem;
use crate::utils::error::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;

pub use add_samples_pipeline::AddSamplesPipeline;
pub use overlap_pipeline::OverlapPipeline;
pub use prepare_pipeline::PreparePipeline;

/// 有 seed 時可重現抽樣結果
pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

pub(crate) fn to_json_lines(items: &[AnnotationItem]) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    for item in items {
        serde_json::to_writer(&mut buffer, item)?;
        buffer.push(b'\n');
    }
    Ok(buffer)
}

pub(crate) fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
