use crate::config::toml_config::{Manifest, DEFAULT_MANIFEST};
use crate::domain::services::consistency::{check_targets, Finding, FindingLevel};
use crate::utils::error::{AnnotateError, Result};
use crate::utils::validation::Validate;
use std::path::{Path, PathBuf};

/// One row per target for `list`.
pub fn target_table(manifest: &Manifest) -> Vec<String> {
    manifest
        .targets
        .iter()
        .map(|t| {
            format!(
                "{:<28} port {:<5} {:<24} config {}  ->  {}",
                t.name,
                t.port,
                t.access_url(&manifest.server.host),
                t.config.display(),
                t.output_dir.display()
            )
        })
        .collect()
}

/// Loads the registry twice and checks it; loading must be deterministic.
/// Without an explicit manifest, `base_dir/annotation.toml` is preferred.
pub fn check_registry(manifest_path: Option<&Path>, base_dir: &Path) -> Result<Vec<Finding>> {
    let manifest_path = resolve_manifest(manifest_path, base_dir);
    let manifest_path = manifest_path.as_deref();

    let manifest = Manifest::load(manifest_path)?;
    manifest.validate()?;

    let mut findings = check_targets(&manifest.targets, &manifest.server.host, base_dir);

    let reloaded = Manifest::load(manifest_path)?;
    if reloaded != manifest {
        findings.push(Finding {
            level: FindingLevel::Error,
            target: "registry".to_string(),
            message: "loading the registry twice produced different targets".to_string(),
        });
    }

    Ok(findings)
}

fn resolve_manifest(manifest_path: Option<&Path>, base_dir: &Path) -> Option<PathBuf> {
    match manifest_path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let candidate = base_dir.join(DEFAULT_MANIFEST);
            candidate.is_file().then_some(candidate)
        }
    }
}

/// `check` 的結果：有任何錯誤就回傳 ConsistencyError
pub fn ensure_consistent(findings: &[Finding]) -> Result<()> {
    let count = findings.iter().filter(|f| f.is_error()).count();
    if count > 0 {
        return Err(AnnotateError::ConsistencyError { count });
    }
    Ok(())
}
