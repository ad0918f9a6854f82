//! Cross-checks of the annotation target registry.
//!
//! Every target must point at an existing server configuration, and targets
//! must not share a name, model, port or output directory. The output directory
//! has to be recognisably tied to the model it collects annotations for.

use crate::domain::model::AnnotationTarget;
use crate::utils::validation::validate_url;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub level: FindingLevel,
    pub target: String,
    pub message: String,
}

impl Finding {
    fn error(target: &str, message: String) -> Self {
        Self {
            level: FindingLevel::Error,
            target: target.to_string(),
            message,
        }
    }

    fn warning(target: &str, message: String) -> Self {
        Self {
            level: FindingLevel::Warning,
            target: target.to_string(),
            message,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == FindingLevel::Error
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            FindingLevel::Warning => "warning",
            FindingLevel::Error => "error",
        };
        write!(f, "[{}] {}: {}", level, self.target, self.message)
    }
}

/// Runs every check and returns all findings; an empty list means consistent.
/// Relative config paths are resolved against `base_dir`.
pub fn check_targets(targets: &[AnnotationTarget], host: &str, base_dir: &Path) -> Vec<Finding> {
    let mut findings = Vec::new();

    if targets.is_empty() {
        findings.push(Finding::error("registry", "no annotation targets defined".to_string()));
        return findings;
    }

    for target in targets {
        check_config_exists(target, base_dir, &mut findings);
        check_output_dir_names_model(target, &mut findings);
        check_access_url(target, host, &mut findings);
        if target.port < 1024 {
            findings.push(Finding::warning(
                &target.name,
                format!("port {} is privileged and may need elevated permissions", target.port),
            ));
        }
    }

    check_distinct(targets, "name", |t| t.name.clone(), &mut findings);
    check_distinct(targets, "model", |t| t.model.clone(), &mut findings);
    check_name_model_collisions(targets, &mut findings);
    check_distinct(targets, "port", |t| t.port.to_string(), &mut findings);
    check_distinct(
        targets,
        "output directory",
        |t| normalize(&t.output_dir),
        &mut findings,
    );

    findings
}

fn check_config_exists(target: &AnnotationTarget, base_dir: &Path, findings: &mut Vec<Finding>) {
    let path = base_dir.join(&target.config);
    if !path.is_file() {
        findings.push(Finding::error(
            &target.name,
            format!("configuration file {} does not exist", target.config.display()),
        ));
    }
}

fn check_output_dir_names_model(target: &AnnotationTarget, findings: &mut Vec<Finding>) {
    let names_model = target
        .output_dir
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .any(|segment| segment.contains(target.model.as_str()));

    if !names_model {
        findings.push(Finding::error(
            &target.name,
            format!(
                "output directory {} has no segment naming model '{}'",
                target.output_dir.display(),
                target.model
            ),
        ));
    }
}

fn check_access_url(target: &AnnotationTarget, host: &str, findings: &mut Vec<Finding>) {
    if target.port == 0 {
        findings.push(Finding::error(&target.name, "port 0 is not a usable port".to_string()));
        return;
    }
    if let Err(e) = validate_url("access_url", &target.access_url(host)) {
        findings.push(Finding::error(&target.name, e.to_string()));
    }
}

fn check_distinct<F>(targets: &[AnnotationTarget], what: &str, key: F, findings: &mut Vec<Finding>)
where
    F: Fn(&AnnotationTarget) -> String,
{
    let mut seen: HashMap<String, &str> = HashMap::new();
    for target in targets {
        let value = key(target);
        if let Some(first) = seen.get(&value) {
            findings.push(Finding::error(
                &target.name,
                format!("{} '{}' is already used by '{}'", what, value, first),
            ));
        } else {
            seen.insert(value, &target.name);
        }
    }
}

// `find` 先比對名稱再比對模型，名稱不可等於其他目標的模型
fn check_name_model_collisions(targets: &[AnnotationTarget], findings: &mut Vec<Finding>) {
    for target in targets {
        if let Some(other) = targets
            .iter()
            .find(|o| o.name != target.name && o.model == target.name)
        {
            findings.push(Finding::error(
                &target.name,
                format!("name '{}' is the model of target '{}'", target.name, other.name),
            ));
        }
    }
}

// "a/b/" 與 "a/b" 視為同一目錄
fn normalize(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
