use keyword_annotate::app::registry::{check_registry, ensure_consistent};
use keyword_annotate::config::toml_config::default_targets;
use keyword_annotate::domain::services::consistency::check_targets;
use keyword_annotate::Manifest;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn repo_root() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn test_shipped_manifest_matches_builtin_targets() {
    let manifest = Manifest::from_file(repo_root().join("annotation.toml")).unwrap();
    assert_eq!(manifest, Manifest::default());
}

#[test]
fn test_shipped_registry_is_consistent() {
    let findings = check_registry(Some(repo_root().join("annotation.toml").as_path()), repo_root()).unwrap();
    assert!(findings.is_empty(), "unexpected findings: {:?}", findings);
    assert!(ensure_consistent(&findings).is_ok());
}

#[test]
fn test_every_config_file_exists() {
    for target in default_targets() {
        assert!(
            repo_root().join(&target.config).is_file(),
            "missing {}",
            target.config.display()
        );
    }
}

#[test]
fn test_ports_are_pairwise_distinct() {
    let ports: Vec<u16> = default_targets().iter().map(|t| t.port).collect();
    let unique: HashSet<u16> = ports.iter().copied().collect();
    assert_eq!(ports, vec![8000, 8001, 8002]);
    assert_eq!(unique.len(), ports.len());
}

#[test]
fn test_output_dirs_are_distinct_and_name_their_model() {
    let targets = default_targets();
    let dirs: HashSet<&PathBuf> = targets.iter().map(|t| &t.output_dir).collect();
    assert_eq!(dirs.len(), targets.len());

    for target in &targets {
        let names_model = target
            .output_dir
            .components()
            .any(|c| c.as_os_str().to_string_lossy().contains(&target.model));
        assert!(names_model, "{}", target.output_dir.display());
    }
}

#[test]
fn test_gpt5_mini_access_url() {
    let manifest = Manifest::default();
    let target = manifest.find("gpt5_mini").unwrap();
    assert_eq!(
        target.config,
        PathBuf::from("configs/keywords_annotation_gpt5_mini.yaml")
    );
    assert_eq!(target.port, 8000);
    assert_eq!(target.access_url(&manifest.server.host), "http://localhost:8000");
}

#[test]
fn test_loading_twice_is_identical() {
    let path = repo_root().join("annotation.toml");
    let first = Manifest::from_file(&path).unwrap();
    let second = Manifest::from_file(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_check_against_empty_directory_reports_all_configs() {
    let dir = tempfile::TempDir::new().unwrap();
    let findings = check_targets(&default_targets(), "localhost", dir.path());
    assert_eq!(findings.len(), 3);
    assert!(findings.iter().all(|f| f.message.contains("does not exist")));
}
