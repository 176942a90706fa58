use fxpkg_core::config::{dirs_path, GlobalConfig, ProjectConfig, PROJECT_FILE};
use fxpkg_core::host::HostFacts;
use fxpkg_core::variant::VariantValue;
use std::path::PathBuf;

fn project_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures/project")
}

#[test]
fn missing_global_config_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = GlobalConfig::load_from(&dir.path().join("config.toml")).unwrap();
    assert!(config.host.compiler.is_none());
    assert!(config.repository.paths.is_empty());
}

#[test]
fn dirs_path_ends_with_fxpkg_or_override() {
    let path = dirs_path();
    match std::env::var_os("FXPKG_HOME") {
        Some(home) => assert_eq!(path, PathBuf::from(home)),
        None => assert!(path.ends_with(".fxpkg")),
    }
}

#[test]
fn global_config_sets_host_facts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[host]\ncompiler = \"clang@17\"\njobs = 3\n").unwrap();
    let config = GlobalConfig::load_from(&path).unwrap();

    let mut facts = HostFacts::default();
    config.apply(&mut facts).unwrap();
    assert_eq!(facts.compiler.unwrap().to_string(), "clang@17");
    assert_eq!(facts.jobs, 3);
}

#[test]
fn zero_jobs_rejected() {
    let config: GlobalConfig = toml::from_str("[host]\njobs = 0\n").unwrap();
    assert!(config.apply(&mut HostFacts::default()).is_err());
}

#[test]
fn project_config_discovered_and_applied() {
    let config = ProjectConfig::discover(&project_dir()).unwrap().unwrap();
    assert_eq!(config.root, project_dir());

    let mut facts = HostFacts::default();
    config.apply(&mut facts).unwrap();
    assert_eq!(facts.jobs, 6);
    assert_eq!(facts.compiler.as_ref().unwrap().to_string(), "gcc@13.2.0");

    let boost = facts.dependency("boost").unwrap();
    assert_eq!(boost.version.as_ref().unwrap().as_str(), "1.75.0");
    assert_eq!(boost.variants["timer"], VariantValue::Bool(true));
    assert_eq!(boost.libs, vec![project_dir().join("lib/libboost_timer.so")]);

    let blas = facts.dependency("blas").unwrap();
    assert_eq!(blas.libs, vec![PathBuf::from("/opt/openblas/lib/libopenblas.so")]);

    assert_eq!(config.repository_paths(), vec![project_dir().join("../recipes")]);
}

#[test]
fn project_config_found_from_subdirectory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(PROJECT_FILE), "[host]\njobs = 2\n").unwrap();
    let nested = dir.path().join("a/b");
    std::fs::create_dir_all(&nested).unwrap();

    let config = ProjectConfig::discover(&nested).unwrap().unwrap();
    assert_eq!(config.host.jobs, Some(2));
}

#[test]
fn bad_installed_variants_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(PROJECT_FILE);
    std::fs::write(&path, "[deps.boost]\nvariants = \"boost+timer\"\n").unwrap();
    let config = ProjectConfig::load_from(&path).unwrap();
    let err = config.apply(&mut HostFacts::default()).unwrap_err();
    assert!(err.to_string().contains("[deps.boost]"), "{err}");
}
