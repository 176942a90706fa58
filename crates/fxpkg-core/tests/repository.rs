use fxpkg_core::repository::Repository;
use std::path::PathBuf;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("tests/fixtures")
}

#[test]
fn directory_recipes_override_builtin() {
    let mut repo = Repository::builtin().unwrap();
    let loaded = repo.load_dir(&fixtures_dir().join("recipes")).unwrap();
    assert_eq!(loaded, 2);
    assert_eq!(repo.len(), 5);

    let basix = repo.get("fenics-basix").unwrap();
    assert_eq!(basix.versions.len(), 1);
    assert_eq!(
        basix.description.as_deref(),
        Some("Site-local basix recipe pinned to one release")
    );
    assert!(repo.contains("toy-solver"));
}

#[test]
fn missing_directory_loads_nothing() {
    let mut repo = Repository::empty();
    let loaded = repo.load_dir(&fixtures_dir().join("no-such-dir")).unwrap();
    assert_eq!(loaded, 0);
    assert!(repo.is_empty());
}

#[test]
fn broken_recipe_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("broken.toml"),
        r#"
[package]
name = "broken"
build-system = "cmake"

[[version]]
id = "1.0"
branch = "main"
"#,
    )
    .unwrap();
    let mut repo = Repository::empty();
    let err = repo.load_dir(dir.path()).unwrap_err();
    assert!(err.to_string().contains("needs a git URL"), "{err}");
}
