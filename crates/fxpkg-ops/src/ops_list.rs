//! Operation: list the recipes in the repository.

use globset::Glob;
use serde::Serialize;

use fxpkg_core::args::BuildSystem;
use fxpkg_core::repository::Repository;
use fxpkg_core::version::Version;
use fxpkg_util::errors::FxError;

use crate::{to_json, OutputFormat};

/// One line of `fxpkg list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSummary {
    pub name: String,
    pub build_system: BuildSystem,
    pub preferred: Option<Version>,
    pub versions: usize,
    pub description: Option<String>,
}

/// Summarise every recipe whose name matches `pattern` (a glob), in name order.
pub fn list(repo: &Repository, pattern: Option<&str>) -> miette::Result<Vec<RecipeSummary>> {
    let matcher = match pattern {
        Some(p) => Some(
            Glob::new(p)
                .map_err(|e| FxError::Generic {
                    message: format!("invalid pattern '{p}': {e}"),
                })?
                .compile_matcher(),
        ),
        None => None,
    };

    let summaries = repo
        .iter()
        .filter(|r| matcher.as_ref().map_or(true, |m| m.is_match(&r.name)))
        .map(|r| RecipeSummary {
            name: r.name.clone(),
            build_system: r.build_system,
            preferred: r.preferred_version().map(|v| v.version.clone()),
            versions: r.versions.len(),
            description: r.description.clone(),
        })
        .collect();
    Ok(summaries)
}

/// Render summaries as aligned columns, or as JSON.
pub fn render(summaries: &[RecipeSummary], format: OutputFormat) -> miette::Result<String> {
    if format == OutputFormat::Json {
        return to_json(summaries);
    }
    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut output = String::new();
    for s in summaries {
        let preferred = s
            .preferred
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        output.push_str(&format!(
            "{:<width$}  {:<6}  {preferred:<14}  {}\n",
            s.name,
            s.build_system.to_string(),
            s.description.as_deref().unwrap_or("")
        ));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_builtin_recipes_listed_in_name_order() {
        let repo = Repository::builtin().unwrap();
        let names: Vec<String> = list(&repo, None).unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "fenics-basix",
                "fenics-dolfinx",
                "py-fenics-dolfinx",
                "py-fenics-ffcx"
            ]
        );
    }

    #[test]
    fn glob_filters_and_reports_preferred_release() {
        let repo = Repository::builtin().unwrap();
        let summaries = list(&repo, Some("py-*")).unwrap();
        assert_eq!(summaries.len(), 2);
        assert!(summaries.iter().all(|s| s.build_system == BuildSystem::Python));

        let dolfinx = list(&repo, Some("fenics-dolfinx")).unwrap().remove(0);
        let preferred = dolfinx.preferred.unwrap();
        assert!(!preferred.is_branch());
        assert_eq!(preferred.to_string(), "0.10.0.post4");
    }

    #[test]
    fn bad_pattern_is_an_error() {
        let repo = Repository::builtin().unwrap();
        assert!(list(&repo, Some("[fenics")).is_err());
    }

    #[test]
    fn render_aligns_names() {
        let repo = Repository::builtin().unwrap();
        let summaries = list(&repo, Some("fenics-*")).unwrap();
        let text = render(&summaries, OutputFormat::Text).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("fenics-basix    cmake"));
        assert!(lines[1].starts_with("fenics-dolfinx  cmake"));

        let json = render(&summaries, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "fenics-basix");
        assert_eq!(value[0]["build_system"], "cmake");
    }
}
