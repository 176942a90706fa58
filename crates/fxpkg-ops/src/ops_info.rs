//! Operation: describe one recipe.

use std::fmt::Write;

use fxpkg_core::recipe::{Recipe, VersionSource};
use fxpkg_core::variant::VariantKind;

/// Render everything a recipe declares: metadata, versions, variants,
/// dependency edges, conflicts and patches.
pub fn info(recipe: &Recipe) -> String {
    let mut out = String::new();
    let preferred = recipe.preferred_version().map(|v| &v.version);

    let _ = writeln!(
        out,
        "{}: {}",
        recipe.name,
        recipe.description.as_deref().unwrap_or("(no description)")
    );
    if let Some(ref homepage) = recipe.homepage {
        let _ = writeln!(out, "  homepage:     {homepage}");
    }
    if let Some(ref license) = recipe.license {
        let _ = writeln!(out, "  license:      {license}");
    }
    if !recipe.maintainers.is_empty() {
        let _ = writeln!(out, "  maintainers:  {}", recipe.maintainers.join(", "));
    }
    let _ = write!(out, "  build system: {}", recipe.build_system);
    if let Some(ref dir) = recipe.build_directory {
        let _ = write!(out, " (in {dir}/)");
    }
    out.push('\n');

    let _ = writeln!(out, "\nVersions:");
    let width = column_width(recipe.versions.iter().map(|v| v.version.as_str()));
    for decl in &recipe.versions {
        let mut notes = Vec::new();
        if Some(&decl.version) == preferred {
            notes.push("preferred".to_string());
        }
        if decl.deprecated {
            notes.push("deprecated".to_string());
        }
        if let VersionSource::Branch {
            branch, no_cache, ..
        } = &decl.source
        {
            notes.push(if *no_cache {
                format!("branch {branch}, no cache")
            } else {
                format!("branch {branch}")
            });
        }
        let _ = writeln!(out, "  {:<width$}  {}", decl.version.as_str(), notes.join(", "));
    }

    if !recipe.variants.is_empty() {
        let _ = writeln!(out, "\nVariants:");
        let width = column_width(recipe.variants.iter().map(|v| v.name.as_str()));
        for decl in &recipe.variants {
            let values = match &decl.kind {
                VariantKind::Bool { .. } => "True, False".to_string(),
                VariantKind::Single { values, .. } => values.join(", "),
                VariantKind::Multi { values, .. } => format!("{} (multi)", values.join(", ")),
            };
            let _ = write!(
                out,
                "  {:<width$}  default {}  [{values}]  {}",
                decl.name,
                decl.default_value(),
                decl.description
            );
            if !decl.when.is_always() {
                let _ = write!(out, "  when {}", decl.when);
            }
            out.push('\n');
        }
    }

    if !recipe.dependencies.is_empty() {
        let _ = writeln!(out, "\nDependencies:");
        for edge in &recipe.dependencies {
            let usage: Vec<String> = edge.usage.iter().map(|u| u.to_string()).collect();
            let _ = write!(out, "  {} [{}]", edge.spec, usage.join(","));
            if !edge.when.is_always() {
                let _ = write!(out, " when {}", edge.when);
            }
            out.push('\n');
        }
    }

    if !recipe.conflicts.is_empty() {
        let _ = writeln!(out, "\nConflicts:");
        for rule in &recipe.conflicts {
            let _ = writeln!(out, "  {}: {}", rule.condition, rule.message);
        }
    }

    if !recipe.patches.is_empty() {
        let _ = writeln!(out, "\nPatches:");
        for patch in &recipe.patches {
            let _ = write!(out, "  {}", patch.file);
            if !patch.when.is_always() {
                let _ = write!(out, " when {}", patch.when);
            }
            out.push('\n');
        }
    }
    out
}

fn column_width<'a>(items: impl Iterator<Item = &'a str>) -> usize {
    items.map(str::len).max().unwrap_or(0)
}
