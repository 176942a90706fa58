use std::path::PathBuf;

use fxpkg_core::args::ArgValue;
use fxpkg_core::dependency::UsageType;
use fxpkg_core::host::{Compiler, DependencyFacts, HostFacts, PATH_SEPARATOR};
use fxpkg_core::recipe::Recipe;
use fxpkg_core::repository::Repository;
use fxpkg_core::request::Request;
use fxpkg_core::variant::VariantValue;
use fxpkg_core::version::Version;
use fxpkg_resolver::fetch::FetchSource;
use fxpkg_resolver::{configure, resolve, Resolution};
use fxpkg_util::errors::FxError;

fn repo() -> Repository {
    Repository::builtin().unwrap()
}

fn host() -> HostFacts {
    HostFacts {
        jobs: 8,
        ..Default::default()
    }
}

fn resolve_str(request: &str, host: &HostFacts) -> Result<Resolution, FxError> {
    let request = Request::parse(request).unwrap();
    let repo = repo();
    let recipe = repo.get(&request.name).unwrap();
    resolve(recipe, &request, host)
}

fn dep_names(resolution: &Resolution) -> Vec<&str> {
    resolution
        .dependencies
        .iter()
        .map(|d| d.name.as_str())
        .collect()
}

fn arg<'a>(resolution: &'a Resolution, key: &str) -> &'a ArgValue {
    &resolution
        .args
        .iter()
        .find(|a| a.key == key)
        .unwrap_or_else(|| panic!("no argument {key}"))
        .value
}

#[test]
fn dolfinx_parmetis_edges_and_arguments() {
    let r = resolve_str("fenics-dolfinx@0.9.0 partitioners=parmetis", &host()).unwrap();
    let names = dep_names(&r);
    assert!(names.contains(&"parmetis"));
    assert!(!names.contains(&"kahip"));
    assert!(!names.contains(&"scotch"));
    assert_eq!(
        names,
        vec![
            "c",
            "cxx",
            "parmetis",
            "cmake",
            "pkgconfig",
            "mpi",
            "hdf5",
            "boost",
            "pugixml",
            "spdlog",
            "fenics-ufcx",
            "fenics-basix",
            "py-fenics-ffcx",
            "catch2",
        ]
    );

    let canonical: Vec<String> = r.args.iter().map(|a| a.to_string()).collect();
    assert_eq!(
        canonical,
        vec![
            "CMAKE_BUILD_TYPE=RelWithDebInfo",
            "DOLFINX_SKIP_BUILD_TESTS=True",
            "DOLFINX_ENABLE_PETSC=False",
            "DOLFINX_ENABLE_SLEPC=False",
            "DOLFINX_ENABLE_ADIOS2=False",
            "DOLFINX_UFCX_PYTHON=False",
            "DOLFINX_ENABLE_KAHIP=False",
            "DOLFINX_ENABLE_PARMETIS=True",
            "DOLFINX_ENABLE_SCOTCH=False",
            "DOLFINX_ENABLE_SUPERLU_DIST=False",
        ]
    );
    assert_eq!(r.rendered_args()[7], "-DDOLFINX_ENABLE_PARMETIS:BOOL=ON");
}

#[test]
fn dolfinx_boost_edges_merge() {
    let r = resolve_str("fenics-dolfinx@0.9.0", &host()).unwrap();
    let boost = r.dependencies.iter().find(|d| d.name == "boost").unwrap();
    assert_eq!(boost.spec(), "boost@1.70:+timer");
    assert_eq!(boost.edges, vec!["boost@1.70:", "boost@1.70:+timer"]);

    let r = resolve_str("fenics-dolfinx@0.10.0.post4", &host()).unwrap();
    let boost = r.dependencies.iter().find(|d| d.name == "boost").unwrap();
    assert_eq!(boost.spec(), "boost@1.70:");
}

#[test]
fn resolution_is_deterministic() {
    let request = "fenics-dolfinx@0.9.0 +petsc +adios2 partitioners=kahip,scotch";
    let first = resolve_str(request, &host()).unwrap();
    for _ in 0..5 {
        assert_eq!(resolve_str(request, &host()).unwrap(), first);
    }
}

#[test]
fn omitted_bool_equals_its_default() {
    let omitted = resolve_str("fenics-dolfinx@0.9.0", &host()).unwrap();
    let explicit = resolve_str("fenics-dolfinx@0.9.0 ~petsc ~slepc ~adios2", &host()).unwrap();
    assert_eq!(omitted, explicit);

    let basix_host = host()
        .with_dependency(
            "blas",
            DependencyFacts {
                libs: vec![PathBuf::from("/usr/lib/libblas.so")],
                ..Default::default()
            },
        )
        .with_dependency(
            "lapack",
            DependencyFacts {
                libs: vec![PathBuf::from("/usr/lib/liblapack.so")],
                ..Default::default()
            },
        );
    let omitted = resolve_str("fenics-basix@0.9.0", &basix_host).unwrap();
    let explicit = resolve_str("fenics-basix@0.9.0 build_type=RelWithDebInfo", &basix_host).unwrap();
    assert_eq!(omitted, explicit);
}

#[test]
fn slepc_without_petsc_conflicts() {
    let err = resolve_str("fenics-dolfinx@0.9.0 +slepc", &host()).unwrap_err();
    match err {
        FxError::Conflict { package, message } => {
            assert_eq!(package, "fenics-dolfinx");
            assert_eq!(message, "+slepc requires +petsc");
        }
        other => panic!("expected a conflict, got {other}"),
    }

    let r = resolve_str("fenics-dolfinx@0.9.0 +slepc +petsc", &host()).unwrap();
    let petsc = r.dependencies.iter().find(|d| d.name == "petsc").unwrap();
    assert_eq!(petsc.spec(), "petsc+mpi+shared");
    assert_eq!(petsc.edges.len(), 2);
    assert!(dep_names(&r).contains(&"slepc"));
}

#[test]
fn every_conflict_rule_fires_exactly_when_it_holds() {
    let cases = [
        ("fenics-dolfinx@0.10.0.post4 %gcc@12.3.0", true),
        ("fenics-dolfinx@0.10.0.post4 %gcc@13.2.0", false),
        ("fenics-dolfinx@0.9.0 %gcc@12.3.0", false),
        ("fenics-dolfinx@main %gcc@11", true),
        ("fenics-dolfinx@0.9.0 +slepc", true),
        ("fenics-dolfinx@0.9.0 +slepc +petsc", false),
        ("fenics-basix@0.9.0 %gcc@9.4", true),
        ("fenics-basix@0.9.0 %gcc@10.1", false),
        ("fenics-basix@0.9.0 %clang@9", true),
        ("py-fenics-dolfinx@0.8.0", true),
        ("py-fenics-dolfinx@0.8.0 +petsc4py", false),
        ("py-fenics-dolfinx@0.9.0 +slepc4py", true),
        ("py-fenics-dolfinx@0.9.0 +slepc4py +petsc4py", false),
    ];
    let facts = host()
        .with_dependency(
            "blas",
            DependencyFacts {
                libs: vec![PathBuf::from("/opt/lib/libblas.so")],
                ..Default::default()
            },
        )
        .with_dependency(
            "lapack",
            DependencyFacts {
                libs: vec![PathBuf::from("/opt/lib/liblapack.so")],
                ..Default::default()
            },
        );
    for (request, conflicts) in cases {
        let result = resolve_str(request, &facts);
        assert_eq!(
            matches!(result, Err(FxError::Conflict { .. })),
            conflicts,
            "{request}: {result:?}"
        );
    }
}

#[test]
fn host_compiler_used_when_request_names_none() {
    let facts = host().with_compiler(Compiler::parse("gcc@12.2.0").unwrap());
    let err = resolve_str("fenics-dolfinx@0.10.0.post4", &facts).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Conflict in fenics-dolfinx: fenics-dolfinx 0.10 and newer requires GCC 13 or newer"
    );
    // The request's compiler takes precedence.
    resolve_str("fenics-dolfinx@0.10.0.post4 %gcc@14.1", &facts).unwrap();
}

#[test]
fn superlu_dist_only_exists_on_main() {
    let err = resolve_str("fenics-dolfinx@0.9.0 +superlu-dist", &host()).unwrap_err();
    assert!(matches!(
        err,
        FxError::InvalidVariantValue { ref variant, .. } if variant == "superlu-dist"
    ));

    let r = resolve_str("fenics-dolfinx@main +superlu-dist", &host()).unwrap();
    let superlu = r.dependencies.iter().find(|d| d.name == "superlu-dist").unwrap();
    assert_eq!(superlu.spec(), "superlu-dist+parmetis");
    assert_eq!(arg(&r, "DOLFINX_ENABLE_SUPERLU_DIST"), &ArgValue::Bool(true));

    let r = resolve_str("fenics-dolfinx@main +superlu-dist partitioners=kahip", &host()).unwrap();
    let superlu = r.dependencies.iter().find(|d| d.name == "superlu-dist").unwrap();
    assert_eq!(superlu.spec(), "superlu-dist~parmetis");

    let r = resolve_str("fenics-dolfinx@main", &host()).unwrap();
    assert_eq!(r.variants["superlu-dist"], VariantValue::Bool(false));
    assert!(!dep_names(&r).contains(&"superlu-dist"));

    let r = resolve_str("fenics-dolfinx@0.9.0", &host()).unwrap();
    assert!(!r.variants.contains_key("superlu-dist"));
}

#[test]
fn post_release_matches_series_condition() {
    let r = resolve_str("fenics-dolfinx@0.10.0.post4", &host()).unwrap();
    let basix = r.dependencies.iter().find(|d| d.name == "fenics-basix").unwrap();
    assert_eq!(basix.spec(), "fenics-basix@0.10");
    assert!(basix.versions.contains(&Version::parse("0.10.0.post0").unwrap()));
}

#[test]
fn main_satisfies_open_upper_ranges() {
    let r = resolve_str("fenics-dolfinx@main", &host()).unwrap();
    let cmake = r.dependencies.iter().find(|d| d.name == "cmake").unwrap();
    assert_eq!(cmake.spec(), "cmake@3.21:");
    assert!(dep_names(&r).contains(&"spdlog"));
    let basix = r.dependencies.iter().find(|d| d.name == "fenics-basix").unwrap();
    assert_eq!(basix.spec(), "fenics-basix@main");
}

#[test]
fn adios2_ranges_intersect_at_0_9() {
    let r = resolve_str("fenics-dolfinx@0.9.0 +adios2", &host()).unwrap();
    let adios2 = r.dependencies.iter().find(|d| d.name == "adios2").unwrap();
    assert_eq!(adios2.spec(), "adios2@2.8.1:2.10+mpi");
    assert_eq!(adios2.edges.len(), 3);
}

#[test]
fn installed_versions_checked_against_merged_constraint() {
    let recipe = Recipe::parse_toml(
        r#"
[package]
name = "toy"
url = "https://example.org/toy/v{version}.tar.gz"
build-system = "cmake"

[[version]]
id = "1.0"
sha256 = "b266c74360c2590c5745d74768c04568c965b44739becca4cd6b5aa58cdbbbd1"

[[depends]]
spec = "boost@1.70:"

[[depends]]
spec = "boost@:1.80"
"#,
    )
    .unwrap();
    let request = Request::new("toy");

    let installed = |version: &str| {
        host().with_dependency(
            "boost",
            DependencyFacts {
                version: Some(Version::parse(version).unwrap()),
                ..Default::default()
            },
        )
    };

    let configured = configure(&recipe, &request, &host()).unwrap();
    assert_eq!(configured.dependencies[0].versions.to_string(), "1.70:1.80");

    let err = configure(&recipe, &request, &installed("1.90")).unwrap_err();
    assert!(matches!(
        err,
        FxError::UnsatisfiableConstraint { ref dependency, .. } if dependency == "boost"
    ));
    configure(&recipe, &request, &installed("1.75")).unwrap();
    configure(&recipe, &request, &installed("1.80.0")).unwrap();
}

#[test]
fn basix_library_arguments() {
    let err = resolve_str("fenics-basix@0.9.0", &host()).unwrap_err();
    assert!(matches!(err, FxError::MissingLibraries { ref dependency } if dependency == "blas"));

    let facts = host()
        .with_dependency(
            "blas",
            DependencyFacts {
                libs: vec![
                    PathBuf::from("/opt/blas/libblas.so"),
                    PathBuf::from("/opt/blas/libcblas.so"),
                ],
                ..Default::default()
            },
        )
        .with_dependency(
            "lapack",
            DependencyFacts {
                libs: vec![PathBuf::from("/opt/lapack/liblapack.so")],
                ..Default::default()
            },
        );
    let r = resolve_str("fenics-basix@0.9.0 build_type=Release", &facts).unwrap();
    assert_eq!(
        arg(&r, "BLAS_LIBRARIES"),
        &ArgValue::Str(format!(
            "/opt/blas/libblas.so{PATH_SEPARATOR}/opt/blas/libcblas.so"
        ))
    );
    assert_eq!(
        arg(&r, "LAPACK_LIBRARIES"),
        &ArgValue::Str("/opt/lapack/liblapack.so".to_string())
    );
    assert_eq!(r.rendered_args()[0], "-DCMAKE_BUILD_TYPE:STRING=Release");
}

#[test]
fn py_dolfinx_config_settings() {
    let r = resolve_str("py-fenics-dolfinx@0.10.0.post4", &host()).unwrap();
    assert_eq!(
        r.rendered_args(),
        vec![
            "--config-settings=build.tool-args=-j8",
            "--config-settings=build.verbose=true",
            "--config-settings=cmake.build-type=RelWithDebInfo",
        ]
    );

    let python = r.dependencies.iter().find(|d| d.name == "python").unwrap();
    assert_eq!(python.spec(), "python@3.10:");
    assert!(python.usage.contains(&UsageType::Run));
    let nanobind = r.dependencies.iter().find(|d| d.name == "py-nanobind").unwrap();
    assert_eq!(nanobind.spec(), "py-nanobind@2.5:");
    let basix = r.dependencies.iter().find(|d| d.name == "fenics-basix").unwrap();
    assert!(basix.usage.contains(&UsageType::Link));
    assert!(!basix.usage.contains(&UsageType::Run));
}

#[test]
fn py_dolfinx_petsc4py_pins_dolfinx_with_petsc() {
    let r = resolve_str("py-fenics-dolfinx@0.8.0 +petsc4py", &host()).unwrap();
    let dolfinx = r.dependencies.iter().find(|d| d.name == "fenics-dolfinx").unwrap();
    assert_eq!(dolfinx.spec(), "fenics-dolfinx@0.8.0+petsc");
    let nanobind = r.dependencies.iter().find(|d| d.name == "py-nanobind").unwrap();
    assert_eq!(nanobind.spec(), "py-nanobind@1.8:1.9");
}

#[test]
fn fetch_descriptors() {
    let r = resolve_str("fenics-dolfinx@0.8.0", &host()).unwrap();
    assert_eq!(
        r.fetch.source,
        FetchSource::Archive {
            url: "https://github.com/FEniCS/dolfinx/archive/v0.8.0.tar.gz".to_string(),
            sha256: "acf3104d9ecc0380677a6faf69eabfafc58d0cce43f7777e1307b95701c7cad9".to_string(),
        }
    );
    assert_eq!(r.fetch.patches, vec!["0.8-boost-filesystem.patch"]);
    assert_eq!(r.fetch.build_directory.as_deref(), Some("cpp"));

    let r = resolve_str("py-fenics-ffcx@main", &host()).unwrap();
    assert_eq!(
        r.fetch.source,
        FetchSource::Git {
            url: "https://github.com/FEniCS/ffcx.git".to_string(),
            branch: "main".to_string(),
            no_cache: true,
        }
    );
    assert_eq!(r.fetch.patches, vec!["test.patch"]);

    let r = resolve_str("py-fenics-ffcx@0.9.0", &host()).unwrap();
    assert!(r.fetch.patches.is_empty());
}

#[test]
fn version_selection() {
    let r = resolve_str("fenics-dolfinx", &host()).unwrap();
    assert_eq!(r.version.as_str(), "0.10.0.post4");
    assert!(!r.deprecated);

    let r = resolve_str("py-fenics-ffcx@:0.9", &host()).unwrap();
    assert_eq!(r.version.as_str(), "0.9.0");

    let r = resolve_str("py-fenics-ffcx@0.6.0", &host()).unwrap();
    assert!(r.deprecated);

    let err = resolve_str("fenics-dolfinx@0.9", &host()).unwrap_err();
    assert_eq!(err.to_string(), "fenics-dolfinx has no version '0.9'");
    let err = resolve_str("fenics-dolfinx@0.11:0.12", &host()).unwrap_err();
    assert!(matches!(err, FxError::UnknownVersion { .. }), "{err}");
}

#[test]
fn invalid_variant_values() {
    let err = resolve_str("fenics-dolfinx@0.9.0 build_type=Fast", &host()).unwrap_err();
    match err {
        FxError::InvalidVariantValue {
            variant,
            value,
            allowed,
            ..
        } => {
            assert_eq!(variant, "build_type");
            assert_eq!(value, "Fast");
            assert!(allowed.contains("RelWithDebInfo"));
        }
        other => panic!("unexpected {other}"),
    }

    let err = resolve_str("fenics-dolfinx@0.9.0 partitioners=kahip,metis", &host()).unwrap_err();
    assert!(matches!(err, FxError::InvalidVariantValue { ref value, .. } if value == "metis"));

    let err = resolve_str("fenics-dolfinx@0.9.0 +mumps", &host()).unwrap_err();
    assert!(matches!(err, FxError::InvalidVariantValue { ref variant, .. } if variant == "mumps"));

    let err = resolve_str("fenics-dolfinx@0.9.0 +build_type", &host()).unwrap_err();
    assert!(matches!(err, FxError::InvalidVariantValue { .. }));
}

#[test]
fn multi_valued_argument_order_is_sorted() {
    let r = resolve_str("fenics-dolfinx@0.9.0 partitioners=scotch,kahip", &host()).unwrap();
    assert_eq!(arg(&r, "DOLFINX_ENABLE_KAHIP"), &ArgValue::Bool(true));
    assert_eq!(arg(&r, "DOLFINX_ENABLE_PARMETIS"), &ArgValue::Bool(false));
    assert_eq!(arg(&r, "DOLFINX_ENABLE_SCOTCH"), &ArgValue::Bool(true));
    let scotch = r.dependencies.iter().find(|d| d.name == "scotch").unwrap();
    assert_eq!(scotch.spec(), "scotch+mpi");
    let kahip = r.dependencies.iter().find(|d| d.name == "kahip").unwrap();
    assert_eq!(kahip.spec(), "kahip@3.12:");
}

#[test]
fn resolution_serializes_to_json() {
    let r = resolve_str("fenics-dolfinx@0.9.0 +petsc", &host()).unwrap();
    let json = serde_json::to_value(&r).unwrap();
    assert_eq!(json["package"], "fenics-dolfinx");
    assert_eq!(json["version"], "0.9.0");
    assert_eq!(json["variants"]["petsc"], true);
    assert_eq!(json["variants"]["partitioners"][0], "parmetis");
    assert_eq!(json["fetch"]["source"]["kind"], "archive");
    assert_eq!(json["args"][2]["key"], "DOLFINX_ENABLE_PETSC");
    assert_eq!(json["args"][2]["value"], true);
    let petsc = json["dependencies"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == "petsc")
        .unwrap();
    assert_eq!(petsc["versions"], ":");
    assert_eq!(petsc["usage"][0], "build");
}
