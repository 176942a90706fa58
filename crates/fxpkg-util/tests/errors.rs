use fxpkg_util::errors::FxError;

#[test]
fn test_io_error_display() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
    let err = FxError::from(io_err);
    assert!(err.to_string().contains("I/O error"), "got: {err}");
}

#[test]
fn test_recipe_error_display() {
    let err = FxError::Recipe {
        message: "bad clause '@@'".to_string(),
    };
    assert_eq!(err.to_string(), "Recipe error: bad clause '@@'");
}

#[test]
fn test_unknown_version_display() {
    let err = FxError::UnknownVersion {
        package: "fenics-basix".to_string(),
        version: "0.5.0".to_string(),
        declared: "main, 0.9.0".to_string(),
    };
    assert_eq!(err.to_string(), "fenics-basix has no version '0.5.0'");
}

#[test]
fn test_invalid_variant_value_display() {
    let err = FxError::InvalidVariantValue {
        package: "fenics-dolfinx".to_string(),
        variant: "partitioners".to_string(),
        value: "metis".to_string(),
        allowed: "kahip, parmetis, scotch".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Invalid value 'metis' for variant 'partitioners' of fenics-dolfinx"
    );
}

#[test]
fn test_conflict_display() {
    let err = FxError::Conflict {
        package: "fenics-dolfinx".to_string(),
        message: "+slepc requires +petsc".to_string(),
    };
    assert_eq!(err.to_string(), "Conflict in fenics-dolfinx: +slepc requires +petsc");
}

#[test]
fn test_unsatisfiable_display() {
    let err = FxError::UnsatisfiableConstraint {
        dependency: "boost".to_string(),
        message: "1.90 is outside 1.70:1.80".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Unsatisfiable constraint on 'boost': 1.90 is outside 1.70:1.80"
    );
}

#[test]
fn test_missing_libraries_display() {
    let err = FxError::MissingLibraries {
        dependency: "blas".to_string(),
    };
    assert_eq!(err.to_string(), "No libraries located for dependency 'blas'");
}

#[test]
fn test_generic_error_display() {
    let err = FxError::Generic {
        message: "something broke".to_string(),
    };
    assert_eq!(err.to_string(), "something broke");
}

#[test]
fn test_io_error_from_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: FxError = io_err.into();
    assert!(matches!(err, FxError::Io(_)));
}
