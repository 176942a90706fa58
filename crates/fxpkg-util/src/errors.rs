use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all fxpkg operations.
#[derive(Debug, Error, Diagnostic)]
pub enum FxError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed recipe file, condition or dependency spec.
    #[error("Recipe error: {message}")]
    #[diagnostic(help("Check the recipe TOML for typos in conditions and specs"))]
    Recipe { message: String },

    /// Invalid global or project configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.fxpkg/config.toml and the nearest Fxpkg.toml"))]
    Config { message: String },

    /// No recipe with the requested name.
    #[error("Unknown package '{name}'")]
    #[diagnostic(help("Run `fxpkg list` to see the available recipes"))]
    UnknownPackage { name: String },

    /// The requested version is not declared by the recipe.
    #[error("{package} has no version '{version}'")]
    #[diagnostic(help("Declared versions: {declared}"))]
    UnknownVersion {
        package: String,
        version: String,
        declared: String,
    },

    /// A variant value outside the declared value set, or an unknown variant.
    #[error("Invalid value '{value}' for variant '{variant}' of {package}")]
    #[diagnostic(help("Allowed: {allowed}"))]
    InvalidVariantValue {
        package: String,
        variant: String,
        value: String,
        allowed: String,
    },

    /// A declared conflict rule is satisfied by the configuration.
    #[error("Conflict in {package}: {message}")]
    Conflict { package: String, message: String },

    /// The conjoined constraints on one dependency admit no configuration.
    #[error("Unsatisfiable constraint on '{dependency}': {message}")]
    UnsatisfiableConstraint { dependency: String, message: String },

    /// A library-path build argument names a dependency with no located libraries.
    #[error("No libraries located for dependency '{dependency}'")]
    #[diagnostic(help("Pass --libs {dependency}=PATH or add [deps.{dependency}] libs to Fxpkg.toml"))]
    MissingLibraries { dependency: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Result type for library code that callers match on.
pub type FxResult<T> = Result<T, FxError>;
