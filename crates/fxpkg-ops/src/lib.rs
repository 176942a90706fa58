//! Operations behind each `fxpkg` command.
//!
//! Every operation runs against an [`ops_context::OpsContext`]: the recipe
//! repository plus the host facts layered from configuration and flags.
//! Operations return data or rendered text; printing is left to the CLI.

pub mod ops_context;
pub mod ops_info;
pub mod ops_list;
pub mod ops_resolve;
pub mod ops_tree;

use fxpkg_util::errors::FxError;

/// How an operation's result is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Pretty-printed JSON with a trailing newline.
pub(crate) fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> miette::Result<String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| FxError::Generic {
        message: format!("failed to serialize output: {e}"),
    })?;
    Ok(json + "\n")
}
