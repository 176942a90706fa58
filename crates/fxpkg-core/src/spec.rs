//! Tokenizer and parser for the spec mini-language used by recipes and requests.
//!
//! One grammar covers activation conditions (`@:0.9 +adios2`), dependency
//! specs (`boost@1.70:+timer`) and command-line requests
//! (`fenics-dolfinx@0.9.0 partitioners=parmetis %gcc@13.2`):
//!
//! ```text
//! spec    := [name] clause*
//! clause  := '@' ranges | '+' ident | '~' ident | ident '=' ['~'] values | '%' ident ['@' ranges]
//! ranges  := range (',' range)*
//! values  := value (',' value)*
//! ```

use std::fmt;

use fxpkg_util::errors::{FxError, FxResult};

use crate::version::VersionConstraint;

/// A variant clause inside a spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantClause {
    /// `+name` (enabled) or `~name` (disabled).
    Flag { name: String, enabled: bool },
    /// `name=a,b` (all present) or `name=~a` (none present).
    Values {
        name: String,
        values: Vec<String>,
        negated: bool,
    },
}

impl VariantClause {
    pub fn name(&self) -> &str {
        match self {
            Self::Flag { name, .. } | Self::Values { name, .. } => name,
        }
    }
}

impl fmt::Display for VariantClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag { name, enabled } => {
                write!(f, "{}{name}", if *enabled { '+' } else { '~' })
            }
            Self::Values {
                name,
                values,
                negated,
            } => {
                write!(f, "{name}={}{}", if *negated { "~" } else { "" }, values.join(","))
            }
        }
    }
}

/// A `%family@versions` compiler clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerClause {
    pub family: String,
    pub versions: VersionConstraint,
}

impl fmt::Display for CompilerClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.family)?;
        if !self.versions.is_any() {
            write!(f, "@{}", self.versions)?;
        }
        Ok(())
    }
}

/// The syntactic form of a spec before it is interpreted as a condition,
/// dependency or request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedSpec {
    pub name: Option<String>,
    pub versions: Option<VersionConstraint>,
    pub variants: Vec<VariantClause>,
    pub compiler: Option<CompilerClause>,
}

impl ParsedSpec {
    pub fn parse(input: &str) -> FxResult<Self> {
        Parser::new(input).parse()
    }
}

impl fmt::Display for ParsedSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        let mut head = self.name.clone().unwrap_or_default();
        if let Some(ref versions) = self.versions {
            head.push('@');
            head.push_str(&versions.to_string());
        }
        if !head.is_empty() {
            parts.push(head);
        }
        parts.extend(self.variants.iter().map(|v| v.to_string()));
        if let Some(ref compiler) = self.compiler {
            parts.push(compiler.to_string());
        }
        f.write_str(&parts.join(" "))
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

fn is_word_byte(b: u8) -> bool {
    is_ident_byte(b) || b == b'.'
}

fn is_version_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b':' | b',' | b'-' | b'_')
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, what: &str) -> FxError {
        FxError::Recipe {
            message: format!("{what} at offset {} in '{}'", self.pos, self.input),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    fn ident(&mut self, what: &str) -> FxResult<String> {
        let ident = self.take_while(is_ident_byte);
        if ident.is_empty() {
            return Err(self.error(&format!("expected {what}")));
        }
        Ok(ident.to_string())
    }

    fn versions(&mut self) -> FxResult<VersionConstraint> {
        let raw = self.take_while(is_version_byte);
        if raw.is_empty() {
            return Err(self.error("expected a version after '@'"));
        }
        VersionConstraint::parse(raw)
    }

    fn parse(mut self) -> FxResult<ParsedSpec> {
        let mut spec = ParsedSpec::default();
        let mut first = true;

        loop {
            self.take_while(|b| b.is_ascii_whitespace());
            let Some(b) = self.peek() else { break };
            match b {
                b'@' => {
                    if spec.versions.is_some() {
                        return Err(self.error("duplicate version constraint"));
                    }
                    self.pos += 1;
                    spec.versions = Some(self.versions()?);
                }
                b'+' | b'~' => {
                    self.pos += 1;
                    let name = self.ident("a variant name")?;
                    spec.variants.push(VariantClause::Flag {
                        name,
                        enabled: b == b'+',
                    });
                }
                b'%' => {
                    if spec.compiler.is_some() {
                        return Err(self.error("duplicate compiler clause"));
                    }
                    self.pos += 1;
                    let family = self.ident("a compiler name")?;
                    let versions = if self.peek() == Some(b'@') {
                        self.pos += 1;
                        self.versions()?
                    } else {
                        VersionConstraint::any()
                    };
                    spec.compiler = Some(CompilerClause { family, versions });
                }
                b if is_word_byte(b) => {
                    let word = self.take_while(is_word_byte).to_string();
                    if self.peek() == Some(b'=') {
                        self.pos += 1;
                        spec.variants.push(self.values(word)?);
                    } else if first {
                        spec.name = Some(word);
                    } else {
                        return Err(self.error(&format!("unexpected name '{word}'")));
                    }
                }
                other => {
                    return Err(self.error(&format!("unexpected character '{}'", other as char)));
                }
            }
            first = false;
        }

        Ok(spec)
    }

    fn values(&mut self, name: String) -> FxResult<VariantClause> {
        let negated = self.peek() == Some(b'~');
        if negated {
            self.pos += 1;
        }
        let raw = self.take_while(|b| !b.is_ascii_whitespace());
        let values: Vec<String> = raw
            .split(',')
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        if values.is_empty() {
            return Err(self.error(&format!("expected a value for '{name}'")));
        }
        if let Some(bad) = values.iter().find(|v| !v.bytes().all(is_word_byte)) {
            return Err(self.error(&format!("invalid value '{bad}' for '{name}'")));
        }
        Ok(VariantClause::Values {
            name,
            values,
            negated,
        })
    }
}
