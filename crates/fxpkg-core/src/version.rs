//! Recipe version parsing, comparison, and range matching.
//!
//! Versions use a component ordering that differs from semver:
//! - Components are split on `.`, `-`, `_` and at digit/letter boundaries
//! - Numeric components compare as numbers
//! - Suffix tags have a fixed ordering: `dev` < `alpha` < `beta` < `rc` < `post`
//! - A version with extra trailing components sorts after its prefix, so
//!   `0.10.0` < `0.10.0.post0` < `0.10.0.post4`
//! - Branch versions (`main`, `develop`, ...) sort above every release

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use fxpkg_util::errors::{FxError, FxResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Names that denote a live branch rather than a release.
const BRANCH_NAMES: &[&str] = &["main", "master", "develop", "head", "trunk"];

/// A parsed recipe version with comparable components.
#[derive(Debug, Clone)]
pub struct Version {
    original: String,
    components: Vec<Component>,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
enum Component {
    Text(String),
    Tag(Tag),
    Number(u64),
    Branch(String),
}

/// Well-known suffix tags with defined ordering.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
enum Tag {
    Dev,
    Alpha,
    Beta,
    Rc,
    Post,
}

impl Component {
    fn rank(&self) -> u8 {
        match self {
            Self::Text(_) => 0,
            Self::Tag(_) => 1,
            Self::Number(_) => 2,
            Self::Branch(_) => 3,
        }
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Tag(a), Self::Tag(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) | (Self::Branch(a), Self::Branch(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Version {
    /// Parse a version string such as `0.10.0.post4` or `main`.
    pub fn parse(version: &str) -> FxResult<Self> {
        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Err(FxError::Recipe {
                message: "empty version".to_string(),
            });
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(FxError::Recipe {
                message: format!("invalid character '{bad}' in version '{trimmed}'"),
            });
        }

        let lowered = trimmed.to_ascii_lowercase();
        let components = if BRANCH_NAMES.contains(&lowered.as_str()) {
            vec![Component::Branch(lowered)]
        } else {
            split_components(trimmed)?
        };
        if components.is_empty() {
            return Err(FxError::Recipe {
                message: format!("version '{trimmed}' has no components"),
            });
        }
        Ok(Self {
            original: trimmed.to_string(),
            components,
        })
    }

    /// The version exactly as written in the recipe.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Whether this version names a live branch instead of a release.
    pub fn is_branch(&self) -> bool {
        matches!(self.components.as_slice(), [Component::Branch(_)])
    }

    /// Whether every component of `self` matches the leading components of `other`.
    ///
    /// `0.10` is a prefix of `0.10.0.post4`.
    pub fn is_prefix_of(&self, other: &Version) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a == b)
    }
}

fn split_components(version: &str) -> FxResult<Vec<Component>> {
    let mut components = Vec::new();
    let mut current = String::new();

    for ch in version.chars() {
        if matches!(ch, '.' | '-' | '_') {
            flush(&mut current, &mut components)?;
            continue;
        }
        let boundary = current
            .chars()
            .last()
            .is_some_and(|last| last.is_ascii_digit() != ch.is_ascii_digit());
        if boundary {
            flush(&mut current, &mut components)?;
        }
        current.push(ch);
    }
    flush(&mut current, &mut components)?;
    Ok(components)
}

fn flush(current: &mut String, components: &mut Vec<Component>) -> FxResult<()> {
    if !current.is_empty() {
        components.push(classify(current)?);
        current.clear();
    }
    Ok(())
}

fn classify(token: &str) -> FxResult<Component> {
    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token
            .parse::<u64>()
            .map(Component::Number)
            .map_err(|_| FxError::Recipe {
                message: format!("numeric component '{token}' in version is too large"),
            });
    }
    let component = match token.to_ascii_lowercase().as_str() {
        "dev" => Component::Tag(Tag::Dev),
        "a" | "alpha" => Component::Tag(Tag::Alpha),
        "b" | "beta" => Component::Tag(Tag::Beta),
        "rc" | "c" => Component::Tag(Tag::Rc),
        "post" => Component::Tag(Tag::Post),
        other => Component::Text(other.to_string()),
    };
    Ok(component)
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for Version {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.original)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// An inclusive version range: `1.70:`, `:1.80`, `1.70:1.80`, or exact `0.10`.
///
/// The upper bound matches by prefix, so `:0.8` contains `0.8.5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub lower: Option<Version>,
    pub upper: Option<Version>,
}

impl VersionRange {
    /// The unbounded range `:`.
    pub fn any() -> Self {
        Self {
            lower: None,
            upper: None,
        }
    }

    /// A range containing `version` and every version it prefixes.
    pub fn exact(version: Version) -> Self {
        Self {
            lower: Some(version.clone()),
            upper: Some(version),
        }
    }

    /// Parse one range expression (no `,` alternatives).
    pub fn parse(spec: &str) -> FxResult<Self> {
        let s = spec.trim();
        let bound = |part: &str| -> FxResult<Option<Version>> {
            let part = part.trim();
            if part.is_empty() {
                Ok(None)
            } else {
                Version::parse(part).map(Some)
            }
        };
        match s.split_once(':') {
            Some((lower, upper)) => {
                if upper.contains(':') {
                    return Err(FxError::Recipe {
                        message: format!("malformed version range '{s}'"),
                    });
                }
                Ok(Self {
                    lower: bound(lower)?,
                    upper: bound(upper)?,
                })
            }
            None => Ok(Self::exact(Version::parse(s)?)),
        }
    }

    /// Check if a version satisfies this range.
    pub fn contains(&self, version: &Version) -> bool {
        if let Some(ref lower) = self.lower {
            if version < lower {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            if version > upper && !upper.is_prefix_of(version) {
                return false;
            }
        }
        true
    }

    /// The single version this range pins, if it was written as `@x`.
    pub fn as_exact(&self) -> Option<&Version> {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) if lower == upper => Some(lower),
            _ => None,
        }
    }

    /// The overlap of two ranges, or `None` when they are disjoint.
    pub fn intersect(&self, other: &VersionRange) -> Option<VersionRange> {
        let lower = match (&self.lower, &other.lower) {
            (Some(a), Some(b)) => Some(a.max(b).clone()),
            (a, b) => a.clone().or_else(|| b.clone()),
        };
        let upper = match (&self.upper, &other.upper) {
            (Some(a), Some(b)) => Some(if upper_at_most(a, b) { a } else { b }.clone()),
            (a, b) => a.clone().or_else(|| b.clone()),
        };
        let range = VersionRange { lower, upper };
        match range.lower {
            Some(ref lower) if !range.contains(lower) => None,
            _ => Some(range),
        }
    }
}

/// Whether upper bound `a` admits no more versions than upper bound `b`.
fn upper_at_most(a: &Version, b: &Version) -> bool {
    if a.is_prefix_of(b) {
        // `:0.8` admits all of `0.8.*`, so it is only as tight as `:0.8.5` when equal.
        return b.is_prefix_of(a);
    }
    b.is_prefix_of(a) || a < b
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(exact) = self.as_exact() {
            return write!(f, "{exact}");
        }
        if let Some(ref lower) = self.lower {
            write!(f, "{lower}")?;
        }
        f.write_str(":")?;
        if let Some(ref upper) = self.upper {
            write!(f, "{upper}")?;
        }
        Ok(())
    }
}

/// A union of version ranges, written `0.6:0.7,0.9:`.
///
/// An empty union admits nothing; [`VersionConstraint::any`] admits everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
    ranges: Vec<VersionRange>,
}

impl VersionConstraint {
    pub fn any() -> Self {
        Self {
            ranges: vec![VersionRange::any()],
        }
    }

    pub fn from_range(range: VersionRange) -> Self {
        Self {
            ranges: vec![range],
        }
    }

    /// Parse a comma-separated list of ranges.
    pub fn parse(spec: &str) -> FxResult<Self> {
        let ranges = spec
            .split(',')
            .map(VersionRange::parse)
            .collect::<FxResult<Vec<_>>>()?;
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[VersionRange] {
        &self.ranges
    }

    pub fn contains(&self, version: &Version) -> bool {
        self.ranges.iter().any(|r| r.contains(version))
    }

    /// Whether this constraint places no restriction at all.
    pub fn is_any(&self) -> bool {
        self.ranges.iter().any(|r| r.lower.is_none() && r.upper.is_none())
    }

    /// Whether no version can satisfy this constraint.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Conjoin two constraints: a version must satisfy both.
    pub fn intersect(&self, other: &VersionConstraint) -> VersionConstraint {
        let mut ranges = Vec::new();
        for a in &self.ranges {
            for b in &other.ranges {
                if let Some(range) = a.intersect(b) {
                    if !ranges.contains(&range) {
                        ranges.push(range);
                    }
                }
            }
        }
        VersionConstraint { ranges }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        f.write_str(&parts.join(","))
    }
}
