//! Conflict rule evaluation and reporting.

use std::fmt;

use fxpkg_core::condition::ConditionContext;
use fxpkg_core::recipe::ConflictRule;
use fxpkg_util::errors::FxError;

/// Every conflict rule a configuration satisfies.
#[derive(Debug, Default)]
pub struct ConflictReport {
    pub violations: Vec<Violation>,
}

/// One satisfied conflict rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The rule's condition as written.
    pub rule: String,
    pub message: String,
}

impl ConflictReport {
    /// Evaluate `rules` against a configuration.
    pub fn check(rules: &[ConflictRule], ctx: &dyn ConditionContext) -> Self {
        let violations = rules
            .iter()
            .filter(|rule| rule.condition.evaluate(ctx))
            .map(|rule| Violation {
                rule: rule.condition.to_string(),
                message: rule.message.clone(),
            })
            .collect();
        Self { violations }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Fail with a conflict error naming every violated rule's message.
    pub fn into_result(self, package: &str) -> Result<(), FxError> {
        if self.is_empty() {
            return Ok(());
        }
        let messages: Vec<String> = self.violations.into_iter().map(|v| v.message).collect();
        Err(FxError::Conflict {
            package: package.to_string(),
            message: messages.join("; "),
        })
    }
}

impl fmt::Display for ConflictReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return write!(f, "No conflicts.");
        }
        writeln!(f, "Conflicts ({}):", self.violations.len())?;
        for v in &self.violations {
            writeln!(f, "  {v}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.rule, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxpkg_core::condition::Condition;
    use fxpkg_core::host::Compiler;
    use fxpkg_core::variant::VariantValue;
    use fxpkg_core::version::Version;
    use std::collections::BTreeMap;

    struct Ctx {
        version: Version,
        variants: BTreeMap<String, VariantValue>,
        compiler: Option<Compiler>,
    }

    impl ConditionContext for Ctx {
        fn version(&self) -> &Version {
            &self.version
        }
        fn variant(&self, name: &str) -> Option<&VariantValue> {
            self.variants.get(name)
        }
        fn compiler(&self) -> Option<&Compiler> {
            self.compiler.as_ref()
        }
    }

    fn rules() -> Vec<ConflictRule> {
        vec![
            ConflictRule {
                condition: Condition::parse("~petsc +slepc").unwrap(),
                message: "+slepc requires +petsc".to_string(),
            },
            ConflictRule {
                condition: Condition::parse("%gcc@:12 @0.10:").unwrap(),
                message: "needs GCC 13".to_string(),
            },
        ]
    }

    fn ctx(petsc: bool, slepc: bool, compiler: &str) -> Ctx {
        Ctx {
            version: Version::parse("0.10.0.post4").unwrap(),
            variants: BTreeMap::from([
                ("petsc".to_string(), VariantValue::Bool(petsc)),
                ("slepc".to_string(), VariantValue::Bool(slepc)),
            ]),
            compiler: Some(Compiler::parse(compiler).unwrap()),
        }
    }

    #[test]
    fn empty_report() {
        let report = ConflictReport::check(&rules(), &ctx(true, true, "gcc@13.2"));
        assert!(report.is_empty());
        assert_eq!(report.to_string(), "No conflicts.");
        assert!(report.into_result("fenics-dolfinx").is_ok());
    }

    #[test]
    fn all_violations_reported() {
        let report = ConflictReport::check(&rules(), &ctx(false, true, "gcc@12.3"));
        assert_eq!(report.len(), 2);
        assert!(report.to_string().contains("'~petsc +slepc': +slepc requires +petsc"));

        let err = report.into_result("fenics-dolfinx").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Conflict in fenics-dolfinx: +slepc requires +petsc; needs GCC 13"
        );
    }
}
