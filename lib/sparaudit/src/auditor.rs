use crate::check::{Check, CheckContext, default_checks};
use crate::gateway::QueryGateway;
use crate::report::{AuditReport, CheckReport};
use crate::scope::Scope;
use crate::subsumption::SubsumptionResolver;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{info, warn};
use xsdlex::DatatypeValidators;

/// What an audit is allowed to do to the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuditMode {
    /// Only report the findings.
    #[default]
    ReportOnly,
    /// Report the findings then let the checks that know how to repair the data do it.
    ReportAndFix,
}

/// Options of an [`Auditor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditOptions {
    pub mode: AuditMode,
    /// Runs the checks on the rayon thread pool.
    pub parallel: bool,
    /// Uses the transitive closure of `rdfs:subClassOf` instead of the direct relations.
    pub reasoning: bool,
    /// Only runs the checks with these names.
    pub checks: Option<Vec<String>>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            mode: AuditMode::default(),
            parallel: false,
            reasoning: true,
            checks: None,
        }
    }
}

/// Runs a list of [`Check`]s on a [`Scope`].
///
/// ```
/// use oxrdf::NamedNode;
/// use sparaudit::{Auditor, Scope};
///
/// let scope = Scope::new(
///     [NamedNode::new("http://example.com/data")?],
///     [NamedNode::new("http://example.com/ontology")?],
/// );
/// let auditor = Auditor::with_default_checks(scope);
/// assert!(auditor.check_names().any(|name| name == "property-domain"));
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
pub struct Auditor {
    scope: Scope,
    checks: Vec<Box<dyn Check>>,
    options: AuditOptions,
    validators: DatatypeValidators,
}

impl Auditor {
    /// An auditor without any check.
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            checks: Vec::new(),
            options: AuditOptions::default(),
            validators: DatatypeValidators::new(),
        }
    }

    /// An auditor with the full catalogue of checks.
    pub fn with_default_checks(scope: Scope) -> Self {
        let mut auditor = Self::new(scope);
        auditor.checks = default_checks();
        auditor
    }

    #[must_use]
    pub fn with_check(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: AuditOptions) -> Self {
        self.options = options;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn options(&self) -> &AuditOptions {
        &self.options
    }

    /// The names of the registered checks, in run order.
    pub fn check_names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|check| check.name())
    }

    /// Runs the selected checks and collects their reports in check order.
    ///
    /// Gateway failures never abort the run: they are reported as warnings.
    pub fn run(&self, gateway: &dyn QueryGateway) -> AuditReport {
        let mut report = AuditReport::new();
        if self.scope.datasets().is_empty() {
            warn!("no dataset to audit");
            return report;
        }
        if let Some(selection) = &self.options.checks {
            for name in selection {
                if !self.check_names().any(|known| known == name) {
                    warn!(check = %name, "unknown check ignored");
                }
            }
        }

        let subsumption = SubsumptionResolver::new(
            self.scope.ontologies().iter().cloned(),
            self.options.reasoning,
        );
        let context = CheckContext::new(&self.scope, gateway, &subsumption, &self.validators);
        let selected = self
            .checks
            .iter()
            .filter(|check| {
                self.options
                    .checks
                    .as_ref()
                    .is_none_or(|selection| selection.iter().any(|name| name == check.name()))
            })
            .map(|check| &**check)
            .collect::<Vec<&dyn Check>>();

        let reports = if self.options.parallel {
            selected
                .par_iter()
                .map(|check| self.run_check(*check, &context))
                .collect::<Vec<_>>()
        } else {
            selected
                .iter()
                .map(|check| self.run_check(*check, &context))
                .collect()
        };
        for check in reports {
            report.push(check);
        }
        info!(
            errors = report.error_count(),
            warnings = report.warning_count(),
            "audit done"
        );
        report
    }

    fn run_check(&self, check: &dyn Check, context: &CheckContext<'_>) -> CheckReport {
        let start = Instant::now();
        info!(check = check.name(), "running check");
        let mut findings = check.run(context);
        let mut fixes = Vec::new();
        if self.options.mode == AuditMode::ReportAndFix && findings.iter().any(|f| f.is_error()) {
            let outcome = check.fix(context, &findings);
            fixes = outcome.fixes;
            findings.extend(outcome.findings);
        }
        info!(
            check = check.name(),
            findings = findings.len(),
            fixes = fixes.len(),
            duration = ?start.elapsed(),
            "check done"
        );
        CheckReport::new(
            check.name(),
            check.description(),
            self.scope.datasets().to_vec(),
            self.scope.ontologies().to_vec(),
            findings,
            fixes,
        )
    }
}
