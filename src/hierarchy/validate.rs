//! Lattice validation and health checking.
//!
//! Verifies that a [`Hierarchy`] implementation honors the addressing contract:
//! - sizes grow strictly with resolution
//! - every child range has `fanout` members whose parent is the range owner
//! - consecutive child ranges tile the next resolution with no gaps
//! - the last child range ends exactly at `size(resl + 1)`
//! - resolution 0 resolves at least one sample
//!
//! Checks run over a bounded probe of addresses, so they stay cheap on lattices
//! with billions of addresses at depth.
//!
//! # Example
//!
//! ```rust
//! use zlattice::hierarchy::{CartHier, HealthCheck};
//!
//! let h = CartHier::<2, f64>::new([0.0; 2], [1.0; 2], [3, 3]).unwrap();
//! let report = h.health_check();
//! assert!(report.is_healthy(), "{}", report);
//! ```

use std::collections::HashMap;

use super::traits::Hierarchy;
use crate::zorder::Address;

/// Addresses probed per resolution, taken from each end of the range.
const PROBE: u64 = 256;
/// Deepest resolution probed.
const PROBE_RESL: u32 = 4;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational, not a problem.
    Info,
    /// Something unusual but not necessarily wrong.
    Warning,
    /// A contract violation.
    Error,
    /// The lattice cannot be traversed at all.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single validation issue found during a health check.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Resolution the issue was found at.
    pub resl: Option<u32>,
    /// Address involved.
    pub index: Option<u64>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            resl: None,
            index: None,
        }
    }

    /// Attach the resolution.
    pub fn at_resl(mut self, resl: u32) -> Self {
        self.resl = Some(resl);
        self
    }

    /// Attach the address.
    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)?;
        if let Some(resl) = self.resl {
            write!(f, " (resl {})", resl)?;
        }
        if let Some(index) = self.index {
            write!(f, " (index {})", index)?;
        }
        Ok(())
    }
}

/// Issues collected by a validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All issues found.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Add an info-level issue.
    pub fn info(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Info, message));
    }

    /// Add a warning-level issue.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Warning, message));
    }

    /// Add a critical-level issue.
    pub fn critical(&mut self, message: impl Into<String>) {
        self.add(ValidationIssue::new(Severity::Critical, message));
    }

    /// True if nothing at error level or above was found.
    pub fn is_healthy(&self) -> bool {
        !self.issues.iter().any(|i| i.severity >= Severity::Error)
    }

    /// True if nothing at all was found.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues of a specific severity or higher.
    pub fn issues_at_level(&self, min_severity: Severity) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity >= min_severity)
            .collect()
    }

    /// Count issues by severity.
    pub fn counts(&self) -> HashMap<Severity, usize> {
        let mut counts = HashMap::new();
        for issue in &self.issues {
            *counts.entry(issue.severity).or_default() += 1;
        }
        counts
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_clean() {
            return write!(f, "Validation passed: no issues found");
        }

        let counts = self.counts();
        write!(f, "Validation report: ")?;

        let parts: Vec<String> = [
            (Severity::Critical, "critical"),
            (Severity::Error, "errors"),
            (Severity::Warning, "warnings"),
            (Severity::Info, "info"),
        ]
        .iter()
        .filter_map(|(sev, name)| counts.get(sev).map(|c| format!("{} {}", c, name)))
        .collect();

        writeln!(f, "{}", parts.join(", "))?;

        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }

        Ok(())
    }
}

/// Health report with lattice statistics.
#[derive(Debug, Clone)]
pub struct HealthReport {
    /// Validation issues.
    pub validation: ValidationReport,
    /// Coarse cell count.
    pub ncell: u64,
    /// Deepest resolution.
    pub max_resl: u32,
    /// Children per parent.
    pub fanout: u64,
    /// Resolutions whose child ranges were probed.
    pub probed_resls: u32,
    /// Fraction of probed resolution-0 addresses that resolve to a value.
    pub valid_fraction: f64,
}

impl HealthReport {
    /// Check if the lattice is healthy (no errors or critical issues).
    pub fn is_healthy(&self) -> bool {
        self.validation.is_healthy()
    }
}

impl std::fmt::Display for HealthReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Lattice Health Report")?;
        writeln!(f, "=====================")?;
        writeln!(f, "Cells: {} (fanout {})", self.ncell, self.fanout)?;
        writeln!(f, "Max resl: {} ({} probed)", self.max_resl, self.probed_resls)?;
        writeln!(f, "Valid at resl 0: {:.1}%", self.valid_fraction * 100.0)?;
        writeln!(f)?;
        write!(f, "{}", self.validation)
    }
}

/// Types that can be health-checked.
pub trait HealthCheck {
    /// Perform a health check and return a report.
    fn health_check(&self) -> HealthReport;

    /// Health check that logs each problem and returns whether it passed.
    fn sanity_check(&self) -> bool {
        let report = self.health_check();
        for issue in report.validation.issues_at_level(Severity::Warning) {
            tracing::warn!(%issue, "lattice sanity check");
        }
        report.is_healthy()
    }
}

impl<H: Hierarchy> HealthCheck for H {
    fn health_check(&self) -> HealthReport {
        let mut validation = ValidationReport::new();
        let ncell = self.ncell().to_u64_lossless();
        let max_resl = self.max_resl();

        if ncell == 0 {
            validation.critical("lattice has no cells");
        }
        if max_resl == 0 {
            validation.warn("lattice cannot be refined (max_resl is 0)");
        }

        for resl in 0..max_resl {
            let (cur, next) = (self.size(resl), self.size(resl + 1));
            if next <= cur {
                validation.add(
                    ValidationIssue::new(
                        Severity::Error,
                        format!("size does not grow: {} -> {}", cur, next),
                    )
                    .at_resl(resl + 1),
                );
            }
        }

        let probed_resls = max_resl.min(PROBE_RESL);
        for resl in 0..probed_resls {
            check_children(self, resl, &mut validation);
        }

        let probe = probe_indices(ncell);
        let nvalid = probe
            .iter()
            .filter(|&&i| self.get_value(0, H::Index::from_u64_truncating(i)).is_some())
            .count();
        let valid_fraction = if probe.is_empty() {
            0.0
        } else {
            nvalid as f64 / probe.len() as f64
        };
        if ncell > 0 && nvalid == 0 {
            validation.add(
                ValidationIssue::new(Severity::Error, "no probed address resolves to a value")
                    .at_resl(0),
            );
        } else if nvalid < probe.len() {
            validation.info(format!(
                "{} of {} probed coarse addresses are invalid",
                probe.len() - nvalid,
                probe.len()
            ));
        }

        HealthReport {
            validation,
            ncell,
            max_resl,
            fanout: self.fanout(),
            probed_resls,
            valid_fraction,
        }
    }
}

/// Up to `2 * PROBE` addresses from the two ends of `[0, size)`.
fn probe_indices(size: u64) -> Vec<u64> {
    if size <= 2 * PROBE {
        return (0..size).collect();
    }
    (0..PROBE).chain(size - PROBE..size).collect()
}

fn check_children<H: Hierarchy + ?Sized>(h: &H, resl: u32, report: &mut ValidationReport) {
    let size = h.size(resl).to_u64_lossless();
    let next_size = h.size(resl + 1).to_u64_lossless();
    let fanout = h.fanout();
    let mut prev_end: Option<(u64, u64)> = None;

    for index in probe_indices(size) {
        let i = H::Index::from_u64_truncating(index);
        let begin = h.child_of_begin(i).to_u64_lossless();
        let end = h.child_of_end(i).to_u64_lossless();

        if end.wrapping_sub(begin) != fanout {
            report.add(
                ValidationIssue::new(
                    Severity::Error,
                    format!("child range [{}, {}) does not hold {} children", begin, end, fanout),
                )
                .at_resl(resl)
                .with_index(index),
            );
            continue;
        }
        if let Some((prev, prev_end)) = prev_end {
            if prev + 1 == index && prev_end != begin {
                report.add(
                    ValidationIssue::new(
                        Severity::Error,
                        format!("child ranges leave a gap or overlap at {}", begin),
                    )
                    .at_resl(resl)
                    .with_index(index),
                );
            }
        }
        if index == 0 && begin != 0 {
            report.add(
                ValidationIssue::new(Severity::Error, "first child range does not start at 0")
                    .at_resl(resl),
            );
        }
        if index + 1 == size && end != next_size {
            report.add(
                ValidationIssue::new(
                    Severity::Error,
                    format!("child ranges end at {} but size is {}", end, next_size),
                )
                .at_resl(resl + 1),
            );
        }
        for child in begin..end {
            let parent = h.parent_of(H::Index::from_u64_truncating(child));
            if parent != i {
                report.add(
                    ValidationIssue::new(
                        Severity::Error,
                        format!("child {} names parent {}", child, parent),
                    )
                    .at_resl(resl)
                    .with_index(index),
                );
            }
        }
        prev_end = Some((index, end));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use super::*;
    use crate::hierarchy::{CartHier, StubHier};
    use crate::transform::Vector;
    use proptest::prelude::*;

    /// Breaks the child layout on purpose.
    struct Shifted(StubHier<2>);

    impl Hierarchy for Shifted {
        type Index = u64;
        type Value = Vector<f64, 1>;
        const FULL_DIM: u32 = 2;

        fn ncell(&self) -> u64 {
            self.0.ncell()
        }
        fn max_resl(&self) -> u32 {
            self.0.max_resl()
        }
        fn get_value(&self, resl: u32, index: u64) -> Option<Vector<f64, 1>> {
            self.0.get_value(resl, index)
        }
        fn child_of_begin(&self, index: u64) -> u64 {
            (index << 2) + 1
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_validation_report_healthy() {
        let mut report = ValidationReport::new();
        report.info("Just some info");
        report.warn("A warning");

        assert!(report.is_healthy());

        report.add(ValidationIssue::new(Severity::Error, "An error").at_resl(2));
        assert!(!report.is_healthy());
        assert_eq!(report.issues_at_level(Severity::Warning).len(), 2);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue::new(Severity::Error, "Something wrong")
            .at_resl(3)
            .with_index(42);

        let s = format!("{}", issue);
        assert!(s.contains("ERROR"));
        assert!(s.contains("Something wrong"));
        assert!(s.contains("resl 3"));
        assert!(s.contains("42"));
    }

    #[test]
    fn test_stub_is_healthy() {
        let h = StubHier::<3>::new(5).unwrap().invalid_every(3);
        let report = h.health_check();
        assert!(report.is_healthy(), "{}", report);
        assert_eq!(report.fanout, 8);
        assert_eq!(report.probed_resls, PROBE_RESL);
        assert!(report.valid_fraction < 1.0);
        assert!(h.sanity_check());
    }

    #[test]
    fn test_broken_children_detected() {
        let h = Shifted(StubHier::<2>::new(2).unwrap());
        let report = h.health_check();
        assert!(!report.is_healthy());
        assert!(report.validation.issues.iter().any(|i| i.message.contains("children")));
        assert!(!h.sanity_check());
    }

    #[test]
    fn test_unrefinable_lattice_warns() {
        let h = StubHier::<1>::new(3).unwrap().with_max_resl(0).unwrap();
        let report = h.health_check();
        assert!(report.is_healthy());
        assert_eq!(report.validation.issues_at_level(Severity::Warning).len(), 1);
    }

    #[test]
    fn test_large_lattice_probe_is_bounded() {
        let h = StubHier::<6>::new(100_000).unwrap();
        assert_eq!(probe_indices(h.ncell()).len(), 2 * PROBE as usize);
        assert!(h.health_check().is_healthy());
    }

    proptest! {
        #[test]
        fn cart_hier_is_healthy(
            bs in proptest::array::uniform3(1u64..20),
            extent in 0.1f64..100.0,
        ) {
            let h = CartHier::<3, f64>::new([-extent; 3], [extent; 3], bs).unwrap();
            let report = h.health_check();
            prop_assert!(report.is_healthy(), "{}", report);
            prop_assert_eq!(report.valid_fraction, 1.0);
        }
    }
}
