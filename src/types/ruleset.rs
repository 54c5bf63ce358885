use std::fmt;
use std::fmt::Write as _;
use std::path::Path;

use super::rule::Rule;
use super::rules::Rules;
use crate::driver::Driver;
use crate::error::PolicyError;

/// Number of evaluation phases a policy is divided into.
///
/// Phase indices are zero-based internally; SecLang's `phase:N` action is
/// one-based, so `phase:1` files a rule under index 0.
pub const PHASE_COUNT: usize = 5;

/// All rules of a compiled policy, separated by phase.
///
/// Each phase holds an ordered [`Rules`] collection; within a phase,
/// declaration order is evaluation order.
///
/// # Example
///
/// ```
/// use palisade::RuleSet;
///
/// let rules = RuleSet::from_seclang(
///     r#"SecRule ARGS "@rx attack" "id:1001,phase:1,deny,status:403""#,
/// )?;
/// assert_eq!(rules.phase(0).map(|phase| phase.len()), Some(1));
/// # Ok::<(), palisade::PolicyError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    phases: [Rules; PHASE_COUNT],
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse SecLang text and compile it into a `RuleSet`.
    ///
    /// This is a convenience wrapper around [`Driver`]; parse with a driver
    /// directly to compile several sources into one set or to inspect
    /// diagnostics incrementally.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] carrying the accumulated diagnostic text when
    /// the input fails to compile.
    pub fn from_seclang(input: &str) -> Result<Self, PolicyError> {
        let mut driver = Driver::new();
        if driver.parse(input, "") {
            Ok(driver.into_rules())
        } else {
            Err(PolicyError::new(driver.diagnostics()))
        }
    }

    /// Read a SecLang file and compile it into a `RuleSet`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] on I/O or compilation failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let mut driver = Driver::new();
        if driver.parse_file(path) {
            Ok(driver.into_rules())
        } else {
            Err(PolicyError::new(driver.diagnostics()))
        }
    }

    /// Files a rule under its phase. Returns `false`, leaving the set
    /// untouched, when the rule's phase is out of range.
    pub fn insert(&mut self, rule: Rule) -> bool {
        match self.phases.get_mut(rule.phase) {
            Some(rules) => {
                rules.insert(rule);
                true
            }
            None => false,
        }
    }

    /// The rules of one phase, or `None` when `phase` is out of range.
    #[must_use]
    pub fn phase(&self, phase: usize) -> Option<&Rules> {
        self.phases.get(phase)
    }

    pub(crate) fn phase_mut(&mut self, phase: usize) -> Option<&mut Rules> {
        self.phases.get_mut(phase)
    }

    /// Iterates the phases in evaluation order.
    pub fn phases(&self) -> impl Iterator<Item = &Rules> {
        self.phases.iter()
    }

    /// Total number of rules across all phases. Chained continuations live
    /// inside their starter and are not counted.
    pub fn len(&self) -> usize {
        self.phases.iter().map(Rules::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(Rules::is_empty)
    }

    /// Merges a clone of `other` into this set, phase by phase.
    ///
    /// Each phase pair merges with [`Rules::append`] semantics. Phases merge
    /// in order and a collision aborts at the offending phase, so phases
    /// before it remain merged. Returns the total number of appended rules,
    /// or the first colliding id.
    ///
    /// `excluded` must be sorted ascending.
    pub fn append(
        &mut self,
        other: &RuleSet,
        excluded: &[i64],
        mut sink: Option<&mut String>,
    ) -> Result<usize, i64> {
        let mut appended = 0;
        for phase in 0..PHASE_COUNT {
            appended += self.phases[phase].append(&other.phases[phase], excluded, sink.as_deref_mut())?;
        }
        Ok(appended)
    }

    /// Renders every phase and its rules, for debugging and tooling.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (index, rules) in self.phases.iter().enumerate() {
            let _ = writeln!(out, "Phase: {index} ({} rules)", rules.len());
            out.push_str(&rules.dump());
        }
        out
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleSet({} rules, {} phases)", self.len(), PHASE_COUNT)
    }
}
