use std::fs;
use std::path::Path;

use crate::diagnostics::{Diagnostics, Location};
use crate::parse;
use crate::types::{CompileError, Rule, RuleSet, Rules, PHASE_COUNT};

/// Reference recorded for diagnostics when `parse` is given an empty
/// reference name.
pub(crate) const REFERENCE_MISSING: &str = "<<reference missing or not informed>>";

/// Position of a chain starter within the rule set, tracked so a following
/// `chain` continuation knows where to attach.
#[derive(Debug, Clone, Copy)]
struct ChainAnchor {
    phase: usize,
    index: usize,
}

/// One policy compilation session.
///
/// A driver accumulates rules across any number of [`parse`](Driver::parse)
/// and [`parse_file`](Driver::parse_file) calls, validating each directive as
/// the scanner hands it over and filing accepted rules under their phase.
/// Failed validations leave already-accepted rules in place; a `false` result
/// means the policy is not safely usable and [`diagnostics`](Driver::diagnostics)
/// explains why.
///
/// A driver compiles one policy; compiling another policy wants a fresh
/// driver, both for the duplicate-id scope and because the diagnostic buffer
/// is never cleared.
///
/// # Example
///
/// ```
/// use palisade::Driver;
///
/// let mut driver = Driver::new();
/// let ok = driver.parse(
///     r#"SecRule REQUEST_URI "@contains /etc/passwd" "id:4001,phase:1,deny""#,
///     "inline",
/// );
/// assert!(ok);
/// assert_eq!(driver.rules().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Driver {
    rules: RuleSet,
    last_rule: Option<ChainAnchor>,
    locations: Vec<Location>,
    references: Vec<String>,
    diagnostics: Diagnostics,
}

impl Driver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles SecLang text into this driver's rule set.
    ///
    /// `reference` names the source in diagnostics (typically a file path);
    /// when empty, a `<<reference missing or not informed>>` placeholder is
    /// recorded instead. Returns whether the text compiled without errors.
    /// Empty input is a hard failure, not an empty success.
    pub fn parse(&mut self, input: &str, reference: &str) -> bool {
        self.last_rule = None;
        self.locations.push(Location::default());
        let reference = if reference.is_empty() {
            REFERENCE_MISSING
        } else {
            reference
        };
        self.references.push(reference.to_owned());

        if input.is_empty() {
            self.record(&CompileError::EmptySource);
            return false;
        }
        parse::scan(self, input)
    }

    /// Reads a file and compiles it via [`parse`](Driver::parse), with the
    /// path as the diagnostic reference.
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if !path.is_file() {
            self.record(&CompileError::FileOpen {
                path: path.display().to_string(),
            });
            return false;
        }
        match fs::read_to_string(path) {
            Ok(contents) => {
                let reference = path.display().to_string();
                self.parse(&contents, &reference)
            }
            Err(_) => {
                self.record(&CompileError::FileOpen {
                    path: path.display().to_string(),
                });
                false
            }
        }
    }

    /// Validates and files a `SecRule`.
    ///
    /// When the previously accepted rule left a chain open, the new rule
    /// attaches to that chain instead: it inherits the starter's phase, must
    /// not carry a disruptive action, and skips the id checks entirely, so a
    /// continuation without an id is legal. A non-continuation rule must
    /// carry a non-zero id that no rule anywhere in the policy already uses.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnknownPhase`], [`CompileError::ChainDisruptive`],
    /// [`CompileError::MissingId`], or [`CompileError::DuplicateId`]; the
    /// failure is also appended to [`diagnostics`](Driver::diagnostics).
    pub fn add_sec_rule(&mut self, mut rule: Rule) -> Result<(), CompileError> {
        if rule.phase >= PHASE_COUNT {
            return Err(self.reject(CompileError::UnknownPhase { phase: rule.phase }));
        }

        if let Some(anchor) = self.last_rule {
            let chain_open = self
                .rules
                .phase(anchor.phase)
                .and_then(|rules| rules.get(anchor.index))
                .is_some_and(|starter| starter.chain_tail().chained);
            if chain_open {
                rule.phase = anchor.phase;
                if rule.has_disruptive_action {
                    return Err(self.reject(CompileError::ChainDisruptive));
                }
                if let Some(starter) = self
                    .rules
                    .phase_mut(anchor.phase)
                    .and_then(|rules| rules.get_mut(anchor.index))
                {
                    starter.chain.push(rule);
                }
                return Ok(());
            }
        }

        if rule.id == 0 {
            let error = CompileError::MissingId {
                file: rule.file.clone(),
                line: rule.line,
            };
            return Err(self.reject(error));
        }
        if self.contains_id(rule.id) {
            return Err(self.reject(CompileError::DuplicateId { id: rule.id }));
        }

        let phase = rule.phase;
        self.rules.insert(rule);
        let index = self.rules.phase(phase).map_or(0, Rules::len).saturating_sub(1);
        self.last_rule = Some(ChainAnchor { phase, index });
        Ok(())
    }

    /// Validates and files a `SecAction`.
    ///
    /// Only the phase range is checked; unconditional rules are exempt from
    /// the id checks and neither open nor continue chains.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnknownPhase`] when the phase is out of range.
    pub fn add_sec_action(&mut self, rule: Rule) -> Result<(), CompileError> {
        if rule.phase >= PHASE_COUNT {
            return Err(self.reject(CompileError::UnknownPhase { phase: rule.phase }));
        }
        self.rules.insert(rule);
        Ok(())
    }

    /// Files a `SecRuleScript` rule. Script-backed rules skip validation and
    /// are only refused when their phase cannot be routed at all.
    ///
    /// # Errors
    ///
    /// [`CompileError::UnknownPhase`] when the phase is out of range.
    pub fn add_sec_rule_script(&mut self, rule: Rule) -> Result<(), CompileError> {
        let phase = rule.phase;
        if !self.rules.insert(rule) {
            return Err(self.reject(CompileError::UnknownPhase { phase }));
        }
        Ok(())
    }

    /// Compiles a `SecMarker`: one marker rule per phase, all carrying
    /// `name`, so `skipAfter` can land on the marker from any phase.
    pub fn add_sec_marker(&mut self, name: &str) {
        let file = self.current_reference().unwrap_or_default().to_owned();
        let line = self.current_location().line;
        for phase in 0..PHASE_COUNT {
            self.rules.insert(Rule::marker(name, phase, file.clone(), line));
        }
    }

    /// Records a located grammar error. The first error recorded while the
    /// diagnostic buffer is empty also gets a `Rules error. File: ...`
    /// header; later ones are appended bare.
    pub fn error(&mut self, location: &Location, message: &str, context: &str) {
        let reference = self.references.last().map(String::as_str);
        self.diagnostics.error_at(location, reference, message, context);
    }

    /// The accumulated diagnostic text, empty when nothing failed.
    #[must_use]
    pub fn diagnostics(&self) -> String {
        self.diagnostics.render()
    }

    /// The rules compiled so far.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Consumes the driver, releasing the compiled rule set.
    #[must_use]
    pub fn into_rules(self) -> RuleSet {
        self.rules
    }

    pub(crate) fn record(&mut self, error: &CompileError) {
        self.diagnostics.append_line(&error.to_string());
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        match self.locations.last_mut() {
            Some(slot) => *slot = location,
            None => self.locations.push(location),
        }
    }

    pub(crate) fn push_frame(&mut self, reference: &str) {
        self.locations.push(Location::default());
        self.references.push(reference.to_owned());
    }

    pub(crate) fn pop_frame(&mut self) {
        self.locations.pop();
        self.references.pop();
    }

    pub(crate) fn current_reference(&self) -> Option<&str> {
        self.references.last().map(String::as_str)
    }

    fn current_location(&self) -> Location {
        self.locations.last().copied().unwrap_or_default()
    }

    fn reject(&mut self, error: CompileError) -> CompileError {
        self.record(&error);
        error
    }

    /// Policy-global id scan over every phase's top-level rules. Chained
    /// continuations are not scanned; they are addressed only through their
    /// starter.
    fn contains_id(&self, id: i64) -> bool {
        self.rules
            .phases()
            .any(|rules| rules.iter().any(|rule| rule.id == id))
    }
}
