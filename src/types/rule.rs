use std::fmt;
use std::path::PathBuf;

use super::action::{Action, Severity};
use super::operator::Operator;
use super::variable::Variable;

/// Phase index assigned to rules that carry no `phase` action (SecLang
/// phase 2, the request body phase).
pub(crate) const DEFAULT_PHASE: usize = 1;

/// What a rule matches on.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// `SecRule`: a variable list tested against an operator.
    Detection {
        variables: Vec<Variable>,
        operator: Operator,
    },
    /// `SecAction`: always matches; exists for its actions.
    Unconditional,
    /// `SecMarker`: a named jump target for `skipAfter`.
    Marker { name: String },
    /// `SecRuleScript`: matching delegated to an external script.
    Script { path: PathBuf },
}

/// A single compiled rule.
///
/// Rules are usually produced by parsing SecLang text with a
/// [`Driver`](crate::Driver), which digests the action list into the fields
/// below before filing the rule under its phase. The full action list is kept
/// in declaration order for the evaluation engine; `chain` holds the chained
/// continuation rules in the order they appeared, and is empty for everything
/// but a chain starter.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// Rule id from the `id` action; 0 means no id was declared.
    pub id: i64,
    /// Zero-based phase index, always below
    /// [`PHASE_COUNT`](super::PHASE_COUNT) once the rule is accepted.
    pub phase: usize,
    /// Whether a `chain` action announced a continuation rule.
    pub chained: bool,
    /// Whether any action in the list is disruptive.
    pub has_disruptive_action: bool,
    pub severity: Option<Severity>,
    pub msg: Option<String>,
    pub tags: Vec<String>,
    /// Configuration source this rule came from.
    pub file: String,
    /// Line within `file` where the directive ended.
    pub line: usize,
    pub actions: Vec<Action>,
    pub kind: RuleKind,
    pub chain: Vec<Rule>,
}

impl Rule {
    /// Builds a rule and digests its action list.
    pub fn new(kind: RuleKind, actions: Vec<Action>, file: impl Into<String>, line: usize) -> Self {
        let mut rule = Rule {
            id: 0,
            phase: DEFAULT_PHASE,
            chained: false,
            has_disruptive_action: false,
            severity: None,
            msg: None,
            tags: Vec::new(),
            file: file.into(),
            line,
            actions: Vec::new(),
            kind,
            chain: Vec::new(),
        };
        for action in &actions {
            if action.is_disruptive() {
                rule.has_disruptive_action = true;
            }
            match action {
                Action::Id(id) => rule.id = *id,
                Action::Phase(phase) => rule.phase = *phase,
                Action::Chain => rule.chained = true,
                Action::Severity(severity) => rule.severity = Some(*severity),
                Action::Msg(msg) => rule.msg = Some(msg.clone()),
                Action::Tag(tag) => rule.tags.push(tag.clone()),
                _ => {}
            }
        }
        rule.actions = actions;
        rule
    }

    /// Builds one phase-local marker rule. `SecMarker` fans a marker out to
    /// every phase so that `skipAfter` can land on it wherever evaluation is.
    pub fn marker(name: impl Into<String>, phase: usize, file: impl Into<String>, line: usize) -> Self {
        Rule {
            id: 0,
            phase,
            chained: false,
            has_disruptive_action: false,
            severity: None,
            msg: None,
            tags: Vec::new(),
            file: file.into(),
            line,
            actions: Vec::new(),
            kind: RuleKind::Marker { name: name.into() },
            chain: Vec::new(),
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self.kind, RuleKind::Marker { .. })
    }

    /// The marker name, for marker rules.
    pub fn marker_name(&self) -> Option<&str> {
        match &self.kind {
            RuleKind::Marker { name } => Some(name),
            _ => None,
        }
    }

    /// The rule a further chain continuation would attach behind: the last
    /// chained continuation, or the starter itself while the chain is empty.
    pub fn chain_tail(&self) -> &Rule {
        self.chain.last().unwrap_or(self)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RuleKind::Detection {
                variables,
                operator,
            } => {
                let variables = variables
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("|");
                write!(f, "SecRule {variables} \"{operator}\"")?;
            }
            RuleKind::Unconditional => f.write_str("SecAction")?,
            RuleKind::Marker { name } => write!(f, "SecMarker \"{name}\"")?,
            RuleKind::Script { path } => write!(f, "SecRuleScript {}", path.display())?,
        }
        if !self.file.is_empty() {
            write!(f, " at {}:{}", self.file, self.line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::{OperatorKind, VariableKind};
    use super::*;

    fn detection() -> RuleKind {
        RuleKind::Detection {
            variables: vec![Variable::new(VariableKind::Args)],
            operator: Operator {
                negated: false,
                kind: OperatorKind::Rx,
                argument: "attack".into(),
            },
        }
    }

    #[test]
    fn defaults_without_actions() {
        let rule = Rule::new(detection(), Vec::new(), "test.conf", 3);
        assert_eq!(rule.id, 0);
        assert_eq!(rule.phase, DEFAULT_PHASE);
        assert!(!rule.chained);
        assert!(!rule.has_disruptive_action);
        assert!(rule.chain.is_empty());
    }

    #[test]
    fn digests_metadata_actions() {
        let actions = vec![
            Action::Id(950001),
            Action::Phase(0),
            Action::Severity(Severity::Critical),
            Action::Msg("sqli".into()),
            Action::Tag("attack-sqli".into()),
            Action::Tag("OWASP".into()),
            Action::Deny,
        ];
        let rule = Rule::new(detection(), actions, "test.conf", 9);
        assert_eq!(rule.id, 950001);
        assert_eq!(rule.phase, 0);
        assert_eq!(rule.severity, Some(Severity::Critical));
        assert_eq!(rule.msg.as_deref(), Some("sqli"));
        assert_eq!(rule.tags, vec!["attack-sqli", "OWASP"]);
        assert!(rule.has_disruptive_action);
        assert_eq!(rule.actions.len(), 7);
    }

    #[test]
    fn chain_action_sets_flag() {
        let rule = Rule::new(detection(), vec![Action::Id(1), Action::Chain], "t", 1);
        assert!(rule.chained);
    }

    #[test]
    fn marker_rules_have_no_id() {
        let marker = Rule::marker("BEGIN_XSS", 2, "markers.conf", 14);
        assert_eq!(marker.id, 0);
        assert_eq!(marker.phase, 2);
        assert!(marker.is_marker());
        assert_eq!(marker.marker_name(), Some("BEGIN_XSS"));
    }

    #[test]
    fn chain_tail_follows_continuations() {
        let mut starter = Rule::new(detection(), vec![Action::Id(7), Action::Chain], "t", 1);
        assert_eq!(starter.chain_tail().id, 7);

        let child = Rule::new(detection(), vec![Action::Chain], "t", 2);
        starter.chain.push(child);
        assert!(starter.chain_tail().chained);

        let last = Rule::new(detection(), Vec::new(), "t", 3);
        starter.chain.push(last);
        assert!(!starter.chain_tail().chained);
    }

    #[test]
    fn display_names_the_directive() {
        let rule = Rule::new(detection(), Vec::new(), "waf.conf", 12);
        assert_eq!(rule.to_string(), "SecRule ARGS \"@rx attack\" at waf.conf:12");

        let marker = Rule::marker("END", 0, "", 0);
        assert_eq!(marker.to_string(), "SecMarker \"END\"");
    }
}
