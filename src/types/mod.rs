mod action;
mod error;
mod operator;
mod rule;
mod rules;
mod ruleset;
mod variable;

pub use action::{Action, InvalidAction, InvalidSeverity, Severity};
pub use error::CompileError;
pub use operator::{Operator, OperatorKind, UnknownOperator};
pub use rule::{Rule, RuleKind};
pub use rules::Rules;
pub use ruleset::{RuleSet, PHASE_COUNT};
pub use variable::{UnknownVariable, Variable, VariableKind};
