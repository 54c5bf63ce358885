mod diagnostics;
mod driver;
mod error;
mod parse;
mod types;

pub use diagnostics::Location;
pub use driver::Driver;
pub use error::PolicyError;
pub use types::{
    Action, CompileError, InvalidAction, InvalidSeverity, Operator, OperatorKind, PHASE_COUNT,
    Rule, RuleKind, RuleSet, Rules, Severity, UnknownOperator, UnknownVariable, Variable,
    VariableKind,
};
