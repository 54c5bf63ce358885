use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Alert severity attached to a rule via the `severity` action.
///
/// Severities follow the syslog convention: lower numbers are more severe.
/// Policies may spell them either numerically (`severity:2`) or by name
/// (`severity:CRITICAL`); both forms parse to the same variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    /// The numeric syslog level for this severity.
    pub fn as_number(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Emergency => "EMERGENCY",
            Severity::Alert => "ALERT",
            Severity::Critical => "CRITICAL",
            Severity::Error => "ERROR",
            Severity::Warning => "WARNING",
            Severity::Notice => "NOTICE",
            Severity::Info => "INFO",
            Severity::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid severity: {0}")]
pub struct InvalidSeverity(String);

impl FromStr for Severity {
    type Err = InvalidSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let severity = if s.eq_ignore_ascii_case("emergency") || s == "0" {
            Severity::Emergency
        } else if s.eq_ignore_ascii_case("alert") || s == "1" {
            Severity::Alert
        } else if s.eq_ignore_ascii_case("critical") || s == "2" {
            Severity::Critical
        } else if s.eq_ignore_ascii_case("error") || s == "3" {
            Severity::Error
        } else if s.eq_ignore_ascii_case("warning") || s == "4" {
            Severity::Warning
        } else if s.eq_ignore_ascii_case("notice") || s == "5" {
            Severity::Notice
        } else if s.eq_ignore_ascii_case("info") || s == "6" {
            Severity::Info
        } else if s.eq_ignore_ascii_case("debug") || s == "7" {
            Severity::Debug
        } else {
            return Err(InvalidSeverity(s.to_owned()));
        };
        Ok(severity)
    }
}

/// A single action from a rule's action list.
///
/// Actions are parsed from the comma-separated list in the third argument of
/// `SecRule` (or the only argument of `SecAction`). The compiler digests a few
/// of them into [`Rule`](super::Rule) fields (`id`, `phase`, `chain`, the
/// disruptive group) and keeps the full list in declaration order for the
/// evaluation engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // -- Disruptive ----------------------------------------------------------
    Allow,
    Block,
    Deny,
    Drop,
    Pass,
    Proxy(String),
    Redirect(String),

    // -- Metadata ------------------------------------------------------------
    Id(i64),
    Phase(usize),
    Rev(String),
    Ver(String),
    Severity(Severity),
    Msg(String),
    LogData(String),
    Tag(String),
    Maturity(u8),
    Accuracy(u8),

    // -- Flow ----------------------------------------------------------------
    Chain,
    Skip(usize),
    SkipAfter(String),

    // -- Matching ------------------------------------------------------------
    Capture,
    MultiMatch,
    Transform(String),
    Status(u16),

    // -- Logging -------------------------------------------------------------
    Log,
    NoLog,
    AuditLog,
    NoAuditLog,

    // -- State ---------------------------------------------------------------
    SetVar(String),
    SetEnv(String),
    ExpireVar(String),
    InitCol(String),
    Ctl(String),
    Exec(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidAction {
    #[error("unknown action: {0}")]
    Unknown(String),

    #[error("action '{0}' requires a value")]
    MissingValue(String),

    #[error("action '{0}' takes no value")]
    UnexpectedValue(String),

    #[error("invalid value '{value}' for action '{name}'")]
    InvalidValue { name: String, value: String },
}

impl Action {
    /// Builds an action from its SecLang name and optional `name:value`
    /// payload. Names are matched case-insensitively, mirroring the upstream
    /// scanner.
    pub fn from_parts(name: &str, value: Option<&str>) -> Result<Self, InvalidAction> {
        let lower = name.to_ascii_lowercase();
        let action = match lower.as_str() {
            "allow" => Self::bare(Action::Allow, &lower, value)?,
            "block" => Self::bare(Action::Block, &lower, value)?,
            "deny" => Self::bare(Action::Deny, &lower, value)?,
            "drop" => Self::bare(Action::Drop, &lower, value)?,
            "pass" => Self::bare(Action::Pass, &lower, value)?,
            "proxy" => Action::Proxy(Self::required(&lower, value)?.to_owned()),
            "redirect" => Action::Redirect(Self::required(&lower, value)?.to_owned()),
            "id" => Action::Id(Self::numeric(&lower, Self::required(&lower, value)?)?),
            "phase" => Action::Phase(phase_index(&lower, Self::required(&lower, value)?)?),
            "rev" => Action::Rev(Self::required(&lower, value)?.to_owned()),
            "ver" => Action::Ver(Self::required(&lower, value)?.to_owned()),
            "severity" => {
                let raw = Self::required(&lower, value)?;
                let severity = raw.parse().map_err(|_| InvalidAction::InvalidValue {
                    name: lower.clone(),
                    value: raw.to_owned(),
                })?;
                Action::Severity(severity)
            }
            "msg" => Action::Msg(Self::required(&lower, value)?.to_owned()),
            "logdata" => Action::LogData(Self::required(&lower, value)?.to_owned()),
            "tag" => Action::Tag(Self::required(&lower, value)?.to_owned()),
            "maturity" => Action::Maturity(Self::numeric(&lower, Self::required(&lower, value)?)?),
            "accuracy" => Action::Accuracy(Self::numeric(&lower, Self::required(&lower, value)?)?),
            "chain" => Self::bare(Action::Chain, &lower, value)?,
            "skip" => Action::Skip(Self::numeric(&lower, Self::required(&lower, value)?)?),
            "skipafter" => Action::SkipAfter(Self::required(&lower, value)?.to_owned()),
            "capture" => Self::bare(Action::Capture, &lower, value)?,
            "multimatch" => Self::bare(Action::MultiMatch, &lower, value)?,
            "t" => Action::Transform(Self::required(&lower, value)?.to_owned()),
            "status" => Action::Status(Self::numeric(&lower, Self::required(&lower, value)?)?),
            "log" => Self::bare(Action::Log, &lower, value)?,
            "nolog" => Self::bare(Action::NoLog, &lower, value)?,
            "auditlog" => Self::bare(Action::AuditLog, &lower, value)?,
            "noauditlog" => Self::bare(Action::NoAuditLog, &lower, value)?,
            "setvar" => Action::SetVar(Self::required(&lower, value)?.to_owned()),
            "setenv" => Action::SetEnv(Self::required(&lower, value)?.to_owned()),
            "expirevar" => Action::ExpireVar(Self::required(&lower, value)?.to_owned()),
            "initcol" => Action::InitCol(Self::required(&lower, value)?.to_owned()),
            "ctl" => Action::Ctl(Self::required(&lower, value)?.to_owned()),
            "exec" => Action::Exec(Self::required(&lower, value)?.to_owned()),
            _ => return Err(InvalidAction::Unknown(name.to_owned())),
        };
        Ok(action)
    }

    /// Whether this action decides the fate of a transaction. Disruptive
    /// actions are only legal on chain starter rules.
    pub fn is_disruptive(&self) -> bool {
        matches!(
            self,
            Action::Allow
                | Action::Block
                | Action::Deny
                | Action::Drop
                | Action::Pass
                | Action::Proxy(_)
                | Action::Redirect(_)
        )
    }

    fn bare(action: Action, name: &str, value: Option<&str>) -> Result<Action, InvalidAction> {
        match value {
            None => Ok(action),
            Some(_) => Err(InvalidAction::UnexpectedValue(name.to_owned())),
        }
    }

    fn required<'v>(name: &str, value: Option<&'v str>) -> Result<&'v str, InvalidAction> {
        value.ok_or_else(|| InvalidAction::MissingValue(name.to_owned()))
    }

    fn numeric<N: FromStr>(name: &str, value: &str) -> Result<N, InvalidAction> {
        value.parse().map_err(|_| InvalidAction::InvalidValue {
            name: name.to_owned(),
            value: value.to_owned(),
        })
    }
}

/// Maps a `phase:` payload to the zero-based phase index used internally.
///
/// Numeric payloads are one-based, so `phase:1` stores index 0. The named
/// aliases land on the phase they conventionally refer to: `request` is the
/// request body phase, `response` the response body phase, and `logging` the
/// final phase.
fn phase_index(name: &str, value: &str) -> Result<usize, InvalidAction> {
    let invalid = || InvalidAction::InvalidValue {
        name: name.to_owned(),
        value: value.to_owned(),
    };
    if value.eq_ignore_ascii_case("request") {
        return Ok(1);
    }
    if value.eq_ignore_ascii_case("response") {
        return Ok(3);
    }
    if value.eq_ignore_ascii_case("logging") {
        return Ok(4);
    }
    let number: usize = value.parse().map_err(|_| invalid())?;
    if number == 0 {
        return Err(invalid());
    }
    Ok(number - 1)
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Allow => f.write_str("allow"),
            Action::Block => f.write_str("block"),
            Action::Deny => f.write_str("deny"),
            Action::Drop => f.write_str("drop"),
            Action::Pass => f.write_str("pass"),
            Action::Proxy(target) => write!(f, "proxy:'{target}'"),
            Action::Redirect(target) => write!(f, "redirect:'{target}'"),
            Action::Id(id) => write!(f, "id:{id}"),
            Action::Phase(index) => write!(f, "phase:{}", index + 1),
            Action::Rev(rev) => write!(f, "rev:'{rev}'"),
            Action::Ver(ver) => write!(f, "ver:'{ver}'"),
            Action::Severity(severity) => write!(f, "severity:{severity}"),
            Action::Msg(msg) => write!(f, "msg:'{msg}'"),
            Action::LogData(data) => write!(f, "logdata:'{data}'"),
            Action::Tag(tag) => write!(f, "tag:'{tag}'"),
            Action::Maturity(level) => write!(f, "maturity:{level}"),
            Action::Accuracy(level) => write!(f, "accuracy:{level}"),
            Action::Chain => f.write_str("chain"),
            Action::Skip(count) => write!(f, "skip:{count}"),
            Action::SkipAfter(marker) => write!(f, "skipAfter:{marker}"),
            Action::Capture => f.write_str("capture"),
            Action::MultiMatch => f.write_str("multiMatch"),
            Action::Transform(name) => write!(f, "t:{name}"),
            Action::Status(status) => write!(f, "status:{status}"),
            Action::Log => f.write_str("log"),
            Action::NoLog => f.write_str("nolog"),
            Action::AuditLog => f.write_str("auditlog"),
            Action::NoAuditLog => f.write_str("noauditlog"),
            Action::SetVar(expr) => write!(f, "setvar:'{expr}'"),
            Action::SetEnv(expr) => write!(f, "setenv:'{expr}'"),
            Action::ExpireVar(expr) => write!(f, "expirevar:'{expr}'"),
            Action::InitCol(expr) => write!(f, "initcol:'{expr}'"),
            Action::Ctl(expr) => write!(f, "ctl:{expr}"),
            Action::Exec(path) => write!(f, "exec:'{path}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_action_parses() {
        assert_eq!(Action::from_parts("deny", None), Ok(Action::Deny));
        assert_eq!(Action::from_parts("chain", None), Ok(Action::Chain));
    }

    #[test]
    fn action_names_are_case_insensitive() {
        assert_eq!(Action::from_parts("DENY", None), Ok(Action::Deny));
        assert_eq!(
            Action::from_parts("skipAfter", Some("END")),
            Ok(Action::SkipAfter("END".into()))
        );
        assert_eq!(
            Action::from_parts("SKIPAFTER", Some("END")),
            Ok(Action::SkipAfter("END".into()))
        );
    }

    #[test]
    fn valued_action_parses() {
        assert_eq!(Action::from_parts("id", Some("1002")), Ok(Action::Id(1002)));
        assert_eq!(
            Action::from_parts("msg", Some("SQL injection")),
            Ok(Action::Msg("SQL injection".into()))
        );
        assert_eq!(
            Action::from_parts("t", Some("lowercase")),
            Ok(Action::Transform("lowercase".into()))
        );
    }

    #[test]
    fn phase_values_are_one_based() {
        assert_eq!(Action::from_parts("phase", Some("1")), Ok(Action::Phase(0)));
        assert_eq!(Action::from_parts("phase", Some("5")), Ok(Action::Phase(4)));
    }

    #[test]
    fn phase_accepts_named_aliases() {
        assert_eq!(
            Action::from_parts("phase", Some("request")),
            Ok(Action::Phase(1))
        );
        assert_eq!(
            Action::from_parts("phase", Some("response")),
            Ok(Action::Phase(3))
        );
        assert_eq!(
            Action::from_parts("phase", Some("logging")),
            Ok(Action::Phase(4))
        );
    }

    #[test]
    fn phase_zero_is_rejected() {
        assert_eq!(
            Action::from_parts("phase", Some("0")),
            Err(InvalidAction::InvalidValue {
                name: "phase".into(),
                value: "0".into(),
            })
        );
    }

    #[test]
    fn missing_value_is_rejected() {
        assert_eq!(
            Action::from_parts("id", None),
            Err(InvalidAction::MissingValue("id".into()))
        );
    }

    #[test]
    fn unexpected_value_is_rejected() {
        assert_eq!(
            Action::from_parts("deny", Some("now")),
            Err(InvalidAction::UnexpectedValue("deny".into()))
        );
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert_eq!(
            Action::from_parts("frobnicate", None),
            Err(InvalidAction::Unknown("frobnicate".into()))
        );
    }

    #[test]
    fn severity_parses_names_and_numbers() {
        assert_eq!("CRITICAL".parse(), Ok(Severity::Critical));
        assert_eq!("critical".parse(), Ok(Severity::Critical));
        assert_eq!("2".parse(), Ok(Severity::Critical));
        assert_eq!("7".parse(), Ok(Severity::Debug));
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn severity_orders_by_syslog_level() {
        assert!(Severity::Emergency < Severity::Debug);
        assert_eq!(Severity::Warning.as_number(), 4);
    }

    #[test]
    fn disruptive_classification() {
        assert!(Action::Deny.is_disruptive());
        assert!(Action::Redirect("http://example.com".into()).is_disruptive());
        assert!(!Action::Log.is_disruptive());
        assert!(!Action::Severity(Severity::Critical).is_disruptive());
        assert!(!Action::Chain.is_disruptive());
    }

    #[test]
    fn display_round_trips_common_forms() {
        assert_eq!(Action::Deny.to_string(), "deny");
        assert_eq!(Action::Id(950001).to_string(), "id:950001");
        assert_eq!(Action::Phase(1).to_string(), "phase:2");
        assert_eq!(Action::Msg("hello".into()).to_string(), "msg:'hello'");
    }
}
