use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The operator expression from the second argument of `SecRule`.
///
/// SecLang writes operators as `"@name argument"` inside the quoted second
/// argument. A leading `!` negates the match, and when the `@name` prefix is
/// omitted the whole string is an implicit regular expression, equivalent to
/// `@rx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    pub negated: bool,
    pub kind: OperatorKind,
    pub argument: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown operator: @{0}")]
pub struct UnknownOperator(String);

impl Operator {
    /// Parses the unquoted text of an operator argument.
    pub fn parse(text: &str) -> Result<Self, UnknownOperator> {
        let (negated, rest) = match text.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let Some(rest) = rest.strip_prefix('@') else {
            return Ok(Operator {
                negated,
                kind: OperatorKind::Rx,
                argument: rest.to_owned(),
            });
        };
        let (name, argument) = match rest.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim_start()),
            None => (rest, ""),
        };
        Ok(Operator {
            negated,
            kind: name.parse()?,
            argument: argument.to_owned(),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            f.write_str("!")?;
        }
        write!(f, "{}", self.kind)?;
        if !self.argument.is_empty() {
            write!(f, " {}", self.argument)?;
        }
        Ok(())
    }
}

/// The matching predicates a rule operator may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    BeginsWith,
    Contains,
    ContainsWord,
    DetectSqli,
    DetectXss,
    EndsWith,
    Eq,
    Ge,
    GeoLookup,
    Gt,
    InspectFile,
    IpMatch,
    IpMatchFromFile,
    Le,
    Lt,
    NoMatch,
    Pm,
    PmFromFile,
    Rbl,
    Rx,
    StrEq,
    StrMatch,
    UnconditionalMatch,
    ValidateByteRange,
    ValidateUrlEncoding,
    ValidateUtf8Encoding,
    VerifyCc,
    Within,
}

impl OperatorKind {
    /// The canonical SecLang spelling, including the `@` sigil.
    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::BeginsWith => "@beginsWith",
            OperatorKind::Contains => "@contains",
            OperatorKind::ContainsWord => "@containsWord",
            OperatorKind::DetectSqli => "@detectSQLi",
            OperatorKind::DetectXss => "@detectXSS",
            OperatorKind::EndsWith => "@endsWith",
            OperatorKind::Eq => "@eq",
            OperatorKind::Ge => "@ge",
            OperatorKind::GeoLookup => "@geoLookup",
            OperatorKind::Gt => "@gt",
            OperatorKind::InspectFile => "@inspectFile",
            OperatorKind::IpMatch => "@ipMatch",
            OperatorKind::IpMatchFromFile => "@ipMatchFromFile",
            OperatorKind::Le => "@le",
            OperatorKind::Lt => "@lt",
            OperatorKind::NoMatch => "@noMatch",
            OperatorKind::Pm => "@pm",
            OperatorKind::PmFromFile => "@pmFromFile",
            OperatorKind::Rbl => "@rbl",
            OperatorKind::Rx => "@rx",
            OperatorKind::StrEq => "@streq",
            OperatorKind::StrMatch => "@strmatch",
            OperatorKind::UnconditionalMatch => "@unconditionalMatch",
            OperatorKind::ValidateByteRange => "@validateByteRange",
            OperatorKind::ValidateUrlEncoding => "@validateUrlEncoding",
            OperatorKind::ValidateUtf8Encoding => "@validateUtf8Encoding",
            OperatorKind::VerifyCc => "@verifyCC",
            OperatorKind::Within => "@within",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OperatorKind {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_lowercase().as_str() {
            "beginswith" => OperatorKind::BeginsWith,
            "contains" => OperatorKind::Contains,
            "containsword" => OperatorKind::ContainsWord,
            "detectsqli" => OperatorKind::DetectSqli,
            "detectxss" => OperatorKind::DetectXss,
            "endswith" => OperatorKind::EndsWith,
            "eq" => OperatorKind::Eq,
            "ge" => OperatorKind::Ge,
            "geolookup" => OperatorKind::GeoLookup,
            "gt" => OperatorKind::Gt,
            "inspectfile" => OperatorKind::InspectFile,
            "ipmatch" => OperatorKind::IpMatch,
            "ipmatchfromfile" => OperatorKind::IpMatchFromFile,
            "le" => OperatorKind::Le,
            "lt" => OperatorKind::Lt,
            "nomatch" => OperatorKind::NoMatch,
            "pm" => OperatorKind::Pm,
            "pmfromfile" => OperatorKind::PmFromFile,
            "rbl" => OperatorKind::Rbl,
            "rx" => OperatorKind::Rx,
            "streq" => OperatorKind::StrEq,
            "strmatch" => OperatorKind::StrMatch,
            "unconditionalmatch" => OperatorKind::UnconditionalMatch,
            "validatebyterange" => OperatorKind::ValidateByteRange,
            "validateurlencoding" => OperatorKind::ValidateUrlEncoding,
            "validateutf8encoding" => OperatorKind::ValidateUtf8Encoding,
            "verifycc" => OperatorKind::VerifyCc,
            "within" => OperatorKind::Within,
            _ => return Err(UnknownOperator(s.to_owned())),
        };
        Ok(kind)
    }
}
