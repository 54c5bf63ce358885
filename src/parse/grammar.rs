use std::path::PathBuf;

use winnow::ascii::{space0, space1, Caseless};
use winnow::combinator::{alt, cut_err, delimited, opt, preceded, separated};
use winnow::error::{ContextError, ErrMode, FromExternalError, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::types::{Action, Operator, Variable, VariableKind};

/// One parsed configuration directive, before driver validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Directive {
    Rule {
        variables: Vec<Variable>,
        operator: Operator,
        actions: Vec<Action>,
    },
    Action {
        actions: Vec<Action>,
    },
    Marker {
        name: String,
    },
    Script {
        path: PathBuf,
        actions: Vec<Action>,
    },
    Include {
        path: PathBuf,
    },
}

// -- Directives -------------------------------------------------------------

/// Parses one whole logical line. Directive keywords are matched
/// case-insensitively, like the upstream scanner's.
pub(crate) fn directive(input: &mut &str) -> ModalResult<Directive> {
    delimited(
        space0,
        alt((include, marker, script, action_directive, rule_directive)),
        space0,
    )
    .parse_next(input)
}

fn rule_directive(input: &mut &str) -> ModalResult<Directive> {
    (Caseless("SecRule"), space1).void().parse_next(input)?;
    let variables = cut_err(variable_list)
        .context(StrContext::Expected(StrContextValue::Description(
            "variable list",
        )))
        .parse_next(input)?;
    cut_err(space1).parse_next(input)?;
    let operator = cut_err(operator_argument).parse_next(input)?;
    let actions = opt(preceded(space1, action_block)).parse_next(input)?;
    Ok(Directive::Rule {
        variables,
        operator,
        actions: actions.unwrap_or_default(),
    })
}

fn action_directive(input: &mut &str) -> ModalResult<Directive> {
    (Caseless("SecAction"), space1).void().parse_next(input)?;
    let actions = cut_err(action_block)
        .context(StrContext::Expected(StrContextValue::Description(
            "action list",
        )))
        .parse_next(input)?;
    Ok(Directive::Action { actions })
}

fn marker(input: &mut &str) -> ModalResult<Directive> {
    (Caseless("SecMarker"), space1).void().parse_next(input)?;
    let name = cut_err(alt((double_quoted, single_quoted, bare_token)))
        .context(StrContext::Expected(StrContextValue::Description(
            "marker name",
        )))
        .parse_next(input)?;
    Ok(Directive::Marker { name })
}

fn script(input: &mut &str) -> ModalResult<Directive> {
    (Caseless("SecRuleScript"), space1).void().parse_next(input)?;
    let path = cut_err(alt((double_quoted, single_quoted, bare_token)))
        .context(StrContext::Expected(StrContextValue::Description(
            "script path",
        )))
        .parse_next(input)?;
    let actions = opt(preceded(space1, action_block)).parse_next(input)?;
    Ok(Directive::Script {
        path: PathBuf::from(path),
        actions: actions.unwrap_or_default(),
    })
}

fn include(input: &mut &str) -> ModalResult<Directive> {
    (Caseless("Include"), space1).void().parse_next(input)?;
    let path = cut_err(alt((double_quoted, single_quoted, bare_token)))
        .context(StrContext::Expected(StrContextValue::Description(
            "include path",
        )))
        .parse_next(input)?;
    Ok(Directive::Include {
        path: PathBuf::from(path),
    })
}

// -- Variables --------------------------------------------------------------

fn variable_list(input: &mut &str) -> ModalResult<Vec<Variable>> {
    separated(1.., variable, '|').parse_next(input)
}

fn variable(input: &mut &str) -> ModalResult<Variable> {
    let count = opt('&').parse_next(input)?.is_some();
    let exclusion = opt('!').parse_next(input)?.is_some();
    let collection = collection_name.parse_next(input)?;
    let member = opt(preceded(':', member_text)).parse_next(input)?;
    Ok(Variable {
        count,
        exclusion,
        collection,
        member,
    })
}

fn collection_name(input: &mut &str) -> ModalResult<VariableKind> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_')
        .try_map(|s: &str| s.parse::<VariableKind>())
        .context(StrContext::Expected(StrContextValue::Description(
            "variable collection",
        )))
        .parse_next(input)
}

fn member_text(input: &mut &str) -> ModalResult<String> {
    alt((
        single_quoted,
        // Regex members keep their slash delimiters.
        ('/', take_while(0.., |c: char| c != '/' && !c.is_ascii_whitespace()), '/')
            .take()
            .map(|s: &str| s.to_owned()),
        take_while(1.., |c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '*')
        })
        .map(|s: &str| s.to_owned()),
    ))
    .parse_next(input)
}

// -- Operators --------------------------------------------------------------

fn operator_argument(input: &mut &str) -> ModalResult<Operator> {
    double_quoted
        .try_map(|text| Operator::parse(&text))
        .context(StrContext::Expected(StrContextValue::Description(
            "operator",
        )))
        .parse_next(input)
}

// -- Actions ----------------------------------------------------------------

fn action_block(input: &mut &str) -> ModalResult<Vec<Action>> {
    preceded(
        '"',
        cut_err(delimited(
            space0,
            separated(1.., action_item, (space0, ',', space0)),
            (space0, '"'),
        )),
    )
    .context(StrContext::Expected(StrContextValue::Description(
        "action list",
    )))
    .parse_next(input)
}

fn action_item(input: &mut &str) -> ModalResult<Action> {
    let name = take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '_' || c == '-'
    })
    .parse_next(input)?;
    let value = opt(preceded(':', action_value)).parse_next(input)?;
    Action::from_parts(name, value.as_deref())
        .map_err(|e| ErrMode::Cut(ContextError::from_external_error(input, e)))
}

fn action_value(input: &mut &str) -> ModalResult<String> {
    alt((
        single_quoted,
        take_while(1.., |c: char| {
            !c.is_ascii_whitespace() && !matches!(c, ',' | '"' | '\'')
        })
        .map(|s: &str| s.to_owned()),
    ))
    .parse_next(input)
}

// -- String literals --------------------------------------------------------

// Escapes collapse only for the delimiter and the backslash itself; anything
// else stays verbatim so regex payloads survive untouched.
fn double_quoted(input: &mut &str) -> ModalResult<String> {
    quoted('"', input)
}

fn single_quoted(input: &mut &str) -> ModalResult<String> {
    quoted('\'', input)
}

fn quoted(mut delimiter: char, input: &mut &str) -> ModalResult<String> {
    delimiter.parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            c if c == delimiter => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                if esc == delimiter || esc == '\\' {
                    s.push(esc);
                } else {
                    s.push('\\');
                    s.push(esc);
                }
            }
            c => s.push(c),
        }
    }
}

fn bare_token(input: &mut &str) -> ModalResult<String> {
    take_while(1.., |c: char| !c.is_ascii_whitespace())
        .map(|s: &str| s.to_owned())
        .parse_next(input)
}
