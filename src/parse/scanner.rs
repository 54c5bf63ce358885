use std::fs;
use std::path::{Path, PathBuf};

use winnow::error::{ContextError, StrContext};
use winnow::prelude::*;

use crate::diagnostics::Location;
use crate::driver::Driver;
use crate::types::{CompileError, Rule, RuleKind};

use super::grammar::{self, Directive};

/// Nesting allowance for `Include` chains.
const MAX_INCLUDE_DEPTH: usize = 80;

/// Scans one source buffer and drives the driver's semantic actions.
/// Returns whether the buffer compiled without errors.
pub(crate) fn scan(driver: &mut Driver, input: &str) -> bool {
    let mut clean = true;
    scan_buffer(driver, input, 0, &mut clean);
    clean
}

/// Walks the buffer line by line. Grammar errors clear `clean` and scanning
/// resumes on the next logical line; a semantic rejection stops the scan and
/// returns `false` through every nesting level.
fn scan_buffer(driver: &mut Driver, input: &str, depth: usize, clean: &mut bool) -> bool {
    let reference = driver.current_reference().unwrap_or_default().to_owned();
    let lines: Vec<&str> = input.lines().collect();
    let mut index = 0;

    while index < lines.len() {
        let head = lines[index].trim_start();
        if head.is_empty() || head.starts_with('#') {
            index += 1;
            continue;
        }

        // Assemble the logical line: a trailing backslash continues the
        // directive onto the next physical line.
        let mut end = index;
        let mut text = String::new();
        loop {
            let line = lines[end];
            match continuation_head(line) {
                Some(head) if end + 1 < lines.len() => {
                    text.push_str(head);
                    text.push(' ');
                    end += 1;
                }
                Some(head) => {
                    text.push_str(head);
                    break;
                }
                None => {
                    text.push_str(line);
                    break;
                }
            }
        }
        index = end + 1;
        let line_number = end + 1;
        driver.set_location(Location {
            line: line_number,
            column: 1,
        });

        match grammar::directive.parse(text.as_str()) {
            Ok(directive) => {
                if !apply(driver, directive, &reference, line_number, depth, clean) {
                    *clean = false;
                    return false;
                }
            }
            Err(parse_error) => {
                *clean = false;
                let location = Location {
                    line: line_number,
                    column: parse_error.offset() + 1,
                };
                driver.set_location(location);
                let message = render_syntax_error(parse_error.inner());
                driver.error(&location, &message, "");
            }
        }
    }
    true
}

/// Dispatches one parsed directive. Returns `false` when the driver rejected
/// it and scanning should stop.
fn apply(
    driver: &mut Driver,
    directive: Directive,
    reference: &str,
    line: usize,
    depth: usize,
    clean: &mut bool,
) -> bool {
    match directive {
        Directive::Rule {
            variables,
            operator,
            actions,
        } => driver
            .add_sec_rule(Rule::new(
                RuleKind::Detection {
                    variables,
                    operator,
                },
                actions,
                reference,
                line,
            ))
            .is_ok(),
        Directive::Action { actions } => driver
            .add_sec_action(Rule::new(RuleKind::Unconditional, actions, reference, line))
            .is_ok(),
        Directive::Script { path, actions } => driver
            .add_sec_rule_script(Rule::new(RuleKind::Script { path }, actions, reference, line))
            .is_ok(),
        Directive::Marker { name } => {
            driver.add_sec_marker(&name);
            true
        }
        Directive::Include { path } => include(driver, &path, reference, depth, clean),
    }
}

/// Reads and scans an included file under the including driver, so an open
/// chain may continue across the include boundary.
fn include(
    driver: &mut Driver,
    path: &Path,
    reference: &str,
    depth: usize,
    clean: &mut bool,
) -> bool {
    if depth >= MAX_INCLUDE_DEPTH {
        driver.record(&CompileError::IncludeDepth {
            limit: MAX_INCLUDE_DEPTH,
        });
        return false;
    }
    let resolved = resolve(path, reference);
    let display = resolved.display().to_string();
    if !resolved.is_file() {
        driver.record(&CompileError::FileOpen { path: display });
        return false;
    }
    let contents = match fs::read_to_string(&resolved) {
        Ok(contents) => contents,
        Err(_) => {
            driver.record(&CompileError::FileOpen { path: display });
            return false;
        }
    };

    driver.push_frame(&display);
    let proceed = scan_buffer(driver, &contents, depth + 1, clean);
    driver.pop_frame();
    proceed
}

/// Relative include paths resolve against the including file's directory.
fn resolve(path: &Path, reference: &str) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match Path::new(reference).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(path),
        _ => path.to_path_buf(),
    }
}

fn continuation_head(line: &str) -> Option<&str> {
    line.trim_end().strip_suffix('\\')
}

fn render_syntax_error(error: &ContextError) -> String {
    let mut message = String::from("syntax error");
    let expected: Vec<String> = error
        .context()
        .filter_map(|context| match context {
            StrContext::Expected(value) => Some(value.to_string()),
            _ => None,
        })
        .collect();
    if !expected.is_empty() {
        message.push_str(", expected ");
        message.push_str(&expected.join(" or "));
    }
    if let Some(cause) = error.cause() {
        message.push_str(", ");
        message.push_str(&cause.to_string());
    }
    message
}
