use std::fmt;

/// A position within the source being compiled.
///
/// `line` is the one-based physical line on which a directive ends. `column`
/// is one-based and points one past the offending character, following the
/// convention of the scanner's position tracking; the diagnostic header
/// prints `column - 1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The driver's accumulated diagnostic text.
///
/// The buffer is sticky: it is never cleared for the lifetime of a driver,
/// and the location header is emitted once, by whichever error is recorded
/// first while the buffer is still empty. Grammar errors arrive through
/// [`error_at`](Diagnostics::error_at) with a location; semantic rejections
/// arrive as bare lines through [`append_line`](Diagnostics::append_line).
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    header: Option<String>,
    fragments: Vec<String>,
}

impl Diagnostics {
    pub(crate) fn is_empty(&self) -> bool {
        self.header.is_none() && self.fragments.is_empty()
    }

    /// Records a semantic rejection as its own line.
    pub(crate) fn append_line(&mut self, fragment: &str) {
        self.fragments.push(format!("{fragment}\n"));
    }

    /// Records a located grammar error, prepending the header when nothing
    /// has been recorded yet.
    pub(crate) fn error_at(
        &mut self,
        location: &Location,
        reference: Option<&str>,
        message: &str,
        context: &str,
    ) {
        if self.is_empty() {
            let mut header = String::from("Rules error. ");
            if let Some(reference) = reference {
                header.push_str(&format!("File: {reference}. "));
            }
            header.push_str(&format!(
                "Line: {}. Column: {}. ",
                location.line,
                location.column.saturating_sub(1)
            ));
            self.header = Some(header);
        }
        let mut fragment = String::new();
        if !message.is_empty() {
            fragment.push_str(message);
            fragment.push(' ');
        }
        if !context.is_empty() {
            fragment.push_str(context);
        }
        self.fragments.push(fragment);
    }

    /// The concatenated diagnostic text.
    pub(crate) fn render(&self) -> String {
        let mut out = String::new();
        if let Some(header) = &self.header {
            out.push_str(header);
        }
        for fragment in &self.fragments {
            out.push_str(fragment);
        }
        out
    }
}
