// src/core/output.rs

use crate::constants::{ERROR_PREFIX, MSG_PREFIX};
use std::fmt::{self, Display};
use std::io::{self, Write};

/// The output facade of the orchestrator.
///
/// Owns the two injected sinks (normal and error) every user-visible byte
/// goes through. Targets never write to a process-global stream directly;
/// they reach these sinks through the context handle bound at execution time,
/// which keeps the whole engine observable and testable without process-level
/// capture.
pub struct Output {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    prefix: &'static str,
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }
}

impl Output {
    /// Creates an output facade over the given sinks.
    pub fn new(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            err,
            prefix: MSG_PREFIX,
        }
    }

    /// The marker prepended to pre/post target messages.
    pub fn prefix(&self) -> &str {
        self.prefix
    }

    /// Writes to the normal sink, verbatim, no trailing newline.
    pub fn print(&mut self, text: impl Display) {
        let _ = write!(self.out, "{text}");
        let _ = self.out.flush();
    }

    /// Writes a line to the normal sink, verbatim.
    pub fn println(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{text}");
    }

    /// Writes a prefixed pre/post target message to the normal sink.
    pub fn message(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{} {text}", self.prefix);
    }

    /// Writes a line to the error sink, prefixed with `Error:`.
    pub fn error(&mut self, text: impl Display) {
        let _ = writeln!(self.err, "{ERROR_PREFIX} {text}");
    }

    /// Raw access to both sinks at once, for streaming subprocess output.
    pub fn sinks(&mut self) -> (&mut (dyn Write + Send), &mut (dyn Write + Send)) {
        (&mut *self.out, &mut *self.err)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::captured;

    #[test]
    fn error_lines_carry_the_fixed_prefix() {
        let (mut output, out, err) = captured();
        output.error("something broke");

        assert_eq!(err.contents(), "Error: something broke\n");
        assert_eq!(out.contents(), "");
    }

    #[test]
    fn messages_carry_the_marker() {
        let (mut output, out, _err) = captured();
        output.message("building image");

        assert_eq!(out.contents(), "==> building image\n");
    }

    #[test]
    fn print_does_not_append_a_newline() {
        let (mut output, out, _err) = captured();
        output.print("a");
        output.print("b");

        assert_eq!(out.contents(), "ab");
    }
}
