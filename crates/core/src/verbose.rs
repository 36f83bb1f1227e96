//! Verbose diagnostics
//!
//! Lines look like `VERBOSE 1.27 GET /container/object` where the number is
//! the seconds elapsed since the invocation started. Each line is flushed as
//! soon as it is written so long-running commands show progress in real time.

use std::fmt::{Display, Write as _};
use std::io::Write as _;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::io::{EmitScope, IoManager};

/// Timestamped, verbosity-gated emitter
#[derive(Clone)]
pub struct VerboseLogger {
    begin: Instant,
    level: u8,
    io: IoManager,
}

impl VerboseLogger {
    pub fn new(begin: Instant, level: u8, io: IoManager) -> Self {
        Self { begin, level, io }
    }

    pub fn is_enabled(&self) -> bool {
        self.level > 0
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Emit one line built from `template` and `args`
    ///
    /// `{}` in the template is replaced by the next argument, `{{` and `}}`
    /// are literal braces. A template that does not match its arguments is an
    /// error even when verbosity is off.
    pub fn emit(&self, scope: EmitScope, template: &str, args: &[&dyn Display]) -> Result<()> {
        let message = render(template, args)?;
        if !self.is_enabled() {
            return Ok(());
        }
        let elapsed = self.begin.elapsed().as_secs_f64();
        self.io.with_debug(scope, |w| {
            writeln!(w, "VERBOSE {elapsed:.2} {message}")
        })?;
        Ok(())
    }
}

/// Fill `{}` placeholders in `template` from `args`
pub fn render(template: &str, args: &[&dyn Display]) -> Result<String> {
    let fail = |reason: &str| Error::VerboseFormat {
        reason: reason.to_string(),
        template: template.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    };

    let mut out = String::with_capacity(template.len());
    let mut remaining = args.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) | ('}', Some('}')) => {
                chars.next();
                out.push(c);
            }
            ('{', Some('}')) => {
                chars.next();
                let arg = remaining
                    .next()
                    .ok_or_else(|| fail("not enough arguments for template"))?;
                write!(out, "{arg}").map_err(|_| fail("argument failed to format"))?;
            }
            ('{', _) => return Err(fail("unsupported placeholder in template")),
            ('}', _) => return Err(fail("unmatched '}' in template")),
            _ => out.push(c),
        }
    }
    if remaining.next().is_some() {
        return Err(fail("not all arguments converted during formatting"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::SharedBuffer;

    #[test]
    fn test_render() {
        assert_eq!(render("GET {}", &[&"/c/o"]).unwrap(), "GET /c/o");
        assert_eq!(render("{} of {}", &[&1, &2]).unwrap(), "1 of 2");
        assert_eq!(render("{{literal}}", &[]).unwrap(), "{literal}");
        assert_eq!(render("plain", &[]).unwrap(), "plain");
    }

    #[test]
    fn test_render_arity_mismatch() {
        let err = render("{} and {}", &[&"one"]).unwrap_err();
        match err {
            Error::VerboseFormat {
                reason,
                template,
                args,
            } => {
                assert!(reason.contains("not enough"));
                assert_eq!(template, "{} and {}");
                assert_eq!(args, vec!["one".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = render("nothing", &[&42]).unwrap_err();
        assert!(err.to_string().contains("\"nothing\""));
        assert!(err.to_string().contains("\"42\""));

        assert!(render("{0}", &[&1]).is_err());
        assert!(render("oops }", &[]).is_err());
    }

    #[test]
    fn test_emit_format() {
        let (io, captured) = IoManager::captured();
        let logger = VerboseLogger::new(Instant::now(), 1, io);
        logger
            .emit(EmitScope::Controller, "GET {}", &[&"/c/o"])
            .unwrap();

        let line = captured.stderr();
        assert!(line.starts_with("VERBOSE "));
        assert!(line.ends_with(" GET /c/o\n"));
        let elapsed = line.split_whitespace().nth(1).unwrap();
        assert_eq!(elapsed.split('.').nth(1).map(str::len), Some(2));
        assert!(elapsed.parse::<f64>().unwrap() >= 0.0);
    }

    #[test]
    fn test_emit_disabled() {
        let (io, captured) = IoManager::captured();
        let logger = VerboseLogger::new(Instant::now(), 0, io);
        logger.emit(EmitScope::Command, "quiet {}", &[&1]).unwrap();
        assert!(captured.stderr().is_empty());
        assert!(logger.emit(EmitScope::Command, "bad {}", &[]).is_err());
    }

    #[test]
    fn test_emit_scope_routing() {
        let (io, captured) = IoManager::captured();
        let sink = SharedBuffer::default();
        let logger = VerboseLogger::new(Instant::now(), 1, io.with_command_debug(sink.clone()));
        logger.emit(EmitScope::Command, "from command", &[]).unwrap();
        logger.emit(EmitScope::Controller, "from controller", &[]).unwrap();
        assert!(sink.contents().ends_with("from command\n"));
        assert!(captured.stderr().ends_with("from controller\n"));
    }
}
