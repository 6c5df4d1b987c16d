//! Interactive rewrite console.
//!
//! # Responsibilities
//! - Read commands from a terminal stream and print rewrite results
//! - Inspect the currently loaded rule set
//!
//! # Design Decisions
//! - Reader and writer are passed in explicitly; nothing touches process stdio
//! - Each command loads the engine's current rule set, so hot reloads show up
//!   on the next command
//!
//! # Commands
//! ```text
//! request <url>    rewrite as an inbound URL
//! response <url>   rewrite as an outbound URL
//! rules            list loaded rules
//! help             show commands
//! quit | exit      leave the console
//! ```

pub mod line_reader;

use std::io::{self, Read, Write};
use std::sync::Arc;

pub use line_reader::LineReader;

use crate::rewrite::{Direction, RewriteEngine};
use crate::template;

const HELP: &str = "\
commands:
  request <url>    rewrite as an inbound URL
  response <url>   rewrite as an outbound URL
  rules            list loaded rules
  help             show this help
  quit             leave the console";

pub struct Console<R, W> {
    engine: Arc<RewriteEngine>,
    reader: LineReader<R>,
    out: W,
    interactive: bool,
}

impl<R: Read, W: Write> Console<R, W> {
    pub fn new(engine: Arc<RewriteEngine>, input: R, out: W) -> Self {
        Self {
            engine,
            reader: LineReader::new(input),
            out,
            interactive: false,
        }
    }

    /// Print a prompt and echo typed bytes, for raw-mode terminals.
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Run until `quit` or end of stream. Returns the number of commands handled.
    pub fn run(&mut self) -> io::Result<usize> {
        let mut handled = 0;
        loop {
            if self.interactive {
                self.out.write_all(b"> ")?;
                self.out.flush()?;
            }
            let echo = if self.interactive {
                Some(&mut self.out as &mut dyn Write)
            } else {
                None
            };
            let Some(line) = self.reader.read_line(echo)? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            handled += 1;
            if !self.execute(line)? {
                break;
            }
        }
        self.out.flush()?;
        Ok(handled)
    }

    /// Execute one command. Returns false when the console should stop.
    fn execute(&mut self, line: &str) -> io::Result<bool> {
        let (command, argument) = line
            .split_once(char::is_whitespace)
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((line, ""));

        match command.to_ascii_lowercase().as_str() {
            "quit" | "exit" => return Ok(false),
            "help" | "?" => writeln!(self.out, "{HELP}")?,
            "rules" => self.list_rules()?,
            other => match other.parse::<Direction>() {
                Ok(direction) if !argument.is_empty() => self.rewrite(argument, direction)?,
                Ok(_) => writeln!(self.out, "usage: {other} <url>")?,
                Err(_) => writeln!(self.out, "unknown command `{command}`, try `help`")?,
            },
        }
        Ok(true)
    }

    fn rewrite(&mut self, url: &str, direction: Direction) -> io::Result<()> {
        let input = match template::parse_url(url) {
            Ok(input) => input,
            Err(e) => return writeln!(self.out, "error: {e}"),
        };
        let outcome = self.engine.evaluate(direction, &input);
        match outcome.rule {
            Some(rule) => writeln!(self.out, "{} [{rule}]", template::format(&outcome.template)),
            None => writeln!(self.out, "{url} [unchanged]"),
        }
    }

    fn list_rules(&mut self) -> io::Result<()> {
        let rules = self.engine.rules();
        if rules.is_empty() {
            return writeln!(self.out, "no rules loaded");
        }
        for rule in rules.iter() {
            let directions: Vec<&str> = rule.directions().iter().map(Direction::as_str).collect();
            writeln!(
                self.out,
                "{}\t{}\t{}",
                rule.name(),
                directions.join(","),
                rule.pattern()
            )?;
        }
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.out
    }
}
