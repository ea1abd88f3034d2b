//! A small interactive shell for trying display filters against a dataset.

use crate::config::ShellRules;
use crate::filter::DisplayFilter;
use crate::sources::Dataset;
use crate::table::{self, QueryError, ResultTable};
use log::{LevelFilter, debug, error, warn};
use std::io::{self, BufRead, Write};

const HELP: &[(&str, &str)] = &[
    ("filter <expr>", "Apply a display filter and print the matching records"),
    ("fields", "List the fields a display filter can be applied on"),
    ("debug", "Toggle debug logging on/off"),
    ("help, ?", "Show this help"),
    ("exit", "Leave the shell (Ctrl+D works too)"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Filter(String),
    Fields,
    Debug,
    Help,
    Exit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if line == "?" {
            return Command::Help;
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        match word {
            "filter" => Command::Filter(rest.to_string()),
            "fields" => Command::Fields,
            "debug" => Command::Debug,
            "help" => Command::Help,
            "exit" | "quit" | "EOF" => Command::Exit,
            _ => Command::Unknown(line.to_string()),
        }
    }
}

pub struct Shell<'a> {
    dataset: &'a Dataset,
    filter: DisplayFilter,
    rules: ShellRules,
    nested_fields: bool,
    debug: bool,
}

impl<'a> Shell<'a> {
    pub fn new(dataset: &'a Dataset, filter: DisplayFilter) -> Self {
        Self {
            dataset,
            filter,
            rules: ShellRules::default(),
            nested_fields: true,
            debug: log::max_level() >= LevelFilter::Debug,
        }
    }

    pub fn with_rules(self, rules: ShellRules) -> Self {
        Self { rules, ..self }
    }

    pub fn with_nested_fields(self, nested_fields: bool) -> Self {
        Self {
            nested_fields,
            ..self
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Read commands until `exit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self.rules.intro)?;
        let mut line = String::new();
        loop {
            write!(out, "{}", self.rules.prompt)?;
            out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(());
            }
            if !self.execute(Command::parse(&line), out)? {
                return Ok(());
            }
        }
    }

    /// Run one command. Returns false once the shell should stop.
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<bool> {
        match command {
            Command::Filter(text) => self.do_filter(&text, out)?,
            Command::Fields => self.do_fields(out)?,
            Command::Debug => self.do_debug(),
            Command::Help => {
                writeln!(out, "Commands:")?;
                for (name, description) in HELP {
                    writeln!(out, "  {name:<15} {description}")?;
                }
            }
            Command::Exit => return Ok(false),
            Command::Empty => {}
            Command::Unknown(line) => writeln!(out, "*** Unknown syntax: {line}")?,
        }
        Ok(true)
    }

    fn do_filter<W: Write>(&self, text: &str, out: &mut W) -> io::Result<()> {
        if text.trim().is_empty() {
            error!("No arguments supplied to filter function.");
            return Ok(());
        }
        match ResultTable::query(&self.filter, text, self.dataset) {
            Ok(result) => write!(out, "{}", result.render())?,
            Err(QueryError::Parser(err)) => {
                error!("Invalid display filter!");
                debug!("{err}");
            }
            Err(QueryError::Evaluation(err)) => {
                error!("There was an unknown error evaluating the results!");
                debug!("{err}");
            }
        }
        Ok(())
    }

    fn do_fields<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let names = match self.filter.parser().field_names() {
            Some(names) => names.to_vec(),
            None => table::fields(&self.dataset.records, self.nested_fields),
        };
        for name in names {
            writeln!(out, "{name}")?;
        }
        Ok(())
    }

    fn do_debug(&mut self) {
        if self.debug {
            log::set_max_level(LevelFilter::Info);
            self.debug = false;
            warn!("Debug mode disabled");
        } else {
            log::set_max_level(LevelFilter::Debug);
            self.debug = true;
            warn!("Debug mode enabled");
        }
    }
}
