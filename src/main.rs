use std::collections::BTreeMap;

use anyhow::{bail, Result};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use lambda::{
    encodings::{extract_church_numeral, Encodings},
    eval::{beta_reduce_once, reduce_to_normal_form, Strategy, DEFAULT_MAX_STEPS},
    parser::{parse, ParseError},
    term::Term,
};
use rustyline::{error::ReadlineError, Editor};

const HISTORY_FILE: &str = "history.txt";

struct Session {
    encodings: Encodings,
    variables: BTreeMap<String, Term>,
}

impl Session {
    fn new() -> Self {
        let encodings = Encodings::new();
        let variables = encodings
            .iter()
            .map(|(name, term)| (name.to_string(), term.clone()))
            .collect();
        Self {
            encodings,
            variables,
        }
    }

    /// Parse `input` and splice defined names into it, free occurrences
    /// only, so reusing a defined name as a binder stays meaningful.
    fn resolve(&self, input: &str) -> Result<Term, ParseError> {
        let mut term = parse(input)?;
        for (name, definition) in &self.variables {
            term = term.substitute(name, definition);
        }
        Ok(term)
    }

    fn parse_input(&self, input: &str) -> Result<Option<Term>> {
        match self.resolve(input) {
            Ok(term) => Ok(Some(term)),
            Err(error) => {
                report_errors(input, &error)?;
                Ok(None)
            }
        }
    }

    fn exec(&mut self, input: &str) -> Result<()> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }
        if input == "help" {
            print_help();
        } else if input == "vars" {
            for (name, term) in &self.variables {
                println!("  {name} = {term}");
            }
        } else if let Some(rest) = input.strip_prefix("let ") {
            self.define(rest)?;
        } else if let Some(rest) = input.strip_prefix("step ") {
            if let Some(term) = self.parse_input(rest)? {
                let (reduced, was_reduced) = beta_reduce_once(&term);
                if was_reduced {
                    println!("Result: {reduced}");
                    self.variables.insert("it".to_string(), reduced);
                } else {
                    println!("Expression is already in normal form.");
                }
            }
        } else if let Some(rest) = input.strip_prefix("normal ") {
            self.reduce(rest, Strategy::Normal, false)?;
        } else if let Some(rest) = input.strip_prefix("app ") {
            self.reduce(rest, Strategy::Applicative, false)?;
        } else if let Some(rest) = input.strip_prefix("trace ") {
            self.reduce(rest, Strategy::Normal, true)?;
        } else if let Some(rest) = input.strip_prefix("church ") {
            match rest.trim().parse::<u64>() {
                Ok(n) => println!("{}", self.encodings.church_numeral(n)),
                Err(_) => println!("Error: church requires a natural number"),
            }
        } else if let Some(rest) = input.strip_prefix("extract ") {
            if let Some(term) = self.parse_input(rest)? {
                let reduction = reduce_to_normal_form(&term, Strategy::Normal, DEFAULT_MAX_STEPS);
                match extract_church_numeral(&reduction.term) {
                    Some(n) => println!("{n}"),
                    None => println!("Not a Church numeral: {}", reduction.term),
                }
            }
        } else {
            self.reduce(input, Strategy::Normal, false)?;
        }
        Ok(())
    }

    fn define(&mut self, rest: &str) -> Result<()> {
        match rest.trim().split_once(char::is_whitespace) {
            Some((name, source)) if is_valid_name(name) => {
                if let Some(term) = self.parse_input(source.trim())? {
                    println!("Defined {name} = {term}");
                    self.variables.insert(name.to_string(), term);
                }
            }
            _ => println!("Error: let requires a name and an expression"),
        }
        Ok(())
    }

    fn reduce(&mut self, input: &str, strategy: Strategy, show_steps: bool) -> Result<()> {
        let term = match self.parse_input(input)? {
            Some(term) => term,
            None => return Ok(()),
        };
        let reduction = reduce_to_normal_form(&term, strategy, DEFAULT_MAX_STEPS);
        println!("Result: {}", reduction.term);
        if reduction.steps == 0 {
            println!("No reduction steps needed (already in normal form).");
        } else if show_steps {
            println!("0: {term}");
            for (i, step) in reduction.trace.iter().enumerate() {
                println!("{}: {step}", i + 1);
            }
        } else {
            println!("Steps taken: {}", reduction.steps);
        }
        if !reduction.normal_form {
            println!("Warning: May not be in normal form (reached maximum steps)");
        }
        if let Some(n) = extract_church_numeral(&reduction.term) {
            println!("Church numeral value: {n}");
        }
        if let Some(b) = self.encodings.to_boolean(&reduction.term) {
            println!("Boolean value: {b}");
        }
        self.variables.insert("it".to_string(), reduction.term);
        Ok(())
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().map_or(false, |c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn print_help() {
    println!("Commands:");
    println!("  help           - Show this help");
    println!("  vars           - List all defined names");
    println!("  let NAME EXPR  - Define a name");
    println!("  step EXPR      - Perform a single beta-reduction step");
    println!("  normal EXPR    - Reduce to normal form, normal order");
    println!("  app EXPR       - Reduce to normal form, applicative order");
    println!("  trace EXPR     - Reduce in normal order, printing every step");
    println!("  church N       - Build the Church numeral for N");
    println!("  extract EXPR   - Reduce, then read back a Church numeral");
    println!();
    println!("Syntax: λx.M or \\x.M, application M N, parentheses (M).");
    println!("Anything else is reduced in normal order; `it` names the last result.");
}

fn build_report(error: &chumsky::error::Simple<String>) -> Report {
    use chumsky::error::SimpleReason;
    let report = Report::build(ReportKind::Error, (), error.span().start);
    match error.reason() {
        SimpleReason::Unexpected => {
            let found = error.found().map(String::as_str).unwrap_or("end of input");
            let expected = error
                .expected()
                .map(|t| t.as_ref().map(String::as_str).unwrap_or("end of input"))
                .collect::<Vec<_>>()
                .join(", ");
            let expected = if expected.is_empty() {
                "something else"
            } else {
                &expected
            };
            report
                .with_message(format!("Unexpected {found}, expected {expected}"))
                .with_label(
                    Label::new(error.span())
                        .with_message(format!("Unexpected {}", found.fg(Color::Red)))
                        .with_color(Color::Red),
                )
        }
        SimpleReason::Unclosed { span, delimiter } => report
            .with_message(format!("Unclosed delimiter {}", delimiter.fg(Color::Yellow)))
            .with_label(
                Label::new(span.clone())
                    .with_message(format!("Unclosed delimiter {}", delimiter.fg(Color::Yellow)))
                    .with_color(Color::Yellow),
            )
            .with_label(
                Label::new(error.span())
                    .with_message(format!(
                        "Must be closed before this {}",
                        error
                            .found()
                            .map(String::as_str)
                            .unwrap_or("end of input")
                            .fg(Color::Red)
                    ))
                    .with_color(Color::Red),
            ),
        SimpleReason::Custom(message) => report.with_message(message).with_label(
            Label::new(error.span())
                .with_message(format!("{}", message.fg(Color::Red)))
                .with_color(Color::Red),
        ),
    }
    .finish()
}

fn report_errors(input: &str, error: &ParseError) -> Result<()> {
    for e in error.errors() {
        build_report(e).eprint(Source::from(input))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let mut editor = Editor::<()>::new();
    editor.load_history(HISTORY_FILE).ok();
    let mut session = Session::new();
    let mut pending: Option<String> = None;
    loop {
        match editor.readline("λ> ") {
            Ok(mut line) if line.ends_with('\\') => {
                line.pop();
                line.push('\n');
                if let Some(pending) = pending.as_mut() {
                    pending.push_str(&line);
                } else {
                    pending = Some(line);
                }
            }
            Ok(line) => {
                let input = if let Some(mut prefix) = pending.take() {
                    prefix.push_str(&line);
                    prefix
                } else {
                    line
                };
                editor.add_history_entry(input.as_str());
                if let Err(e) = session.exec(&input) {
                    eprintln!("Error: {e:?}");
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Bye!");
                break;
            }
            Err(e) => bail!(e),
        }
    }
    editor.save_history(HISTORY_FILE).ok();
    Ok(())
}
