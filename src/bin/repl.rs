use std::cell::RefCell;
use std::rc::Rc;

use psil::evaluator::special_form_identifiers;
use psil::lexer::{Atom, TokenKind, tokenize};
use psil::{Error, Interpreter};
use rustyline::error::ReadlineError;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Cmd, Completer, Context, Editor, EventHandler, KeyCode, KeyEvent, Modifiers};
use rustyline::{Helper, Highlighter, Hinter, Validator};
use tracing_subscriber::EnvFilter;

const HISTORY_FILE: &str = "psil_history.txt";

struct PsilCompleter {
    interpreter: Rc<RefCell<Interpreter>>,
}

impl rustyline::completion::Completer for PsilCompleter {
    type Candidate = String;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let prefix = match tokenize(&line[..pos]).pop() {
            Some(token) if token.span.end == pos => match token.kind {
                TokenKind::Atom(Atom::Symbol(prefix)) => prefix,
                _ => return Ok((pos, vec![])),
            },
            _ => return Ok((pos, vec![])),
        };
        let mut candidates: Vec<String> = self
            .interpreter
            .borrow()
            .globals()
            .get_identifiers()
            .union(&special_form_identifiers())
            .filter_map(|id| id.strip_prefix(prefix.as_str()).map(str::to_string))
            .filter(|rest| !rest.is_empty())
            .collect();
        candidates.sort();
        Ok((pos, candidates))
    }
}

#[derive(Completer, Helper, Highlighter, Hinter, Validator)]
struct InputHelper {
    #[rustyline(Validator)]
    validator: BracketValidator,
    #[rustyline(Highlighter)]
    highlighter: BracketHighlighter,
    #[rustyline(Completer)]
    completer: PsilCompleter,
}

struct BracketValidator;

impl Validator for BracketValidator {
    fn validate(&self, ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        let mut open = 0usize;
        for (i, c) in ctx.input().chars().enumerate() {
            match c {
                '(' => open += 1,
                ')' if open == 0 => {
                    return Ok(ValidationResult::Invalid(Some(format!(
                        "  - Unmatched ')' at position {}",
                        i
                    ))));
                }
                ')' => open -= 1,
                _ => {}
            }
        }
        if open > 0 {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

struct BracketHighlighter;

impl Highlighter for BracketHighlighter {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> std::borrow::Cow<'l, str> {
        let mut stack: Vec<usize> = Vec::new();
        let mut highlighted = String::new();

        for (i, c) in line.char_indices() {
            match c {
                '(' => {
                    stack.push(highlighted.len());
                    highlighted.push(c);
                }
                ')' => match stack.pop() {
                    Some(matching_pos) if i + 1 == pos => {
                        highlighted.push_str("\x1b[34m)\x1b[0m"); // Blue for matching brackets
                        highlighted.replace_range(matching_pos..=matching_pos, "\x1b[1;34m(\x1b[0m");
                    }
                    Some(_) => highlighted.push(c),
                    None => highlighted.push_str("\x1b[31m)\x1b[0m"), // Red for unmatched
                },
                '\'' => highlighted.push_str("\x1b[33m'\x1b[0m"),
                _ => highlighted.push(c),
            }
        }

        std::borrow::Cow::Owned(highlighted)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn main() -> rustyline::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("PSIL_LOG"))
        .with_writer(std::io::stderr)
        .init();

    println!("psil REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl-D to quit.");

    let interpreter = Rc::new(RefCell::new(Interpreter::new()));
    let helper = InputHelper {
        highlighter: BracketHighlighter,
        validator: BracketValidator,
        completer: PsilCompleter {
            interpreter: interpreter.clone(),
        },
    };
    let config = rustyline::config::Config::builder()
        .edit_mode(rustyline::EditMode::Vi)
        .build();
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    rl.bind_sequence(
        KeyEvent(KeyCode::Char('s'), Modifiers::CTRL),
        EventHandler::Simple(Cmd::Newline),
    );
    if rl.load_history(HISTORY_FILE).is_err() {
        println!("No previous history.");
    }

    loop {
        match rl.readline("psil> ") {
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if input.eq_ignore_ascii_case("exit") {
                    break;
                }

                let result = interpreter.borrow_mut().run_source(input);
                match result {
                    Ok(value) => {
                        println!("{}", value);
                        println!("; calls: {}", interpreter.borrow().profile().count);
                    }
                    Err(err) => report(&err, input),
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                println!("Interrupted. Type 'exit' or Ctrl-D to quit.");
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nExiting.");
                break;
            }
            Err(err) => {
                eprintln!("Readline Error: {:?}", err);
                break;
            }
        }
    }
    rl.save_history(HISTORY_FILE)
}

fn report(err: &Error, input: &str) {
    if err.pretty_print("REPL", input).is_err() {
        eprintln!("Error: {}", err);
    }
}
