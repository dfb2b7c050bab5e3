//! Interactive menu over a catalog.
//!
//! Every action is a small form read one field at a time. Errors are shown
//! and the menu comes back; only end of input or `quit` leaves.

use std::io;

use linefeed::{DefaultTerminal, Interface, ReadResult};
use tracing::debug;

use crate::commands::{exec_command, Command};
use crate::data::{self, Draft};
use crate::errors::*;
use crate::store::{Catalog, Field};

const HELP: &str = "Menu: home, add, remove, search, list, stats, finish, help, quit";

/// Where the shell reads answers and writes output.
pub trait Prompt {
    /// `None` at end of input.
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;

    fn say(&mut self, text: &str) -> io::Result<()>;
}

pub struct LineReader {
    reader: Interface<DefaultTerminal>,
}

impl LineReader {
    pub fn new(name: &str) -> io::Result<LineReader> {
        Ok(LineReader { reader: Interface::new(name.to_string())? })
    }
}

impl Prompt for LineReader {
    fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.reader.set_prompt(prompt)?;

        match self.reader.read_line()? {
            ReadResult::Input(line) => {
                if !line.trim().is_empty() {
                    self.reader.add_history_unique(line.clone());
                }
                Ok(Some(line))
            }
            ReadResult::Eof => Ok(None),
            ReadResult::Signal(_) => Ok(None),
        }
    }

    fn say(&mut self, text: &str) -> io::Result<()> {
        println!("{}", text);
        Ok(())
    }
}

/// Run the menu until the user quits.
pub fn run<P: Prompt>(catalog: &mut Catalog, prompt: &mut P) -> Result<()> {
    let today = data::format_date(data::today())?;
    prompt.say(&format!("Personal Library Manager ({})", today))?;
    prompt.say(&format!("Total books loaded: {}", catalog.len()))?;
    prompt.say(HELP)?;

    loop {
        let choice = match prompt.ask("menu> ")? {
            Some(choice) => choice,
            None => break,
        };

        let choice = choice.trim().to_lowercase();
        debug!(choice = %choice, "menu");

        let command = match choice.as_str() {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "help" | "?" => {
                prompt.say(HELP)?;
                continue;
            }
            "home" => {
                prompt.say("Welcome to your personal library manager!")?;
                Some(Command::List)
            }
            "list" => Some(Command::List),
            "stats" => Some(Command::Stats),
            "add" => add_form(prompt)?,
            "remove" => pick_title(catalog, prompt, "remove")?.map(Command::Remove),
            "finish" => pick_title(catalog, prompt, "mark as read")?.map(Command::Finish),
            "search" => search_form(prompt)?,
            other => {
                prompt.say(&format!("Unknown choice `{}`. {}", other, HELP))?;
                continue;
            }
        };

        let command = match command {
            Some(command) => command,
            None => continue,
        };

        match exec_command(catalog, command) {
            Ok(out) => prompt.say(&out)?,
            Err(e) => report(prompt, &e)?,
        }
    }

    Ok(())
}

fn report<P: Prompt>(prompt: &mut P, err: &Error) -> Result<()> {
    let label = if err.is_validation() { "invalid input" } else { "error" };
    let mut text = format!("{}: {}", label, err);
    for cause in err.iter().skip(1) {
        text.push_str(&format!("\ncaused by: {}", cause));
    }
    prompt.say(&text)?;
    Ok(())
}

/// Ask one field; `None` when input ends.
fn field<P: Prompt>(prompt: &mut P, label: &str) -> Result<Option<String>> {
    Ok(prompt.ask(&format!("{}: ", label))?)
}

fn add_form<P: Prompt>(prompt: &mut P) -> Result<Option<Command>> {
    macro_rules! next {
        ($label:expr) => {
            match field(prompt, $label)? {
                Some(value) => value,
                None => return Ok(None),
            }
        };
    }

    let title = next!("Title");
    let author = next!("Author");
    let year = next!("Publication year");
    let genre = next!("Genre");
    let read = next!("Have you read this book? [y/N]");

    let year = match data::parse_year(&year) {
        Ok(year) => year,
        Err(e) => {
            report(prompt, &e)?;
            return Ok(None);
        }
    };

    let read = match read.trim().to_lowercase().as_str() {
        "y" | "yes" => true,
        _ => false,
    };

    Ok(Some(Command::Add(Draft { title, author, year, genre, read })))
}

/// Offer the current titles and read a number or an exact title.
fn pick_title<P: Prompt>(catalog: &Catalog, prompt: &mut P, verb: &str) -> Result<Option<String>> {
    if catalog.is_empty() {
        prompt.say("Your library is empty!")?;
        return Ok(None);
    }

    let titles: Vec<String> = catalog.titles().into_iter().map(String::from).collect();
    let mut menu = format!("Select a book to {}:", verb);
    for (n, title) in titles.iter().enumerate() {
        menu.push_str(&format!("\n  {}) {}", n + 1, title));
    }
    prompt.say(&menu)?;

    let answer = match field(prompt, "Book")? {
        Some(answer) => answer,
        None => return Ok(None),
    };
    let answer = answer.trim();

    // an exact title wins over a list number
    if titles.iter().any(|t| t == answer) {
        return Ok(Some(answer.to_string()));
    }

    if let Ok(n) = answer.parse::<usize>() {
        if n >= 1 && n <= titles.len() {
            return Ok(Some(titles[n - 1].clone()));
        }
    }

    prompt.say(&format!("No book `{}` in the list", answer))?;
    Ok(None)
}

fn search_form<P: Prompt>(prompt: &mut P) -> Result<Option<Command>> {
    let by = match field(prompt, "Search by (title/author/genre/year)")? {
        Some(by) => by,
        None => return Ok(None),
    };

    let by: Field = match by.parse() {
        Ok(by) => by,
        Err(e) => {
            report(prompt, &e)?;
            return Ok(None);
        }
    };

    match field(prompt, "Search term")? {
        Some(term) => Ok(Some(Command::Search(by, term))),
        None => Ok(None),
    }
}
