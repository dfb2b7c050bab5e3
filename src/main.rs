#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate prettytable;

mod commands;
mod data;
mod errors;
mod shell;
mod store;

use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command as App};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use xdg::BaseDirectories;

use crate::commands::{exec_command, Command};
use crate::data::Draft;
use crate::errors::*;
use crate::store::Catalog;

const NAME: &str = "bookshelf";
const LIBRARY_FILE: &str = "library.json";
const LIBRARY_ENV: &str = "BOOKSHELF_LIBRARY";
const LOG_ENV: &str = "BOOKSHELF_LOG";

fn build_cli() -> App {
    App::new(NAME)
        .author("Mark <mark.edward.x@gmail.com>")
        .about("personal book catalog")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(Arg::new("LIBRARY")
                 .short('l')
                 .long("library")
                 .value_name("PATH")
                 .env(LIBRARY_ENV)
                 .global(true)
                 .value_parser(value_parser!(PathBuf))
                 .help("library file to use instead of the XDG data file"))
        .arg(Arg::new("VERBOSE")
                 .short('v')
                 .long("verbose")
                 .global(true)
                 .action(ArgAction::Count)
                 .help("log more; repeat for debug output"))
        .subcommand(App::new("add")
                        .about("add a book")
                        .arg(Arg::new("TITLE")
                                 .required(true)
                                 .index(1)
                                 .help("title of the book"))
                        .arg(Arg::new("AUTHOR")
                                 .required(true)
                                 .index(2)
                                 .help("author of the book"))
                        .arg(Arg::new("YEAR")
                                 .required(true)
                                 .index(3)
                                 .value_parser(value_parser!(i32))
                                 .help("publication year"))
                        .arg(Arg::new("GENRE")
                                 .required(true)
                                 .index(4)
                                 .help("genre of the book"))
                        .arg(Arg::new("READ")
                                 .long("read")
                                 .action(ArgAction::SetTrue)
                                 .help("you have already read it")))
        .subcommand(App::new("remove")
                        .about("remove every book with exactly this title")
                        .arg(Arg::new("TITLE")
                                 .required(true)
                                 .index(1)
                                 .help("title of the book(s) to remove")))
        .subcommand(App::new("finish")
                        .about("mark every book with exactly this title as read")
                        .arg(Arg::new("TITLE")
                                 .required(true)
                                 .index(1)
                                 .help("title of the book(s) you finished")))
        .subcommand(App::new("search")
                        .about("find books. case insensitive on title, author and genre; \
                                exact on year")
                        .arg(Arg::new("FIELD")
                                 .required(true)
                                 .index(1)
                                 .value_parser(["title", "author", "genre", "year"])
                                 .help("field to search"))
                        .arg(Arg::new("TERM")
                                 .required(true)
                                 .index(2)
                                 .help("search term")))
        .subcommand(App::new("list").about("list every book in insertion order"))
        .subcommand(App::new("stats").about("show library statistics"))
        .subcommand(App::new("shell").about("browse the library interactively"))
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `--library`, then an existing XDG data file, then a new one.
fn library_path(matches: &ArgMatches) -> Result<PathBuf> {
    if let Some(path) = matches.get_one::<PathBuf>("LIBRARY") {
        return Ok(path.clone());
    }

    let bd = BaseDirectories::with_prefix(NAME)?;

    match bd.find_data_file(LIBRARY_FILE) {
        Some(path) => Ok(path),
        None => Ok(bd.place_data_file(LIBRARY_FILE)
            .chain_err(|| "could not create the data directory")?),
    }
}

fn arg(matches: &ArgMatches, name: &'static str) -> Result<String> {
    matches.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| ErrorKind::MissingField(name).into())
}

fn parse_command(name: &str, sub: &ArgMatches) -> Result<Option<Command>> {
    let command = match name {
        "add" => {
            Command::Add(Draft {
                title: arg(sub, "TITLE")?,
                author: arg(sub, "AUTHOR")?,
                year: *sub.get_one::<i32>("YEAR").ok_or(ErrorKind::MissingField("YEAR"))?,
                genre: arg(sub, "GENRE")?,
                read: sub.get_flag("READ"),
            })
        }
        "remove" => Command::Remove(arg(sub, "TITLE")?),
        "finish" => Command::Finish(arg(sub, "TITLE")?),
        "search" => Command::Search(arg(sub, "FIELD")?.parse()?, arg(sub, "TERM")?),
        "list" => Command::List,
        "stats" => Command::Stats,
        _ => return Ok(None),
    };

    Ok(Some(command))
}

fn run() -> Result<()> {
    let matches = build_cli().get_matches();

    init_logging(matches.get_count("VERBOSE"));

    let path = library_path(&matches)?;
    let (mut catalog, err) = Catalog::open(&path);
    if let Some(e) = err {
        warn!(error = %e, "starting with an empty library");
        eprintln!("Error loading library: {}", e);
    }
    info!(path = %catalog.path().display(), count = catalog.len(), "library ready");

    let (name, sub) = match matches.subcommand() {
        Some(pair) => pair,
        None => return Ok(()),
    };

    if name == "shell" {
        let mut reader = shell::LineReader::new(NAME)?;
        return shell::run(&mut catalog, &mut reader);
    }

    if let Some(command) = parse_command(name, sub)? {
        info!(command = %command, "executing");
        let msg = exec_command(&mut catalog, command)?;
        println!("{}", msg);
    }

    Ok(())
}

fn main() {
    if let Err(ref e) = run() {
        eprintln!("error: {}", e);
        for e in e.iter().skip(1) {
            eprintln!("caused by: {}", e);
        }
        ::std::process::exit(if e.is_validation() { 2 } else { 1 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Field;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }

    fn parse(args: &[&str]) -> Option<Command> {
        let matches = build_cli().try_get_matches_from(args).unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        parse_command(name, sub).unwrap()
    }

    #[test]
    fn add_arguments_become_a_draft() {
        let cmd = parse(&["bookshelf", "add", "Dune", "Frank Herbert", "1965", "Sci-Fi", "--read"]);

        assert_eq!(cmd, Some(Command::Add(Draft {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            year: 1965,
            genre: "Sci-Fi".into(),
            read: true,
        })));
    }

    #[test]
    fn search_takes_a_field_and_term() {
        let cmd = parse(&["bookshelf", "search", "year", "1950"]);
        assert_eq!(cmd, Some(Command::Search(Field::Year, "1950".into())));

        assert!(build_cli().try_get_matches_from(&["bookshelf", "search", "isbn", "1"]).is_err());
    }

    #[test]
    fn library_flag_overrides_xdg() {
        let matches = build_cli()
            .try_get_matches_from(&["bookshelf", "list", "--library", "/tmp/books.json"])
            .unwrap();

        assert_eq!(library_path(&matches).unwrap(), PathBuf::from("/tmp/books.json"));
    }

    #[test]
    fn shell_has_no_one_shot_command() {
        assert_eq!(parse(&["bookshelf", "shell"]), None);
    }
}
