use std::fmt;

use prettytable::Table;
use tracing::{debug, warn};

use crate::data::{Draft, Entry};
use crate::errors::*;
use crate::store::{Catalog, Change, Field, Stats};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    Add(Draft),
    Remove(String),
    Finish(String),
    Search(Field, String),
    List,
    Stats,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Command::Add(ref d) => write!(f, "Add '{}' by '{}'", d.title, d.author),
            Command::Remove(ref title) => write!(f, "Remove entries titled '{}'", title),
            Command::Finish(ref title) => write!(f, "Mark '{}' as read", title),
            Command::Search(field, ref term) => write!(f, "Search {} for '{}'", field, term),
            Command::List => write!(f, "List entries"),
            Command::Stats => write!(f, "Show library statistics"),
        }
    }
}

/// Run `command` against `catalog` and render what the user should see.
pub fn exec_command(catalog: &mut Catalog, command: Command) -> Result<String> {
    match command {
        Command::Add(draft) => do_add(catalog, draft),
        Command::Remove(ref title) => do_remove(catalog, title),
        Command::Finish(ref title) => do_finish(catalog, title),
        Command::Search(field, ref term) => do_search(catalog, field, term),
        Command::List => Ok(do_list(catalog)),
        Command::Stats => Ok(do_stats(catalog)),
    }
}

fn do_add(catalog: &mut Catalog, draft: Draft) -> Result<String> {
    let entry = flushed(catalog.add_entry(draft)?)?;

    Ok(format!("Successfully added '{}' by {}", entry.title, entry.author))
}

fn do_remove(catalog: &mut Catalog, title: &str) -> Result<String> {
    let removed = flushed(catalog.remove_entry(title))?;

    if removed > 0 {
        Ok(format!("Removed {} entr{} titled '{}'", removed, plural(removed), title))
    } else {
        Ok(format!("Nothing titled '{}' to remove", title))
    }
}

fn do_finish(catalog: &mut Catalog, title: &str) -> Result<String> {
    let changed = flushed(catalog.mark_read(title))?;

    if changed > 0 {
        Ok(format!("'{}' marked as read", title))
    } else {
        Ok(format!("No unread entry titled '{}'", title))
    }
}

fn do_search(catalog: &Catalog, field: Field, term: &str) -> Result<String> {
    let entries = catalog.search_entries(field, term)?;

    if entries.is_empty() {
        return Ok("No books found!".into());
    }

    Ok(format!("{}Found {} result(s)", entry_table(&entries), entries.len()))
}

fn do_list(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return "Your library is empty!".into();
    }

    let entries: Vec<&Entry> = catalog.entries().iter().collect();
    format!("{}{} book(s) in your library", entry_table(&entries), entries.len())
}

fn do_stats(catalog: &Catalog) -> String {
    match catalog.compute_stats() {
        Some(stats) => {
            debug!(total = stats.total, ratio = stats.read_ratio(), "computed stats");
            stats_table(&stats).to_string()
        }
        None => "Your library is empty!".into(),
    }
}

/// A mutation that could not be written is still reported as an error.
fn flushed<T>(change: Change<T>) -> Result<T> {
    if let Err(ref e) = change.flush {
        warn!(error = %e, "change kept in memory only");
    }

    change.into_result().chain_err(|| "the change was applied but not saved")
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "y" } else { "ies" }
}

pub fn entry_table(entries: &[&Entry]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["#", "TITLE", "AUTHOR", "YEAR", "GENRE", "READ", "ADDED"]);

    for (n, entry) in entries.iter().enumerate() {
        table.add_row(row![n + 1,
                           entry.title,
                           entry.author,
                           entry.year,
                           entry.genre,
                           if entry.read { "✓" } else { "✗" },
                           entry.added_display()]);
    }

    table
}

pub fn stats_table(stats: &Stats) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Total books", stats.total]);
    table.add_row(row!["Books read", format!("{} ({}%)", stats.read, stats.read_percent())]);
    table.add_row(row!["Genres", stats.genre_count()]);
    table.add_row(row!["Publication years", format!("{} to {}", stats.oldest, stats.newest)]);
    table.add_row(row!["Genre list", stats.genres.join(", ")]);

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn draft(title: &str, year: i32, genre: &str, read: bool) -> Draft {
        Draft {
            title: title.into(),
            author: "Frank Herbert".into(),
            year,
            genre: genre.into(),
            read,
        }
    }

    fn catalog_in(dir: &TempDir) -> Catalog {
        Catalog::new(dir.path().join("library.json"))
    }

    #[test]
    fn add_then_list() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);

        let msg = exec_command(&mut catalog, Command::Add(draft("Dune", 1965, "Sci-Fi", false)))
            .unwrap();
        assert_eq!(msg, "Successfully added 'Dune' by Frank Herbert");

        let listing = exec_command(&mut catalog, Command::List).unwrap();
        assert!(listing.contains("Dune"));
        assert!(listing.contains("1965"));
        assert!(listing.ends_with("1 book(s) in your library"));
    }

    #[test]
    fn invalid_add_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);

        let err = exec_command(&mut catalog, Command::Add(draft("Dune", 1700, "Sci-Fi", false)))
            .unwrap_err();
        assert!(err.is_validation());
        assert!(catalog.is_empty());
    }

    #[test]
    fn unsaved_add_is_an_error_but_kept() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("library.json");
        std::fs::create_dir(&path).unwrap();
        let mut catalog = Catalog::new(&path);

        let err = exec_command(&mut catalog, Command::Add(draft("Dune", 1965, "Sci-Fi", false)))
            .unwrap_err();
        assert_eq!(err.to_string(), "the change was applied but not saved");
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn remove_reports_count() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);
        exec_command(&mut catalog, Command::Add(draft("Dune", 1965, "Sci-Fi", false))).unwrap();
        exec_command(&mut catalog, Command::Add(draft("Dune", 1965, "Sci-Fi", true))).unwrap();

        let msg = exec_command(&mut catalog, Command::Remove("Dune".into())).unwrap();
        assert_eq!(msg, "Removed 2 entries titled 'Dune'");

        let msg = exec_command(&mut catalog, Command::Remove("Dune".into())).unwrap();
        assert_eq!(msg, "Nothing titled 'Dune' to remove");
    }

    #[test]
    fn finish_marks_read() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);
        exec_command(&mut catalog, Command::Add(draft("Dune", 1965, "Sci-Fi", false))).unwrap();

        let msg = exec_command(&mut catalog, Command::Finish("Dune".into())).unwrap();
        assert_eq!(msg, "'Dune' marked as read");
        assert!(catalog.entries()[0].read);
    }

    #[test]
    fn search_renders_matches() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);
        exec_command(&mut catalog, Command::Add(draft("Dune", 1965, "Sci-Fi", false))).unwrap();
        exec_command(&mut catalog, Command::Add(draft("Dune Messiah", 1969, "Sci-Fi", false)))
            .unwrap();

        let out = exec_command(&mut catalog, Command::Search(Field::Year, "1969".into())).unwrap();
        assert!(out.contains("Dune Messiah"));
        assert!(out.ends_with("Found 1 result(s)"));

        let out = exec_command(&mut catalog, Command::Search(Field::Genre, "horror".into()))
            .unwrap();
        assert_eq!(out, "No books found!");

        let err = exec_command(&mut catalog, Command::Search(Field::Year, "soon".into()))
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn stats_render_floored_percentage() {
        let dir = TempDir::new().unwrap();
        let mut catalog = catalog_in(&dir);

        let out = exec_command(&mut catalog, Command::Stats).unwrap();
        assert_eq!(out, "Your library is empty!");

        exec_command(&mut catalog, Command::Add(draft("A", 1990, "Sci-Fi", true))).unwrap();
        exec_command(&mut catalog, Command::Add(draft("B", 2005, "Classic", true))).unwrap();
        exec_command(&mut catalog, Command::Add(draft("C", 2010, "Sci-Fi", false))).unwrap();

        let out = exec_command(&mut catalog, Command::Stats).unwrap();
        assert!(out.contains("2 (66%)"));
        assert!(out.contains("1990 to 2010"));
        assert!(out.contains("Sci-Fi, Classic"));
    }

    #[test]
    fn commands_describe_themselves() {
        let cmd = Command::Search(Field::Author, "Herbert".into());
        assert_eq!(cmd.to_string(), "Search author for 'Herbert'");
    }
}
