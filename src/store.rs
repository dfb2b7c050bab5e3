//! The catalog and its JSON file.
//!
//! Every mutation is written through to disk straight away. A failed write
//! leaves the in-memory catalog ahead of the file; nothing is rolled back
//! or retried.

use std::fmt;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use time::Date;
use tracing::{debug, info, warn};

use crate::data::{self, Draft, Entry};
use crate::errors::*;

/// Outcome of a mutation that was applied in memory.
///
/// `flush` carries the result of writing the catalog back to disk.
#[derive(Debug)]
pub struct Change<T> {
    pub value: T,
    pub flush: Result<()>,
}

impl<T> Change<T> {
    /// Fold a failed flush into an error, dropping the value.
    pub fn into_result(self) -> Result<T> {
        let Change { value, flush } = self;
        flush.map(|_| value)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Field {
    Title,
    Author,
    Genre,
    Year,
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Field> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(Field::Title),
            "author" => Ok(Field::Author),
            "genre" => Ok(Field::Genre),
            "year" => Ok(Field::Year),
            _ => Err(ErrorKind::UnknownField(s.to_string()).into()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Genre => "genre",
            Field::Year => "year",
        };
        f.write_str(name)
    }
}

/// Aggregates over a non-empty catalog.
#[derive(Debug, PartialEq, Clone)]
pub struct Stats {
    pub total: usize,
    pub read: usize,
    /// Distinct genres in order of first appearance.
    pub genres: Vec<String>,
    pub oldest: i32,
    pub newest: i32,
}

impl Stats {
    pub fn read_ratio(&self) -> f64 {
        self.read as f64 / self.total as f64
    }

    /// Share of read books as a whole percentage, rounded down.
    pub fn read_percent(&self) -> usize {
        self.read * 100 / self.total
    }

    pub fn genre_count(&self) -> usize {
        self.genres.len()
    }
}

#[derive(Debug)]
pub struct Catalog {
    entries: Vec<Entry>,
    path: PathBuf,
}

impl Catalog {
    /// An empty catalog that will be saved to `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Catalog {
        Catalog {
            entries: Vec::new(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a catalog for `path` and load it.
    ///
    /// A load failure is handed back next to the (empty) catalog so the
    /// caller can report it and carry on.
    pub fn open<P: AsRef<Path>>(path: P) -> (Catalog, Option<Error>) {
        let mut catalog = Catalog::new(path);
        let err = catalog.load().err();
        (catalog, err)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.title.as_str()).collect()
    }

    /// Replace the in-memory entries with the file's contents.
    ///
    /// A missing file is an empty catalog. On any error the catalog is
    /// left empty.
    pub fn load(&mut self) -> Result<usize> {
        self.entries.clear();

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(ref e) if e.kind() == IoErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no library file yet");
                return Ok(0);
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read library");
                return Err(Error::with_chain(e, ErrorKind::Storage(self.path.clone())));
            }
        };

        let entries: Vec<Entry> = match serde_json::from_str(&text) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse library");
                return Err(Error::with_chain(e, ErrorKind::Storage(self.path.clone())));
            }
        };

        self.entries = entries;
        info!(path = %self.path.display(), count = self.entries.len(), "library loaded");

        Ok(self.entries.len())
    }

    /// Overwrite the file with the whole catalog.
    pub fn save(&self) -> Result<()> {
        let res = self.write_file();
        match res {
            Ok(()) => debug!(path = %self.path.display(), count = self.entries.len(), "library saved"),
            Err(ref e) => warn!(path = %self.path.display(), error = %e, "failed to save library"),
        }

        res.chain_err(|| ErrorKind::Storage(self.path.clone()))
    }

    fn write_file(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        self.entries.serialize(&mut ser)?;
        buf.push(b'\n');

        fs::write(&self.path, buf)?;

        Ok(())
    }

    /// Add a book dated today.
    pub fn add_entry(&mut self, draft: Draft) -> Result<Change<Entry>> {
        self.add_entry_on(draft, data::today())
    }

    /// Add a book dated `today`.
    ///
    /// Validation errors leave the catalog untouched.
    pub fn add_entry_on(&mut self, draft: Draft, today: Date) -> Result<Change<Entry>> {
        let entry = Entry::from_draft(draft, today)?;

        info!(title = %entry.title, author = %entry.author, "adding entry");
        self.entries.push(entry.clone());

        Ok(Change {
            value: entry,
            flush: self.save(),
        })
    }

    /// Remove every entry titled exactly `title`.
    pub fn remove_entry(&mut self, title: &str) -> Change<usize> {
        let before = self.entries.len();
        self.entries.retain(|e| e.title != title);
        let removed = before - self.entries.len();

        if removed == 0 {
            debug!(title, "nothing to remove");
            return Change { value: 0, flush: Ok(()) };
        }

        info!(title, removed, "removed entries");
        Change {
            value: removed,
            flush: self.save(),
        }
    }

    /// Mark every entry titled exactly `title` as read.
    pub fn mark_read(&mut self, title: &str) -> Change<usize> {
        let mut changed = 0;
        for entry in self.entries.iter_mut().filter(|e| e.title == title && !e.read) {
            entry.read = true;
            changed += 1;
        }

        if changed == 0 {
            return Change { value: 0, flush: Ok(()) };
        }

        info!(title, changed, "marked as read");
        Change {
            value: changed,
            flush: self.save(),
        }
    }

    /// Entries matching `term` on `field`, in catalog order.
    ///
    /// Text fields match case-insensitive substrings; years match exactly.
    pub fn search_entries(&self, field: Field, term: &str) -> Result<Vec<&Entry>> {
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let hits = match field {
            Field::Year => {
                let year = data::parse_year(term)?;
                self.entries.iter().filter(|e| e.year == year).collect()
            }
            Field::Title => contains(&self.entries, term, |e| &e.title),
            Field::Author => contains(&self.entries, term, |e| &e.author),
            Field::Genre => contains(&self.entries, term, |e| &e.genre),
        };

        Ok(hits)
    }

    /// `None` when there is nothing to count.
    pub fn compute_stats(&self) -> Option<Stats> {
        let first = self.entries.first()?;

        let mut stats = Stats {
            total: self.entries.len(),
            read: 0,
            genres: Vec::new(),
            oldest: first.year,
            newest: first.year,
        };

        for entry in &self.entries {
            if entry.read {
                stats.read += 1;
            }
            if !stats.genres.contains(&entry.genre) {
                stats.genres.push(entry.genre.clone());
            }
            stats.oldest = stats.oldest.min(entry.year);
            stats.newest = stats.newest.max(entry.year);
        }

        Some(stats)
    }
}

fn contains<'a, F>(entries: &'a [Entry], term: &str, field: F) -> Vec<&'a Entry>
    where F: Fn(&Entry) -> &String
{
    let needle = term.to_lowercase();
    entries.iter()
        .filter(|e| field(e).to_lowercase().contains(&needle))
        .collect()
}
