use std::io;
use std::path::PathBuf;

error_chain! {
    foreign_links {
        Io(io::Error);
        Json(serde_json::Error);
        Xdg(xdg::BaseDirectoriesError);
        DateFormat(time::error::Format);
    }

    errors {
        MissingField(field: &'static str) {
            description("Missing required field")
            display("Required field `{}` is empty", field)
        }
        YearOutOfRange(year: i32, max: i32) {
            description("Year out of range")
            display("Year {} is not between {} and {}", year, crate::data::MIN_YEAR, max)
        }
        BadYear(term: String) {
            description("Year is not an integer")
            display("`{}` is not a valid year", term)
        }
        UnknownField(name: String) {
            description("Unknown search field")
            display("Cannot search by `{}`; use title, author, genre or year", name)
        }
        Storage(path: PathBuf) {
            description("Library file unreadable or unwritable")
            display("Could not access library file `{}`", path.display())
        }
    }
}

impl Error {
    /// True for bad user input, which never mutates the catalog.
    pub fn is_validation(&self) -> bool {
        match *self.kind() {
            ErrorKind::MissingField(_) |
            ErrorKind::YearOutOfRange(..) |
            ErrorKind::BadYear(_) |
            ErrorKind::UnknownField(_) => true,
            _ => false,
        }
    }
}
