//! Canonical book ordering.
//!
//! Book codes follow OSIS abbreviations. The order is the Protestant canon with
//! the deuterocanonical books placed between the testaments, which is how most
//! SWORD modules with apocrypha lay them out.

/// All known book codes in canonical order.
pub const BOOKS: &[&str] = &[
    // Old Testament
    "Gen", "Exod", "Lev", "Num", "Deut", "Josh", "Judg", "Ruth", "1Sam", "2Sam", "1Kgs", "2Kgs",
    "1Chr", "2Chr", "Ezra", "Neh", "Esth", "Job", "Ps", "Prov", "Eccl", "Song", "Isa", "Jer",
    "Lam", "Ezek", "Dan", "Hos", "Joel", "Amos", "Obad", "Jonah", "Mic", "Nah", "Hab", "Zeph",
    "Hag", "Zech", "Mal",
    // Deuterocanon
    "Tob", "Jdt", "AddEsth", "Wis", "Sir", "Bar", "EpJer", "PrAzar", "Sus", "Bel", "1Macc",
    "2Macc", "3Macc", "4Macc", "PrMan", "1Esd", "2Esd", "AddPs",
    // New Testament
    "Matt", "Mark", "Luke", "John", "Acts", "Rom", "1Cor", "2Cor", "Gal", "Eph", "Phil", "Col",
    "1Thess", "2Thess", "1Tim", "2Tim", "Titus", "Phlm", "Heb", "Jas", "1Pet", "2Pet", "1John",
    "2John", "3John", "Jude", "Rev",
];

/// Position of a book in canonical order, if the code is known.
pub fn book_index(code: &str) -> Option<usize> {
    BOOKS.iter().position(|b| *b == code)
}

/// Whether `code` is a known OSIS book code.
pub fn is_known_book(code: &str) -> bool {
    book_index(code).is_some()
}

/// Sort key for a book: known books by canonical position, unknown books
/// after all known ones.
pub(crate) fn book_sort_key(code: &str) -> (usize, &str) {
    match book_index(code) {
        Some(idx) => (idx, ""),
        None => (BOOKS.len(), code),
    }
}
