// Client-side search over normalized records

use crate::record::Record;

/// Case-insensitive substring search across every value of a record.
///
/// The identifier is searched too. An empty term matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    term: String,
}

impl Filter {
    pub fn new(term: &str) -> Self {
        Self {
            term: term.to_lowercase(),
        }
    }

    /// The lowercased term
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn is_empty(&self) -> bool {
        self.term.is_empty()
    }

    pub fn matches(&self, record: &Record) -> bool {
        record
            .search_texts()
            .any(|text| text.to_lowercase().contains(&self.term))
    }

    /// Records that match, in list order. The input is never modified.
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}
