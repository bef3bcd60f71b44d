use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigLoadError;

/// File name LabelImg uses for the class list, looked up in the source folder.
pub const PREDEFINED_CLASSES_FILE: &str = "predefined_classes.txt";

/// Ordered list of class labels; a label's position is its class id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse newline-separated labels; whitespace is trimmed and blank lines dropped.
    pub fn parse(text: &str) -> Self {
        Self::new(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigLoadError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&raw))
    }

    /// Like [`ClassList::load`], but falls back to an empty list and hands the
    /// error back so the caller can report it.
    pub fn load_or_empty(path: impl AsRef<Path>) -> (Self, Option<ConfigLoadError>) {
        match Self::load(path) {
            Ok(list) => (list, None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_skips_blank_lines() {
        let list = ClassList::parse("trunk\r\n\n  branch \nstump");
        assert_eq!(list.names(), ["trunk", "branch", "stump"]);
        assert_eq!(list.index_of("branch"), Some(1));
        assert_eq!(list.index_of("trunk\n"), None);
        assert!(!list.contains("leaf"));
    }

    #[test]
    fn missing_file_yields_empty_list_and_error() {
        let (list, err) = ClassList::load_or_empty("/definitely/not/here/predefined_classes.txt");
        assert!(list.is_empty());
        let err = err.expect("error reported");
        assert!(err.to_string().contains("predefined_classes.txt"));
    }
}
