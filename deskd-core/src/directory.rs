use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::infrastructure::DeskDirectory;
use crate::types::DeskId;

/// A fixed list of desks, typically read from a file with one name per line.
#[derive(Debug, Clone, Default)]
pub struct DeskList {
    desks: Vec<DeskId>,
    known: HashSet<DeskId>,
}

impl DeskList {
    /// Build from names, keeping the first occurrence of each and skipping blanks.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            let desk = DeskId::from(name);
            if list.known.insert(desk.clone()) {
                list.desks.push(desk);
            }
        }
        list
    }

    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::from_names(contents.lines()))
    }

    pub fn len(&self) -> usize {
        self.desks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.desks.is_empty()
    }
}

impl DeskDirectory for DeskList {
    fn desks(&self) -> Vec<DeskId> {
        self.desks.clone()
    }

    fn desk_exists(&self, desk: &DeskId) -> bool {
        self.known.contains(desk)
    }
}
