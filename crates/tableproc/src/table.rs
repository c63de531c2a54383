//! A table backed by a flat text file.
//!
//! One entry per line: `key value`, or a bare `key` for a set member.
//! Blank lines and lines starting with `#` are skipped. A repeated key
//! keeps its first position and takes the later value.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tableproc_api::{HandlerRegistry, Key, KeyKind, Outcome, ValueBuffer};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug)]
pub struct StaticTable {
    path: PathBuf,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    cursor: usize,
}

impl StaticTable {
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path)?;
        let mut table = Self {
            path,
            entries: Vec::new(),
            index: HashMap::new(),
            cursor: 0,
        };
        table.replace(parse(&text));
        Ok(table)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-read the file. On error the current contents stay in place.
    pub fn reload(&mut self) -> io::Result<()> {
        let text = std::fs::read_to_string(&self.path)?;
        self.replace(parse(&text));
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// The value stored for `key`. Set members have none.
    pub fn get(&self, key: &str) -> Option<&str> {
        let entry = &self.entries[*self.index.get(key)?];
        entry.value.as_deref()
    }

    /// The next entry in file order, wrapping at the end.
    ///
    /// Yields the value, or the key itself for set members.
    pub fn next_entry(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let entry = &self.entries[self.cursor % self.entries.len()];
        self.cursor = (self.cursor + 1) % self.entries.len();
        Some(entry.value.as_deref().unwrap_or(&entry.key))
    }

    fn replace(&mut self, entries: Vec<Entry>) {
        self.entries.clear();
        self.index.clear();
        self.cursor = 0;
        for entry in entries {
            match self.index.get(&entry.key) {
                Some(&at) => self.entries[at].value = entry.value,
                None => {
                    self.index.insert(entry.key.clone(), self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
    }
}

pub fn parse(text: &str) -> Vec<Entry> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| match line.split_once(char::is_whitespace) {
            Some((key, value)) => Entry {
                key: key.to_string(),
                value: Some(value.trim_start().to_string()),
            },
            None => Entry {
                key: line.to_string(),
                value: None,
            },
        })
        .collect()
}

/// Handlers answering from a shared table.
///
/// The key type is logged but not used: a flat file serves every kind the
/// same way. The file is UTF-8, so a key that is not can never match.
pub fn registry(table: Rc<RefCell<StaticTable>>) -> HandlerRegistry {
    let mut handlers = HandlerRegistry::new();

    let shared = Rc::clone(&table);
    handlers.on_update(move || {
        let mut table = shared.borrow_mut();
        match table.reload() {
            Ok(()) => {
                info!(path = %table.path().display(), entries = table.len(), "table reloaded");
                Outcome::Found
            }
            Err(err) => {
                warn!(path = %table.path().display(), error = %err, "table reload failed");
                Outcome::Failed
            }
        }
    });

    let shared = Rc::clone(&table);
    handlers.on_check(move |kind, key| {
        debug!(kind = KeyKind::describe(kind), %key, "check");
        Outcome::from(text_key(key).is_some_and(|key| shared.borrow().contains(key)))
    });

    let shared = Rc::clone(&table);
    handlers.on_lookup(move |kind, key, out| {
        debug!(kind = KeyKind::describe(kind), %key, "lookup");
        let Some(key) = text_key(key) else {
            return Outcome::NotFound;
        };
        match shared.borrow().get(key) {
            Some(value) => store(out, value),
            None => Outcome::NotFound,
        }
    });

    handlers.on_fetch(move |kind, out| {
        debug!(kind = KeyKind::describe(kind), "fetch");
        match table.borrow_mut().next_entry() {
            Some(value) => store(out, value),
            None => Outcome::NotFound,
        }
    });

    handlers
}

fn text_key<'a>(key: Key<'a>) -> Option<&'a str> {
    let text = key.to_str();
    if text.is_none() {
        debug!(%key, "key is not UTF-8");
    }
    text
}

fn store(out: &mut ValueBuffer, value: &str) -> Outcome {
    match out.set(value) {
        Ok(()) => Outcome::Found,
        Err(err) => {
            warn!(error = %err, "value does not fit in a reply");
            Outcome::Failed
        }
    }
}
