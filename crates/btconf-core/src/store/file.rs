//! Ordered, file-backed implementation of [`ConfigStore`].
//!
//! File syntax:
//!
//! ```text
//! # comment
//! [Adapter]
//! Address = 00:11:22:33:44:55
//!
//! [aa:bb:cc:dd:ee:ff]
//! Name = Headset
//! LinkKey = 00112233445566778899aabbccddeeff
//! ```
//!
//! Properties appearing before the first header land in the `Global`
//! section.  Sections and properties are written back in the order they were
//! first inserted.
//!
//! Names and values are escaped on save so any string reads back unchanged:
//! a backslash becomes `\\`, and control characters, syntax characters and
//! edge whitespace become `\u{hex}`.  Loading is lenient: a malformed line
//! is logged and skipped, never fatal to the rest of the file.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{ConfigStore, StoreError};

/// Section that receives properties found before any `[header]`.
pub const GLOBAL_SECTION: &str = "Global";

/// Characters escaped wherever they appear in a section name.
const SECTION_SPECIALS: &[char] = &['[', ']'];

/// Characters escaped wherever they appear in a property name.
const KEY_SPECIALS: &[char] = &['=', '[', ']', '#'];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: Vec::new(),
        }
    }

    fn find(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

/// Ordered in-memory config store with text load/save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    sections: Vec<Section>,
}

impl ConfigFile {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store from `path`.
    ///
    /// Malformed lines are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file cannot be read, including when
    /// it does not exist or is not valid UTF-8.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::parse(&content);
        debug!(
            "loaded {} sections from {}",
            store.sections.len(),
            path.display()
        );
        Ok(store)
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Returns `true` if the store holds no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Parses file content, skipping lines that are neither a header nor a
    /// `key = value` pair.
    fn parse(content: &str) -> Self {
        let mut store = Self::new();
        let mut current = GLOBAL_SECTION.to_string();

        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                match header.strip_suffix(']') {
                    Some(name) => current = unescape(name.trim()),
                    None => warn!("skipping malformed header on line {}: {raw:?}", idx + 1),
                }
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) => {
                    store.set(&current, &unescape(key.trim()), &unescape(value.trim()));
                }
                None => warn!("skipping malformed line {}: {raw:?}", idx + 1),
            }
        }

        store
    }

    /// Renders the store in file syntax.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", escape(&section.name, SECTION_SPECIALS)));
            for (key, value) in &section.entries {
                out.push_str(&format!(
                    "{} = {}\n",
                    escape(key, KEY_SPECIALS),
                    escape(value, &[])
                ));
            }
        }
        out
    }

    fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }
}

impl ConfigStore for ConfigFile {
    fn has_section(&self, section: &str) -> bool {
        self.section(section).is_some()
    }

    fn has_key(&self, section: &str, key: &str) -> bool {
        self.get(section, key).is_some()
    }

    fn get(&self, section: &str, key: &str) -> Option<&str> {
        let s = self.section(section)?;
        s.find(key).map(|i| s.entries[i].1.as_str())
    }

    fn set(&mut self, section: &str, key: &str, value: &str) {
        if self.section(section).is_none() {
            self.sections.push(Section::new(section));
        }
        let Some(s) = self.section_mut(section) else {
            return;
        };
        match s.find(key) {
            Some(i) => s.entries[i].1 = value.to_string(),
            None => s.entries.push((key.to_string(), value.to_string())),
        }
    }

    fn remove_key(&mut self, section: &str, key: &str) -> bool {
        let Some(pos) = self.sections.iter().position(|s| s.name == section) else {
            return false;
        };
        let s = &mut self.sections[pos];
        let Some(i) = s.find(key) else {
            return false;
        };
        s.entries.remove(i);
        if s.entries.is_empty() {
            self.sections.remove(pos);
        }
        true
    }

    fn remove_section(&mut self, section: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| s.name != section);
        self.sections.len() != before
    }

    fn sections(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.sections.iter().map(|s| s.name.as_str()))
    }

    fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        // Write next to the target and rename so a crash mid-write never
        // leaves a truncated config behind.
        let tmp = temp_path(path);
        std::fs::write(&tmp, self.serialize()).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

/// Escapes `raw` so it survives a save and load unchanged.
///
/// Whitespace is escaped only at either end, where parsing trims.
fn escape(raw: &str, specials: &[char]) -> String {
    let last = raw.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        let edge = (i == 0 || i == last) && c.is_whitespace();
        if c == '\\' {
            out.push_str("\\\\");
        } else if c.is_control() || edge || specials.contains(&c) {
            out.push_str(&format!("\\u{{{:x}}}", u32::from(c)));
        } else {
            out.push(c);
        }
    }
    out
}

/// Reverses [`escape`].  An unrecognised escape is kept literally.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        if let Some(after) = tail.strip_prefix('\\') {
            out.push('\\');
            rest = after;
        } else if let Some((c, after)) = unicode_escape(tail) {
            out.push(c);
            rest = after;
        } else {
            out.push('\\');
            rest = tail;
        }
    }
    out.push_str(rest);
    out
}

/// Decodes a leading `u{hex}` and returns the character and what follows.
fn unicode_escape(tail: &str) -> Option<(char, &str)> {
    let body = tail.strip_prefix("u{")?;
    let end = body.find('}')?;
    let c = u32::from_str_radix(&body[..end], 16)
        .ok()
        .and_then(char::from_u32)?;
    Some((c, &body[end + 1..]))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".new");
    PathBuf::from(name)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
