//! Output sinks: a directory-structured output file and an in-memory sink.
//!
//! The file keeps a tree of directories, each holding an ordered list of
//! keys. Writing an object whose name already exists in the current
//! directory adds a new cycle instead of overwriting, and lookups return
//! the highest cycle. On [`OutputFile::finish`] the whole tree is written as
//! pretty JSON.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use hb_core::{ObjectSink, Result, StoredObject};
use serde::{Deserialize, Serialize};

/// One stored object with its cycle number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredKey {
    /// Cycle number (1 for the first write of a name in a directory).
    pub cycle: u16,
    /// The object.
    pub object: StoredObject,
}

/// A directory: keys in write order plus named subdirectories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Directory {
    #[serde(default)]
    keys: Vec<StoredKey>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    dirs: BTreeMap<String, Directory>,
}

impl Directory {
    /// Keys in write order.
    pub fn keys(&self) -> &[StoredKey] {
        &self.keys
    }

    /// Subdirectory by name.
    pub fn subdir(&self, name: &str) -> Option<&Directory> {
        self.dirs.get(name)
    }

    /// Subdirectory names.
    pub fn subdir_names(&self) -> Vec<&str> {
        self.dirs.keys().map(String::as_str).collect()
    }

    /// Distinct object names in this directory, in first-write order.
    pub fn object_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for k in &self.keys {
            let name = k.object.name();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Find an object by slash-separated path (returns the highest cycle).
    pub fn get(&self, path: &str) -> Option<&StoredObject> {
        let (dir_path, name) = match path.rsplit_once('/') {
            Some((d, n)) => (d, n),
            None => ("", path),
        };
        let mut dir = self;
        for part in dir_path.split('/').filter(|p| !p.is_empty()) {
            dir = dir.dirs.get(part)?;
        }
        dir.keys
            .iter()
            .filter(|k| k.object.name() == name)
            .max_by_key(|k| k.cycle)
            .map(|k| &k.object)
    }

    fn subdir_mut(&mut self, path: &[String]) -> &mut Directory {
        let mut dir = self;
        for part in path {
            dir = dir.dirs.entry(part.clone()).or_default();
        }
        dir
    }

    fn push(&mut self, object: StoredObject) {
        let existing = self.keys.iter().filter(|k| k.object.name() == object.name()).count();
        let cycle = next_cycle(existing);
        if cycle == u16::MAX {
            log::warn!("'{}' reached the last key cycle ({cycle})", object.name());
        }
        self.keys.push(StoredKey { cycle, object });
    }
}

/// Cycle for the next write of a name already written `existing` times.
///
/// Saturates at `u16::MAX`; later writes share that cycle and the most
/// recent one wins on lookup.
fn next_cycle(existing: usize) -> u16 {
    u16::try_from(existing).ok().and_then(|n| n.checked_add(1)).unwrap_or(u16::MAX)
}

/// A directory-structured output file.
///
/// Objects are held in memory until [`finish`](Self::finish).
#[derive(Debug)]
pub struct OutputFile {
    path: PathBuf,
    root: Directory,
    cwd: Vec<String>,
}

impl OutputFile {
    /// Start a new output file at `path`. Nothing is written until `finish`.
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), root: Directory::default(), cwd: Vec::new() }
    }

    /// Change the current directory, creating it if needed.
    ///
    /// Paths are absolute from the file root; `""` or `"/"` is the root.
    pub fn cd(&mut self, path: &str) {
        self.cwd = path.split('/').filter(|p| !p.is_empty()).map(str::to_string).collect();
        self.root.subdir_mut(&self.cwd);
    }

    /// Current directory as a slash-separated path (`""` at the root).
    pub fn pwd(&self) -> String {
        self.cwd.join("/")
    }

    /// Root directory (for inspection before `finish`).
    pub fn root(&self) -> &Directory {
        &self.root
    }

    /// Serialize the directory tree to disk and return the path.
    pub fn finish(self) -> Result<PathBuf> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut w, &self.root)?;
        w.flush()?;
        log::debug!("wrote output file {}", self.path.display());
        Ok(self.path)
    }

    /// Read back a file produced by [`finish`](Self::finish).
    pub fn read(path: impl AsRef<Path>) -> Result<Directory> {
        let file = File::open(path.as_ref())?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl ObjectSink for OutputFile {
    fn write_object(&mut self, object: StoredObject) -> Result<()> {
        log::debug!("writing {} '{}' into /{}", object.class_name(), object.name(), self.pwd());
        let cwd = self.cwd.clone();
        self.root.subdir_mut(&cwd).push(object);
        Ok(())
    }
}

/// Sink that keeps written objects in a list.
#[derive(Debug, Default)]
pub struct MemorySink {
    objects: Vec<StoredObject>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Objects in write order.
    pub fn objects(&self) -> &[StoredObject] {
        &self.objects
    }

    /// Names of written objects, in write order.
    pub fn names(&self) -> Vec<&str> {
        self.objects.iter().map(StoredObject::name).collect()
    }

    /// Last written object with `name`.
    pub fn get(&self, name: &str) -> Option<&StoredObject> {
        self.objects.iter().rev().find(|o| o.name() == name)
    }
}

impl ObjectSink for MemorySink {
    fn write_object(&mut self, object: StoredObject) -> Result<()> {
        self.objects.push(object);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(name: &str, rows: usize) -> StoredObject {
        StoredObject::Tree {
            name: name.into(),
            title: String::new(),
            fields: vec!["x".into()],
            rows: vec![vec![0.0]; rows],
        }
    }

    #[test]
    fn rewrite_adds_cycle() {
        let mut out = OutputFile::create("unused.json");
        out.write_object(tree("t", 1)).unwrap();
        out.write_object(tree("t", 2)).unwrap();
        let keys = out.root().keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[1].cycle, 2);
        match out.root().get("t").unwrap() {
            StoredObject::Tree { rows, .. } => assert_eq!(rows.len(), 2),
            other => panic!("unexpected object: {other:?}"),
        }
        assert_eq!(out.root().object_names(), ["t"]);
    }

    #[test]
    fn cycle_saturates() {
        assert_eq!(next_cycle(0), 1);
        assert_eq!(next_cycle(41), 42);
        assert_eq!(next_cycle(u16::MAX as usize - 1), u16::MAX);
        assert_eq!(next_cycle(u16::MAX as usize), u16::MAX);
        assert_eq!(next_cycle(1 << 20), u16::MAX);
    }

    #[test]
    fn saturated_cycle_lookup_returns_latest() {
        let mut dir = Directory::default();
        dir.keys = (1..=u16::MAX).map(|cycle| StoredKey { cycle, object: tree("t", 1) }).collect();
        dir.push(tree("t", 7));
        assert_eq!(dir.keys().last().unwrap().cycle, u16::MAX);
        match dir.get("t").unwrap() {
            StoredObject::Tree { rows, .. } => assert_eq!(rows.len(), 7),
            other => panic!("unexpected object: {other:?}"),
        }
    }

    #[test]
    fn cd_creates_nested_dirs() {
        let mut out = OutputFile::create("unused.json");
        out.cd("Muons/Iso");
        assert_eq!(out.pwd(), "Muons/Iso");
        out.write_object(tree("t", 0)).unwrap();
        out.cd("/");
        out.write_object(tree("top", 0)).unwrap();

        assert!(out.root().get("Muons/Iso/t").is_some());
        assert!(out.root().get("t").is_none());
        assert!(out.root().get("top").is_some());
        assert_eq!(out.root().subdir_names(), ["Muons"]);
    }

    #[test]
    fn memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        sink.write_object(tree("b", 0)).unwrap();
        sink.write_object(tree("a", 0)).unwrap();
        assert_eq!(sink.names(), ["b", "a"]);
        assert!(sink.get("a").is_some());
    }
}
