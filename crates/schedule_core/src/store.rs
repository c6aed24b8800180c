use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde_json::{Map, Value};
use walkdir::WalkDir;

pub type JsonMap = Map<String, Value>;

/// File access for one save directory. Every path is relative to the root;
/// a missing file reads as an empty object, a present-but-unparsable file is
/// `ErrorKind::InvalidData`.
#[derive(Debug, Clone)]
pub struct SaveStore {
    root: PathBuf,
}

impl SaveStore {
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("save directory not found: {}", root.display()),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root.join(rel)
    }

    pub fn exists(&self, rel: impl AsRef<Path>) -> bool {
        self.root.join(rel.as_ref()).exists()
    }

    // Write paths must not silently recreate a root that was deleted out
    // from under the session.
    fn ensure_root(&self) -> io::Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("save directory no longer exists: {}", self.root.display()),
        ))
    }

    pub fn read_json(&self, rel: impl AsRef<Path>) -> io::Result<JsonMap> {
        self.ensure_root()?;
        let rel = rel.as_ref();
        let path = self.root.join(rel);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(JsonMap::new()),
            Err(e) => return Err(e),
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: expected a JSON object", rel.display()),
            )),
            Err(e) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: {e}", rel.display()),
            )),
        }
    }

    pub fn write_json(&self, rel: impl AsRef<Path>, data: &JsonMap) -> io::Result<()> {
        self.ensure_root()?;
        let rel = rel.as_ref();
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut text = serde_json::to_string_pretty(data).map_err(io::Error::other)?;
        text.push('\n');
        debug!("writing {}", rel.display());
        fs::write(&path, text)
    }

    /// Lazy listing of files under `rel_dir` whose name matches `pattern`
    /// (literal name or a single `*` wildcard, e.g. `*.json`). Yields paths
    /// relative to the save root, in filesystem order.
    pub fn list_files(&self, rel_dir: impl AsRef<Path>, pattern: &str, recursive: bool) -> ListFiles {
        let dir = self.root.join(rel_dir.as_ref());
        let inner = if dir.is_dir() {
            let depth = if recursive { usize::MAX } else { 1 };
            Some(WalkDir::new(dir).max_depth(depth).into_iter())
        } else {
            None
        };
        ListFiles {
            root: self.root.clone(),
            pattern: pattern.to_string(),
            inner,
        }
    }

    pub fn list_dirs(&self, rel_dir: impl AsRef<Path>) -> io::Result<Vec<String>> {
        self.ensure_root()?;
        let dir = self.root.join(rel_dir.as_ref());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                out.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(out)
    }
}

pub struct ListFiles {
    root: PathBuf,
    pattern: String,
    inner: Option<walkdir::IntoIter>,
}

impl Iterator for ListFiles {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        let iter = self.inner.as_mut()?;
        loop {
            match iter.next()? {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy();
                    if !name_matches(&self.pattern, &name) {
                        continue;
                    }
                    if let Ok(rel) = entry.path().strip_prefix(&self.root) {
                        return Some(rel.to_path_buf());
                    }
                }
                Err(e) => {
                    debug!("skipping unreadable entry: {e}");
                    continue;
                }
            }
        }
    }
}

fn name_matches(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
        None => name == pattern,
    }
}
