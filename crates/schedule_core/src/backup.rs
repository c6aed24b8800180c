use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;
use walkdir::WalkDir;

pub const FEATURE_AREA: &str = "feature_backups";

const STAGING_SUFFIX: &str = ".partial";
const RETIRED_SUFFIX: &str = ".replaced";

/// Two-tier backups for one save root: a one-time full mirror at
/// `<SaveRoot>_Backup`, plus timestamped per-feature snapshots under
/// `<SaveRoot>_Backup/feature_backups/<feature>/<timestamp>/`.
///
/// Every tree replacement is staged at a temporary sibling and renamed into
/// place; the old tree is deleted only after the swap, so an interrupted
/// operation never leaves a torn tree under the live name.
#[derive(Debug, Clone)]
pub struct BackupManager {
    save_root: PathBuf,
    backup_root: PathBuf,
}

impl BackupManager {
    pub fn new(save_root: impl Into<PathBuf>) -> io::Result<Self> {
        let save_root = save_root.into();
        let name = save_root.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("save root has no directory name: {}", save_root.display()),
            )
        })?;
        let mut backup_name = name.to_os_string();
        backup_name.push("_Backup");
        let backup_root = save_root.with_file_name(backup_name);
        Ok(Self {
            save_root,
            backup_root,
        })
    }

    pub fn save_root(&self) -> &Path {
        &self.save_root
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    pub fn feature_area(&self) -> PathBuf {
        self.backup_root.join(FEATURE_AREA)
    }

    pub fn snapshot_dir(&self, feature: &str, stamp: &str) -> PathBuf {
        self.feature_area().join(feature).join(stamp)
    }

    pub fn has_initial_backup(&self) -> bool {
        self.backup_root.is_dir()
    }

    /// Full mirror of the save root, created at most once. Returns whether a
    /// backup was written by this call.
    pub fn ensure_initial_backup(&self) -> io::Result<bool> {
        if self.has_initial_backup() {
            return Ok(false);
        }
        let staging = sibling(&self.backup_root, STAGING_SUFFIX);
        remove_if_present(&staging)?;
        copy_tree(&self.save_root, &staging, &[])?;
        fs::rename(&staging, &self.backup_root)?;
        info!("created initial backup at {}", self.backup_root.display());
        Ok(true)
    }

    /// Self-contained copy of each given file or directory, keyed by feature
    /// name and a `%Y%m%d%H%M%S` stamp. Paths are relative to the save root
    /// and keep that relative layout inside the snapshot; absent paths are
    /// skipped (the feature is about to create them). Same-second snapshots
    /// get a numeric suffix instead of overwriting. Returns the stamp token.
    pub fn snapshot_feature<P: AsRef<Path>>(
        &self,
        feature: &str,
        rel_paths: &[P],
    ) -> io::Result<String> {
        // The origin checkpoint must exist before a snapshot claims the
        // backup root, or a later revert_all would restore an empty tree.
        self.ensure_initial_backup()?;
        let feature_dir = self.feature_area().join(feature);
        fs::create_dir_all(&feature_dir)?;

        let stamp = Local::now().format("%Y%m%d%H%M%S").to_string();
        let mut token = stamp.clone();
        let mut attempt = 1;
        while feature_dir.join(&token).exists() {
            attempt += 1;
            token = format!("{stamp}-{attempt}");
        }
        let snapshot = feature_dir.join(&token);
        fs::create_dir_all(&snapshot)?;

        for rel in rel_paths {
            let rel = rel.as_ref();
            let src = self.save_root.join(rel);
            let dst = snapshot.join(rel);
            if src.is_dir() {
                copy_tree(&src, &dst, &[])?;
            } else if src.is_file() {
                if let Some(parent) = dst.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&src, &dst)?;
            }
        }
        info!("feature backup {feature}/{token} written");
        Ok(token)
    }

    /// All feature backups, timestamps most-recent-first.
    pub fn list_feature_backups(&self) -> io::Result<BTreeMap<String, Vec<String>>> {
        let mut out = BTreeMap::new();
        let area = self.feature_area();
        if !area.is_dir() {
            return Ok(out);
        }
        for feature in fs::read_dir(&area)? {
            let feature = feature?;
            if !feature.file_type()?.is_dir() {
                continue;
            }
            let mut stamps = Vec::new();
            for snapshot in fs::read_dir(feature.path())? {
                let snapshot = snapshot?;
                if snapshot.file_type()?.is_dir() {
                    stamps.push(snapshot.file_name().to_string_lossy().into_owned());
                }
            }
            if stamps.is_empty() {
                continue;
            }
            stamps.sort();
            stamps.reverse();
            out.insert(feature.file_name().to_string_lossy().into_owned(), stamps);
        }
        Ok(out)
    }

    /// Replaces each top-level entry recorded in the snapshot with the
    /// backed-up copy. Entries not present in the snapshot are left alone;
    /// cross-feature state reverted out from under another feature is the
    /// caller's concern. `ErrorKind::NotFound` if the snapshot is absent.
    pub fn revert_feature(&self, feature: &str, stamp: &str) -> io::Result<()> {
        let snapshot = self.snapshot_dir(feature, stamp);
        if !snapshot.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("backup not found: {feature}/{stamp}"),
            ));
        }
        for entry in fs::read_dir(&snapshot)? {
            let entry = entry?;
            let live = self.save_root.join(entry.file_name());
            if entry.file_type()?.is_dir() {
                replace_dir(&entry.path(), &live)?;
            } else {
                replace_file(&entry.path(), &live)?;
            }
        }
        info!("reverted feature {feature} to {stamp}");
        Ok(())
    }

    /// Restores the initial backup over the whole live tree.
    /// `ErrorKind::NotFound` if no initial backup exists. Feature backups are
    /// left on disk afterwards but describe the superseded tree.
    pub fn revert_all(&self) -> io::Result<()> {
        if !self.has_initial_backup() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "no initial backup to restore",
            ));
        }
        // The feature area nests inside the backup root; it mirrors nothing
        // in a live save and must not be restored into one.
        let staging = sibling(&self.save_root, STAGING_SUFFIX);
        remove_if_present(&staging)?;
        copy_tree(&self.backup_root, &staging, &[FEATURE_AREA])?;
        swap_staged(&staging, &self.save_root)?;
        info!("restored initial backup over {}", self.save_root.display());
        Ok(())
    }

    /// Removes the entire backup tree, initial backup included. Returns
    /// whether anything was there to remove.
    pub fn delete_all_backups(&self) -> io::Result<bool> {
        if !self.backup_root.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&self.backup_root)?;
        info!("deleted backup tree {}", self.backup_root.display());
        Ok(true)
    }
}

pub(crate) fn copy_tree(src: &Path, dst: &Path, skip_top: &[&str]) -> io::Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?
            .to_path_buf();
        if rel.as_os_str().is_empty() {
            fs::create_dir_all(dst)?;
            continue;
        }
        if let Some(first) = rel.components().next() {
            if skip_top.iter().any(|skip| first.as_os_str() == *skip) {
                continue;
            }
        }
        let target = dst.join(&rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn replace_dir(snapshot: &Path, live: &Path) -> io::Result<()> {
    let staging = sibling(live, STAGING_SUFFIX);
    remove_if_present(&staging)?;
    copy_tree(snapshot, &staging, &[])?;
    if live.exists() {
        swap_staged(&staging, live)
    } else {
        if let Some(parent) = live.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&staging, live)
    }
}

fn replace_file(snapshot: &Path, live: &Path) -> io::Result<()> {
    let staging = sibling(live, STAGING_SUFFIX);
    if let Some(parent) = live.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(snapshot, &staging)?;
    if live.is_file() {
        fs::remove_file(live)?;
    }
    fs::rename(&staging, live)
}

// Retire the live tree, move the staged one into its place, then drop the
// retired tree. The live name always points at a complete tree.
fn swap_staged(staging: &Path, live: &Path) -> io::Result<()> {
    let retired = sibling(live, RETIRED_SUFFIX);
    remove_if_present(&retired)?;
    fs::rename(live, &retired)?;
    if let Err(e) = fs::rename(staging, live) {
        let _ = fs::rename(&retired, live);
        return Err(e);
    }
    remove_if_present(&retired)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.is_file() {
        fs::remove_file(path)
    } else {
        Ok(())
    }
}
