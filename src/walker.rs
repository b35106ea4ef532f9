use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use tracing::warn;
use zip::ZipArchive;

use crate::error::AnalysisError;

/// Where a class entry came from: the outer WAR, and the nested library
/// jar when the entry was packaged under `WEB-INF/lib/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ClassOrigin {
    pub(crate) archive: PathBuf,
    pub(crate) nested: Option<String>,
}

impl fmt::Display for ClassOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.nested {
            Some(nested) => write!(f, "{}!/{nested}", self.archive.display()),
            None => write!(f, "{}", self.archive.display()),
        }
    }
}

/// One class file pulled out of the archive, bytes still undecoded.
#[derive(Clone, Debug)]
pub(crate) struct ClassEntry {
    pub(crate) origin: ClassOrigin,
    pub(crate) path: String,
    pub(crate) bytes: Vec<u8>,
}

/// Streams class entries out of a WAR in archive order: loose classes
/// under `WEB-INF/classes/`, then the contents of each `WEB-INF/lib/*.jar`
/// at the position its containing entry appears. Unreadable entries are
/// skipped with a diagnostic; they never abort the walk.
pub(crate) struct ArchiveWalker {
    archive_path: PathBuf,
    archive: ZipArchive<File>,
    index: usize,
    nested: Option<NestedArchive>,
}

struct NestedArchive {
    name: String,
    archive: ZipArchive<Cursor<Vec<u8>>>,
    index: usize,
}

impl ArchiveWalker {
    pub(crate) fn open(path: &Path) -> Result<Self, AnalysisError> {
        if !path.exists() {
            return Err(AnalysisError::ArchiveNotFound(path.to_path_buf()));
        }
        let open_error = |message: String| AnalysisError::ArchiveOpenError {
            path: path.to_path_buf(),
            message,
        };
        let file = File::open(path).map_err(|err| open_error(err.to_string()))?;
        let archive = ZipArchive::new(file).map_err(|err| open_error(err.to_string()))?;
        Ok(Self {
            archive_path: path.to_path_buf(),
            archive,
            index: 0,
            nested: None,
        })
    }
}

impl Iterator for ArchiveWalker {
    type Item = ClassEntry;

    fn next(&mut self) -> Option<ClassEntry> {
        loop {
            if let Some(nested) = self.nested.as_mut() {
                if let Some(entry) = next_nested_entry(&self.archive_path, nested) {
                    return Some(entry);
                }
                self.nested = None;
            }

            if self.index >= self.archive.len() {
                return None;
            }
            let index = self.index;
            self.index += 1;

            let mut entry = match self.archive.by_index(index) {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(archive = %self.archive_path.display(), index, %err, "skipping unreadable archive entry");
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();

            if is_application_class(&name) {
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                if let Err(err) = entry.read_to_end(&mut bytes) {
                    warn!(archive = %self.archive_path.display(), entry = name.as_str(), %err, "skipping unreadable class entry");
                    continue;
                }
                return Some(ClassEntry {
                    origin: ClassOrigin {
                        archive: self.archive_path.clone(),
                        nested: None,
                    },
                    path: name,
                    bytes,
                });
            }

            if is_library_jar(&name) {
                let mut bytes = Vec::with_capacity(entry.size() as usize);
                if let Err(err) = entry.read_to_end(&mut bytes) {
                    warn!(archive = %self.archive_path.display(), entry = name.as_str(), %err, "skipping unreadable library jar");
                    continue;
                }
                match ZipArchive::new(Cursor::new(bytes)) {
                    Ok(archive) => {
                        self.nested = Some(NestedArchive {
                            name,
                            archive,
                            index: 0,
                        });
                    }
                    Err(err) => {
                        warn!(archive = %self.archive_path.display(), entry = name.as_str(), %err, "skipping malformed library jar");
                    }
                }
            }
        }
    }
}

fn next_nested_entry(war_path: &Path, nested: &mut NestedArchive) -> Option<ClassEntry> {
    while nested.index < nested.archive.len() {
        let index = nested.index;
        nested.index += 1;

        let mut entry = match nested.archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(jar = nested.name.as_str(), index, %err, "skipping unreadable nested entry");
                continue;
            }
        };
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        if !is_class_file(&name) {
            continue;
        }
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        if let Err(err) = entry.read_to_end(&mut bytes) {
            warn!(jar = nested.name.as_str(), entry = name.as_str(), %err, "skipping unreadable nested class entry");
            continue;
        }
        return Some(ClassEntry {
            origin: ClassOrigin {
                archive: war_path.to_path_buf(),
                nested: Some(nested.name.clone()),
            },
            path: name,
            bytes,
        });
    }
    None
}

fn is_class_file(name: &str) -> bool {
    name.ends_with(".class") && !name.ends_with("module-info.class")
}

fn is_application_class(name: &str) -> bool {
    name.starts_with("WEB-INF/classes/") && is_class_file(name)
}

fn is_library_jar(name: &str) -> bool {
    name.strip_prefix("WEB-INF/lib/")
        .is_some_and(|rest| !rest.contains('/') && rest.ends_with(".jar"))
}
