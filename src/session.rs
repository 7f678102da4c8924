use crate::binary::Decoder;
use crate::errors::Error;
use crate::file::{load_with, save, SaveOptions};
use crate::model::{SackKind, SaveDocument};
use log::debug;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Saving stopped at the first document that could not be written
#[derive(Debug, thiserror::Error)]
#[error("unable to save {}: {source}", .path.display())]
pub struct SaveAllError {
    /// The document that failed
    pub path: PathBuf,

    /// How many documents were written before the failure
    pub saved: usize,

    pub source: Error,
}

/// Holds at most one document per file path, so every caller editing a file
/// sees the same in-memory document
///
/// A session is not synchronized. Callers sharing one across threads wrap it
/// in a mutex.
#[derive(Debug, Default)]
pub struct Session {
    documents: HashMap<PathBuf, SaveDocument>,
    decoder: Decoder,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// A session that decodes files with a customized decoder
    pub fn with_decoder(decoder: Decoder) -> Self {
        Session {
            documents: HashMap::new(),
            decoder,
        }
    }

    /// The document cached for a path, if any
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&SaveDocument> {
        self.documents.get(path.as_ref())
    }

    pub fn get_mut(&mut self, path: impl AsRef<Path>) -> Option<&mut SaveDocument> {
        self.documents.get_mut(path.as_ref())
    }

    /// The cached character save for the path, loading it on first use
    pub fn open_player(&mut self, path: impl Into<PathBuf>) -> Result<&mut SaveDocument, Error> {
        match self.documents.entry(path.into()) {
            Entry::Occupied(x) => Ok(x.into_mut()),
            Entry::Vacant(x) => {
                let doc = load_with(&self.decoder, x.key())?;
                Ok(x.insert(doc))
            }
        }
    }

    /// The cached stash for the path. A stash that is not on disk yet is
    /// created empty with one sack of `kind`.
    ///
    /// Also returns whether the stash existed, either cached or on disk.
    pub fn open_stash(
        &mut self,
        path: impl Into<PathBuf>,
        kind: SackKind,
        display_name: &str,
    ) -> Result<(&mut SaveDocument, bool), Error> {
        let entry = match self.documents.entry(path.into()) {
            Entry::Occupied(x) => return Ok((x.into_mut(), true)),
            Entry::Vacant(x) => x,
        };

        let (doc, found) = match fs::read(entry.key()) {
            Ok(data) => {
                let mut doc = self.decoder.decode_document(&data, entry.key())?;
                doc.set_display_name(display_name);

                // relic vault pages are stored with a generic stash type
                if kind == SackKind::RelicVaultStash {
                    doc.set_sack_kind(0, kind);
                }
                (doc, true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("creating empty stash {}", entry.key().display());
                let doc = SaveDocument::create_empty(kind, display_name, entry.key());
                (doc, false)
            }
            Err(e) => return Err(e.into()),
        };

        Ok((entry.insert(doc), found))
    }

    /// Drop the cached document, discarding unsaved edits
    pub fn evict(&mut self, path: impl AsRef<Path>) -> Option<SaveDocument> {
        self.documents.remove(path.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &SaveDocument)> {
        self.documents.iter().map(|(k, v)| (k.as_path(), v))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Whether any cached document has unsaved edits
    pub fn is_modified(&self) -> bool {
        self.documents.values().any(SaveDocument::is_modified)
    }

    /// Back up and write every modified document, in path order. Returns
    /// how many were written.
    pub fn save_all_modified(&mut self, options: &SaveOptions) -> Result<usize, SaveAllError> {
        let mut modified: Vec<&PathBuf> = self
            .documents
            .iter()
            .filter(|(_, doc)| doc.is_modified())
            .map(|(path, _)| path)
            .collect();
        modified.sort();
        let modified: Vec<PathBuf> = modified.into_iter().cloned().collect();

        let mut saved = 0;
        for path in modified {
            if let Some(doc) = self.documents.get_mut(&path) {
                match save(doc, &path, options) {
                    Ok(true) => saved += 1,
                    Ok(false) => {}
                    Err(source) => {
                        return Err(SaveAllError {
                            path,
                            saved,
                            source,
                        })
                    }
                }
            }
        }

        debug!("saved {} modified documents", saved);
        Ok(saved)
    }
}
