use crate::binary::Decoder;
use crate::errors::Error;
use crate::model::SaveDocument;
use crate::serializer::encode;
use log::debug;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Controls how documents are written to disk
///
/// By default an existing file is copied to `<file>.bak` before it is
/// overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    backup_extension: Option<String>,
}

impl SaveOptions {
    pub fn new() -> Self {
        SaveOptions::default()
    }

    /// Customize how documents are saved
    ///
    /// ```
    /// use vaultsave::SaveOptions;
    ///
    /// let options = SaveOptions::builder().backup_extension("old").build();
    /// assert_eq!(options.backup_extension(), Some("old"));
    ///
    /// let options = SaveOptions::builder().backup(false).build();
    /// assert_eq!(options.backup_extension(), None);
    /// ```
    pub fn builder() -> SaveOptionsBuilder {
        SaveOptionsBuilder::new()
    }

    /// Extension appended to the backup copy, if backups are made
    pub fn backup_extension(&self) -> Option<&str> {
        self.backup_extension.as_deref()
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        SaveOptionsBuilder::new().build()
    }
}

/// Builds save options
#[derive(Debug, Clone)]
pub struct SaveOptionsBuilder {
    backup: bool,
    extension: String,
}

impl Default for SaveOptionsBuilder {
    fn default() -> Self {
        SaveOptionsBuilder {
            backup: true,
            extension: String::from("bak"),
        }
    }
}

impl SaveOptionsBuilder {
    pub fn new() -> Self {
        SaveOptionsBuilder::default()
    }

    /// Whether to copy an existing file aside before overwriting it
    pub fn backup(&mut self, backup: bool) -> &mut Self {
        self.backup = backup;
        self
    }

    pub fn backup_extension(&mut self, extension: &str) -> &mut Self {
        self.extension = extension.to_string();
        self
    }

    pub fn build(&self) -> SaveOptions {
        SaveOptions {
            backup_extension: self.backup.then(|| self.extension.clone()),
        }
    }
}

/// Path of the backup copy made before `path` is overwritten
///
/// ```
/// use std::path::Path;
/// use vaultsave::backup_path;
///
/// assert_eq!(backup_path(Path::new("saves/winsys.dxb"), "bak"), Path::new("saves/winsys.dxb.bak"));
/// ```
pub fn backup_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Decode a document from memory
pub fn decode(data: &[u8], path: impl Into<PathBuf>) -> Result<SaveDocument, Error> {
    Decoder::new().decode_document(data, path)
}

/// Read and decode the save or stash file at `path`
pub fn load(path: impl AsRef<Path>) -> Result<SaveDocument, Error> {
    load_with(&Decoder::new(), path)
}

/// Read and decode a file with a customized decoder
pub fn load_with(decoder: &Decoder, path: impl AsRef<Path>) -> Result<SaveDocument, Error> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    debug!("read {} bytes from {}", data.len(), path.display());
    decoder.decode_document(&data, path)
}

/// Write a modified document to `path`, backing up any file already there.
///
/// Returns `false` without touching the disk when the document has no
/// unsaved edits. On success the document is no longer modified and
/// remembers `path` as its source.
pub fn save(
    doc: &mut SaveDocument,
    path: impl AsRef<Path>,
    options: &SaveOptions,
) -> Result<bool, Error> {
    save_with(doc, path.as_ref(), options, |path, data| fs::write(path, data))
}

/// Save with the final write delegated to `write`. The backup, if any, is in
/// place before `write` runs and is left alone when it fails.
fn save_with<W>(
    doc: &mut SaveDocument,
    path: &Path,
    options: &SaveOptions,
    write: W,
) -> Result<bool, Error>
where
    W: FnOnce(&Path, &[u8]) -> io::Result<()>,
{
    if !doc.is_modified() {
        debug!("skipping unmodified {}", path.display());
        return Ok(false);
    }

    let data = encode(doc);
    if let Some(parent) = path.parent().filter(|x| !x.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    if let Some(extension) = options.backup_extension() {
        let backup = backup_path(path, extension);
        match fs::copy(path, &backup) {
            Ok(_) => debug!("backed up {} to {}", path.display(), backup.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    write(path, &data)?;
    debug!("wrote {} bytes to {}", data.len(), path.display());
    doc.mark_saved(path);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::Value;
    use crate::model::{Placement, SackKind};
    use crate::Item;

    #[test]
    fn test_save_skips_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.dxb");
        let mut doc = SaveDocument::create_empty(SackKind::Stash, "Vault", &path);
        assert!(!save(&mut doc, &path, &SaveOptions::new()).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_save_backs_up_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stash").join("vault.dxb");
        let mut doc = SaveDocument::create_empty(SackKind::Stash, "Vault", &path);
        doc.insert_item(0, Item::new("Ring"), Placement::grid(0, 0))
            .unwrap();

        assert!(save(&mut doc, &path, &SaveOptions::new()).unwrap());
        assert!(!doc.is_modified());
        let first = fs::read(&path).unwrap();
        assert!(!backup_path(&path, "bak").exists());

        doc.set_attribute("note", Value::Int32(1)).unwrap();
        assert!(save(&mut doc, &path, &SaveOptions::new()).unwrap());
        assert_eq!(fs::read(backup_path(&path, "bak")).unwrap(), first);

        let reloaded = load(&path).unwrap();
        assert_eq!(reloaded.source_path(), path.as_path());
        assert_eq!(reloaded.attributes().value("note"), Some(&Value::Int32(1)));
        assert_eq!(reloaded.display_name(), "vault");
    }

    #[test]
    fn test_save_without_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.dxb");
        fs::write(&path, b"old").unwrap();

        let mut doc = SaveDocument::create_empty(SackKind::Stash, "Vault", &path);
        doc.set_attribute("note", Value::Int32(1)).unwrap();
        let options = SaveOptions::builder().backup(false).build();
        assert!(save(&mut doc, &path, &options).unwrap());
        assert!(!backup_path(&path, "bak").exists());
    }

    #[test]
    fn test_failed_write_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.dxb");
        fs::write(&path, b"previous contents").unwrap();

        let mut doc = SaveDocument::create_empty(SackKind::Stash, "Vault", &path);
        doc.insert_item(0, Item::new("Ring"), Placement::grid(0, 0))
            .unwrap();
        let err = save_with(&mut doc, &path, &SaveOptions::new(), |_, _| {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        })
        .unwrap_err();

        assert!(matches!(err.kind(), crate::ErrorKind::Io(_)));
        assert!(doc.is_modified());
        assert_eq!(fs::read(backup_path(&path, "bak")).unwrap(), b"previous contents");
        assert_eq!(fs::read(&path).unwrap(), b"previous contents");

        assert!(save(&mut doc, &path, &SaveOptions::new()).unwrap());
        assert!(load(&path).unwrap().sacks()[0].item_at(0, 0).is_some());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("missing.chr")).unwrap_err();
        assert!(matches!(err.kind(), crate::ErrorKind::Io(_)));
    }
}
