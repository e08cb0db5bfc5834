//! JSON-file record store for font families (made by fontlib)

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{FontRecord, FontStatus};

/// Largest number of records returned by a single listing.
pub const FONTS_MAX_QUERY: usize = 100;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    fonts: Vec<FontRecord>,
}

/// Listing filter; `None` fields match everything.
#[derive(Debug, Clone, Default)]
pub struct FontFilter {
    pub slug: Option<String>,
    pub status: Option<FontStatus>,
}

impl FontFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_status(mut self, status: FontStatus) -> Self {
        self.status = Some(status);
        self
    }

    fn matches(&self, font: &FontRecord) -> bool {
        self.slug.as_ref().is_none_or(|slug| &font.slug == slug)
            && self.status.is_none_or(|status| font.status == status)
    }
}

/// Font records kept in one JSON document.
///
/// Every call reads the file, so several processes can share a root; the
/// mutex serializes read-modify-write cycles within one process.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records in ascending id order, capped at [`FONTS_MAX_QUERY`].
    pub fn list(&self, filter: &FontFilter) -> Result<Vec<FontRecord>> {
        let _guard = self.lock.lock();
        let mut fonts: Vec<FontRecord> = self
            .load()?
            .fonts
            .into_iter()
            .filter(|f| filter.matches(f))
            .collect();
        fonts.sort_by_key(|f| f.id);
        fonts.truncate(FONTS_MAX_QUERY);
        Ok(fonts)
    }

    pub fn get(&self, id: u64) -> Result<Option<FontRecord>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.fonts.into_iter().find(|f| f.id == id))
    }

    pub fn find_by_slug(&self, slug: &str) -> Result<Option<FontRecord>> {
        let _guard = self.lock.lock();
        Ok(self.load()?.fonts.into_iter().find(|f| f.slug == slug))
    }

    /// Insert `record` under a fresh id, suffixing its slug if already taken.
    pub fn create(&self, record: FontRecord) -> Result<FontRecord> {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        let record = Self::insert(&mut file, record);
        self.save(&file)?;
        Ok(record)
    }

    /// Return the record with `slug`, creating it from `make` when missing.
    ///
    /// The boolean is `true` when a record was created.
    pub fn find_or_create(
        &self,
        slug: &str,
        make: impl FnOnce() -> FontRecord,
    ) -> Result<(FontRecord, bool)> {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        if let Some(existing) = file.fonts.iter().find(|f| f.slug == slug) {
            return Ok((existing.clone(), false));
        }

        let record = Self::insert(&mut file, make());
        self.save(&file)?;
        Ok((record, true))
    }

    /// Apply `edit` to the record with `id` and persist it.
    pub fn update(
        &self,
        id: u64,
        edit: impl FnOnce(&mut FontRecord),
    ) -> Result<Option<FontRecord>> {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        let Some(font) = file.fonts.iter_mut().find(|f| f.id == id) else {
            return Ok(None);
        };

        edit(font);
        font.id = id;
        let updated = font.clone();
        self.save(&file)?;
        Ok(Some(updated))
    }

    pub fn delete(&self, id: u64) -> Result<Option<FontRecord>> {
        let _guard = self.lock.lock();
        let mut file = self.load()?;
        let Some(pos) = file.fonts.iter().position(|f| f.id == id) else {
            return Ok(None);
        };

        let removed = file.fonts.remove(pos);
        self.save(&file)?;
        Ok(Some(removed))
    }

    fn insert(file: &mut LibraryFile, mut record: FontRecord) -> FontRecord {
        let max_id = file.fonts.iter().map(|f| f.id).max().unwrap_or(0);
        file.next_id = file.next_id.max(max_id) + 1;
        record.id = file.next_id;
        record.slug = unique_slug(&file.fonts, &record.slug);
        file.fonts.push(record.clone());
        debug!("created font {} ({})", record.id, record.slug);
        record
    }

    fn load(&self) -> Result<LibraryFile> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| Error::Store {
                path: self.path.clone(),
                source,
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(LibraryFile::default()),
            Err(err) => Err(Error::read(&self.path, err)),
        }
    }

    fn save(&self, file: &LibraryFile) -> Result<()> {
        write_json_atomic(&self.path, file)
    }
}

fn unique_slug(fonts: &[FontRecord], wanted: &str) -> String {
    let taken = |slug: &str| fonts.iter().any(|f| f.slug == slug);
    if !taken(wanted) {
        return wanted.to_string();
    }

    (2..)
        .map(|n| format!("{wanted}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| wanted.to_string())
}

/// Pretty-print `value` to a sibling temp file, then rename it over `path`.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(|source| Error::Store {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|e| Error::write(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::write(path, e))?;
    Ok(())
}
