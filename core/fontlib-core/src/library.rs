//! Font library orchestration (made by fontlib)
//!
//! Ties the record store, settings, stylesheet pipeline and asset directory
//! together. Every mutation ends by regenerating `fonts/fonts.css` from the
//! full record set, so the stylesheet never needs incremental patching.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use walkdir::WalkDir;

use crate::emit::emit;
use crate::error::{Error, Result};
use crate::fetch::{Fetcher, HttpFetcher};
use crate::model::{
    merge_variant, slugify, variant_name, FontDisplay, FontFacts, FontRecord, FontStatus,
    Provenance, VariantRecord, VariantRequest,
};
use crate::parse::{parse_stylesheet, ParsedVariant};
use crate::query::{google_css_url, sort_variants};
use crate::settings::{Settings, SettingsStore};
use crate::store::{FontFilter, JsonStore};

/// Extensions accepted for uploaded font files.
pub const ALLOWED_FONT_EXTENSIONS: [&str; 4] = ["otf", "ttf", "woff", "woff2"];

const CSS_FILE_NAME: &str = "fonts.css";

/// Where the library keeps its data and how its files are addressed publicly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub root: PathBuf,
    pub base_url: String,
}

impl LibraryConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            base_url: "/".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn fonts_dir(&self) -> PathBuf {
        self.root.join("fonts")
    }

    /// Asset directory of `slug`; refuses anything that is not one plain path segment.
    pub fn font_dir(&self, slug: &str) -> Result<PathBuf> {
        let mut parts = Path::new(slug).components();
        match (parts.next(), parts.next()) {
            (Some(Component::Normal(_)), None) if !slug.contains(['/', '\\']) => {
                Ok(self.fonts_dir().join(slug))
            }
            _ => Err(Error::InvalidSlug(slug.to_string())),
        }
    }

    pub fn css_path(&self) -> PathBuf {
        self.fonts_dir().join(CSS_FILE_NAME)
    }

    pub fn font_url(&self, slug: &str, file_name: &str) -> String {
        format!("{}/fonts/{slug}/{file_name}", self.base_url.trim_end_matches('/'))
    }

    pub fn css_url(&self) -> String {
        format!("{}/fonts/{CSS_FILE_NAME}", self.base_url.trim_end_matches('/'))
    }
}

/// Result of an operation that can be refused for missing input.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    Failed(String),
}

/// The font a request is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontRequest {
    pub name: String,
    pub slug: String,
    /// Full CSS stack, e.g. `Roboto, sans-serif`; used to infer a fallback.
    pub font_family: String,
}

impl FontRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn with_font_family(mut self, stack: impl Into<String>) -> Self {
        self.font_family = stack.into();
        self
    }

    fn resolved_slug(&self) -> String {
        match slugify(&self.slug) {
            slug if slug.is_empty() => slugify(&self.name),
            slug => slug,
        }
    }
}

/// Where the bytes of a variant's file come from.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    /// File received in a request body.
    Upload { file_name: String, bytes: Vec<u8> },
    /// File already on this machine; it is copied into the library.
    Local(PathBuf),
    /// Download the variant's `src` URL.
    Remote,
}

/// A font file placed in the asset directory.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub path: PathBuf,
    pub url: String,
    pub facts: Option<FontFacts>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub font: FontRequest,
    pub slug: Option<String>,
    pub source: Provenance,
    pub variants: Vec<VariantRequest>,
    /// Files keyed by the `src` of the variant they belong to.
    pub files: HashMap<String, FileSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadError {
    pub font: VariantRequest,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(rename = "ID")]
    pub id: Option<u64>,
    pub variants: Vec<VariantRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error: Vec<UploadError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeleteVariant {
    pub src: String,
    pub delete_status: bool,
}

/// Replacement values for a font; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateFontRequest {
    pub id: u64,
    pub status: Option<FontStatus>,
    pub alias: Option<String>,
    pub new_variants: Option<Vec<VariantRecord>>,
    pub delete_variants: Vec<DeleteVariant>,
    pub font_display: Option<FontDisplay>,
    pub fallback: Option<String>,
    pub css_variable: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingsUpdate {
    pub updated: bool,
    pub settings: Settings,
}

/// The font library rooted at one directory.
#[derive(Debug)]
pub struct FontLibrary<F = HttpFetcher> {
    config: LibraryConfig,
    store: JsonStore,
    settings: SettingsStore,
    fetcher: F,
}

impl FontLibrary<HttpFetcher> {
    pub fn open(config: LibraryConfig) -> Self {
        Self::with_fetcher(config, HttpFetcher::new())
    }
}

impl<F: Fetcher> FontLibrary<F> {
    pub fn with_fetcher(config: LibraryConfig, fetcher: F) -> Self {
        let store = JsonStore::new(config.root.join("library.json"));
        let settings = SettingsStore::new(config.root.join("settings.json"));
        Self {
            config,
            store,
            settings,
            fetcher,
        }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// All fonts regardless of status, ascending by id, optionally one slug.
    pub fn get_fonts(&self, name: Option<&str>) -> Result<Vec<FontRecord>> {
        let filter = match name.filter(|n| !n.is_empty()) {
            Some(slug) => FontFilter::new().with_slug(slug),
            None => FontFilter::new(),
        };
        self.store.list(&filter)
    }

    /// Render the stylesheet for the current record set.
    pub fn generate_css(&self) -> Result<String> {
        Ok(emit(&self.get_fonts(None)?))
    }

    /// Regenerate `fonts.css`, removing it when there is nothing to declare.
    pub fn build_css_file(&self) -> Result<PathBuf> {
        let css = self
            .generate_css()
            .map_err(|e| Error::CssGeneration(Box::new(e)))?;
        let path = self.config.css_path();

        if css.is_empty() {
            match fs::remove_file(&path) {
                Ok(()) => info!("removed empty stylesheet {}", path.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::CssGeneration(Box::new(Error::write(&path, err)))),
            }
            return Ok(path);
        }

        write_file(&path, css.as_bytes()).map_err(|e| Error::CssGeneration(Box::new(e)))?;
        info!("wrote {} ({} bytes)", path.display(), css.len());
        Ok(path)
    }

    /// Public URL of the stylesheet, if it exists.
    pub fn css_file_url(&self) -> Option<String> {
        self.config
            .css_path()
            .exists()
            .then(|| self.config.css_url())
    }

    /// Modification time of the stylesheet in seconds, for cache busting.
    pub fn css_version(&self) -> Option<u64> {
        let modified = fs::metadata(self.config.css_path()).ok()?.modified().ok()?;
        Some(modified.duration_since(UNIX_EPOCH).ok()?.as_secs())
    }

    /// Fetch and parse the optimized stylesheet for `variants` of `family`,
    /// keeping the subsets allowed by the current settings.
    pub fn resolve_variants(
        &self,
        family: &str,
        variants: &[VariantRequest],
    ) -> Result<IndexMap<String, ParsedVariant>> {
        let allowed = self.settings.load()?.allowed_subsets();
        Ok(resolve_variants(
            &self.fetcher,
            family,
            &slugify(family),
            variants,
            &allowed,
        ))
    }

    /// Fill in the `src` of each requested variant from the optimized stylesheet.
    pub fn optimize_google_fonts(
        &self,
        font: &FontRequest,
        variants: Vec<VariantRequest>,
    ) -> Result<Outcome<Vec<VariantRequest>>> {
        if font.name.is_empty() || variants.is_empty() {
            return Ok(Outcome::Failed("No font or variants provided".to_string()));
        }

        let optimized = self.resolve_variants(&font.name, &variants)?;
        let mut variants = variants;

        for candidate in optimized.values() {
            if let Some(variant) = variants.iter_mut().find(|v| {
                v.font_style == candidate.font_style && v.font_weight == candidate.font_weight
            }) {
                variant.src = candidate.src.clone();
            }
        }

        Ok(Outcome::Done(variants))
    }

    /// Optimize `variants` of a Google font, then download them into the library.
    pub fn download_google_font(
        &self,
        font: &FontRequest,
        variants: Vec<VariantRequest>,
    ) -> Result<Outcome<UploadResult>> {
        let variants = match self.optimize_google_fonts(font, variants)? {
            Outcome::Done(variants) => variants,
            Outcome::Failed(message) => return Ok(Outcome::Failed(message)),
        };

        let variants = variants
            .into_iter()
            .map(|v| {
                if v.font_family.is_empty() {
                    v.with_family(font.name.clone())
                } else {
                    v
                }
            })
            .collect();

        let result = self.upload_fonts(UploadRequest {
            font: font.clone(),
            slug: None,
            source: Provenance::Google,
            variants,
            files: HashMap::new(),
        })?;
        Ok(Outcome::Done(result))
    }

    /// Place one variant's file into `fonts/<slug>/`.
    pub fn handle_font_file(
        &self,
        variant: &VariantRequest,
        slug: &str,
        file: FileSource,
    ) -> Result<StoredFile> {
        let slug = match slugify(slug) {
            slug if slug.is_empty() => slugify(&variant.font_family),
            slug => slug,
        };
        if slug.is_empty() {
            return Err(Error::CreateFont("font has no name".to_string()));
        }
        let dir = self.config.font_dir(&slug)?;
        fs::create_dir_all(&dir).map_err(|e| Error::write(&dir, e))?;

        let (file_name, bytes) = match file {
            FileSource::Upload { file_name, bytes } => {
                (checked_file_name(&file_name)?, bytes)
            }
            FileSource::Local(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let name = checked_file_name(&name)?;
                let bytes = fs::read(&path).map_err(|e| Error::read(&path, e))?;
                (name, bytes)
            }
            FileSource::Remote => {
                let download_error = |reason: String| Error::Download {
                    family: variant.font_family.clone(),
                    url: variant.src.clone(),
                    reason,
                };
                if variant.src.is_empty() {
                    return Err(download_error("no source URL".to_string()));
                }
                let bytes = self
                    .fetcher
                    .fetch_bytes(&variant.src)
                    .map_err(|e| download_error(e.to_string()))?;
                (url_file_name(&variant.src).to_string(), bytes)
            }
        };

        let path = dir.join(&file_name);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| Error::write(&path, e))?;
        }
        write_file(&path, &bytes)?;
        debug!("stored {} ({} bytes)", path.display(), bytes.len());

        Ok(StoredFile {
            url: self.config.font_url(&slug, &file_name),
            facts: sniff(&bytes),
            path,
        })
    }

    /// Id of the font with `slug`, creating a published record when missing.
    pub fn get_font_post(&self, variant: &VariantRequest, slug: &str) -> Result<u64> {
        let slug = slugify(slug);
        if slug.is_empty() {
            return Err(Error::CreateFont("font has no name".to_string()));
        }
        let (font, created) = self
            .store
            .find_or_create(&slug, || {
                FontRecord::new(0, variant.font_family.clone(), slug.clone())
            })
            .map_err(|e| Error::CreateFont(format!("{slug}: {e}")))?;
        if created {
            info!("created font {} ({})", font.id, font.slug);
        }
        Ok(font.id)
    }

    /// Store each variant's file and merge it into its font.
    ///
    /// A variant whose file cannot be stored is reported in `error` and the
    /// rest still proceed.
    pub fn upload_fonts(&self, request: UploadRequest) -> Result<UploadResult> {
        let UploadRequest {
            font,
            slug,
            source,
            variants,
            mut files,
        } = request;

        let slug = slug
            .map(|s| slugify(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| font.resolved_slug());
        let mut result = UploadResult::default();

        for variant in variants {
            let file = files.remove(&variant.src).unwrap_or(FileSource::Remote);

            let stored = match self.handle_font_file(&variant, &slug, file) {
                Ok(stored) => stored,
                Err(err) => {
                    warn!("skipping {} {}: {err}", variant.font_family, variant.font_weight);
                    result.error.push(UploadError {
                        font: variant,
                        message: err.to_string(),
                    });
                    continue;
                }
            };

            let variant = complete_variant(variant, stored.facts.as_ref(), &font.name);
            let slug = if slug.is_empty() {
                slugify(&variant.font_family)
            } else {
                slug.clone()
            };
            let id = self.get_font_post(&variant, &slug)?;

            let record = VariantRecord {
                name: variant_name(&variant.font_weight, variant.font_style),
                src: stored.url,
                font_family: variant.font_family,
                font_style: variant.font_style,
                font_weight: variant.font_weight,
                is_variable: variant.is_variable,
                source,
                disabled: false,
                preview: String::new(),
            };
            let fallback = inferred_fallback(&font.font_family);

            let updated = self
                .store
                .update(id, |f| {
                    if source == Provenance::Google {
                        if let Some(fallback) = fallback {
                            f.fallback = fallback;
                        }
                    }
                    f.source.get_or_insert(source);
                    merge_variant(&mut f.variants, record);
                })?
                .ok_or(Error::FontNotFound(id))?;

            result.id = Some(id);
            result.variants = updated.variants;
        }

        if result.id.is_some() {
            self.build_css_file()?;
        }

        Ok(result)
    }

    /// Apply an edit from the font settings screen and remove dropped files.
    pub fn update_font(&self, request: UpdateFontRequest) -> Result<FontRecord> {
        let UpdateFontRequest {
            id,
            status,
            alias,
            new_variants,
            delete_variants,
            font_display,
            fallback,
            css_variable,
        } = request;

        let font = self
            .store
            .update(id, |f| {
                if let Some(status) = status {
                    f.status = status;
                }
                if let Some(alias) = alias {
                    f.alias = alias;
                }
                if let Some(variants) = new_variants {
                    f.variants = variants;
                }
                if let Some(display) = font_display {
                    f.font_display = display;
                }
                if let Some(fallback) = fallback {
                    f.fallback = fallback;
                }
                if let Some(css_variable) = css_variable {
                    f.css_variable = css_variable;
                    f.fill_css_variable();
                }
            })?
            .ok_or(Error::FontNotFound(id))?;

        match self.config.font_dir(&font.slug) {
            Ok(dir) => {
                for variant in delete_variants.iter().filter(|v| v.delete_status) {
                    let path = dir.join(url_file_name(&variant.src));
                    if path.is_file() {
                        match fs::remove_file(&path) {
                            Ok(()) => info!("removed {}", path.display()),
                            Err(err) => warn!("cannot remove {}: {err}", path.display()),
                        }
                    }
                }
            }
            Err(err) => warn!("keeping files of font {}: {err}", font.id),
        }

        self.build_css_file()?;
        Ok(font)
    }

    /// Remove a font record and its asset directory.
    pub fn delete_font(&self, id: u64) -> Result<FontRecord> {
        let font = self.store.delete(id)?.ok_or(Error::FontNotFound(id))?;

        match self.config.font_dir(&font.slug) {
            Ok(dir) if dir.exists() => {
                if let Err(err) = delete_directory(&dir) {
                    warn!("partially removed {}: {err}", dir.display());
                }
            }
            Ok(_) => {}
            Err(err) => warn!("keeping files of font {}: {err}", font.id),
        }

        self.build_css_file()?;
        info!("deleted font {} ({})", font.id, font.slug);
        Ok(font)
    }

    pub fn get_settings(&self) -> Result<Settings> {
        self.settings.load()
    }

    /// Sanitize and store `raw` as the complete settings object.
    pub fn set_settings(&self, raw: &Map<String, Value>) -> Result<SettingsUpdate> {
        let settings = Settings::sanitize(raw);
        let updated = self.settings.save(&settings)?;
        Ok(SettingsUpdate { updated, settings })
    }

    /// Download variants whose `src` points off-site and repoint them locally.
    ///
    /// Variants that cannot be downloaded keep their remote `src`.
    pub fn localize_remote_variants(&self, id: u64) -> Result<FontRecord> {
        let font = self.store.get(id)?.ok_or(Error::FontNotFound(id))?;
        let dir = self.config.font_dir(&font.slug)?;
        let mut variants = font.variants.clone();
        let mut changed = false;

        for variant in variants.iter_mut() {
            if !is_remote(&variant.src) || variant.src.starts_with(&self.config.base_url) {
                continue;
            }

            let bytes = match self.fetcher.fetch_bytes(&variant.src) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!("cannot localize {}: {err}", variant.src);
                    continue;
                }
            };

            let file_name = url_file_name(&variant.src).to_string();
            if let Err(err) =
                fs::create_dir_all(&dir).and_then(|()| fs::write(dir.join(&file_name), &bytes))
            {
                warn!("cannot store {file_name} for {}: {err}", font.slug);
                continue;
            }

            variant.src = self.config.font_url(&font.slug, &file_name);
            changed = true;
        }

        if !changed {
            return Ok(font);
        }

        self.store
            .update(id, |f| f.variants = variants)?
            .ok_or(Error::FontNotFound(id))
    }

    /// Add exported records to the library, reusing fonts whose slug exists.
    pub fn import_fonts(&self, records: Vec<FontRecord>) -> Result<Vec<FontRecord>> {
        let mut imported = Vec::with_capacity(records.len());

        for record in records {
            let slug = match slugify(&record.slug) {
                slug if slug.is_empty() => slugify(&record.name),
                slug => slug,
            };
            if slug.is_empty() {
                warn!("skipping import of font {} without a name", record.id);
                continue;
            }
            let (font, created) = self.store.find_or_create(&slug, || {
                let mut font = FontRecord {
                    slug: slug.clone(),
                    ..record
                };
                font.fill_css_variable();
                font
            })?;
            if !created {
                info!("font {} already exists, keeping id {}", slug, font.id);
            }
            imported.push(self.localize_remote_variants(font.id)?);
        }

        self.build_css_file()?;
        Ok(imported)
    }
}

/// Sort `variants`, fetch their stylesheet and return the faces parsed for `slug`.
///
/// An unreachable stylesheet or a family missing from it yields an empty map.
pub fn resolve_variants<F: Fetcher + ?Sized>(
    fetcher: &F,
    family: &str,
    slug: &str,
    variants: &[VariantRequest],
    allowed_subsets: &[String],
) -> IndexMap<String, ParsedVariant> {
    let mut sorted = variants.to_vec();
    sort_variants(&mut sorted);

    let url = google_css_url(family, &sorted);
    debug!("resolving {family} via {url}");
    let stylesheet = fetcher.fetch_text(&url);
    if stylesheet.is_empty() {
        return IndexMap::new();
    }

    parse_stylesheet(&stylesheet, allowed_subsets)
        .shift_remove(slug)
        .map(|family| family.variants)
        .unwrap_or_default()
}

/// Recursively delete `dir`, stopping at the first entry that cannot be removed.
pub fn delete_directory(dir: &Path) -> io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    if !dir.is_dir() {
        return fs::remove_file(dir);
    }

    for entry in WalkDir::new(dir).contents_first(true) {
        let entry = entry.map_err(io::Error::other)?;
        if entry.file_type().is_dir() {
            fs::remove_dir(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }

    Ok(())
}

fn complete_variant(
    mut variant: VariantRequest,
    facts: Option<&FontFacts>,
    font_name: &str,
) -> VariantRequest {
    if let Some(facts) = facts {
        if variant.font_weight.is_empty() {
            variant.font_weight = facts.weight.clone();
            variant.font_style = facts.style;
        }
        variant.is_variable |= facts.is_variable;
        if variant.font_family.is_empty() {
            variant.font_family = facts.family.clone().unwrap_or_default();
        }
    }

    if variant.font_weight.is_empty() {
        variant.font_weight = "400".to_string();
    }
    if variant.font_family.is_empty() {
        variant.font_family = font_name.to_string();
    }
    variant
}

/// Everything after the first family in a stack like `Roboto, Arial, sans-serif`.
fn inferred_fallback(stack: &str) -> Option<String> {
    let mut families = stack.split(", ");
    families.next();
    let rest: Vec<&str> = families.collect();
    (!rest.is_empty()).then(|| rest.join(", "))
}

fn checked_file_name(raw: &str) -> Result<String> {
    let name = Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = Path::new(&name)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if name.is_empty() || !ALLOWED_FONT_EXTENSIONS.contains(&ext.as_str()) {
        return Err(Error::InvalidFileType(raw.to_string()));
    }
    Ok(name)
}

fn url_file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path)
}

fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::write(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| Error::write(path, e))
}

#[cfg(feature = "fontations")]
fn sniff(bytes: &[u8]) -> Option<FontFacts> {
    crate::inspect::inspect(bytes)
}

#[cfg(not(feature = "fontations"))]
fn sniff(_bytes: &[u8]) -> Option<FontFacts> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontStyle;

    #[test]
    fn fallback_is_everything_after_the_first_family() {
        assert_eq!(
            inferred_fallback("Roboto, Arial, sans-serif").as_deref(),
            Some("Arial, sans-serif")
        );
        assert_eq!(inferred_fallback("Roboto"), None);
        assert_eq!(inferred_fallback(""), None);
    }

    #[test]
    fn file_names_are_checked_against_font_extensions() {
        assert_eq!(checked_file_name("../x/Inter.WOFF2").expect("ok"), "Inter.WOFF2");
        assert_eq!(
            checked_file_name("evil.php").expect_err("rejected").code(),
            "rest_font_upload_invalid_file_type"
        );
        assert!(checked_file_name("").is_err());
    }

    #[test]
    fn url_file_name_drops_query() {
        assert_eq!(url_file_name("https://x.test/a/b/font.woff2?v=1"), "font.woff2");
        assert_eq!(url_file_name("font.ttf"), "font.ttf");
    }

    #[test]
    fn facts_only_fill_missing_fields() {
        let facts = FontFacts {
            family: Some("Recursive".into()),
            weight: "300 1000".into(),
            style: FontStyle::Normal,
            is_variable: true,
        };

        let blank = complete_variant(VariantRequest::default(), Some(&facts), "Fallback");
        assert_eq!(blank.font_family, "Recursive");
        assert_eq!(blank.font_weight, "300 1000");
        assert!(blank.is_variable);

        let given = VariantRequest::new("700", FontStyle::Italic).with_family("Mine");
        let given = complete_variant(given, Some(&facts), "Fallback");
        assert_eq!(given.font_weight, "700");
        assert_eq!(given.font_style, FontStyle::Italic);
        assert_eq!(given.font_family, "Mine");

        let none = complete_variant(VariantRequest::default(), None, "Fallback");
        assert_eq!(none.font_weight, "400");
        assert_eq!(none.font_family, "Fallback");
    }

    struct OneSheet;

    impl Fetcher for OneSheet {
        fn fetch_text(&self, url: &str) -> String {
            if url != "https://fonts.googleapis.com/css2?family=Lora" {
                return String::new();
            }
            "/* latin */\n@font-face {\n  font-family: 'Lora';\n  font-style: normal;\n  font-weight: 400;\n  src: url(https://fonts.gstatic.com/lora.woff2) format('woff2');\n}\n".to_string()
        }

        fn fetch_bytes(&self, _url: &str) -> std::result::Result<Vec<u8>, crate::fetch::FetchError> {
            Err(crate::fetch::FetchError::EmptyBody)
        }
    }

    #[test]
    fn resolve_returns_only_the_requested_slug() {
        let latin = vec!["latin".to_string()];
        let regular = [VariantRequest::new("400", FontStyle::Normal)];

        let found = resolve_variants(&OneSheet, "Lora", "lora", &regular, &latin);
        assert_eq!(found["latin-400"].src, "https://fonts.gstatic.com/lora.woff2");

        assert!(resolve_variants(&OneSheet, "Lora", "inter", &regular, &latin).is_empty());
        let bold = [VariantRequest::new("700", FontStyle::Normal), regular[0].clone()];
        assert!(resolve_variants(&OneSheet, "Lora", "lora", &bold, &latin).is_empty());
    }

    #[test]
    fn public_urls_join_base_without_double_slashes() {
        let config = LibraryConfig::new("/srv/lib").with_base_url("https://cdn.test/assets/");
        assert_eq!(
            config.font_url("inter", "inter.woff2"),
            "https://cdn.test/assets/fonts/inter/inter.woff2"
        );
        assert_eq!(config.css_url(), "https://cdn.test/assets/fonts/fonts.css");
        assert_eq!(LibraryConfig::new("/srv").font_url("a", "b.ttf"), "/fonts/a/b.ttf");
    }
}
