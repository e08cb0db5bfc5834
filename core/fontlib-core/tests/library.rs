use std::collections::HashMap;
use std::fs;

use fontlib_core::fetch::{FetchError, Fetcher};
use fontlib_core::library::{
    delete_directory, DeleteVariant, FileSource, FontLibrary, FontRequest, LibraryConfig,
    Outcome, UpdateFontRequest, UploadRequest,
};
use fontlib_core::model::{FontRecord, FontStatus, FontStyle, Provenance, VariantRecord, VariantRequest};
use serde_json::{json, Map, Value};
use tempfile::{tempdir, TempDir};

#[derive(Default)]
struct FakeFetcher {
    text: HashMap<String, String>,
    bytes: HashMap<String, Vec<u8>>,
}

impl FakeFetcher {
    fn with_text(mut self, url: &str, body: &str) -> Self {
        self.text.insert(url.to_string(), body.to_string());
        self
    }

    fn with_bytes(mut self, url: &str, body: &[u8]) -> Self {
        self.bytes.insert(url.to_string(), body.to_vec());
        self
    }
}

impl Fetcher for FakeFetcher {
    fn fetch_text(&self, url: &str) -> String {
        self.text.get(url).cloned().unwrap_or_default()
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.bytes.get(url).cloned().ok_or(FetchError::Status(404))
    }
}

const ROBOTO_URL: &str = "https://fonts.googleapis.com/css2?family=Roboto:ital,wght@0,400;1,700";
const ROBOTO_CSS: &str = "/* latin-ext */
@font-face {
  font-family: 'Roboto';
  font-style: normal;
  font-weight: 400;
  src: url(https://fonts.gstatic.com/s/roboto/ext-400.woff2) format('woff2');
}
/* latin */
@font-face {
  font-family: 'Roboto';
  font-style: normal;
  font-weight: 400;
  src: url(https://fonts.gstatic.com/s/roboto/latin-400.woff2) format('woff2');
}
/* latin */
@font-face {
  font-family: 'Roboto';
  font-style: italic;
  font-weight: 700;
  src: url(https://fonts.gstatic.com/s/roboto/latin-700i.woff2) format('woff2');
}
";

fn roboto_fetcher() -> FakeFetcher {
    FakeFetcher::default()
        .with_text(ROBOTO_URL, ROBOTO_CSS)
        .with_bytes("https://fonts.gstatic.com/s/roboto/ext-400.woff2", b"ext")
        .with_bytes("https://fonts.gstatic.com/s/roboto/latin-400.woff2", b"regular")
        .with_bytes("https://fonts.gstatic.com/s/roboto/latin-700i.woff2", b"bold-italic")
}

fn library(fetcher: FakeFetcher) -> (TempDir, FontLibrary<FakeFetcher>) {
    let tmp = tempdir().expect("tempdir");
    let config = LibraryConfig::new(tmp.path()).with_base_url("https://example.test/");
    (tmp, FontLibrary::with_fetcher(config, fetcher))
}

fn roboto_request() -> (FontRequest, Vec<VariantRequest>) {
    (
        FontRequest::new("Roboto").with_font_family("Roboto, Arial, sans-serif"),
        vec![
            VariantRequest::new("700", FontStyle::Italic),
            VariantRequest::new("400", FontStyle::Normal),
        ],
    )
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

fn download_roboto(library: &FontLibrary<FakeFetcher>) -> u64 {
    let (font, variants) = roboto_request();
    match library.download_google_font(&font, variants).expect("download") {
        Outcome::Done(result) => result.id.expect("font id"),
        Outcome::Failed(message) => panic!("download refused: {message}"),
    }
}

#[test]
fn optimize_fills_sources_from_allowed_subsets() {
    let (_tmp, library) = library(roboto_fetcher());
    let (font, variants) = roboto_request();

    let Outcome::Done(optimized) = library.optimize_google_fonts(&font, variants).expect("optimize")
    else {
        panic!("expected optimized variants");
    };

    assert_eq!(optimized[0].src, "https://fonts.gstatic.com/s/roboto/latin-700i.woff2");
    assert_eq!(optimized[1].src, "https://fonts.gstatic.com/s/roboto/latin-400.woff2");
}

#[test]
fn optimize_refuses_empty_requests() {
    let (_tmp, library) = library(FakeFetcher::default());
    let outcome = library
        .optimize_google_fonts(&FontRequest::new("Roboto"), Vec::new())
        .expect("optimize");
    assert_eq!(outcome, Outcome::Failed("No font or variants provided".to_string()));
}

#[test]
fn preferred_subsets_change_the_chosen_source() {
    let (_tmp, library) = library(roboto_fetcher());
    library
        .set_settings(&object(json!({"preferred_subset": ["latin-ext"]})))
        .expect("settings");

    let resolved = library
        .resolve_variants("Roboto", &[VariantRequest::new("400", FontStyle::Normal)])
        .expect("resolve");
    // The single-regular URL differs from the fixture URL, so nothing is fetched.
    assert!(resolved.is_empty());

    let (_, variants) = roboto_request();
    let resolved = library.resolve_variants("Roboto", &variants).expect("resolve");
    let keys: Vec<&str> = resolved.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["latin-ext-400"]);
}

#[test]
fn google_download_stores_files_and_writes_css() {
    let (tmp, library) = library(roboto_fetcher());
    let id = download_roboto(&library);

    let font = library.store().get(id).expect("get").expect("stored font");
    assert_eq!(font.slug, "roboto");
    assert_eq!(font.fallback, "Arial, sans-serif");
    assert_eq!(font.source, Some(Provenance::Google));

    let names: Vec<&str> = font.variants.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["Bold 700 Italic", "Regular 400"]);
    assert_eq!(
        font.variants[1].src,
        "https://example.test/fonts/roboto/latin-400.woff2"
    );
    assert!(font.variants.iter().all(|v| v.source == Provenance::Google));

    let stored = fs::read(tmp.path().join("fonts/roboto/latin-700i.woff2")).expect("font file");
    assert_eq!(stored, b"bold-italic");

    let css = fs::read_to_string(tmp.path().join("fonts/fonts.css")).expect("css");
    assert!(css.contains("--fontlib--roboto: \"Roboto\", Arial, sans-serif;"));
    assert_eq!(css.matches("@font-face").count(), 2);
    assert_eq!(
        library.css_file_url().as_deref(),
        Some("https://example.test/fonts/fonts.css")
    );
    assert!(library.css_version().is_some());
}

#[test]
fn repeated_download_merges_variants_by_name() {
    let (_tmp, library) = library(roboto_fetcher());
    let first = download_roboto(&library);
    let second = download_roboto(&library);

    assert_eq!(first, second);
    let fonts = library.get_fonts(None).expect("list");
    assert_eq!(fonts.len(), 1);
    assert_eq!(fonts[0].variants.len(), 2);
}

#[test]
fn upload_reports_bad_files_and_keeps_good_ones() {
    let (tmp, library) = library(FakeFetcher::default());
    let good = VariantRequest::new("400", FontStyle::Normal)
        .with_family("Inter")
        .with_src("inter.woff2");
    let bad = VariantRequest::new("700", FontStyle::Normal)
        .with_family("Inter")
        .with_src("inter.exe");

    let mut files = HashMap::new();
    files.insert(
        "inter.woff2".to_string(),
        FileSource::Upload {
            file_name: "Inter-Regular.woff2".to_string(),
            bytes: b"woff2".to_vec(),
        },
    );
    files.insert(
        "inter.exe".to_string(),
        FileSource::Upload {
            file_name: "inter.exe".to_string(),
            bytes: b"nope".to_vec(),
        },
    );

    let result = library
        .upload_fonts(UploadRequest {
            font: FontRequest::new("Inter"),
            slug: None,
            source: Provenance::Custom,
            variants: vec![good, bad],
            files,
        })
        .expect("upload");

    assert_eq!(result.id, Some(1));
    assert_eq!(result.variants.len(), 1);
    assert_eq!(result.variants[0].src, "https://example.test/fonts/inter/Inter-Regular.woff2");
    assert_eq!(result.error.len(), 1);
    assert_eq!(result.error[0].font.font_weight, "700");
    assert!(result.error[0].message.contains("not permitted"));

    assert!(tmp.path().join("fonts/inter/Inter-Regular.woff2").is_file());
    assert!(!tmp.path().join("fonts/inter/inter.exe").exists());
}

#[test]
fn upload_with_only_failures_creates_nothing() {
    let (tmp, library) = library(FakeFetcher::default());
    let result = library
        .upload_fonts(UploadRequest {
            font: FontRequest::new("Ghost"),
            variants: vec![VariantRequest::new("400", FontStyle::Normal).with_family("Ghost")],
            ..UploadRequest::default()
        })
        .expect("upload");

    assert_eq!(result.id, None);
    assert_eq!(result.error.len(), 1);
    assert!(result.error[0].message.contains("no source URL"));
    assert!(library.get_fonts(None).expect("list").is_empty());
    assert!(!tmp.path().join("fonts/fonts.css").exists());
}

#[test]
fn update_applies_fields_and_drops_marked_files() {
    let (tmp, library) = library(roboto_fetcher());
    let id = download_roboto(&library);
    let font = library.store().get(id).expect("get").expect("font");
    let (italic, regular): (Vec<VariantRecord>, Vec<VariantRecord>) = font
        .variants
        .iter()
        .cloned()
        .partition(|v| v.font_style == FontStyle::Italic);

    let updated = library
        .update_font(UpdateFontRequest {
            id,
            alias: Some("Body".to_string()),
            new_variants: Some(regular),
            delete_variants: vec![DeleteVariant {
                src: italic[0].src.clone(),
                delete_status: true,
            }],
            ..UpdateFontRequest::default()
        })
        .expect("update");

    assert_eq!(updated.alias, "Body");
    assert_eq!(updated.fallback, "Arial, sans-serif");
    assert_eq!(updated.variants.len(), 1);
    assert!(!tmp.path().join("fonts/roboto/latin-700i.woff2").exists());
    assert!(tmp.path().join("fonts/roboto/latin-400.woff2").exists());

    let css = fs::read_to_string(tmp.path().join("fonts/fonts.css")).expect("css");
    assert!(css.contains("font-family: \"Body\";"));
    assert_eq!(css.matches("@font-face").count(), 1);
}

#[test]
fn drafting_the_only_font_removes_the_stylesheet() {
    let (tmp, library) = library(roboto_fetcher());
    let id = download_roboto(&library);
    assert!(tmp.path().join("fonts/fonts.css").exists());

    library
        .update_font(UpdateFontRequest {
            id,
            status: Some(FontStatus::Draft),
            ..UpdateFontRequest::default()
        })
        .expect("update");

    assert!(!tmp.path().join("fonts/fonts.css").exists());
    assert!(library.css_file_url().is_none());
}

#[test]
fn update_of_missing_font_fails() {
    let (_tmp, library) = library(FakeFetcher::default());
    let err = library
        .update_font(UpdateFontRequest {
            id: 9,
            ..UpdateFontRequest::default()
        })
        .expect_err("missing");
    assert_eq!(err.code(), "font_post_delete_failed");
}

#[test]
fn delete_removes_record_directory_and_css() {
    let (tmp, library) = library(roboto_fetcher());
    let id = download_roboto(&library);

    let removed = library.delete_font(id).expect("delete");
    assert_eq!(removed.slug, "roboto");
    assert!(!tmp.path().join("fonts/roboto").exists());
    assert!(!tmp.path().join("fonts/fonts.css").exists());
    assert!(library.get_fonts(None).expect("list").is_empty());

    let err = library.delete_font(id).expect_err("already gone");
    assert_eq!(err.code(), "font_post_delete_failed");
}

#[test]
fn settings_report_whether_anything_changed() {
    let (_tmp, library) = library(FakeFetcher::default());
    let raw = object(json!({"google_gdpr": "1", "preferred_subset": "latin"}));

    let first = library.set_settings(&raw).expect("first");
    assert!(first.updated);
    assert!(first.settings.google_gdpr);

    let second = library.set_settings(&raw).expect("second");
    assert!(!second.updated);
    assert_eq!(library.get_settings().expect("get"), first.settings);
}

#[test]
fn import_localizes_remote_sources() {
    let fetcher = FakeFetcher::default().with_bytes("https://cdn.test/lora/lora.ttf", b"lora");
    let (tmp, library) = library(fetcher);

    let mut lora = FontRecord::new(77, "Lora", "lora");
    lora.variants = vec![
        VariantRecord {
            font_family: "Lora".into(),
            font_style: FontStyle::Normal,
            font_weight: "400".into(),
            src: "https://cdn.test/lora/lora.ttf".into(),
            name: "Regular 400".into(),
            is_variable: false,
            source: Provenance::Custom,
            disabled: false,
            preview: String::new(),
        },
        VariantRecord {
            font_family: "Lora".into(),
            font_style: FontStyle::Italic,
            font_weight: "400".into(),
            src: "https://cdn.test/lora/missing.ttf".into(),
            name: "Regular 400 Italic".into(),
            is_variable: false,
            source: Provenance::Custom,
            disabled: false,
            preview: String::new(),
        },
    ];

    let imported = library.import_fonts(vec![lora]).expect("import");
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].id, 1);
    assert_eq!(imported[0].variants[0].src, "https://example.test/fonts/lora/lora.ttf");
    assert_eq!(imported[0].variants[1].src, "https://cdn.test/lora/missing.ttf");
    assert_eq!(fs::read(tmp.path().join("fonts/lora/lora.ttf")).expect("file"), b"lora");

    let css = fs::read_to_string(tmp.path().join("fonts/fonts.css")).expect("css");
    assert!(css.contains("lora.ttf') format('truetype');"));
}

#[test]
fn upload_slug_stays_inside_the_fonts_directory() {
    let (tmp, library) = library(FakeFetcher::default());
    fs::write(tmp.path().join("keep.txt"), b"keep").expect("sentinel");
    let source = tempdir().expect("source dir");
    let file = source.path().join("Evil.woff2");
    fs::write(&file, b"woff2").expect("font");

    let variant = VariantRequest::new("400", FontStyle::Normal)
        .with_family("Evil")
        .with_src("Evil.woff2");
    let result = library
        .upload_fonts(UploadRequest {
            font: FontRequest::new("Evil"),
            slug: Some("..".to_string()),
            variants: vec![variant],
            files: HashMap::from([("Evil.woff2".to_string(), FileSource::Local(file))]),
            ..UploadRequest::default()
        })
        .expect("upload");

    let id = result.id.expect("stored");
    let font = &library.get_fonts(None).expect("list")[0];
    assert_eq!(font.slug, "evil");
    assert!(tmp.path().join("fonts/evil/Evil.woff2").is_file());
    assert!(!tmp.path().join("Evil.woff2").exists());

    library.delete_font(id).expect("delete");
    assert!(!tmp.path().join("fonts/evil").exists());
    assert!(tmp.path().join("keep.txt").is_file());
    assert!(tmp.path().join("library.json").is_file());
}

#[test]
fn path_like_slugs_are_flattened() {
    let (tmp, library) = library(FakeFetcher::default());
    let variant = VariantRequest::new("400", FontStyle::Normal).with_family("Inter");
    let stored = library
        .handle_font_file(
            &variant,
            "../Outside/Inter",
            FileSource::Upload {
                file_name: "Inter.woff2".to_string(),
                bytes: b"woff2".to_vec(),
            },
        )
        .expect("stored");

    assert_eq!(stored.path, tmp.path().join("fonts/outsideinter/Inter.woff2"));
    assert!(library.config().font_dir("..").is_err());
    assert!(library.config().font_dir("a/b").is_err());
    assert!(library.config().font_dir("").is_err());
}

#[test]
fn deleting_a_record_with_an_unsafe_slug_keeps_the_root() {
    let (tmp, library) = library(FakeFetcher::default());
    let (font, _) = library
        .store()
        .find_or_create("..", || FontRecord::new(0, "Evil", ".."))
        .expect("insert");

    library.delete_font(font.id).expect("delete");
    assert!(tmp.path().join("library.json").is_file());
    assert!(library.get_fonts(None).expect("list").is_empty());
}

#[test]
fn imported_records_without_a_css_variable_get_one() {
    let (tmp, library) = library(FakeFetcher::default());
    let records: Vec<FontRecord> =
        serde_json::from_str(r#"[{"id":9,"name":"Lora","slug":"lora","variants":[]}]"#)
            .expect("records");

    let imported = library.import_fonts(records).expect("import");
    assert_eq!(imported[0].css_variable, "--fontlib--lora");

    let css = fs::read_to_string(tmp.path().join("fonts/fonts.css")).expect("css");
    assert!(css.starts_with(":root {\n--fontlib--lora: \"Lora\";\n}"));
}

#[test]
fn get_fonts_filters_by_slug() {
    let (_tmp, library) = library(roboto_fetcher());
    download_roboto(&library);

    assert_eq!(library.get_fonts(Some("roboto")).expect("list").len(), 1);
    assert!(library.get_fonts(Some("inter")).expect("list").is_empty());
    assert_eq!(library.get_fonts(Some("")).expect("list").len(), 1);
}

#[test]
fn delete_directory_removes_nested_trees() {
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("fonts/inter");
    fs::create_dir_all(root.join("nested/deeper")).expect("dirs");
    fs::write(root.join("a.woff2"), b"a").expect("a");
    fs::write(root.join("nested/deeper/b.ttf"), b"b").expect("b");

    delete_directory(&root).expect("delete");
    assert!(!root.exists());
    assert!(tmp.path().join("fonts").exists());
    delete_directory(&root).expect("missing directory is fine");
}
