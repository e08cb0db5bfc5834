/// fontlib-core: a self-hosted font library
///
/// Keeps a set of font families on local disk and publishes them through a
/// single generated stylesheet. Families come from two places: files a user
/// uploads, and Google Fonts faces that are downloaded once and served
/// locally from then on.
///
/// ## Pipeline
///
/// **Query**: [`query::sort_variants`] orders the requested faces upright
/// before italic, then by weight, and [`query::google_css_url`] turns them
/// into a CSS2 API URL. Duplicate requests are passed through unchanged.
///
/// **Fetch**: [`fetch::HttpFetcher`] downloads the stylesheet with a modern
/// browser user agent so the API answers with WOFF2 sources.
///
/// **Parse**: [`parse::parse_stylesheet`] reads the returned `@font-face`
/// blocks and keeps only the subsets the library is configured for.
///
/// **Emit**: [`emit::emit`] renders `:root` custom properties and one
/// `@font-face` rule per enabled variant.
///
/// ## Storage
///
/// [`library::FontLibrary`] owns a root directory:
///
/// - `library.json`: font records ([`store::JsonStore`])
/// - `settings.json`: library settings ([`settings::SettingsStore`])
/// - `fonts/<slug>/<file>`: font files; slugs are sanitized to one path segment
/// - `fonts/fonts.css`: the generated stylesheet
///
/// ```rust,no_run
/// use fontlib_core::library::{FontLibrary, FontRequest, LibraryConfig, Outcome};
/// use fontlib_core::model::{FontStyle, VariantRequest};
///
/// let library = FontLibrary::open(LibraryConfig::new("/srv/fontlib"));
/// let font = FontRequest::new("Roboto").with_font_family("Roboto, sans-serif");
/// let variants = vec![
///     VariantRequest::new("400", FontStyle::Normal),
///     VariantRequest::new("700", FontStyle::Italic),
/// ];
///
/// if let Outcome::Done(result) = library.download_google_font(&font, variants)? {
///     println!("stored {} variants", result.variants.len());
/// }
/// # Ok::<(), fontlib_core::Error>(())
/// ```

pub mod emit;
pub mod error;
pub mod fetch;
#[cfg(feature = "fontations")]
pub mod inspect;
pub mod library;
pub mod model;
pub mod output;
pub mod parse;
pub mod query;
pub mod settings;
pub mod store;

pub use error::{Error, Result};
