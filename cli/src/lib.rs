//! fontlib CLI (made by fontlib)

pub mod server;

use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use regex::Regex;
use serde_json::{Map, Value};

use fontlib_core::library::{
    FileSource, FontLibrary, FontRequest, LibraryConfig, Outcome, UpdateFontRequest,
    UploadRequest,
};
use fontlib_core::model::{
    parse_google_variant, FontDisplay, FontRecord, FontStatus, FontStyle, Provenance,
    VariantRecord, VariantRequest,
};
use fontlib_core::output::{write_json_pretty, write_ndjson};

use crate::server::AppState;

/// CLI entrypoint for fontlib.
#[derive(Debug, Parser)]
#[command(
    name = "fontlib",
    about = "Self-hosted font library: download Google Fonts, upload custom fonts, generate CSS"
)]
pub struct Cli {
    /// Library root directory (falls back to FONTLIB_ROOT)
    #[arg(long = "root", global = true, value_hint = ValueHint::DirPath)]
    root: Option<PathBuf>,

    /// Public URL the root is served under (falls back to FONTLIB_BASE_URL, then "/")
    #[arg(long = "base-url", global = true, value_hint = ValueHint::Url)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List fonts in the library
    List(ListArgs),
    /// Resolve optimized Google Fonts sources without downloading
    Optimize(GoogleArgs),
    /// Download Google Fonts variants into the library
    Download(GoogleArgs),
    /// Add local font files to the library
    Upload(UploadArgs),
    /// Edit a font's display settings
    Update(UpdateArgs),
    /// Remove a font and its files
    Delete {
        /// Font id
        id: u64,
    },
    /// Read or change library settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Regenerate fonts/fonts.css
    BuildCss,
    /// Print the stylesheet URL with its cache-busting version
    CssUrl,
    /// Import fonts from a JSON export and download their remote files
    Import {
        /// JSON file holding an array of font records
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },
    /// Serve the HTTP API
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct ListArgs {
    /// Only the font with this slug
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Only fonts whose name matches this regex
    #[arg(long = "match")]
    pattern: Option<String>,

    /// Emit a single JSON array
    #[arg(long = "json", action = ArgAction::SetTrue, conflicts_with = "ndjson")]
    json: bool,

    /// Emit newline-delimited JSON
    #[arg(long = "ndjson", action = ArgAction::SetTrue)]
    ndjson: bool,

    /// Format output as padded columns
    #[arg(long = "columns", action = ArgAction::SetTrue)]
    columns: bool,

    /// Control colorized output (auto|always|never)
    #[arg(long = "color", default_value_t = ColorChoice::Auto, value_enum)]
    color: ColorChoice,
}

#[derive(Debug, Args)]
struct GoogleArgs {
    /// Family name as listed on Google Fonts
    family: String,

    /// Variants as Google tokens (regular, italic, 700, 700italic)
    #[arg(
        short = 'V',
        long = "variants",
        value_delimiter = ',',
        default_value = "regular"
    )]
    variants: Vec<String>,

    /// Fallback stack appended after the family (e.g. "Arial, sans-serif")
    #[arg(long = "fallback")]
    fallback: Option<String>,
}

#[derive(Debug, Args)]
struct UploadArgs {
    /// Font files (otf, ttf, woff, woff2)
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    files: Vec<PathBuf>,

    /// Family name; read from the files when omitted
    #[arg(short = 'n', long = "name")]
    name: Option<String>,

    /// Slug of the font to add the files to
    #[arg(long = "slug")]
    slug: Option<String>,

    /// Weight for every file (e.g. 400 or "100 900")
    #[arg(short = 'w', long = "weight")]
    weight: Option<String>,

    /// Mark every file as italic
    #[arg(long = "italic", action = ArgAction::SetTrue)]
    italic: bool,

    /// Mark every file as a variable font
    #[arg(long = "variable", action = ArgAction::SetTrue)]
    variable: bool,
}

#[derive(Debug, Args)]
struct UpdateArgs {
    /// Font id
    id: u64,

    #[arg(long = "status", value_parser = parse_from_str::<FontStatus>)]
    status: Option<FontStatus>,

    #[arg(long = "alias")]
    alias: Option<String>,

    #[arg(long = "display", value_parser = parse_from_str::<FontDisplay>)]
    display: Option<FontDisplay>,

    #[arg(long = "fallback")]
    fallback: Option<String>,

    #[arg(long = "css-variable")]
    css_variable: Option<String>,

    /// Disable the variants with these names (e.g. "Bold 700")
    #[arg(long = "disable", value_delimiter = ',')]
    disable: Vec<String>,

    /// Re-enable the variants with these names
    #[arg(long = "enable", value_delimiter = ',')]
    enable: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    /// Print settings as JSON
    Get,
    /// Replace settings with KEY=VALUE pairs
    Set {
        /// Pairs such as google_gdpr=1 or preferred_subset=latin,latin-ext
        #[arg(required = true, value_parser = parse_setting)]
        pairs: Vec<(String, String)>,
    },
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to bind
    #[arg(long = "bind", default_value = "127.0.0.1:8765")]
    bind: String,

    /// Bearer token required by API routes (falls back to FONTLIB_TOKEN)
    #[arg(long = "token")]
    token: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

/// Parse CLI args and execute the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = library_config(cli.root, cli.base_url)?;

    run_command(FontLibrary::open(config), cli.command, &mut io::stdout().lock())
}

fn run_command(library: FontLibrary, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::List(args) => run_list(&library, args, out),
        Command::Optimize(args) => {
            let (font, variants) = google_request(&args);
            match library.optimize_google_fonts(&font, variants)? {
                Outcome::Done(variants) => write_json_line(out, &variants),
                Outcome::Failed(message) => bail!(message),
            }
        }
        Command::Download(args) => {
            let (font, variants) = google_request(&args);
            match library.download_google_font(&font, variants)? {
                Outcome::Done(result) => {
                    report_upload_errors(&result.error);
                    if result.id.is_none() {
                        bail!("no variants of {} could be downloaded", args.family);
                    }
                    write_json_line(out, &result)
                }
                Outcome::Failed(message) => bail!(message),
            }
        }
        Command::Upload(args) => {
            let name = upload_family_name(&args)?;
            let result = library.upload_fonts(upload_request(args, name))?;
            report_upload_errors(&result.error);
            if result.id.is_none() {
                bail!("no font files could be stored");
            }
            write_json_line(out, &result)
        }
        Command::Update(args) => {
            let font = library
                .store()
                .get(args.id)?
                .ok_or_else(|| anyhow!("no font with id {}", args.id))?;
            let font = library.update_font(update_request(args, font.variants))?;
            write_json_line(out, &font)
        }
        Command::Delete { id } => {
            let font = library.delete_font(id)?;
            writeln!(out, "deleted {} ({})", font.name, font.slug)?;
            Ok(())
        }
        Command::Settings { action } => match action {
            SettingsAction::Get => write_json_line(out, &library.get_settings()?),
            SettingsAction::Set { pairs } => {
                let update = library.set_settings(&settings_map(&pairs))?;
                if !update.updated {
                    eprintln!("settings unchanged");
                }
                write_json_line(out, &update.settings)
            }
        },
        Command::BuildCss => {
            let path = library.build_css_file()?;
            if path.exists() {
                writeln!(out, "{}", path.display())?;
            } else {
                eprintln!("no published fonts; removed {}", path.display());
            }
            Ok(())
        }
        Command::CssUrl => {
            let url = library
                .css_file_url()
                .ok_or_else(|| anyhow!("stylesheet has not been generated"))?;
            match library.css_version() {
                Some(ver) => writeln!(out, "{url}?ver={ver}")?,
                None => writeln!(out, "{url}")?,
            }
            Ok(())
        }
        Command::Import { file } => {
            let records = read_records(&file)?;
            let imported = library.import_fonts(records)?;
            write_json_line(out, &imported)
        }
        Command::Serve(args) => run_serve(library, args),
    }
}

fn run_list(library: &FontLibrary, args: ListArgs, out: &mut impl Write) -> Result<()> {
    let mut fonts = library.get_fonts(args.name.as_deref())?;
    if let Some(pattern) = &args.pattern {
        let re = Regex::new(pattern).with_context(|| format!("invalid regex: {pattern}"))?;
        fonts.retain(|f| re.is_match(&f.name) || re.is_match(&f.alias));
    }

    let use_color = match args.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => io::stdout().is_terminal(),
    };

    if args.ndjson {
        write_ndjson(&fonts, &mut *out)?;
    } else if args.json {
        write_json_pretty(&fonts, &mut *out)?;
        writeln!(out)?;
    } else if args.columns {
        write_columns(&fonts, out, use_color)?;
    } else {
        write_plain(&fonts, out, use_color)?;
    }

    Ok(())
}

fn run_serve(library: FontLibrary, args: ServeArgs) -> Result<()> {
    let token = args
        .token
        .or_else(|| env::var("FONTLIB_TOKEN").ok())
        .filter(|t| !t.is_empty());
    if token.is_none() {
        log::warn!("serving without a token; every API route is open");
    }

    let state = AppState::new(library, token);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("starting tokio runtime")?;
    runtime.block_on(server::serve(&args.bind, state))
}

fn library_config(root: Option<PathBuf>, base_url: Option<String>) -> Result<LibraryConfig> {
    let root = root
        .or_else(|| env::var_os("FONTLIB_ROOT").map(PathBuf::from))
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| anyhow!("no library root: pass --root or set FONTLIB_ROOT"))?;

    let base_url = base_url
        .or_else(|| env::var("FONTLIB_BASE_URL").ok())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "/".to_string());

    Ok(LibraryConfig::new(root).with_base_url(base_url))
}

fn google_request(args: &GoogleArgs) -> (FontRequest, Vec<VariantRequest>) {
    let stack = match &args.fallback {
        Some(fallback) if !fallback.is_empty() => format!("{}, {fallback}", args.family),
        _ => args.family.clone(),
    };
    let font = FontRequest::new(args.family.clone()).with_font_family(stack);

    let variants = args
        .variants
        .iter()
        .filter(|token| !token.trim().is_empty())
        .map(|token| {
            let (weight, style) = parse_google_variant(token);
            VariantRequest::new(weight, style).with_family(args.family.clone())
        })
        .collect();

    (font, variants)
}

fn upload_family_name(args: &UploadArgs) -> Result<String> {
    if let Some(name) = args.name.as_ref().filter(|n| !n.trim().is_empty()) {
        return Ok(name.trim().to_string());
    }

    #[cfg(feature = "fontations")]
    for path in &args.files {
        let Ok(bytes) = fs::read(path) else { continue };
        if let Some(family) = fontlib_core::inspect::inspect(&bytes).and_then(|f| f.family) {
            return Ok(family);
        }
    }

    bail!("cannot read a family name from the files; pass --name")
}

fn upload_request(args: UploadArgs, name: String) -> UploadRequest {
    let style = if args.italic {
        FontStyle::Italic
    } else {
        FontStyle::Normal
    };

    let mut variants = Vec::with_capacity(args.files.len());
    let mut files = HashMap::new();
    for path in args.files {
        let src = path.display().to_string();
        let variant = VariantRequest::new(args.weight.clone().unwrap_or_default(), style)
            .with_family(name.clone())
            .with_src(src.clone())
            .variable(args.variable);
        variants.push(variant);
        files.insert(src, FileSource::Local(path));
    }

    UploadRequest {
        font: FontRequest::new(name),
        slug: args.slug,
        source: Provenance::Custom,
        variants,
        files,
    }
}

fn update_request(args: UpdateArgs, mut variants: Vec<VariantRecord>) -> UpdateFontRequest {
    let toggles = !args.disable.is_empty() || !args.enable.is_empty();
    for variant in variants.iter_mut() {
        if args.disable.contains(&variant.name) {
            variant.disabled = true;
        }
        if args.enable.contains(&variant.name) {
            variant.disabled = false;
        }
    }

    UpdateFontRequest {
        id: args.id,
        status: args.status,
        alias: args.alias,
        new_variants: toggles.then_some(variants),
        delete_variants: Vec::new(),
        font_display: args.display,
        fallback: args.fallback,
        css_variable: args.css_variable,
    }
}

fn settings_map(pairs: &[(String, String)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| {
            let value = if key == "preferred_subset" {
                Value::Array(
                    value
                        .split(',')
                        .map(|s| Value::String(s.trim().to_string()))
                        .collect(),
                )
            } else {
                Value::String(value.clone())
            };
            (key.clone(), value)
        })
        .collect()
}

fn parse_setting(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in {raw}"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn parse_from_str<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T, String> {
    raw.parse()
}

fn read_records(path: &Path) -> Result<Vec<FontRecord>> {
    let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn report_upload_errors(errors: &[fontlib_core::library::UploadError]) {
    for err in errors {
        let label = if err.font.src.is_empty() {
            format!("{} {}", err.font.font_family, err.font.font_weight)
        } else {
            err.font.src.clone()
        };
        eprintln!("warning: {label}: {}", err.message);
    }
}

fn write_json_line(out: &mut impl Write, value: &impl serde::Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn write_plain(fonts: &[FontRecord], mut w: impl Write, color: bool) -> Result<()> {
    for font in fonts {
        let slug = apply_color(&font.slug, color, AnsiColor::Cyan);
        writeln!(w, "{}\t{slug}\t{}", font.id, font.family_name())?;
    }
    Ok(())
}

fn write_columns(fonts: &[FontRecord], mut w: impl Write, color: bool) -> Result<()> {
    let mut rows: Vec<(String, String, String)> = fonts
        .iter()
        .map(|f| {
            let id_slug = format!("{:>3} {}", f.id, f.slug);
            let family = f.font_family_stack();
            let enabled = f.variants.iter().filter(|v| !v.disabled).count();
            let info = format!(
                "variants:{:<2} display:{:<8}{}{}",
                enabled,
                f.font_display,
                if f.is_disabled() { " draft" } else { "" },
                if f.variants.iter().any(|v| v.is_variable) {
                    " var"
                } else {
                    ""
                },
            );
            (id_slug, family, info)
        })
        .collect();

    let slug_width = rows
        .iter()
        .map(|r| r.0.len())
        .max()
        .unwrap_or(0)
        .clamp(0, 60);
    let family_width = rows
        .iter()
        .map(|r| r.1.len())
        .max()
        .unwrap_or(0)
        .clamp(0, 80);

    for (id_slug, family, info) in rows.drain(..) {
        let padded_slug = format!("{:<slug_width$}", id_slug);
        let padded_family = format!("{:<family_width$}", family);
        let rendered_slug = apply_color(&padded_slug, color, AnsiColor::Cyan);
        let rendered_family = apply_color(&padded_family, color, AnsiColor::Yellow);
        let rendered_info = apply_color(&info, color, AnsiColor::Green);

        writeln!(w, "{rendered_slug}  {rendered_family}  {rendered_info}")?;
    }

    Ok(())
}

#[derive(Copy, Clone)]
enum AnsiColor {
    Cyan,
    Yellow,
    Green,
}

fn apply_color(text: &str, color: bool, code: AnsiColor) -> String {
    if !color {
        return text.to_string();
    }

    let code_str = match code {
        AnsiColor::Cyan => "36",
        AnsiColor::Yellow => "33",
        AnsiColor::Green => "32",
    };

    format!("\u{1b}[{}m{}\u{1b}[0m", code_str, text)
}
