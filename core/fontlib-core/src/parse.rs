//! Google Fonts stylesheet parsing (made by fontlib)
//!
//! The CSS2 API precedes every `@font-face` rule with a comment naming its
//! subset (`/* latin-ext */`, or `/* [12] */` for the numbered slices of
//! CJK families). Blocks are captured from that comment to the closing brace
//! so the subset travels with its rule.

use std::sync::LazyLock;

use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{slugify, FontStyle};

static FAMILY_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"font-family:\s'(.*?)';").expect("family regex"));
static FACE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*\s.*?\}").expect("block regex"));
static STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"font-style:\s(normal|italic);").expect("style regex"));
static WEIGHT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"font-weight:\s([0-9]+);").expect("weight regex"));
static SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"src:\surl\((.*?woff2)\)").expect("src regex"));
static SUBSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*\s([a-z\-0-9\[\]]+?)\s\*/").expect("subset regex"));
static SUBSET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*\s([a-z\-]+?)\s\*/").expect("subset name regex"));
static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"unicode-range:\s(.*?);").expect("range regex"));

/// Subset retained when no preference is configured.
pub const DEFAULT_SUBSET: &str = "latin";

/// One face extracted from a provider stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedVariant {
    pub font_family: String,
    pub font_style: FontStyle,
    pub font_weight: String,
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

/// All faces of one family found in a stylesheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedFamily {
    pub slug: String,
    pub font_family: String,
    pub variants: IndexMap<String, ParsedVariant>,
    pub subsets: Vec<String>,
}

/// Parse a stylesheet into families keyed by slug.
///
/// Faces whose subset is not in `allowed_subsets` are dropped; numbered
/// subsets are always kept and tagged `logogram-<N>`. A stylesheet without
/// any `font-family` declaration yields an empty map.
pub fn parse_stylesheet(
    stylesheet: &str,
    allowed_subsets: &[String],
) -> IndexMap<String, ParsedFamily> {
    let mut families: Vec<&str> = Vec::new();
    for caps in FAMILY_DECL.captures_iter(stylesheet) {
        let family = caps.get(1).map_or("", |m| m.as_str());
        if !families.contains(&family) {
            families.push(family);
        }
    }

    let mut object = IndexMap::new();
    for family in families {
        let slug = slugify(family);
        let (variants, subsets) = parse_family(stylesheet, family, allowed_subsets);
        object.insert(
            slug.clone(),
            ParsedFamily {
                slug,
                font_family: family.to_string(),
                variants,
                subsets,
            },
        );
    }

    object
}

fn parse_family(
    stylesheet: &str,
    family: &str,
    allowed_subsets: &[String],
) -> (IndexMap<String, ParsedVariant>, Vec<String>) {
    let mut variants = IndexMap::new();
    let mut subsets: Vec<String> = Vec::new();

    // The family name comes from the stylesheet (or a caller); escape it so
    // names with regex metacharacters match literally.
    let exact = match Regex::new(&format!(
        r#"font-family:[\s'"]*?{}['"]?;"#,
        regex::escape(family)
    )) {
        Ok(re) => re,
        Err(_) => return (variants, subsets),
    };

    for block in FACE_BLOCK.find_iter(stylesheet).map(|m| m.as_str()) {
        if !exact.is_match(block) {
            continue;
        }

        if let Some(name) = first_capture(&SUBSET_NAME, block) {
            if !subsets.iter().any(|s| s == name) {
                subsets.push(name.to_string());
            }
        }

        let (Some(style), Some(weight), Some(src)) = (
            first_capture(&STYLE, block),
            first_capture(&WEIGHT, block),
            first_capture(&SRC, block),
        ) else {
            debug!("skipping incomplete @font-face block for {family}");
            continue;
        };
        let font_style = if style == "italic" {
            FontStyle::Italic
        } else {
            FontStyle::Normal
        };

        let raw_subset = first_capture(&SUBSET, block)
            .map(|s| s.trim_matches(|c| c == '[' || c == ']'))
            .unwrap_or("");

        let subset = if is_numeric(raw_subset) {
            format!("logogram-{raw_subset}")
        } else if raw_subset.is_empty() || subset_allowed(raw_subset, allowed_subsets) {
            raw_subset.to_string()
        } else {
            debug!("dropping {family} {weight} {style}: subset {raw_subset} not allowed");
            continue;
        };

        let key = match font_style {
            FontStyle::Normal => format!("{subset}-{weight}"),
            FontStyle::Italic => format!("{subset}-{weight}-italic"),
        };

        variants.insert(
            key,
            ParsedVariant {
                font_family: family.to_string(),
                font_style,
                font_weight: weight.to_string(),
                src: src.to_string(),
                subset: (!subset.is_empty()).then_some(subset),
                range: first_capture(&RANGE, block).map(str::to_string),
            },
        );
    }

    (variants, subsets)
}

/// The configured allow-list, falling back to `latin` when empty.
pub fn effective_subsets(preferred: &[String]) -> Vec<String> {
    if preferred.iter().all(|s| s.trim().is_empty()) {
        vec![DEFAULT_SUBSET.to_string()]
    } else {
        preferred.to_vec()
    }
}

fn subset_allowed(subset: &str, allowed: &[String]) -> bool {
    effective_subsets(allowed).iter().any(|s| s == subset)
}

fn first_capture<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
