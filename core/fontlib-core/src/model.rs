//! Font and variant records (made by fontlib)

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix of the CSS custom property generated for each font.
pub const CSS_VAR_PREFIX: &str = "--fontlib--";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl FontStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        }
    }

    /// Value of the `ital` axis in a CSS2 API query.
    pub fn ital(self) -> u8 {
        match self {
            FontStyle::Normal => 0,
            FontStyle::Italic => 1,
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "normal" => Ok(FontStyle::Normal),
            "italic" => Ok(FontStyle::Italic),
            other => Err(format!("unknown font style: {other}")),
        }
    }
}

/// The `font-display` descriptor written into every generated `@font-face` rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontDisplay {
    #[default]
    Auto,
    Block,
    Swap,
    Fallback,
    Optional,
}

impl FontDisplay {
    pub fn as_str(self) -> &'static str {
        match self {
            FontDisplay::Auto => "auto",
            FontDisplay::Block => "block",
            FontDisplay::Swap => "swap",
            FontDisplay::Fallback => "fallback",
            FontDisplay::Optional => "optional",
        }
    }
}

impl fmt::Display for FontDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontDisplay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "auto" => Ok(FontDisplay::Auto),
            "block" => Ok(FontDisplay::Block),
            "swap" => Ok(FontDisplay::Swap),
            "fallback" => Ok(FontDisplay::Fallback),
            "optional" => Ok(FontDisplay::Optional),
            other => Err(format!("unknown font-display value: {other}")),
        }
    }
}

/// Publication status; anything other than `publish` disables the font.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStatus {
    #[default]
    Publish,
    Draft,
}

impl FromStr for FontStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "publish" => Ok(FontStatus::Publish),
            "draft" => Ok(FontStatus::Draft),
            other => Err(format!("unknown font status: {other}")),
        }
    }
}

/// Where a variant's file came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Google,
    #[default]
    Custom,
}

impl FromStr for Provenance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "google" => Ok(Provenance::Google),
            "custom" => Ok(Provenance::Custom),
            other => Err(format!("unknown font source: {other}")),
        }
    }
}

/// One face of a font family with its source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    pub font_family: String,
    pub font_style: FontStyle,
    #[serde(deserialize_with = "deserialize_weight")]
    pub font_weight: String,
    pub src: String,
    pub name: String,
    #[serde(default)]
    pub is_variable: bool,
    #[serde(default)]
    pub source: Provenance,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub preview: String,
}

/// A font family entry with its display settings and variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontRecord {
    pub id: u64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub status: FontStatus,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub fallback: String,
    #[serde(default)]
    pub font_display: FontDisplay,
    #[serde(default)]
    pub css_variable: String,
    #[serde(default)]
    pub source: Option<Provenance>,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub variants: Vec<VariantRecord>,
}

impl FontRecord {
    /// A freshly created, published record with no variants.
    pub fn new(id: u64, name: impl Into<String>, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id,
            name: name.into(),
            css_variable: format!("{CSS_VAR_PREFIX}{slug}"),
            slug,
            status: FontStatus::Publish,
            alias: String::new(),
            fallback: String::new(),
            font_display: FontDisplay::Auto,
            source: None,
            preview: String::new(),
            variants: Vec::new(),
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.status != FontStatus::Publish
    }

    /// Custom property naming this font; `--fontlib--<slug>` when none is stored.
    pub fn css_property(&self) -> String {
        if self.css_variable.is_empty() {
            format!("{CSS_VAR_PREFIX}{}", self.slug)
        } else {
            self.css_variable.clone()
        }
    }

    /// Store the derived custom property when the record has none.
    pub fn fill_css_variable(&mut self) {
        if self.css_variable.is_empty() {
            self.css_variable = self.css_property();
        }
    }

    /// The family name written into CSS: the alias when set, else the name.
    pub fn family_name(&self) -> &str {
        if self.alias.is_empty() {
            &self.name
        } else {
            &self.alias
        }
    }

    /// Quoted family plus fallback stack, e.g. `"Inter", sans-serif`.
    pub fn font_family_stack(&self) -> String {
        let mut stack = format!("\"{}\"", self.family_name());
        if !self.fallback.is_empty() {
            stack.push_str(", ");
            stack.push_str(&self.fallback);
        }
        stack
    }
}

/// A face requested by a caller before it has a stored file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariantRequest {
    pub font_family: String,
    pub font_style: FontStyle,
    #[serde(deserialize_with = "deserialize_weight")]
    pub font_weight: String,
    pub src: String,
    pub is_variable: bool,
}

impl VariantRequest {
    pub fn new(weight: impl Into<String>, style: FontStyle) -> Self {
        Self {
            font_weight: weight.into(),
            font_style: style,
            ..Self::default()
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = src.into();
        self
    }

    pub fn variable(mut self, yes: bool) -> Self {
        self.is_variable = yes;
        self
    }
}

/// Weights arrive as `400` or `"400"` (or `"100 900"` for variable fonts).
fn deserialize_weight<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Weight {
        Number(u64),
        Text(String),
    }

    Ok(match Weight::deserialize(deserializer)? {
        Weight::Number(n) => n.to_string(),
        Weight::Text(s) => s,
    })
}

/// What an uploaded font file says about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFacts {
    pub family: Option<String>,
    pub weight: String,
    pub style: FontStyle,
    pub is_variable: bool,
}

/// Human label for a face, e.g. `Bold 700 Italic` or `100-900 (Variable)`.
pub fn variant_name(weight: &str, style: FontStyle) -> String {
    let label = match weight {
        "100" => Some("Thin 100"),
        "200" => Some("ExtraLight 200"),
        "250" => Some("ExtraLight 250"),
        "300" => Some("Light 300"),
        "400" | "regular" => Some("Regular 400"),
        "500" => Some("Medium 500"),
        "600" => Some("SemiBold 600"),
        "700" => Some("Bold 700"),
        "800" => Some("ExtraBold 800"),
        "900" => Some("Black 900"),
        _ => None,
    };

    match label {
        Some(label) if style == FontStyle::Italic => format!("{label} Italic"),
        Some(label) => label.to_string(),
        None => format!("{} (Variable)", weight.replace(' ', "-")),
    }
}

/// Parse a Google Fonts variant token (`regular`, `italic`, `700`, `700italic`).
pub fn parse_google_variant(token: &str) -> (String, FontStyle) {
    let token = token.trim();
    if token == "regular" {
        return ("400".to_string(), FontStyle::Normal);
    }

    let (weight, style) = if token.contains("italic") {
        (token.replace("italic", ""), FontStyle::Italic)
    } else {
        (token.to_string(), FontStyle::Normal)
    };

    if weight.is_empty() {
        ("400".to_string(), style)
    } else {
        (weight, style)
    }
}

/// Insert `new` into `variants`, replacing the entry with the same name in place.
pub fn merge_variant(variants: &mut Vec<VariantRecord>, new: VariantRecord) {
    match variants.iter_mut().find(|v| v.name == new.name) {
        Some(existing) => *existing = new,
        None => variants.push(new),
    }
}

/// Order weights numerically when both parse, lexically otherwise.
pub fn compare_weights(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u32>(), b.trim().parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// URL- and path-safe slug: lowercase alphanumerics joined by single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            slug.extend(ch.to_lowercase());
        } else if (ch.is_whitespace() || ch == '-' || ch == '.') && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}
