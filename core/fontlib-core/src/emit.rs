//! Stylesheet generation for the font library (made by fontlib)

use crate::model::FontRecord;

/// Render the library stylesheet: a `:root` block with one custom property
/// per enabled font, then the `@font-face` rules of every enabled variant.
///
/// Disabled fonts are left out entirely; when nothing is enabled the result
/// is empty. The output depends only on `fonts`, so unchanged input renders
/// byte-for-byte identical text.
pub fn emit(fonts: &[FontRecord]) -> String {
    let enabled: Vec<&FontRecord> = fonts.iter().filter(|f| !f.is_disabled()).collect();
    if enabled.is_empty() {
        return String::new();
    }

    let mut css = css_variables(&enabled);
    css.push('\n');

    for font in enabled {
        css.push_str(&font_face_rules(font));
    }

    css
}

fn css_variables(fonts: &[&FontRecord]) -> String {
    let mut out = String::from(":root {\n");
    for font in fonts {
        out.push_str(&format!("{}: {};\n", font.css_property(), font.font_family_stack()));
    }
    out.push_str("}\n");
    out
}

/// `@font-face` rules for the enabled variants of one font.
pub fn font_face_rules(font: &FontRecord) -> String {
    let family = font.family_name();
    let mut css = String::new();

    for variant in font.variants.iter().filter(|v| !v.disabled) {
        let format = font_format(&variant.src)
            .map(|f| format!(" format('{f}')"))
            .unwrap_or_default();

        css.push_str(&format!(
            "@font-face {{\n\tfont-display: {};\n\tfont-family: \"{}\";\n\tfont-style: {};\n\tfont-weight: {};\n\tsrc: url('{}'){};\n}}\n",
            font.font_display, family, variant.font_style, variant.font_weight, variant.src, format
        ));
    }

    css
}

/// `format()` hint for a font URL, by file extension.
pub fn font_format(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file.rsplit_once('.')?;

    match ext {
        "woff" => Some("woff"),
        "woff2" => Some("woff2"),
        "ttf" => Some("truetype"),
        "otf" => Some("opentype"),
        _ => None,
    }
}
