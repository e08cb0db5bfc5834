//! Facts read from uploaded TrueType/OpenType files (made by fontlib)

use read_fonts::tables::name::NameId;
use read_fonts::types::Tag;
use read_fonts::{FontRef, TableProvider};
use skrifa::attribute::Style;
use skrifa::{FontRef as SkrifaFontRef, MetadataProvider};

use crate::model::{FontFacts, FontStyle};

/// Read family, weight and style from an sfnt file.
///
/// Variable fonts report their `wght` axis as a `min max` range. Returns
/// `None` for data that is not a TrueType/OpenType font (WOFF and WOFF2 are
/// compressed and are not inspected).
pub fn inspect(data: &[u8]) -> Option<FontFacts> {
    let font = FontRef::new(data).ok()?;
    let sfont = SkrifaFontRef::new(data).ok()?;
    let attributes = sfont.attributes();

    let style = match attributes.style {
        Style::Italic => FontStyle::Italic,
        _ => FontStyle::Normal,
    };

    let weight_range = weight_axis(&font);
    let weight = match weight_range {
        Some((min, max)) if min != max => format!("{min} {max}"),
        _ => format!("{}", attributes.weight.value().round() as u32),
    };

    Some(FontFacts {
        family: family_name(&font),
        weight,
        style,
        is_variable: font.fvar().is_ok(),
    })
}

fn weight_axis(font: &FontRef) -> Option<(u32, u32)> {
    let wght = Tag::new(b"wght");
    let fvar = font.fvar().ok()?;
    let axes = fvar.axes().ok()?;
    axes.iter().find(|axis| axis.axis_tag() == wght).map(|axis| {
        (
            axis.min_value().to_f64().round() as u32,
            axis.max_value().to_f64().round() as u32,
        )
    })
}

fn family_name(font: &FontRef) -> Option<String> {
    let name_table = font.name().ok()?;
    let data = name_table.string_data();

    for wanted in [NameId::TYPOGRAPHIC_FAMILY_NAME, NameId::FAMILY_NAME] {
        for record in name_table.name_record() {
            if !record.is_unicode() || record.name_id() != wanted {
                continue;
            }
            if let Ok(entry) = record.string(data) {
                let rendered = entry.to_string();
                if !rendered.trim().is_empty() {
                    return Some(rendered.trim().to_string());
                }
            }
        }
    }

    None
}
