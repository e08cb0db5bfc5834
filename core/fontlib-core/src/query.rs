//! Google Fonts CSS2 query building (made by fontlib)

use crate::model::{compare_weights, FontStyle, VariantRequest};

pub const GOOGLE_CSS2_ENDPOINT: &str = "https://fonts.googleapis.com/css2";

/// Order variants the way the CSS2 API expects its axis tuples.
///
/// Normal faces come before italic ones; within a style weights ascend.
/// The sort is stable, so equal entries keep their input order.
pub fn sort_variants(variants: &mut [VariantRequest]) {
    variants.sort_by(|a, b| {
        a.font_style
            .ital()
            .cmp(&b.font_style.ital())
            .then_with(|| compare_weights(&a.font_weight, &b.font_weight))
    });
}

/// Build the stylesheet URL for `family` from an already sorted variant list.
pub fn google_css_url(family: &str, variants: &[VariantRequest]) -> String {
    let mut url = format!(
        "{GOOGLE_CSS2_ENDPOINT}?family={}",
        family.replace(' ', "+")
    );

    let only_regular = variants.len() == 1 && variants[0].font_style == FontStyle::Normal;
    if only_regular {
        return url;
    }

    let has_italics = variants.iter().any(|v| v.font_style == FontStyle::Italic);
    if !has_italics {
        let weights: Vec<&str> = variants.iter().map(|v| v.font_weight.as_str()).collect();
        url.push_str(":wght@");
        url.push_str(&weights.join(";"));
        return url;
    }

    url.push_str(":ital,wght@");
    for variant in variants {
        url.push_str(&format!(
            "{},{};",
            variant.font_style.ital(),
            variant.font_weight
        ));
    }

    url.trim_end_matches(';').to_string()
}
