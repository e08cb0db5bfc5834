use fontlib_core::model::{merge_variant, FontStyle, Provenance, VariantRecord, VariantRequest};
use fontlib_core::query::{google_css_url, sort_variants};
use proptest::prelude::*;

fn style() -> impl Strategy<Value = FontStyle> {
    prop_oneof![Just(FontStyle::Normal), Just(FontStyle::Italic)]
}

fn requests() -> impl Strategy<Value = Vec<VariantRequest>> {
    prop::collection::vec(
        ((1u32..=9).prop_map(|w| (w * 100).to_string()), style())
            .prop_map(|(w, s)| VariantRequest::new(w, s)),
        1..8,
    )
}

proptest! {
    #[test]
    fn upright_requests_never_use_the_ital_axis(mut variants in requests()) {
        for v in variants.iter_mut() {
            v.font_style = FontStyle::Normal;
        }
        sort_variants(&mut variants);
        let url = google_css_url("Open Sans", &variants);

        prop_assert!(url.starts_with("https://fonts.googleapis.com/css2?family=Open+Sans"));
        prop_assert!(!url.contains("ital"));
        prop_assert!(!url.ends_with(';'));
    }

    #[test]
    fn italic_requests_list_one_tuple_per_variant(mut variants in requests()) {
        prop_assume!(variants.iter().any(|v| v.font_style == FontStyle::Italic));
        sort_variants(&mut variants);
        let url = google_css_url("Roboto", &variants);

        let (_, tuples) = url.split_once(":ital,wght@").expect("ital axis");
        prop_assert_eq!(tuples.split(';').count(), variants.len());
    }

    #[test]
    fn sorted_requests_put_uprights_first(mut variants in requests()) {
        sort_variants(&mut variants);
        let first_italic = variants
            .iter()
            .position(|v| v.font_style == FontStyle::Italic)
            .unwrap_or(variants.len());
        prop_assert!(variants[first_italic..]
            .iter()
            .all(|v| v.font_style == FontStyle::Italic));
    }

    #[test]
    fn merging_never_duplicates_names(names in prop::collection::vec("[a-d]", 0..20)) {
        let mut variants = Vec::new();
        for name in &names {
            merge_variant(&mut variants, VariantRecord {
                font_family: "Inter".into(),
                font_style: FontStyle::Normal,
                font_weight: "400".into(),
                src: String::new(),
                name: name.clone(),
                is_variable: false,
                source: Provenance::Custom,
                disabled: false,
                preview: String::new(),
            });
        }

        let mut unique = names.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(variants.len(), unique.len());
    }
}
