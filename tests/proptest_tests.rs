use domeo_docs::{DocumentType, mint_numbers, sanitize_filename, transliterate};
use proptest::prelude::*;

proptest! {
    /// Transliteration never emits non-ASCII output.
    #[test]
    fn transliteration_is_always_ascii(input in "\\PC{0,64}") {
        prop_assert!(transliterate(&input).is_ascii());
    }

    /// Sanitized filenames contain only filename-safe characters.
    #[test]
    fn sanitized_filenames_are_safe(input in "\\PC{0,64}") {
        let sanitized = sanitize_filename(&input);
        prop_assert!(sanitized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')));
    }

    /// ASCII-safe input survives sanitization unchanged.
    #[test]
    fn safe_input_is_untouched(input in "[A-Za-z0-9._-]{0,64}") {
        prop_assert_eq!(sanitize_filename(&input), input);
    }

    /// Both minted numbers always share the timestamp suffix.
    #[test]
    fn minted_numbers_share_suffix(ts in 0i64..=4_102_444_800_000) {
        for doc_type in [DocumentType::Quote, DocumentType::Invoice, DocumentType::Order] {
            let numbers = mint_numbers(doc_type, ts);
            let export_suffix = numbers.export_facing.rsplit('-').next().unwrap().to_string();
            let canonical_suffix = numbers.canonical.rsplit('-').next().unwrap().to_string();
            prop_assert_eq!(&export_suffix, &canonical_suffix);
            prop_assert_eq!(export_suffix, ts.to_string());
            prop_assert!(numbers.export_facing.is_ascii());
        }
    }
}
