//! Document numbering and filename sanitization.
//!
//! Every export mints two identifiers from the same millisecond timestamp:
//! a canonical number with a Cyrillic prefix (`КП-`, `Счет-`, `Заказ-`)
//! stored on the database row, and an export-facing number with a Latin
//! prefix (`KP-`, `Invoice-`, `Order-`) used for the download filename.
//! Filenames must stay ASCII-safe even when a Cyrillic number leaks into
//! the export path, so the sanitizer runs a transliteration table and
//! degrades anything unmapped to `X`.

use super::types::DocumentType;

impl DocumentType {
    /// Latin prefix of the export-facing document number.
    pub fn latin_prefix(&self) -> &'static str {
        match self {
            Self::Quote => "KP",
            Self::Invoice => "Invoice",
            Self::Order => "Order",
        }
    }

    /// Cyrillic prefix of the canonical (persisted) document number.
    pub fn cyrillic_prefix(&self) -> &'static str {
        match self {
            Self::Quote => "КП",
            Self::Invoice => "Счет",
            Self::Order => "Заказ",
        }
    }
}

/// The two identifiers minted for one export act.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNumbers {
    /// Latin-prefixed number used for filenames and the API response.
    pub export_facing: String,
    /// Cyrillic-prefixed number written to the document row.
    pub canonical: String,
}

/// Mint both document numbers from a Unix-millisecond timestamp.
///
/// The shared suffix ties the export artifact back to the persisted row.
pub fn mint_numbers(doc_type: DocumentType, timestamp_millis: i64) -> DocumentNumbers {
    DocumentNumbers {
        export_facing: format!("{}-{timestamp_millis}", doc_type.latin_prefix()),
        canonical: format!("{}-{timestamp_millis}", doc_type.cyrillic_prefix()),
    }
}

/// Transliterate Russian Cyrillic into Latin.
///
/// ASCII passes through unchanged; any other unmapped character becomes `X`
/// so the result is always safe for filenames and HTTP headers.
pub fn transliterate(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii() {
            out.push(ch);
            continue;
        }
        match translit_char(ch) {
            Some(mapped) => out.push_str(mapped),
            None => out.push('X'),
        }
    }
    out
}

fn translit_char(ch: char) -> Option<&'static str> {
    Some(match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' | 'э' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' | 'ы' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ю' => "yu",
        'я' => "ya",
        'А' => "A",
        'Б' => "B",
        'В' => "V",
        'Г' => "G",
        'Д' => "D",
        'Е' | 'Ё' | 'Э' => "E",
        'Ж' => "Zh",
        'З' => "Z",
        'И' => "I",
        'Й' | 'Ы' => "Y",
        'К' => "K",
        'Л' => "L",
        'М' => "M",
        'Н' => "N",
        'О' => "O",
        'П' => "P",
        'Р' => "R",
        'С' => "S",
        'Т' => "T",
        'У' => "U",
        'Ф' => "F",
        'Х' => "H",
        'Ц' => "Ts",
        'Ч' => "Ch",
        'Ш' => "Sh",
        'Щ' => "Sch",
        'Ъ' | 'Ь' => "",
        'Ю' => "Yu",
        'Я' => "Ya",
        _ => return None,
    })
}

/// Turn a document number into a filename-safe ASCII stem.
///
/// Transliterates first, then replaces anything outside `[A-Za-z0-9._-]`
/// with `X`.
pub fn sanitize_filename(number: &str) -> String {
    transliterate(number)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                'X'
            }
        })
        .collect()
}
