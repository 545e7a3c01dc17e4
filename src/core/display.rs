//! Display-name formatting for cart positions.
//!
//! The same name string appears in the PDF table, in workbook rows and in
//! the persisted line-item notes, so all callers go through this module.

use rust_decimal::Decimal;

use super::types::CartItem;

/// Fallback name for a handle the cart did not describe.
const UNKNOWN_HANDLE: &str = "Неизвестная ручка";

/// Hardware kit used when the cart omits one.
const DEFAULT_HARDWARE_KIT: &str = "Базовый";

/// Build the customer-facing name of one cart position.
///
/// Handles render as `Ручка <название>`; doors render as
/// `Дверь <модель> (<покрытие>, <цвет>, <Ш> × <В> мм, Комплект фурнитуры -<комплект>)`.
/// Positions with neither a handle id nor a model fall back to the raw cart
/// name.
pub fn display_name(item: &CartItem) -> String {
    if item.is_handle() {
        let name = item
            .handle_name
            .as_deref()
            .or(item.handle_id.as_deref())
            .unwrap_or(UNKNOWN_HANDLE);
        return format!("Ручка {name}");
    }

    if let Some(model) = item.model.as_deref() {
        let branded = model.contains("DomeoDoors");
        let model_name = model.replace("DomeoDoors_", "").replace('_', " ");
        let finish = item.finish.as_deref().unwrap_or("");
        let color = item.color.as_deref().unwrap_or("");
        let dimensions = dimensions_label(item).unwrap_or_default();
        let kit = hardware_kit_label(item);

        return if branded {
            format!(
                "Дверь DomeoDoors {model_name} ({finish}, {color}, {dimensions}, Комплект фурнитуры -{kit})"
            )
        } else {
            format!(
                "Дверь {model_name} ({finish}, {color}, {dimensions}, Комплект фурнитуры -{kit})"
            )
        };
    }

    item.name.clone().unwrap_or_else(|| "Товар".to_string())
}

/// `<width> × <height> мм`, present only when both dimensions are known.
fn dimensions_label(item: &CartItem) -> Option<String> {
    match (item.width.as_deref(), item.height.as_deref()) {
        (Some(w), Some(h)) => Some(format!("{w} × {h} мм")),
        _ => None,
    }
}

fn hardware_kit_label(item: &CartItem) -> &str {
    let kit = item
        .hardware_kit_name
        .as_deref()
        .or(item.hardware.as_deref())
        .unwrap_or(DEFAULT_HARDWARE_KIT);
    // Carts sometimes send the kit already prefixed.
    kit.strip_prefix("Комплект фурнитуры — ").unwrap_or(kit)
}

/// Format a monetary amount the way ru-RU documents print it: thousands
/// grouped with spaces, kopecks shown only when non-zero.
pub(crate) fn format_ru_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), f.trim_end_matches('0').to_string()),
        None => (text, String::new()),
    };

    let mut grouped = String::new();
    let digits: Vec<char> = int_part.chars().collect();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(&frac_part);
    }
    out
}
