//! Flat CSV serialization of an export payload.

use crate::core::ExportData;

/// Render the payload as CSV with a header row.
///
/// Only the name column is quoted — the remaining columns are numeric or
/// controlled identifiers.
pub fn to_csv(data: &ExportData) -> String {
    let mut out = String::from("№,Артикул,Наименование,Количество,Цена,Сумма\n");
    for item in &data.items {
        out.push_str(&format!(
            "{},{},\"{}\",{},{},{}\n",
            item.row_number,
            item.sku,
            item.name.replace('"', "\"\""),
            item.quantity,
            item.unit_price,
            item.total,
        ));
    }
    out
}
