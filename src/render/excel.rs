//! Excel workbooks.
//!
//! The Order workbook is the demanding one: each cart position expands into
//! a row-group — one row per matched catalog product, or a single row with
//! blank catalog columns when nothing matched — with the cart-sourced cells
//! vertically merged across the group. Header colors communicate provenance
//! to a human reviewer: light blue for cart-sourced columns, beige for
//! catalog-sourced ones.
//!
//! The sheet is planned as plain row-group values first and serialized
//! second, so the merging and column-mapping rules stay testable without
//! reading xlsx binaries back.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook};
use serde_json::{Map, Value};

use crate::catalog::property_text;
use crate::core::{CatalogMatch, ExportData, ExportError, ItemKind, ResolvedItem};

/// Cart-sourced columns, in sheet order.
pub const CART_HEADERS: &[&str] = &["№", "Наименование", "Количество", "Цена", "Сумма"];

/// Catalog-sourced columns of the Order workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CatalogColumn {
    PriceOpt,
    PriceRrc,
    Supplier,
    SupplierName,
    Material,
    Size1,
    Size2,
    Size3,
    Color,
    InternalSku,
    SupplierArticle,
}

/// Catalog column order and headers as they appear on the sheet.
pub(crate) const CATALOG_COLUMNS: &[(CatalogColumn, &str)] = &[
    (CatalogColumn::PriceOpt, "Цена опт"),
    (CatalogColumn::PriceRrc, "Цена РРЦ"),
    (CatalogColumn::Supplier, "Поставщик"),
    (CatalogColumn::SupplierName, "Наименование у поставщика"),
    (CatalogColumn::Material, "Материал/Покрытие"),
    (CatalogColumn::Size1, "Размер 1"),
    (CatalogColumn::Size2, "Размер 2"),
    (CatalogColumn::Size3, "Размер 3"),
    (CatalogColumn::Color, "Цвет/Отделка"),
    (CatalogColumn::InternalSku, "SKU внутреннее"),
    (CatalogColumn::SupplierArticle, "Артикул поставщика"),
];

// Provenance colors.
const CART_HEADER_FILL: u32 = 0xE6F3FF; // light blue
const CATALOG_HEADER_FILL: u32 = 0xF5F5DC; // beige
const MATCHED_ROW_FILL: u32 = 0xF0F0F0; // light gray
const UNMATCHED_ROW_FILL: u32 = 0xFFFFFF;

const PRICE_NUM_FORMAT: &str = "#,##0";

/// 1-based row 10 carries the table header.
const HEADER_ROW: u32 = 9;
const FIRST_DATA_ROW: u32 = 10;

/// One rendered cell of the catalog section.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CatalogCell {
    Text(String),
    Price(Decimal),
    Blank,
}

/// All spreadsheet rows produced by one cart position.
#[derive(Debug)]
pub(crate) struct RowGroup {
    pub row_number: usize,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total: Decimal,
    /// False when no catalog product matched; the single row then keeps its
    /// catalog columns blank and renders on a white background.
    pub matched: bool,
    /// One entry per sheet row; never empty.
    pub rows: Vec<Vec<CatalogCell>>,
}

/// Expand resolved items into row-groups.
pub(crate) fn plan_order_groups(items: &[ResolvedItem]) -> Vec<RowGroup> {
    items
        .iter()
        .map(|item| {
            let rows: Vec<Vec<CatalogCell>> = if item.matches.is_empty() {
                vec![vec![CatalogCell::Blank; CATALOG_COLUMNS.len()]]
            } else {
                item.matches
                    .iter()
                    .map(|product| catalog_cells(item.kind, product))
                    .collect()
            };
            RowGroup {
                row_number: item.row_number,
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total: item.total,
                matched: !item.matches.is_empty(),
                rows,
            }
        })
        .collect()
}

/// Map one matched product onto the catalog columns.
///
/// The mapping is type-dependent: handles have no door-style dimensions or
/// coating, and their retail price and supplier article live under
/// handle-specific property names.
pub(crate) fn catalog_cells(kind: ItemKind, product: &CatalogMatch) -> Vec<CatalogCell> {
    CATALOG_COLUMNS
        .iter()
        .map(|(column, _)| mapped_cell(*column, kind, &product.properties))
        .collect()
}

fn mapped_cell(column: CatalogColumn, kind: ItemKind, props: &Map<String, Value>) -> CatalogCell {
    let handle = kind == ItemKind::Handle;
    match column {
        CatalogColumn::PriceOpt => price_cell(props, &["Цена опт"]),
        CatalogColumn::PriceRrc if handle => price_cell(props, &["Цена розница", "Цена РРЦ"]),
        CatalogColumn::PriceRrc => price_cell(props, &["Цена РРЦ"]),
        CatalogColumn::Supplier => text_cell(props, &["Поставщик"]),
        CatalogColumn::SupplierName => text_cell(
            props,
            &[
                "Фабрика_наименование",
                "Наименование двери у поставщика",
                "Наименование поставщика",
                "Наименование",
            ],
        ),
        CatalogColumn::Material if handle => CatalogCell::Blank,
        CatalogColumn::Material => text_cell(props, &["Материал/Покрытие", "Тип покрытия"]),
        CatalogColumn::Size1 if handle => CatalogCell::Blank,
        CatalogColumn::Size1 => text_cell(props, &["Ширина/мм"]),
        CatalogColumn::Size2 if handle => CatalogCell::Blank,
        CatalogColumn::Size2 => text_cell(props, &["Высота/мм"]),
        CatalogColumn::Size3 if handle => CatalogCell::Blank,
        CatalogColumn::Size3 => text_cell(props, &["Толщина/мм"]),
        CatalogColumn::Color => text_cell(props, &["Цвет/Отделка", "Domeo_Цвет"]),
        CatalogColumn::InternalSku => text_cell(props, &["SKU внутреннее"]),
        CatalogColumn::SupplierArticle if handle => {
            text_cell(props, &["Фабрика_артикул", "Артикул поставщика"])
        }
        CatalogColumn::SupplierArticle => text_cell(props, &["Артикул поставщика"]),
    }
}

fn text_cell(props: &Map<String, Value>, keys: &[&str]) -> CatalogCell {
    match property_text(props, keys) {
        Some(text) => CatalogCell::Text(text),
        None => CatalogCell::Blank,
    }
}

/// Price cell; an unparsable price yields a blank cell rather than an error.
fn price_cell(props: &Map<String, Value>, keys: &[&str]) -> CatalogCell {
    property_text(props, keys)
        .and_then(|raw| parse_price(&raw))
        .map(CatalogCell::Price)
        .unwrap_or(CatalogCell::Blank)
}

fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    Decimal::from_str(&cleaned).ok()
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn rendering(error: rust_xlsxwriter::XlsxError) -> ExportError {
    ExportError::Rendering(format!("workbook generation failed: {error}"))
}

/// Render the Order workbook with merged row-groups and provenance colors.
pub fn to_order_workbook(data: &ExportData) -> Result<Vec<u8>, ExportError> {
    let total_columns = (CART_HEADERS.len() + CATALOG_COLUMNS.len()) as u16;
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Заказ").map_err(rendering)?;

    let title_format = Format::new()
        .set_bold()
        .set_font_size(16)
        .set_align(FormatAlign::Center);
    worksheet
        .merge_range(0, 0, 0, total_columns - 1, data.doc_type.title(), &title_format)
        .map_err(rendering)?;

    // Client block, rows 3-8 in sheet terms.
    let date = chrono::Local::now().format("%d.%m.%Y").to_string();
    worksheet.write_string(2, 0, "Клиент:").map_err(rendering)?;
    worksheet.write_string(2, 1, &data.client.name).map_err(rendering)?;
    worksheet.write_string(3, 0, "Телефон:").map_err(rendering)?;
    worksheet
        .write_string(3, 1, data.client.phone.as_deref().unwrap_or("N/A"))
        .map_err(rendering)?;
    worksheet.write_string(4, 0, "Адрес:").map_err(rendering)?;
    worksheet
        .write_string(4, 1, data.client.address.as_deref().unwrap_or("N/A"))
        .map_err(rendering)?;
    if let Some(supplier) = &data.supplier {
        let mut line = supplier.name.clone().unwrap_or_else(|| "N/A".into());
        if let Some(email) = supplier.email.as_deref() {
            line.push_str(&format!(", {email}"));
        }
        if let Some(phone) = supplier.phone.as_deref() {
            line.push_str(&format!(", {phone}"));
        }
        worksheet.write_string(5, 0, "Поставщик:").map_err(rendering)?;
        worksheet.write_string(5, 1, &line).map_err(rendering)?;
    }
    worksheet.write_string(6, 0, "Номер документа:").map_err(rendering)?;
    worksheet
        .write_string(6, 1, &data.document_number)
        .map_err(rendering)?;
    worksheet.write_string(7, 0, "Дата:").map_err(rendering)?;
    worksheet.write_string(7, 1, &date).map_err(rendering)?;

    // Header row 10: cart columns light blue, catalog columns beige.
    let cart_header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(CART_HEADER_FILL))
        .set_border_bottom(FormatBorder::Thin);
    let catalog_header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(CATALOG_HEADER_FILL))
        .set_border_bottom(FormatBorder::Thin);
    for (col, header) in CART_HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(HEADER_ROW, col as u16, *header, &cart_header)
            .map_err(rendering)?;
    }
    for (offset, (_, header)) in CATALOG_COLUMNS.iter().enumerate() {
        let col = (CART_HEADERS.len() + offset) as u16;
        worksheet
            .write_string_with_format(HEADER_ROW, col, *header, &catalog_header)
            .map_err(rendering)?;
    }

    let groups = plan_order_groups(&data.items);
    let mut row = FIRST_DATA_ROW;
    for group in &groups {
        let fill = if group.matched {
            MATCHED_ROW_FILL
        } else {
            UNMATCHED_ROW_FILL
        };
        let text_format = Format::new()
            .set_background_color(Color::RGB(fill))
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border_bottom(FormatBorder::Thin);
        let price_format = text_format.clone().set_num_format(PRICE_NUM_FORMAT);

        let span = group.rows.len() as u32;
        let last_row = row + span - 1;

        // Cart-sourced cells appear once per group, merged across its rows.
        if span > 1 {
            for col in 0..CART_HEADERS.len() as u16 {
                worksheet
                    .merge_range(row, col, last_row, col, "", &text_format)
                    .map_err(rendering)?;
            }
        }
        worksheet
            .write_number_with_format(row, 0, group.row_number as f64, &text_format)
            .map_err(rendering)?;
        worksheet
            .write_string_with_format(row, 1, &group.name, &text_format)
            .map_err(rendering)?;
        worksheet
            .write_number_with_format(row, 2, f64::from(group.quantity), &text_format)
            .map_err(rendering)?;
        worksheet
            .write_number_with_format(row, 3, to_f64(group.unit_price), &price_format)
            .map_err(rendering)?;
        worksheet
            .write_number_with_format(row, 4, to_f64(group.total), &price_format)
            .map_err(rendering)?;

        for (row_offset, cells) in group.rows.iter().enumerate() {
            let sheet_row = row + row_offset as u32;
            for (col_offset, cell) in cells.iter().enumerate() {
                let col = (CART_HEADERS.len() + col_offset) as u16;
                match cell {
                    CatalogCell::Text(text) => worksheet
                        .write_string_with_format(sheet_row, col, text, &text_format)
                        .map_err(rendering)?,
                    CatalogCell::Price(price) => worksheet
                        .write_number_with_format(sheet_row, col, to_f64(*price), &price_format)
                        .map_err(rendering)?,
                    CatalogCell::Blank => worksheet
                        .write_string_with_format(sheet_row, col, "", &text_format)
                        .map_err(rendering)?,
                };
            }
        }

        row = last_row + 1;
    }

    // Итого, one blank row below the table.
    let total_label = Format::new().set_bold().set_align(FormatAlign::Right);
    let total_value = Format::new().set_bold().set_num_format(PRICE_NUM_FORMAT);
    worksheet
        .write_string_with_format(row + 1, 3, "Итого:", &total_label)
        .map_err(rendering)?;
    worksheet
        .write_number_with_format(row + 1, 4, to_f64(data.total_amount), &total_value)
        .map_err(rendering)?;

    for col in 0..total_columns {
        let width = if col < 6 { 15.0 } else { 20.0 };
        worksheet.set_column_width(col, width).map_err(rendering)?;
    }

    workbook.save_to_buffer().map_err(rendering)
}

/// Flat single-table workbook used for quotes and invoices.
pub fn to_flat_workbook(data: &ExportData) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Документ").map_err(rendering)?;

    let header_format = Format::new().set_bold();
    let headers = ["№", "Артикул", "Наименование", "Количество", "Цена", "Сумма"];
    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(rendering)?;
    }

    for (index, item) in data.items.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet
            .write_number(row, 0, item.row_number as f64)
            .map_err(rendering)?;
        worksheet.write_string(row, 1, &item.sku).map_err(rendering)?;
        worksheet.write_string(row, 2, &item.name).map_err(rendering)?;
        worksheet
            .write_number(row, 3, f64::from(item.quantity))
            .map_err(rendering)?;
        worksheet
            .write_number(row, 4, to_f64(item.unit_price))
            .map_err(rendering)?;
        worksheet
            .write_number(row, 5, to_f64(item.total))
            .map_err(rendering)?;
    }

    for col in 0..headers.len() as u16 {
        worksheet.set_column_width(col, 15.0).map_err(rendering)?;
    }

    workbook.save_to_buffer().map_err(rendering)
}
