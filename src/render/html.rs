//! Self-contained HTML document fed to the headless browser.
//!
//! One template serves all three document types; only the title differs.
//! Styles are inlined and the page is sized for A4 with 20 mm margins so
//! the browser's print pipeline needs no external resources.

use chrono::Local;

use crate::core::{ExportData, format_ru_amount};

/// Escape a value for interpolation into HTML text content.
pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Build the printable HTML document for the given payload.
pub fn build_document_html(data: &ExportData) -> String {
    let title = data.doc_type.title();
    let client_name = escape_html(&data.client.name);
    let client_phone = escape_html(data.client.phone.as_deref().unwrap_or("N/A"));
    let client_address = escape_html(data.client.address.as_deref().unwrap_or("N/A"));
    let document_number = escape_html(&data.document_number);
    let date = Local::now().format("%d.%m.%Y");

    let mut rows = String::new();
    for item in &data.items {
        rows.push_str(&format!(
            r#"      <tr>
        <td class="number">{row}</td>
        <td class="sku">{sku}</td>
        <td class="name">{name}</td>
        <td class="price">{price} ₽</td>
        <td class="qty">{qty}</td>
        <td class="total">{total} ₽</td>
      </tr>
"#,
            row = item.row_number,
            sku = escape_html(&item.sku),
            name = escape_html(&item.name),
            price = format_ru_amount(item.unit_price),
            qty = item.quantity,
            total = format_ru_amount(item.total),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="ru">
<head>
  <meta charset="UTF-8">
  <title>{title}</title>
  <style>
    @page {{
      size: A4;
      margin: 20mm;
    }}
    body {{
      font-family: 'Arial', 'Helvetica', sans-serif;
      font-size: 12px;
      margin: 0;
      padding: 0;
      line-height: 1.4;
      color: #000;
    }}
    .header {{
      text-align: center;
      font-size: 18px;
      font-weight: bold;
      margin-bottom: 20px;
      border-bottom: 2px solid #000;
      padding-bottom: 10px;
    }}
    .info {{
      margin-bottom: 20px;
      line-height: 1.6;
      background-color: #f9f9f9;
      padding: 15px;
      border-radius: 5px;
    }}
    .info div {{ margin-bottom: 5px; }}
    .info strong {{ font-weight: bold; }}
    table {{
      width: 100%;
      border-collapse: collapse;
      margin-bottom: 20px;
      font-size: 11px;
    }}
    th, td {{
      border: 1px solid #000;
      padding: 8px;
      text-align: left;
      vertical-align: top;
    }}
    th {{
      background-color: #e0e0e0;
      font-weight: bold;
      text-align: center;
    }}
    .number {{ text-align: center; width: 5%; }}
    .sku {{ width: 15%; }}
    .name {{ width: 40%; }}
    .price {{ text-align: right; width: 15%; }}
    .qty {{ text-align: center; width: 10%; }}
    .total {{ text-align: right; width: 15%; }}
    .total-row {{
      text-align: right;
      font-size: 14px;
      font-weight: bold;
      margin-top: 20px;
      border-top: 2px solid #000;
      padding-top: 10px;
    }}
    .footer {{
      font-size: 10px;
      margin-top: 30px;
      text-align: center;
      color: #666;
    }}
  </style>
</head>
<body>
  <div class="header">{title}</div>

  <div class="info">
    <div><strong>Клиент:</strong> {client_name}</div>
    <div><strong>Телефон:</strong> {client_phone}</div>
    <div><strong>Адрес:</strong> {client_address}</div>
    <div><strong>Номер документа:</strong> {document_number}</div>
    <div><strong>Дата:</strong> {date}</div>
  </div>

  <table>
    <thead>
      <tr>
        <th class="number">№</th>
        <th class="sku">Артикул</th>
        <th class="name">Наименование</th>
        <th class="price">Цена за ед.</th>
        <th class="qty">Кол-во</th>
        <th class="total">Сумма</th>
      </tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>

  <div class="total-row">Итого: {total} ₽</div>

  <div class="footer">Документ сгенерирован автоматически системой Domeo</div>
</body>
</html>"#,
        total = format_ru_amount(data.total_amount),
    )
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::core::{ClientInfo, DocumentType, ItemKind, ResolvedItem};

    fn payload() -> ExportData {
        ExportData {
            doc_type: DocumentType::Quote,
            document_number: "KP-1726000000000".into(),
            client: ClientInfo {
                name: "Иванов Иван".into(),
                phone: Some("+7 (999) 123-45-67".into()),
                address: None,
            },
            items: vec![ResolvedItem {
                row_number: 1,
                sku: "SKU-1".into(),
                name: "Дверь <test> & Co".into(),
                kind: ItemKind::Door,
                unit_price: Decimal::from(25_000),
                quantity: 2,
                total: Decimal::from(50_000),
                matches: Vec::new(),
            }],
            total_amount: Decimal::from(50_000),
            supplier: None,
        }
    }

    #[test]
    fn title_follows_document_type() {
        let mut data = payload();
        assert!(build_document_html(&data).contains("КОММЕРЧЕСКОЕ ПРЕДЛОЖЕНИЕ"));
        data.doc_type = DocumentType::Invoice;
        assert!(build_document_html(&data).contains("<div class=\"header\">СЧЕТ</div>"));
    }

    #[test]
    fn values_are_escaped() {
        let html = build_document_html(&payload());
        assert!(html.contains("Дверь &lt;test&gt; &amp; Co"));
        assert!(!html.contains("Дверь <test>"));
    }

    #[test]
    fn totals_and_number_present() {
        let html = build_document_html(&payload());
        assert!(html.contains("Итого: 50 000 ₽"));
        assert!(html.contains("KP-1726000000000"));
        assert!(html.contains("@page"));
    }

    #[test]
    fn missing_client_fields_render_as_na() {
        let html = build_document_html(&payload());
        assert!(html.contains("<strong>Адрес:</strong> N/A"));
    }
}
