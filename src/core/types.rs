use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Kind of commercial document produced by an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Коммерческое предложение (КП).
    Quote,
    /// Счет на оплату.
    Invoice,
    /// Заказ.
    Order,
}

impl DocumentType {
    /// Document title as printed in the rendered output.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Quote => "КОММЕРЧЕСКОЕ ПРЕДЛОЖЕНИЕ",
            Self::Invoice => "СЧЕТ",
            Self::Order => "ЗАКАЗ",
        }
    }

    /// Status assigned to a freshly persisted document of this type.
    pub fn default_status(&self) -> &'static str {
        match self {
            Self::Quote | Self::Invoice => "DRAFT",
            Self::Order => "PENDING",
        }
    }
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Excel,
    Csv,
}

impl ExportFormat {
    /// MIME type for the HTTP response carrying the export.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            Self::Csv => "text/csv",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
            Self::Csv => "csv",
        }
    }
}

/// Kind of a configured cart position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Door,
    Handle,
    #[serde(other)]
    Other,
}

/// One configured product position submitted by the storefront cart.
///
/// Identity is positional within a submission; the struct mirrors the JSON
/// the configurator sends, so unknown attributes stay optional and prices
/// arrive as plain JSON numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: ItemKind,
    #[serde(default)]
    pub name: Option<String>,
    /// Configured door model, e.g. `DomeoDoors_Neo_1`.
    #[serde(default)]
    pub model: Option<String>,
    /// Surface finish (Тип покрытия).
    #[serde(default)]
    pub finish: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    /// Leaf width in mm; callers send either a number or a string.
    #[serde(default, deserialize_with = "stringly")]
    pub width: Option<String>,
    /// Leaf height in mm; callers send either a number or a string.
    #[serde(default, deserialize_with = "stringly")]
    pub height: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub hardware_kit_id: Option<String>,
    #[serde(default)]
    pub hardware_kit_name: Option<String>,
    /// Legacy alias of `hardware_kit_name` still sent by older carts.
    #[serde(default)]
    pub hardware: Option<String>,
    #[serde(default)]
    pub handle_id: Option<String>,
    #[serde(default)]
    pub handle_name: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(default = "default_quantity", alias = "qty")]
    pub quantity: u32,
    /// 1C SKU of the configured product, when the cart knows it.
    #[serde(rename = "sku_1c", default)]
    pub sku_1c: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

/// Accept a string, a number, or nothing for loosely-typed cart attributes.
fn stringly<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

impl CartItem {
    /// Line total (`unit_price × quantity`).
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Whether this position is a handle rather than a door leaf.
    pub fn is_handle(&self) -> bool {
        self.kind == ItemKind::Handle || self.handle_id.is_some()
    }
}

/// Persisted client, owned by the CRM subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

impl ClientRecord {
    /// Full name in the "Фамилия Имя Отчество" order used on documents.
    pub fn display_name(&self) -> String {
        let mut name = format!("{} {}", self.last_name, self.first_name);
        if let Some(middle) = self.middle_name.as_deref() {
            if !middle.is_empty() {
                name.push(' ');
                name.push_str(middle);
            }
        }
        name.trim().to_string()
    }
}

/// Client block as it appears on a rendered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<&ClientRecord> for ClientInfo {
    fn from(record: &ClientRecord) -> Self {
        Self {
            name: record.display_name(),
            phone: record.phone.clone(),
            address: record.address.clone(),
        }
    }
}

/// Supplier block for supplier-order workbooks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Catalog product as stored, reduced to the fields matching needs.
///
/// `properties_data` is the raw JSON property bag keyed by human-readable
/// Russian property names; it is parsed lazily and a malformed blob only
/// disqualifies its own product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub category: String,
    pub properties_data: Option<String>,
}

/// A catalog product resolved for a cart item, with its property bag parsed.
#[derive(Debug, Clone)]
pub struct CatalogMatch {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub properties: serde_json::Map<String, Value>,
}

/// Persisted document header (Quote, Invoice and Order are structurally
/// identical; `doc_type` selects the table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub doc_type: DocumentType,
    /// Unique within the document type, Cyrillic prefix for fresh documents.
    pub number: String,
    /// Upstream document this one was generated from; forms a strict tree.
    pub parent_document_id: Option<String>,
    /// Groups repeated exports of the same cart instance.
    pub cart_session_id: Option<String>,
    pub client_id: String,
    pub created_by: String,
    pub status: String,
    pub subtotal: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub notes: String,
    /// Verbatim JSON snapshot of the cart, kept for audit and dedup.
    pub cart_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Document header fields supplied at creation; the store assigns
/// `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub doc_type: DocumentType,
    pub number: String,
    pub parent_document_id: Option<String>,
    pub cart_session_id: Option<String>,
    pub client_id: String,
    pub created_by: String,
    pub status: String,
    pub subtotal: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub notes: String,
    pub cart_data: Option<String>,
}

/// Line item created in the same batch as its document header.
#[derive(Debug, Clone)]
pub struct NewDocumentItem {
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub notes: String,
}

/// Persisted document line item.
#[derive(Debug, Clone)]
pub struct DocumentItemRecord {
    pub id: String,
    pub document_id: String,
    pub product_id: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub notes: String,
}

/// A cart item after catalog resolution, ready for rendering.
#[derive(Debug, Clone)]
pub struct ResolvedItem {
    /// 1-based position within the document.
    pub row_number: usize,
    /// SKU shown on the document (cart-supplied, else supplier article).
    pub sku: String,
    /// Fully-formed display name shared with the persisted item notes.
    pub name: String,
    pub kind: ItemKind,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub total: Decimal,
    /// Catalog products matching this position, capped by the matcher.
    pub matches: Vec<CatalogMatch>,
}

/// Normalized payload consumed by every renderer.
#[derive(Debug, Clone)]
pub struct ExportData {
    pub doc_type: DocumentType,
    /// Export-facing (Latin-prefixed) document number.
    pub document_number: String,
    pub client: ClientInfo,
    pub items: Vec<ResolvedItem>,
    pub total_amount: Decimal,
    /// Present only on supplier-order workbooks.
    pub supplier: Option<SupplierInfo>,
}
