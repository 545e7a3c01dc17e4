//! Property-name alias tables.
//!
//! Catalog imports arrived from several suppliers over the years, so the
//! same logical field lives under different human-readable keys inside
//! `properties_data`. Each canonical field carries an ordered alias list;
//! lookups take the first alias holding a non-empty value.

use serde_json::{Map, Value};

/// Canonical configuration fields a cart item can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    Model,
    Finish,
    Color,
    Width,
    Height,
}

/// Ordered property-name aliases for one canonical field.
#[derive(Debug)]
pub struct FieldAliases {
    pub field: ConfigField,
    pub keys: &'static [&'static str],
}

/// Alias priority for door-configuration matching.
pub const DOOR_MATCH_ALIASES: &[FieldAliases] = &[
    FieldAliases {
        field: ConfigField::Model,
        keys: &["Domeo_Название модели для Web", "МОДЕЛЬ", "model"],
    },
    FieldAliases {
        field: ConfigField::Finish,
        keys: &["Тип покрытия", "Материал/Покрытие"],
    },
    FieldAliases {
        field: ConfigField::Color,
        keys: &["Domeo_Цвет", "Цвет/Отделка", "Общее_Цвет"],
    },
    FieldAliases {
        field: ConfigField::Width,
        keys: &["Ширина/мм", "Размер 1", "Общее_Ширина"],
    },
    FieldAliases {
        field: ConfigField::Height,
        keys: &["Высота/мм", "Размер 2", "Общее_Высота"],
    },
];

/// Supplier-article aliases used when the cart has no SKU of its own.
pub const SUPPLIER_SKU_ALIASES: &[&str] = &[
    "Артикул поставщика",
    "SKU поставщика",
    "Фабрика_артикул",
    "Артикул",
    "SKU",
];

/// Alias keys for a canonical field.
pub fn aliases_for(field: ConfigField) -> &'static [&'static str] {
    DOOR_MATCH_ALIASES
        .iter()
        .find(|entry| entry.field == field)
        .map(|entry| entry.keys)
        .unwrap_or(&[])
}

/// First non-empty value among the given alias keys, coerced to text.
///
/// Numbers coerce to their decimal representation so `800` and `"800"`
/// compare equal downstream; empty strings and nulls are skipped.
pub fn property_text(properties: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        match properties.get(*key) {
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}
