use serde::{Deserialize, Serialize};

/// A catalog product built from one spreadsheet row, ready to be sent to
/// the store's create-product endpoint.
///
/// Field names serialize in the Admin REST wire format (`body_html`,
/// `product_type`, ...). Unset optional fields are omitted from the payload
/// so the store applies its own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Product {
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    /// Comma-separated tag string, passed through as written in the sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    /// At most two option groups (`Size`, then `Color`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ProductOption>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ProductImage>,
    /// Always exactly one entry; only the first variant is ever populated.
    pub variants: Vec<Variant>,
}

impl Product {
    /// Returns an empty product with its single default variant in place.
    #[must_use]
    pub fn new() -> Self {
        Self {
            variants: vec![Variant::default()],
            ..Self::default()
        }
    }

    /// Returns the populated variant, creating it if the product was built
    /// without one.
    pub fn variant_mut(&mut self) -> &mut Variant {
        if self.variants.is_empty() {
            self.variants.push(Variant::default());
        }
        &mut self.variants[0]
    }

    /// Returns the populated variant, if any.
    #[must_use]
    pub fn variant(&self) -> Option<&Variant> {
        self.variants.first()
    }
}

/// The single purchasable configuration carried by a [`Product`].
///
/// Prices stay as text exactly as the sheet had them (`"9.99"`, `"$10"`);
/// the store does its own parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Variant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<String>,
    /// `Some(0)` when the sheet had an unreadable quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_quantity: Option<i64>,
    /// `Some(0.0)` when the sheet had an unreadable weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option2: Option<String>,
}

/// A named option group, e.g. `Size` with values `["M"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    pub values: Vec<String>,
}

impl ProductOption {
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_owned(),
            values: vec![value.to_owned()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub src: String,
}
