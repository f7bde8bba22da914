//! Row-to-product mapping.
//!
//! Headers are resolved through a fixed alias table into [`CanonicalField`]s;
//! each non-blank cell then writes its field on a fresh [`Product`]. Columns
//! are applied left to right, so when two aliases name the same field the
//! rightmost column wins.

use sheetsync_core::{CellValue, Product, ProductImage, ProductOption};

/// The product attribute a header resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    Title,
    BodyHtml,
    Vendor,
    ProductType,
    Tags,
    Published,
    Sku,
    Barcode,
    Price,
    CompareAtPrice,
    Cost,
    InventoryQuantity,
    Weight,
    WeightUnit,
    Option1,
    Option2,
    Image,
}

/// Normalized header name to canonical field.
const HEADER_ALIASES: &[(&str, CanonicalField)] = &[
    ("title", CanonicalField::Title),
    ("product name", CanonicalField::Title),
    ("name", CanonicalField::Title),
    ("description", CanonicalField::BodyHtml),
    ("body", CanonicalField::BodyHtml),
    ("body_html", CanonicalField::BodyHtml),
    ("vendor", CanonicalField::Vendor),
    ("brand", CanonicalField::Vendor),
    ("manufacturer", CanonicalField::Vendor),
    ("product type", CanonicalField::ProductType),
    ("type", CanonicalField::ProductType),
    ("category", CanonicalField::ProductType),
    ("tags", CanonicalField::Tags),
    ("keywords", CanonicalField::Tags),
    ("published", CanonicalField::Published),
    ("status", CanonicalField::Published),
    ("sku", CanonicalField::Sku),
    ("product code", CanonicalField::Sku),
    ("barcode", CanonicalField::Barcode),
    ("upc", CanonicalField::Barcode),
    ("ean", CanonicalField::Barcode),
    ("isbn", CanonicalField::Barcode),
    ("gtin", CanonicalField::Barcode),
    ("price", CanonicalField::Price),
    ("retail price", CanonicalField::Price),
    ("compare at price", CanonicalField::CompareAtPrice),
    ("compare price", CanonicalField::CompareAtPrice),
    ("msrp", CanonicalField::CompareAtPrice),
    ("cost", CanonicalField::Cost),
    ("cost price", CanonicalField::Cost),
    ("inventory", CanonicalField::InventoryQuantity),
    ("quantity", CanonicalField::InventoryQuantity),
    ("stock", CanonicalField::InventoryQuantity),
    ("weight", CanonicalField::Weight),
    ("weight unit", CanonicalField::WeightUnit),
    ("option1", CanonicalField::Option1),
    ("size", CanonicalField::Option1),
    ("option2", CanonicalField::Option2),
    ("color", CanonicalField::Option2),
    ("image", CanonicalField::Image),
    ("image url", CanonicalField::Image),
    ("product image", CanonicalField::Image),
];

/// String values that coerce to `published = true`. Matching is exact.
const PUBLISHED_VALUES: &[&str] = &["true", "yes", "published"];

const SIZE_OPTION: &str = "Size";
const COLOR_OPTION: &str = "Color";
const PLACEHOLDER_OPTION_VALUE: &str = "Default";

/// Resolves a raw header cell to its canonical field.
///
/// Matching is case-insensitive and ignores surrounding whitespace. Unknown
/// headers resolve to `None`.
#[must_use]
pub fn resolve_header(header: &str) -> Option<CanonicalField> {
    let normalized = header.trim().to_lowercase();
    HEADER_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, field)| *field)
}

/// Maps one data row onto a new [`Product`].
///
/// `cells` shorter than `headers` are treated as padded with empty cells.
/// Cells past the last header have no field to land in and are ignored.
/// `skip_column` (the outcome column) is never mapped.
#[must_use]
pub fn map_row(headers: &[String], cells: &[CellValue], skip_column: Option<usize>) -> Product {
    let mut product = Product::new();
    for (idx, header) in headers.iter().enumerate() {
        if Some(idx) == skip_column {
            continue;
        }
        let Some(value) = cells.get(idx) else {
            break;
        };
        if value.is_blank() {
            continue;
        }
        if let Some(field) = resolve_header(header) {
            apply_field(&mut product, field, value);
        }
    }
    product
}

fn apply_field(product: &mut Product, field: CanonicalField, value: &CellValue) {
    match field {
        CanonicalField::Title => product.title = Some(value.to_text()),
        CanonicalField::BodyHtml => product.body_html = Some(value.to_text()),
        CanonicalField::Vendor => product.vendor = Some(value.to_text()),
        CanonicalField::ProductType => product.product_type = Some(value.to_text()),
        CanonicalField::Tags => product.tags = Some(value.to_text()),
        CanonicalField::Published => product.published = Some(is_published(value)),
        CanonicalField::Sku => product.variant_mut().sku = Some(value.to_text()),
        CanonicalField::Barcode => product.variant_mut().barcode = Some(value.to_text()),
        CanonicalField::Price => product.variant_mut().price = Some(value.to_text()),
        CanonicalField::CompareAtPrice => {
            product.variant_mut().compare_at_price = Some(value.to_text());
        }
        CanonicalField::Cost => product.variant_mut().cost = Some(value.to_text()),
        CanonicalField::InventoryQuantity => {
            product.variant_mut().inventory_quantity = Some(value.to_int_lenient());
        }
        CanonicalField::Weight => product.variant_mut().weight = Some(value.to_float_lenient()),
        CanonicalField::WeightUnit => product.variant_mut().weight_unit = Some(value.to_text()),
        CanonicalField::Option1 => apply_option1(product, &value.to_text()),
        CanonicalField::Option2 => apply_option2(product, &value.to_text()),
        CanonicalField::Image => {
            let src = value.to_text();
            let src = src.trim();
            if !src.is_empty() {
                product.images = vec![ProductImage {
                    src: src.to_owned(),
                }];
            }
        }
    }
}

fn is_published(value: &CellValue) -> bool {
    match value {
        CellValue::Bool(b) => *b,
        CellValue::Text(s) => PUBLISHED_VALUES.contains(&s.as_str()),
        CellValue::Empty | CellValue::Number(_) => false,
    }
}

/// Sets `option1`. Seeds the `Size` group only when no option group exists
/// yet; an existing first group (including a `Default` placeholder left by an
/// earlier color column) is not touched.
fn apply_option1(product: &mut Product, value: &str) {
    product.variant_mut().option1 = Some(value.to_owned());
    if product.options.is_empty() {
        product.options.push(ProductOption::new(SIZE_OPTION, value));
    }
}

/// Sets `option2`. The `Color` group must sit in the second slot, so when no
/// group exists yet a `Size: ["Default"]` placeholder is seeded first. The
/// color group is appended only while fewer than two groups exist, so a
/// second color column updates the variant but not the groups.
///
/// The result depends on column order: with color left of size the size
/// group keeps the placeholder value while `option1` carries the real size.
fn apply_option2(product: &mut Product, value: &str) {
    product.variant_mut().option2 = Some(value.to_owned());
    if product.options.is_empty() {
        product
            .options
            .push(ProductOption::new(SIZE_OPTION, PLACEHOLDER_OPTION_VALUE));
    }
    if product.options.len() < 2 {
        product.options.push(ProductOption::new(COLOR_OPTION, value));
    }
}

#[cfg(test)]
#[path = "mapper_test.rs"]
mod tests;
