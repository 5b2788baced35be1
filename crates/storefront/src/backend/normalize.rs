//! Upstream record normalization.
//!
//! The 4Fun backend grew out of a Spanish-field REST API and returns
//! product payloads in several shapes at once: `_id` or `id`, `nombre` or
//! `name`, stringified prices, platform/genre references that are either a
//! populated object or a bare id, and "referenced product" wrappers around
//! the actual record. Everything entering the storefront passes through
//! [`normalize`] exactly once and comes out as a canonical
//! [`Product`] - downstream code never re-validates.
//!
//! `normalize` is idempotent: feeding a canonical product's serialized
//! form back in returns the same product.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use four_fun_core::{CartLine, EntityRef, LineId, Product, ProductId, ProductKind};

/// Substituted for any missing or malformed image reference.
pub const PLACEHOLDER_IMAGE_URL: &str = "/placeholder.png";

/// Synthesized identifier for records arriving without one.
pub const MISSING_ID: &str = "missing-id";

/// Platform id -> display name.
const PLATFORM_NAMES: &[(&str, &str)] = &[
    ("ps5", "PlayStation 5"),
    ("xbox", "Xbox Series X"),
    ("switch", "Nintendo Switch"),
    ("pc", "PC"),
    ("multi", "Multi-platform"),
];

/// Genre id -> display name.
const GENRE_NAMES: &[(&str, &str)] = &[
    ("action", "Action"),
    ("rpg", "RPG"),
    ("strategy", "Strategy"),
    ("adventure", "Adventure"),
    ("sports", "Sports"),
    ("puzzle", "Puzzle"),
    ("racing", "Racing"),
    ("shooter", "Shooter"),
    ("simulation", "Simulation"),
];

/// Failures raised by the normalization boundary.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The payload is not a structured record at all.
    #[error("malformed record: expected a JSON object, got {0}")]
    MalformedRecord(&'static str),

    /// A cart line payload lacks a field it cannot be repaired without.
    #[error("cart line missing {0}")]
    IncompleteLine(&'static str),
}

/// JSON type name for error messages.
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// =============================================================================
// Product normalization
// =============================================================================

/// Normalize an arbitrary upstream product payload into a canonical
/// [`Product`].
///
/// Never returns a partially-invalid product. Records missing their
/// identifier are repaired with [`MISSING_ID`] and logged as degraded
/// rather than rejected.
///
/// # Errors
///
/// Returns [`NormalizeError::MalformedRecord`] only when `raw` is not a
/// JSON object.
pub fn normalize(raw: &Value) -> Result<Product, NormalizeError> {
    let record = raw
        .as_object()
        .ok_or_else(|| NormalizeError::MalformedRecord(json_type(raw)))?;

    // Cart payloads wrap the real record in a populated reference field;
    // the wrapper has no name of its own.
    if let Some(inner) = wrapped_record(record) {
        return normalize(inner);
    }

    let id = match string_field(record, &["_id", "id"]) {
        Some(id) if !id.trim().is_empty() => id,
        _ => {
            warn!("Product record arrived without an identifier; marking degraded");
            MISSING_ID.to_string()
        }
    };

    let name = string_field(record, &["name", "nombre"])
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Unknown Product".to_string());
    let description = string_field(record, &["description", "descripcion"]).unwrap_or_default();
    let developer = string_field(record, &["developer", "desarrollador"])
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(Product {
        id: ProductId::new(id),
        name,
        description,
        price: coerce_decimal(field(record, &["price", "precio"])),
        stock: coerce_count(field(record, &["stock"])),
        image_url: coerce_image_url(field(record, &["imageUrl", "imagenUrl", "imageId", "image"])),
        platform: resolve_entity(
            field(record, &["platform", "plataformaId"]),
            PLATFORM_NAMES,
            "Unknown Platform",
        ),
        genre: resolve_entity(
            field(record, &["genre", "generoId"]),
            GENRE_NAMES,
            "Unknown Genre",
        ),
        kind: coerce_kind(field(record, &["kind", "tipo", "type"])),
        developer,
        rating: coerce_rating(field(record, &["rating", "calificacion"])),
        release_date: coerce_release_date(field(record, &["releaseDate", "fechaLanzamiento"])),
    })
}

/// Normalize a list of product payloads, dropping malformed entries.
///
/// One bad record must not blank out an entire catalog page, so failures
/// are logged and skipped rather than propagated.
#[must_use]
pub fn normalize_products(raw: &[Value]) -> Vec<Product> {
    raw.iter()
        .filter_map(|value| match normalize(value) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(error = %e, "Dropping malformed product record from list");
                None
            }
        })
        .collect()
}

/// A populated "referenced product" wrapper without its own name.
fn wrapped_record(record: &Map<String, Value>) -> Option<&Value> {
    if record.contains_key("name") || record.contains_key("nombre") {
        return None;
    }
    ["productoId", "product"]
        .iter()
        .find_map(|key| record.get(*key))
        .filter(|value| value.is_object())
}

// =============================================================================
// Cart line normalization
// =============================================================================

/// Normalize a raw remote cart line.
///
/// Lines embed their product either as a populated `product` object or as
/// flat `name`/`price`/`image` fields next to a `productId`. The embedded
/// product, when present, wins over the flat fields (it is the fresher
/// source).
///
/// # Errors
///
/// Returns an error when the payload is not an object or lacks a line id
/// or product reference; list contexts drop such lines with a log.
pub fn normalize_line(raw: &Value) -> Result<CartLine, NormalizeError> {
    let record = raw
        .as_object()
        .ok_or_else(|| NormalizeError::MalformedRecord(json_type(raw)))?;

    let line_id = string_field(record, &["_id", "id"])
        .filter(|s| !s.trim().is_empty())
        .ok_or(NormalizeError::IncompleteLine("line id"))?;

    let embedded = record
        .get("product")
        .or_else(|| record.get("productoId"))
        .filter(|value| value.is_object())
        .map(normalize)
        .transpose()?;

    let product_id = match &embedded {
        Some(product) => product.id.clone(),
        None => string_field(record, &["productId", "productoId"])
            .filter(|s| !s.trim().is_empty())
            .map(ProductId::new)
            .ok_or(NormalizeError::IncompleteLine("product reference"))?,
    };

    let name = embedded.as_ref().map_or_else(
        || {
            string_field(record, &["name", "nombre"])
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "Unknown Product".to_string())
        },
        |product| product.name.clone(),
    );
    let price = embedded.as_ref().map_or_else(
        || coerce_decimal(field(record, &["price", "precio"])),
        |product| product.price,
    );
    let image_url = embedded.as_ref().map_or_else(
        || string_field(record, &["image", "imageUrl", "imagenUrl"]),
        |product| Some(product.image_url.clone()),
    );

    Ok(CartLine {
        id: LineId::new(line_id),
        product_id,
        name,
        price,
        quantity: coerce_count(field(record, &["quantity", "cantidad"])).max(1),
        image_url,
    })
}

/// Normalize a list of raw cart lines, dropping unusable entries.
#[must_use]
pub fn normalize_lines(raw: &[Value]) -> Vec<CartLine> {
    raw.iter()
        .filter_map(|value| match normalize_line(value) {
            Ok(line) => Some(line),
            Err(e) => {
                warn!(error = %e, "Dropping malformed cart line from remote snapshot");
                None
            }
        })
        .collect()
}

// =============================================================================
// Field coercion helpers
// =============================================================================

/// First present field among `keys`.
fn field<'a>(record: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| record.get(*key))
}

/// First field among `keys` that holds a string.
fn string_field(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .find_map(|value| value.as_str().map(ToString::to_string))
}

/// Coerce a number-or-string value into a non-negative decimal.
/// Anything unparseable (or negative) becomes zero.
fn coerce_decimal(value: Option<&Value>) -> Decimal {
    let parsed = match value {
        Some(Value::Number(n)) => {
            if let Some(int) = n.as_i64() {
                Some(Decimal::from(int))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Some(Value::String(s)) => s.trim().parse::<Decimal>().ok(),
        _ => None,
    };

    match parsed {
        Some(d) if d >= Decimal::ZERO => d,
        _ => Decimal::ZERO,
    }
}

/// Coerce a number-or-string value into a non-negative count.
fn coerce_count(value: Option<&Value>) -> u32 {
    let parsed = match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
        }
        _ => None,
    };

    parsed
        .map(|count| u32::try_from(count).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Coerce a rating into a non-negative float, defaulting to zero.
fn coerce_rating(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    match parsed {
        Some(rating) if rating.is_finite() && rating >= 0.0 => rating,
        _ => 0.0,
    }
}

/// Accept only absolute (`http...`) or root-relative (`/...`) URLs;
/// everything else becomes the fixed placeholder.
fn coerce_image_url(value: Option<&Value>) -> String {
    match value.and_then(Value::as_str) {
        Some(url) if url.starts_with("http") || url.starts_with('/') => url.to_string(),
        _ => PLACEHOLDER_IMAGE_URL.to_string(),
    }
}

/// Resolve a union-typed platform/genre reference into a full pair.
///
/// Accepts a populated object (`_id`/`id` + `nombre`/`name`), a bare id
/// string (looked up in the static dictionary, falling back to the id
/// itself), or nothing (the `unknown` sentinel pair).
fn resolve_entity(
    value: Option<&Value>,
    dictionary: &[(&str, &str)],
    unknown_name: &str,
) -> EntityRef {
    match value {
        Some(Value::Object(record)) => {
            let id = string_field(record, &["_id", "id"])
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "unknown".to_string());
            let name = string_field(record, &["name", "nombre"])
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| display_name(dictionary, &id));
            EntityRef::new(id, name)
        }
        Some(Value::String(id)) if !id.trim().is_empty() => {
            EntityRef::new(id.clone(), display_name(dictionary, id))
        }
        _ => EntityRef::new("unknown", unknown_name),
    }
}

/// Dictionary lookup, falling back to the id itself.
fn display_name(dictionary: &[(&str, &str)], id: &str) -> String {
    dictionary
        .iter()
        .find(|(key, _)| *key == id)
        .map_or_else(|| id.to_string(), |(_, name)| (*name).to_string())
}

/// `Fisico`/`Physical` map to physical; every other tag is digital.
fn coerce_kind(value: Option<&Value>) -> ProductKind {
    match value.and_then(Value::as_str) {
        Some(tag)
            if tag.eq_ignore_ascii_case("Fisico") || tag.eq_ignore_ascii_case("Physical") =>
        {
            ProductKind::Physical
        }
        _ => ProductKind::Digital,
    }
}

/// Parse an RFC 3339 timestamp or bare date; anything else becomes now.
fn coerce_release_date(value: Option<&Value>) -> DateTime<Utc> {
    let Some(raw) = value.and_then(Value::as_str) else {
        return Utc::now();
    };

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.with_timezone(&Utc);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return midnight.and_utc();
        }
    }
    Utc::now()
}
