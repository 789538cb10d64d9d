//! Validation utilities for the Stock Movement API

use crate::types::CompanyKey;

// ============================================================================
// Identifier Validations
// ============================================================================

/// Canonical 8-4-4-4-12 hexadecimal GUID
pub fn is_guid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    groups.len() == lengths.len()
        && groups
            .iter()
            .zip(lengths)
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Interpret a warehouse selector as a company GUID or numeric code
pub fn parse_company_key(input: &str) -> Result<CompanyKey, &'static str> {
    let trimmed = input.trim();
    if is_guid(trimmed) {
        return uuid::Uuid::parse_str(trimmed)
            .map(CompanyKey::Guid)
            .map_err(|_| "Invalid warehouse. Send a GUID (ID) or a numeric cdemp");
    }
    crate::numeric::to_optional_code(trimmed)
        .map(CompanyKey::Code)
        .ok_or("Invalid warehouse. Send a GUID (ID) or a numeric cdemp")
}

// ============================================================================
// Amount Validations
// ============================================================================

/// Fractional digits accepted on payload quantities and prices
pub const MAX_AMOUNT_DECIMAL_PLACES: u32 = 4;

/// Trailing zeros do not count: `1.50000` has two decimal places
pub fn within_decimal_places(value: rust_decimal::Decimal, max: u32) -> bool {
    value.normalize().scale() <= max
}

// ============================================================================
// Upload Validations
// ============================================================================

/// 5 MiB
pub const MAX_UPLOAD_SIZE_BYTES: i64 = 5 * 1024 * 1024;

pub const ALLOWED_UPLOAD_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/jpg",
    "image/webp",
    "application/pdf",
];

/// Normalize and check an upload's MIME type and size, returning the normalized type
pub fn validate_upload_file(file_type: &str, file_size: i64) -> Result<String, &'static str> {
    let normalized = file_type.trim().to_lowercase();
    if normalized.is_empty() || !ALLOWED_UPLOAD_MIME_TYPES.contains(&normalized.as_str()) {
        return Err("File type not allowed");
    }
    if file_size <= 0 {
        return Err("File size must be positive");
    }
    if file_size > MAX_UPLOAD_SIZE_BYTES {
        return Err("File exceeds the maximum allowed size");
    }
    Ok(normalized)
}

/// Object key extension for an accepted MIME type
pub fn extension_for_mime_type(file_type: &str) -> &'static str {
    match file_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "application/pdf" => "pdf",
        _ => "jpg",
    }
}
