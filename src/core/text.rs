use crate::models::Business;

/// Default cap on text search results
pub const DEFAULT_TEXT_SEARCH_LIMIT: usize = 20;

/// Trim a raw query. Blank queries yield `None` and never reach the store.
pub fn normalize_query(query: &str) -> Option<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Case-insensitive substring match on name, address or business type
pub fn matches_text(business: &Business, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    [&business.business_name, &business.address, &business.business_type]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}
