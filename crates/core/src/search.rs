//! Pagination and BaaS filter helpers.

/// Default page size for catalog listings.
pub const DEFAULT_PER_PAGE: u32 = 50;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: u32 = 200;

/// Clamp a user-provided page number to at least 1.
pub fn clamp_page(page: Option<i64>) -> u32 {
    page.unwrap_or(1).clamp(1, i64::from(u32::MAX)) as u32
}

/// Clamp a user-provided page size to `[1, max]`, defaulting to `default`.
pub fn clamp_per_page(per_page: Option<i64>, default: u32, max: u32) -> u32 {
    per_page
        .unwrap_or(i64::from(default))
        .clamp(1, i64::from(max)) as u32
}

/// Quote a value for use inside a BaaS filter expression.
///
/// Backslashes and double quotes are escaped so user input cannot close the
/// string literal and inject extra filter clauses.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
