//! Shared query parameter types for API handlers.

use radio_core::search::{clamp_page, clamp_per_page, DEFAULT_PER_PAGE, MAX_PER_PAGE};
use serde::Deserialize;

/// Catalog pagination parameters (`?page=&perPage=`).
///
/// Values are clamped by [`PageParams::resolve`]: `page >= 1`,
/// `perPage` in `[1, 200]` defaulting to 50.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    /// `(page, per_page)` after clamping.
    pub fn resolve(&self) -> (u32, u32) {
        (
            clamp_page(self.page),
            clamp_per_page(self.per_page, DEFAULT_PER_PAGE, MAX_PER_PAGE),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_defaults_and_clamps() {
        assert_eq!(PageParams::default().resolve(), (1, 50));
        let params = PageParams {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(params.resolve(), (1, 200));
    }
}
