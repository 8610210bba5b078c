use crate::error::{CatalogError, Result};

pub const MIN_PAGE_LIMIT: i32 = 10;
pub const MAX_PAGE_LIMIT: i32 = 100;

/// Validated page window. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i32,
    limit: i32,
}

impl Pagination {
    pub fn new(page: i32, limit: i32) -> Result<Self> {
        if page <= 0 {
            return Err(CatalogError::invalid_argument("page must be > 0"));
        }
        if !(MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(CatalogError::invalid_argument(format!(
                "limit must be in range [{MIN_PAGE_LIMIT};{MAX_PAGE_LIMIT}]"
            )));
        }
        Ok(Self { page, limit })
    }

    pub fn limit(&self) -> i64 {
        self.limit as i64
    }

    pub fn offset(&self) -> i64 {
        self.limit as i64 * (self.page as i64 - 1)
    }
}
