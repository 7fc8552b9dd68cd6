use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Deserialize, IntoParams, ToSchema)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_page_size() -> u32 {
    50
}

impl PaginationParams {
    pub fn validate(&self) -> Result<(), String> {
        if self.page < 1 {
            return Err("page must be >= 1".to_string());
        }
        if self.page_size < 1 || self.page_size > MAX_PAGE_SIZE {
            return Err(format!("page_size must be between 1 and {MAX_PAGE_SIZE}"));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: i64,
    pub total_pages: u32,
}

impl PaginationMeta {
    pub fn new(params: PaginationParams, total_items: i64) -> Self {
        let page_size = i64::from(params.page_size.max(1));
        let total_pages = (total_items.max(0) + page_size - 1) / page_size;
        Self {
            page: params.page,
            page_size: params.page_size,
            total_items,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, params: PaginationParams, total_items: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(params, total_items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_follow_page_numbers() {
        let params = PaginationParams {
            page: 3,
            page_size: 20,
        };
        assert_eq!(params.offset(), 40);
        assert_eq!(params.limit(), 20);
    }

    #[test]
    fn rejects_out_of_range_pages() {
        assert!(PaginationParams { page: 0, page_size: 10 }.validate().is_err());
        assert!(PaginationParams { page: 1, page_size: 101 }.validate().is_err());
        assert!(PaginationParams::default().validate().is_ok());
    }

    #[test]
    fn total_pages_rounds_up() {
        let meta = PaginationMeta::new(PaginationParams { page: 1, page_size: 50 }, 101);
        assert_eq!(meta.total_pages, 3);
        let empty = PaginationMeta::new(PaginationParams::default(), 0);
        assert_eq!(empty.total_pages, 0);
    }
}
