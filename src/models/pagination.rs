//! 分页相关的数据结构
//!
//! Two flavours: offset pages for vendor back-office lists, and cursor pages
//! (last seen id + fixed page size) for the customer's own bookings and
//! payments, ordered newest first.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaginationParams {
    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        Self { page, per_page }
    }

    pub fn get_page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn get_per_page(&self) -> u64 {
        self.per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn get_offset(&self) -> u64 {
        (self.get_page() - 1) * self.get_per_page()
    }

    pub fn get_limit(&self) -> u64 {
        self.get_per_page()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        let per_page = params.get_per_page();
        Self {
            items,
            page: params.get_page(),
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct CursorParams {
    /// 上一页最后一条记录的 id
    pub cursor: Option<Uuid>,
    pub limit: Option<u64>,
}

impl CursorParams {
    pub fn new(cursor: Option<Uuid>, limit: Option<u64>) -> Self {
        Self { cursor, limit }
    }

    pub fn get_limit(&self, default_limit: u64) -> u64 {
        self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    /// 存在下一页时返回，作为下次请求的 cursor
    pub next_cursor: Option<Uuid>,
}

impl<T> CursorPage<T> {
    /// `rows` is the page fetched with `limit + 1`; the extra row only signals
    /// that another page exists and is dropped.
    pub fn from_rows<M>(
        mut rows: Vec<M>,
        limit: u64,
        id_of: impl Fn(&M) -> Uuid,
        map: impl Fn(M) -> T,
    ) -> Self {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more { rows.last().map(&id_of) } else { None };
        Self {
            items: rows.into_iter().map(map).collect(),
            next_cursor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_params() {
        let params = PaginationParams::new(Some(2), Some(10));
        assert_eq!(params.get_page(), 2);
        assert_eq!(params.get_per_page(), 10);
        assert_eq!(params.get_offset(), 10);
        assert_eq!(params.get_limit(), 10);
    }

    #[test]
    fn test_pagination_params_defaults_and_clamping() {
        let params = PaginationParams::new(None, None);
        assert_eq!(params.get_page(), 1);
        assert_eq!(params.get_per_page(), 20);
        assert_eq!(params.get_offset(), 0);

        let params = PaginationParams::new(Some(0), Some(10_000));
        assert_eq!(params.get_page(), 1);
        assert_eq!(params.get_per_page(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_total_pages() {
        let params = PaginationParams::new(Some(1), Some(10));
        let page = PaginatedResponse::new(vec![1, 2, 3], &params, 25);
        assert_eq!(page.total_pages, 3);
        let empty: PaginatedResponse<i32> = PaginatedResponse::new(vec![], &params, 0);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn test_cursor_page_detects_more_rows() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        let page = CursorPage::from_rows(ids.clone(), 3, |id| *id, |id| id);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.next_cursor, Some(ids[2]));

        let page = CursorPage::from_rows(ids[..2].to_vec(), 3, |id| *id, |id| id);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_cursor_limit_clamped() {
        assert_eq!(CursorParams::new(None, None).get_limit(10), 10);
        assert_eq!(CursorParams::new(None, Some(0)).get_limit(10), 1);
        assert_eq!(CursorParams::new(None, Some(500)).get_limit(10), MAX_PAGE_SIZE);
    }
}
