use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Page must be a positive integer")]
    InvalidPage,
    #[error("Limit must be a positive integer")]
    InvalidLimit,
    #[error("Page not found!")]
    ZeroPage,
    #[error("Page not found!")]
    ZeroLimit,
    /// The filter matched rows, but none fall inside the requested window.
    #[error("Page not found!")]
    OutOfRange,
}

/// PageQuery
///
/// Raw `?page=&limit=` query parameters. Kept as strings so that a non-numeric
/// value is reported with the pagination message instead of a generic query rejection.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page index. Defaults to 1.
    pub page: Option<String>,
    /// Page size. Defaults to 10.
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> Result<PageRequest, PageError> {
        PageRequest::parse(self.page.as_deref(), self.limit.as_deref())
    }
}

/// Offset/limit pair handed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_positive(raw: Option<&str>, fallback: u32, invalid: PageError, zero: PageError) -> Result<u32, PageError> {
    let Some(raw) = raw else {
        return Ok(fallback);
    };
    match raw.trim().parse::<u32>() {
        Ok(0) => Err(zero),
        Ok(value) => Ok(value),
        Err(_) => Err(invalid),
    }
}

impl PageRequest {
    /// parse
    ///
    /// Absent values fall back to page 1 / limit 10. Zero is treated as a page
    /// that cannot exist; anything that is not a non-negative integer is invalid input.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, PageError> {
        let page = parse_positive(page, DEFAULT_PAGE, PageError::InvalidPage, PageError::ZeroPage)?;
        let limit = parse_positive(limit, DEFAULT_LIMIT, PageError::InvalidLimit, PageError::ZeroLimit)?;
        Ok(Self { page, limit })
    }

    /// The store window, or `None` when the offset does not fit in an `i64`.
    /// No store holds that many rows, so callers treat it as out of range.
    pub fn window(&self) -> Option<Window> {
        let limit = i64::from(self.limit);
        let offset = (i64::from(self.page) - 1).checked_mul(limit)?;
        Some(Window { offset, limit })
    }

    /// resolve
    ///
    /// Classifies a store listing. Zero matches and an out-of-range page are
    /// reported separately because endpoints answer them with different messages.
    pub fn resolve<T>(&self, listing: Listing<T>) -> PageOutcome<T> {
        if listing.total <= 0 {
            return PageOutcome::Empty;
        }
        if listing.rows.is_empty() {
            return PageOutcome::OutOfRange;
        }
        PageOutcome::Page(Page {
            total_results: listing.total,
            total_pages: total_pages(listing.total, self.limit),
            page: self.page,
            data: listing.rows,
        })
    }
}

pub fn total_pages(total: i64, limit: u32) -> i64 {
    let limit = i64::from(limit.max(1));
    (total + limit - 1) / limit
}

/// One window of rows plus the size of the full filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub total: i64,
    pub rows: Vec<T>,
}

impl<T> Listing<T> {
    pub fn empty() -> Self {
        Self {
            total: 0,
            rows: Vec::new(),
        }
    }
}

/// Page
///
/// The paginated result payload: `{totalResults, totalPages, page, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Page<T> {
    pub total_results: i64,
    pub total_pages: i64,
    pub page: u32,
    pub data: Vec<T>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome<T> {
    Empty,
    OutOfRange,
    Page(Page<T>),
}

impl<T> PageOutcome<T> {
    /// Turns the outcome into an endpoint result, using `empty_msg` when the filter matched nothing.
    pub fn or_not_found(self, empty_msg: &str) -> AppResult<Page<T>> {
        match self {
            PageOutcome::Page(page) => Ok(page),
            PageOutcome::Empty => Err(AppError::not_found(empty_msg)),
            PageOutcome::OutOfRange => Err(PageError::OutOfRange.into()),
        }
    }
}

/// paginate
///
/// Runs one filtered listing through the store and classifies the result.
/// `fetch` receives the offset/limit window and returns the matching rows
/// together with the total count for the same filter.
pub async fn paginate<T, E, F, Fut>(request: PageRequest, fetch: F) -> Result<PageOutcome<T>, E>
where
    F: FnOnce(Window) -> Fut,
    Fut: Future<Output = Result<Listing<T>, E>>,
{
    let Some(window) = request.window() else {
        return Ok(PageOutcome::OutOfRange);
    };
    let listing = fetch(window).await?;
    Ok(request.resolve(listing))
}
