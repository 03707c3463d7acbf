use std::future::Future;

use crate::{
    error::{AppError, AppResult},
    models::{CatalogPage, UpstreamPage},
};

/// Items per page as presented to the user
pub const LOGICAL_PAGE_SIZE: u32 = 24;
/// Items per page as returned by the upstream service
pub const UPSTREAM_PAGE_SIZE: u32 = 20;

/// Maps logical pages of one size onto upstream pages of another
///
/// The two sizes are independent; neither has to divide the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rebucketer {
    pub logical: u32,
    pub upstream: u32,
}

impl Default for Rebucketer {
    fn default() -> Self {
        Self {
            logical: LOGICAL_PAGE_SIZE,
            upstream: UPSTREAM_PAGE_SIZE,
        }
    }
}

impl Rebucketer {
    pub fn new(logical: u32, upstream: u32) -> AppResult<Self> {
        if logical == 0 || upstream == 0 {
            return Err(AppError::InvalidInput(
                "Page sizes must be greater than zero".to_string(),
            ));
        }
        Ok(Self { logical, upstream })
    }

    /// First upstream page to request and the offset of the logical page inside it.
    ///
    /// Fails when the upstream page number does not fit the upstream's `u32` paging.
    pub fn locate(&self, page: u32) -> AppResult<(u32, usize)> {
        let start = u64::from(page.saturating_sub(1)) * u64::from(self.logical);
        let upstream = u64::from(self.upstream);
        let first_page = u32::try_from(start / upstream + 1).map_err(|_| {
            AppError::InvalidInput(format!("Logical page {} is out of range", page))
        })?;
        Ok((first_page, (start % upstream) as usize))
    }

    /// Logical page count for an upstream total, never less than one.
    pub fn total_pages(&self, total_results: u64) -> u32 {
        let logical = u64::from(self.logical);
        total_results.div_ceil(logical).max(1) as u32
    }

    /// Resolves one logical page by fetching as many upstream pages as needed.
    ///
    /// Upstream pages are requested sequentially in increasing order; each
    /// fetch depends on how many items have accumulated. Any failure aborts
    /// the whole page.
    pub async fn fetch<T, F, Fut>(&self, page: u32, mut fetch: F) -> AppResult<CatalogPage<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AppResult<UpstreamPage<T>>>,
    {
        if page == 0 {
            return Err(AppError::InvalidInput(
                "Logical page numbers start at 1".to_string(),
            ));
        }

        let (first_page, offset) = self.locate(page)?;
        let needed = offset + self.logical as usize;

        let first = fetch(first_page).await?;
        let upstream_total_pages = first.total_pages.unwrap_or(1);
        let total_results = first
            .total_results
            .unwrap_or(u64::from(upstream_total_pages) * u64::from(self.upstream));

        let mut buffer = first.results;
        let mut last_fetched = first_page;
        let mut exhausted = buffer.is_empty();

        while !exhausted && buffer.len() < needed && last_fetched < upstream_total_pages {
            last_fetched += 1;
            let next = fetch(last_fetched).await?;
            exhausted = next.results.is_empty();
            buffer.extend(next.results);
        }

        let items: Vec<T> = buffer
            .into_iter()
            .skip(offset)
            .take(self.logical as usize)
            .collect();

        tracing::debug!(
            page = page,
            first_upstream_page = first_page,
            last_upstream_page = last_fetched,
            items = items.len(),
            "Logical page assembled"
        );

        Ok(CatalogPage {
            page,
            items,
            total_pages: self.total_pages(total_results),
        })
    }
}

/// Resolves a logical page with the default 24-over-20 sizing.
pub async fn fetch_logical_page<T, F, Fut>(page: u32, fetch: F) -> AppResult<CatalogPage<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = AppResult<UpstreamPage<T>>>,
{
    Rebucketer::default().fetch(page, fetch).await
}
