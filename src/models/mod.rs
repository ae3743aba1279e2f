pub mod catalog;
pub mod recipe;
pub mod user;

/// One-based page request, already clamped to the configured limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u64, limit: u64) -> Self {
        Self { page, limit }
    }

    /// Zero-based index for `Paginator::fetch_page`.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.page.saturating_sub(1)
    }

    /// Row offset of the first item, `None` when it does not fit an SQL
    /// `OFFSET` (signed 64-bit).
    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        self.index()
            .checked_mul(self.limit)
            .filter(|offset| i64::try_from(*offset).is_ok())
    }

    /// Last valid page for `count` rows; an empty result still has page 1.
    #[must_use]
    pub const fn last_page(&self, count: u64) -> u64 {
        if self.limit == 0 {
            return 1;
        }
        let pages = count.div_ceil(self.limit);
        if pages == 0 { 1 } else { pages }
    }

    /// Whether this page exists for `count` rows.
    #[must_use]
    pub const fn is_within(&self, count: u64) -> bool {
        self.page >= 1 && self.page <= self.last_page(count)
    }
}
