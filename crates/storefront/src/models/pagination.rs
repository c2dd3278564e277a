//! Limit/offset pagination shared by the list endpoints.

/// A limit/offset window over a sorted result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    limit: i64,
    offset: i64,
}

impl Page {
    /// Page size used when the caller does not supply one.
    pub const DEFAULT_LIMIT: i64 = 10;
    /// Largest page a caller can request.
    pub const MAX_LIMIT: i64 = 100;

    /// Build a page, clamping `limit` to `[1, MAX_LIMIT]` and `offset` to `>= 0`.
    #[must_use]
    pub const fn new(limit: i64, offset: i64) -> Self {
        let limit = if limit < 1 {
            1
        } else if limit > Self::MAX_LIMIT {
            Self::MAX_LIMIT
        } else {
            limit
        };
        let offset = if offset < 0 { 0 } else { offset };
        Self { limit, offset }
    }

    /// Build a page from raw query-string values.
    ///
    /// Missing or non-numeric values fall back to the defaults
    /// (`limit = 10`, `offset = 0`) instead of failing the request.
    #[must_use]
    pub fn from_query(limit: Option<&str>, offset: Option<&str>) -> Self {
        Self::from_query_with_default(limit, offset, Self::DEFAULT_LIMIT)
    }

    /// Like [`Page::from_query`] with a caller-chosen default limit.
    #[must_use]
    pub fn from_query_with_default(
        limit: Option<&str>,
        offset: Option<&str>,
        default_limit: i64,
    ) -> Self {
        let limit = limit
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(default_limit);
        let offset = offset
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(0);
        Self::new(limit, offset)
    }

    /// Maximum number of rows in this page.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    /// Number of rows skipped before this page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    /// Apply this window to an already sorted sequence.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(take).collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}
