//! Page-number handling shared by the listing endpoints.

pub const PAGE_SIZE: i64 = 10;

/// Resolve a 1-based page number from the query into `(page, offset)`.
///
/// Missing or non-positive pages mean the first page. The offset saturates, so
/// an absurd page number reads past the end instead of overflowing.
pub fn window(page: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    (page, (page - 1).saturating_mul(PAGE_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_starts_at_zero() {
        assert_eq!(window(None), (1, 0));
        assert_eq!(window(Some(0)), (1, 0));
        assert_eq!(window(Some(-7)), (1, 0));
        assert_eq!(window(Some(3)), (3, 20));
    }

    #[test]
    fn huge_page_saturates_offset() {
        assert_eq!(window(Some(i64::MAX)), (i64::MAX, i64::MAX));
        assert_eq!(window(Some(i64::MAX / PAGE_SIZE + 2)).1, i64::MAX);
    }
}
