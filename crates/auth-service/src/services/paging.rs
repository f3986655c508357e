//! Offset pagination bounds shared by the admin listings

/// Page size used when none is given
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// Normalize a requested (page, page_size): pages start at 1, sizes are
/// clamped to `1..=MAX_PAGE_SIZE`.
pub fn page_bounds(page: Option<i64>, page_size: Option<i64>) -> (i64, i64) {
    let page = page.filter(|p| *p > 0).unwrap_or(1);
    let page_size = page_size
        .filter(|s| *s > 0)
        .map_or(DEFAULT_PAGE_SIZE, |s| s.min(MAX_PAGE_SIZE));
    (page, page_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds() {
        assert_eq!(page_bounds(None, None), (1, 20));
        assert_eq!(page_bounds(Some(0), Some(-3)), (1, 20));
        assert_eq!(page_bounds(Some(3), Some(500)), (3, 100));
        assert_eq!(page_bounds(Some(2), Some(15)), (2, 15));
    }
}
