//! Slicing ranked results for display.

/// Results shown per page when the caller has no preference.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// One window over a ranked result list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub offset: usize,
    pub total: usize,
    /// Results after this page.
    pub remaining: usize,
}

impl<T> Page<'_, T> {
    /// Offset of the following page, if there is one.
    pub const fn next_offset(&self) -> Option<usize> {
        if self.remaining > 0 {
            Some(self.offset + self.items.len())
        } else {
            None
        }
    }
}

/// Returns the window `[offset, offset + page_size)` of `results`.
///
/// Offsets past the end yield an empty page; a zero page size is treated as
/// the default.
pub fn paginate<T>(results: &[T], offset: usize, page_size: usize) -> Page<'_, T> {
    let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
    let start = offset.min(results.len());
    let end = start.saturating_add(page_size).min(results.len());

    Page {
        items: &results[start..end],
        offset: start,
        total: results.len(),
        remaining: results.len() - end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case(0, 25, 25, 35)]
    #[case(25, 25, 25, 10)]
    #[case(50, 25, 10, 0)]
    #[case(60, 25, 0, 0)]
    #[case(100, 25, 0, 0)]
    fn test_windows(
        #[case] offset: usize,
        #[case] page_size: usize,
        #[case] expected_len: usize,
        #[case] expected_remaining: usize,
    ) {
        let results: Vec<u32> = (0..60).collect();
        let page = paginate(&results, offset, page_size);
        check!(page.items.len() == expected_len);
        check!(page.remaining == expected_remaining);
        check!(page.total == 60);
    }

    #[test]
    fn test_next_offset() {
        let results: Vec<u32> = (0..30).collect();
        let first = paginate(&results, 0, 25);
        check!(first.next_offset() == Some(25));
        let second = paginate(&results, 25, 25);
        check!(second.items == [25, 26, 27, 28, 29]);
        check!(second.next_offset().is_none());
    }

    #[test]
    fn test_zero_page_size_uses_default() {
        let results: Vec<u32> = (0..30).collect();
        check!(paginate(&results, 0, 0).items.len() == DEFAULT_PAGE_SIZE);
    }
}
