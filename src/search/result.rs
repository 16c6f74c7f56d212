use std::collections::HashMap;

use crate::data::FieldValue;
use crate::document::Document;

/// One page of search results.
#[derive(Debug, Clone)]
pub struct ResultPage {
    pub matches: Vec<Document>,
    /// 1-based.
    pub current_page: u32,
    pub per_page: u32,
    pub estimated_total: u64,
    /// The query with spelling corrections applied, when there were any.
    pub corrected_query: Option<String>,
    /// Value counts per requested facet field, in ascending value order.
    pub facets: HashMap<String, Vec<(FieldValue, u64)>>,
}

impl ResultPage {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.matches.iter()
    }

    /// Number of pages needed to show every estimated match.
    ///
    /// Rounds up: a partial last page counts as a page, so 200 matches at
    /// 18 per page is 12 pages and 10 matches at 4 per page is 3.
    pub fn total_pages(&self) -> u64 {
        self.estimated_total.div_ceil(u64::from(self.per_page.max(1)))
    }

    pub fn previous_page(&self) -> Option<u32> {
        (self.current_page > 1).then(|| self.current_page - 1)
    }

    pub fn next_page(&self) -> Option<u32> {
        (u64::from(self.current_page) < self.total_pages()).then(|| self.current_page + 1)
    }

    /// Zero-based rank of the first match on this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.current_page.saturating_sub(1)) * u64::from(self.per_page)
    }
}

impl<'a> IntoIterator for &'a ResultPage {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(current_page: u32, per_page: u32, estimated_total: u64) -> ResultPage {
        ResultPage {
            matches: Vec::new(),
            current_page,
            per_page,
            estimated_total,
            corrected_query: None,
            facets: HashMap::new(),
        }
    }

    #[test]
    fn test_page_navigation() {
        let p = page(1, 10, 25);
        assert_eq!(p.total_pages(), 3);
        assert_eq!(p.previous_page(), None);
        assert_eq!(p.next_page(), Some(2));
        assert_eq!(p.offset(), 0);

        let p = page(3, 10, 25);
        assert_eq!(p.previous_page(), Some(2));
        assert_eq!(p.next_page(), None);
        assert_eq!(p.offset(), 20);
    }

    #[test]
    fn test_partial_last_page_counts() {
        assert_eq!(page(1, 4, 10).total_pages(), 3);
        assert_eq!(page(1, 10, 20).total_pages(), 2);
        assert_eq!(page(1, 10, 21).total_pages(), 3);
        assert_eq!(page(1, 0, 5).total_pages(), 5);
    }

    #[test]
    fn test_empty_result() {
        let p = page(1, 10, 0);
        assert_eq!(p.total_pages(), 0);
        assert_eq!(p.next_page(), None);
        assert!(p.is_empty());
    }
}
