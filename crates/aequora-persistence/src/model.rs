//! Domain model types for persistence operations

use serde::{Deserialize, Serialize};

/// Paged query result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_count: u64,
    pub page_number: u64,
    pub pages_available: u64,
    pub page_items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total_count: u64, page_number: u64, page_size: u64, page_items: Vec<T>) -> Self {
        Self {
            total_count,
            page_number,
            pages_available: if page_size > 0 {
                total_count.div_ceil(page_size)
            } else {
                0
            },
            page_items,
        }
    }

    pub fn empty() -> Self {
        Self {
            total_count: 0,
            page_number: 0,
            pages_available: 0,
            page_items: Vec::new(),
        }
    }

    /// Convert the items while keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total_count: self.total_count,
            page_number: self.page_number,
            pages_available: self.pages_available,
            page_items: self.page_items.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_new_rounds_up() {
        let page = Page::new(41, 1, 20, vec![1, 2, 3]);
        assert_eq!(page.pages_available, 3);
        assert_eq!(page.page_items.len(), 3);
    }

    #[test]
    fn test_page_zero_size() {
        let page: Page<i32> = Page::new(10, 1, 0, vec![]);
        assert_eq!(page.pages_available, 0);
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = Page::new(1, 1, 10, vec!["a"]).map(|s| s.to_uppercase());
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["pagesAvailable"], 1);
        assert_eq!(json["pageItems"][0], "A");
    }
}
