use axum::http::{HeaderMap, Uri, header};

use guestbook_types::api::PageLinks;

use crate::error::ApiError;

/// Which page of a listing was requested: a 1-based number or `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSelector {
    Number(u32),
    Last,
}

impl PageSelector {
    /// Parse the raw `page` query value. Absent means the first page.
    pub fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw {
            None => Ok(Self::Number(1)),
            Some("last") => Ok(Self::Last),
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n >= 1 => Ok(Self::Number(n)),
                _ => Err(ApiError::InvalidPage),
            },
        }
    }

    /// The concrete page number for a listing of `count` items, or `None`
    /// when it lies past the last page.
    pub fn resolve(self, count: u64, page_size: u32) -> Option<u32> {
        let total = total_pages(count, page_size);
        match self {
            Self::Last => Some(total),
            Self::Number(n) if n <= total => Some(n),
            Self::Number(_) => None,
        }
    }
}

/// An empty listing still has one (empty) page.
pub fn total_pages(count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = count.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Absolute URL of the current listing when the request names its host,
/// otherwise the bare path.
pub fn base_url(headers: &HeaderMap, uri: &Uri) -> String {
    match headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
        Some(host) => format!("http://{}{}", host, uri.path()),
        None => uri.path().to_string(),
    }
}

/// Link to `page`; page 1 drops the query parameter.
pub fn page_url(base: &str, page: u32) -> String {
    if page <= 1 {
        base.to_string()
    } else {
        format!("{}?page={}", base, page)
    }
}

pub fn page_links(base: &str, page: u32, total_pages: u32) -> PageLinks {
    PageLinks {
        next: (page < total_pages).then(|| page_url(base, page + 1)),
        previous: (page > 1).then(|| page_url(base, page - 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_selector() {
        assert_eq!(PageSelector::parse(None).unwrap(), PageSelector::Number(1));
        assert_eq!(PageSelector::parse(Some("4")).unwrap(), PageSelector::Number(4));
        assert_eq!(PageSelector::parse(Some("last")).unwrap(), PageSelector::Last);
        for bad in ["0", "-1", "two", "", "1.5"] {
            assert!(matches!(PageSelector::parse(Some(bad)), Err(ApiError::InvalidPage)));
        }
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 3), 1);
        assert_eq!(total_pages(3, 3), 1);
        assert_eq!(total_pages(4, 3), 2);
        assert_eq!(total_pages(9, 3), 3);
    }

    #[test]
    fn test_resolve_against_count() {
        assert_eq!(PageSelector::Number(1).resolve(0, 3), Some(1));
        assert_eq!(PageSelector::Number(2).resolve(4, 3), Some(2));
        assert_eq!(PageSelector::Number(3).resolve(4, 3), None);
        assert_eq!(PageSelector::Last.resolve(7, 3), Some(3));
    }

    #[test]
    fn test_links_null_at_boundaries() {
        let only = page_links("/entries/", 1, 1);
        assert!(only.next.is_none());
        assert!(only.previous.is_none());

        let first = page_links("/entries/", 1, 3);
        assert_eq!(first.next.as_deref(), Some("/entries/?page=2"));
        assert!(first.previous.is_none());

        let middle = page_links("/entries/", 2, 3);
        assert_eq!(middle.previous.as_deref(), Some("/entries/"));
        assert_eq!(middle.next.as_deref(), Some("/entries/?page=3"));

        let last = page_links("/entries/", 3, 3);
        assert_eq!(last.previous.as_deref(), Some("/entries/?page=2"));
        assert!(last.next.is_none());
    }

    #[test]
    fn test_base_url_uses_host_header() {
        let uri: Uri = "/entries/?page=2".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(base_url(&headers, &uri), "/entries/");

        headers.insert(header::HOST, "guestbook.test".parse().unwrap());
        assert_eq!(base_url(&headers, &uri), "http://guestbook.test/entries/");
    }
}
