//! `page` / `limit` pagination with `count`, `next`, `previous` links.

use axum::http::Uri;
use url::form_urlencoded;

use super::{ApiError, Page};
use crate::config::PaginationConfig;
use crate::models::PageRequest;

/// Read `page` and `limit` from the query string. A malformed or zero page
/// is NotFound; a malformed limit falls back to the default and an
/// oversized one is clamped.
pub fn page_request(uri: &Uri, config: &PaginationConfig) -> Result<PageRequest, ApiError> {
    let mut page = 1;
    let mut limit = config.default_page_size;

    for (key, value) in form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "page" => {
                page = value
                    .parse::<u64>()
                    .ok()
                    .filter(|p| *p > 0)
                    .ok_or_else(|| ApiError::NotFound("Invalid page".to_string()))?;
            }
            "limit" => {
                if let Ok(requested) = value.parse::<u64>()
                    && requested > 0
                {
                    limit = requested.min(config.max_page_size);
                }
            }
            _ => {}
        }
    }

    let request = PageRequest::new(page, limit);
    if request.offset().is_none() {
        return Err(ApiError::NotFound("Invalid page".to_string()));
    }
    Ok(request)
}

/// Wrap one page of results, rejecting pages past the last one.
pub fn paginate<T>(
    uri: &Uri,
    request: PageRequest,
    count: u64,
    results: Vec<T>,
) -> Result<Page<T>, ApiError> {
    let last_page = request.last_page(count);
    if !request.is_within(count) {
        return Err(ApiError::NotFound("Invalid page".to_string()));
    }

    let next = (request.page < last_page).then(|| page_link(uri, request.page + 1, request.limit));
    let previous = (request.page > 1).then(|| page_link(uri, request.page - 1, request.limit));

    Ok(Page {
        count,
        next,
        previous,
        results,
    })
}

/// Same path and filters, different page.
fn page_link(uri: &Uri, page: u64, limit: u64) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer
        .append_pair("page", &page.to_string())
        .append_pair("limit", &limit.to_string());

    for (key, value) in form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes()) {
        if key != "page" && key != "limit" {
            serializer.append_pair(&key, &value);
        }
    }

    format!("{}?{}", uri.path(), serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PaginationConfig {
        PaginationConfig {
            default_page_size: 6,
            max_page_size: 100,
        }
    }

    #[test]
    fn test_page_request_defaults_and_clamps() {
        let uri: Uri = "/api/recipes".parse().unwrap();
        assert_eq!(page_request(&uri, &config()).unwrap(), PageRequest::new(1, 6));

        let uri: Uri = "/api/recipes?page=3&limit=500".parse().unwrap();
        assert_eq!(page_request(&uri, &config()).unwrap(), PageRequest::new(3, 100));

        let uri: Uri = "/api/recipes?limit=abc".parse().unwrap();
        assert_eq!(page_request(&uri, &config()).unwrap(), PageRequest::new(1, 6));
    }

    #[test]
    fn test_page_request_rejects_bad_page() {
        let uri: Uri = "/api/recipes?page=0".parse().unwrap();
        assert!(page_request(&uri, &config()).is_err());

        let uri: Uri = "/api/recipes?page=last".parse().unwrap();
        assert!(page_request(&uri, &config()).is_err());

        let uri: Uri = "/api/recipes?page=18446744073709551615".parse().unwrap();
        assert!(page_request(&uri, &config()).is_err());
    }

    #[test]
    fn test_links_keep_filters() {
        let uri: Uri = "/api/recipes?tags=lunch&page=2&limit=2&tags=dinner"
            .parse()
            .unwrap();
        let page = paginate(&uri, PageRequest::new(2, 2), 5, vec![3, 4]).unwrap();

        assert_eq!(
            page.next.as_deref(),
            Some("/api/recipes?page=3&limit=2&tags=lunch&tags=dinner")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("/api/recipes?page=1&limit=2&tags=lunch&tags=dinner")
        );
    }

    #[test]
    fn test_page_past_end_is_not_found() {
        let uri: Uri = "/api/users".parse().unwrap();
        assert!(paginate::<i32>(&uri, PageRequest::new(2, 6), 6, vec![]).is_err());

        let empty = paginate::<i32>(&uri, PageRequest::new(1, 6), 0, vec![]).unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.next.is_none());
        assert!(empty.previous.is_none());
    }
}
