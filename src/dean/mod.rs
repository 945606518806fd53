//! Typed wrappers over the dean administration endpoints.
//!
//! One module per screen. Each function issues exactly one request and
//! returns the parsed body; the screen layer owns loading/empty/error
//! presentation and never sees raw HTTP.

pub mod calendar;
pub mod catalog;
pub mod grades;
pub mod people;
pub mod reports;
pub mod stats;
pub mod tuition;

/// Optional `skip`/`limit` window for list endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl Page {
    /// Query parameters for this window; empty when unpaginated.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(skip) = self.skip {
            params.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }

    pub fn is_unpaginated(&self) -> bool {
        self.skip.is_none() && self.limit.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query() {
        assert!(Page::default().query().is_empty());
        assert!(Page::default().is_unpaginated());

        let page = Page {
            skip: Some(20),
            limit: Some(10),
        };
        assert_eq!(
            page.query(),
            vec![("skip", "20".to_string()), ("limit", "10".to_string())]
        );
    }
}
