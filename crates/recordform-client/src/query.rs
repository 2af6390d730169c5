use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Parameters of a list request.
///
/// Defaults match an unfiltered dropdown fetch: first page of ten,
/// ascending, no search, no sort column.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filters: Vec<Value>,
    pub search_term: String,
    pub page_number: u32,
    pub page_size: u32,
    pub sort_field: String,
    pub sort_order: Option<SortOrder>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            search_term: String::new(),
            page_number: 1,
            page_size: 10,
            sort_field: String::new(),
            sort_order: Some(SortOrder::Asc),
        }
    }
}

impl ListQuery {
    #[must_use]
    pub fn filters(mut self, filters: Vec<Value>) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// Page number and size. A page number of 0 disables paging.
    #[must_use]
    pub fn page(mut self, number: u32, size: u32) -> Self {
        self.page_number = number;
        self.page_size = size;
        self
    }

    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, order: Option<SortOrder>) -> Self {
        self.sort_field = field.into();
        self.sort_order = order;
        self
    }

    /// Query-string pairs. Parameters are only sent when meaningful:
    /// `pageSize` rides on `pageNumber`, `sortOrder` on `sortField`.
    pub fn to_params(&self) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
        let mut params = Vec::new();

        if !self.filters.is_empty() {
            params.push(("filters", serde_json::to_string(&self.filters)?));
        }
        if !self.search_term.is_empty() {
            params.push(("searchTerm", self.search_term.clone()));
        }
        if self.page_number > 0 {
            params.push(("pageNumber", self.page_number.to_string()));
            if self.page_size > 0 {
                params.push(("pageSize", self.page_size.to_string()));
            }
        }
        if !self.sort_field.is_empty() {
            params.push(("sortField", self.sort_field.clone()));
            if let Some(order) = self.sort_order {
                params.push(("sortOrder", order.as_str().to_string()));
            }
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_query_pages_only() {
        let params = ListQuery::default().to_params().unwrap();
        assert_eq!(
            params,
            vec![("pageNumber", "1".to_string()), ("pageSize", "10".to_string())]
        );
    }

    #[test]
    fn sort_order_needs_sort_field() {
        let params = ListQuery::default()
            .page(0, 50)
            .sort("", Some(SortOrder::Desc))
            .to_params()
            .unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn full_query() {
        let params = ListQuery::default()
            .filters(vec![json!({"field": "Name", "operator": "contains", "value": "a"})])
            .search("ada")
            .page(2, 25)
            .sort("LastName", Some(SortOrder::Desc))
            .to_params()
            .unwrap();

        let keys: Vec<_> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            vec!["filters", "searchTerm", "pageNumber", "pageSize", "sortField", "sortOrder"]
        );
        assert_eq!(
            params[0].1,
            r#"[{"field":"Name","operator":"contains","value":"a"}]"#
        );
        assert_eq!(params[5].1, "desc");
    }

    #[test]
    fn sort_order_parses() {
        assert_eq!("DESC".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("up".parse::<SortOrder>().is_err());
    }
}
