use std::collections::HashMap;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;
pub const SEARCH_PARAM: &str = "search";

/// Decoded query string. Duplicate keys collapse to the last value.
pub type QueryParams = HashMap<String, String>;

/// Allow-lists an endpoint exposes to the list-query layer.
///
/// Field names are the public parameter names; columns are what they map to.
#[derive(Clone, Copy, Debug)]
pub struct FieldSet<C: 'static> {
    /// Primary key, always used as the final tiebreak sort.
    pub id: C,
    pub sortable: &'static [(&'static str, C)],
    pub exact: &'static [(&'static str, C)],
    pub range: &'static [(&'static str, C)],
    pub search: &'static [C],
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, per_page: DEFAULT_PER_PAGE }
    }
}

impl Pagination {
    /// Reads `page` and `per_page`; `per_page` is clamped to `max_per_page`.
    pub fn from_params(params: &QueryParams, max_per_page: u64) -> AppResult<Self> {
        let page = positive(params, "page", DEFAULT_PAGE)?;
        let per_page = positive(params, "per_page", DEFAULT_PER_PAGE)?.min(max_per_page.max(1));
        Ok(Self { page, per_page })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

fn positive(params: &QueryParams, key: &str, default: u64) -> AppResult<u64> {
    let Some(raw) = params.get(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(n as u64),
        _ => Err(AppError::InvalidParameter(key.to_string())),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Sort<C> {
    pub column: C,
    pub ascending: bool,
}

#[derive(Clone, Debug)]
pub struct ExactFilter<C> {
    pub column: C,
    pub value: String,
}

/// Inclusive bounds read from `{field}_min` / `{field}_max`.
#[derive(Clone, Debug)]
pub struct RangeFilter<C> {
    pub column: C,
    pub min: Option<String>,
    pub max: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ListQuery<C> {
    pub pagination: Pagination,
    pub sort: Option<Sort<C>>,
    pub exact: Vec<ExactFilter<C>>,
    pub ranges: Vec<RangeFilter<C>>,
    pub search: Option<String>,
}

impl<C: Copy> ListQuery<C> {
    pub fn parse(params: &QueryParams, fields: &FieldSet<C>, max_per_page: u64) -> AppResult<Self> {
        Ok(Self {
            pagination: Pagination::from_params(params, max_per_page)?,
            sort: parse_sort(params, fields.sortable),
            exact: parse_exact_filters(params, fields.exact),
            ranges: parse_range_filters(params, fields.range),
            search: parse_search(params, fields.search),
        })
    }
}

/// Unknown `sort_by` names are ignored rather than rejected.
pub fn parse_sort<C: Copy>(params: &QueryParams, allowed: &[(&str, C)]) -> Option<Sort<C>> {
    let sort_by = params.get("sort_by")?;
    let column = allowed.iter().find(|(name, _)| *name == sort_by.as_str()).map(|&(_, col)| col)?;
    let ascending = params.get("ascending").is_none_or(|v| v.eq_ignore_ascii_case("true"));
    Some(Sort { column, ascending })
}

pub fn parse_exact_filters<C: Copy>(params: &QueryParams, allowed: &[(&str, C)]) -> Vec<ExactFilter<C>> {
    allowed
        .iter()
        .filter_map(|&(name, column)| {
            params.get(name).map(|value| ExactFilter { column, value: value.clone() })
        })
        .collect()
}

pub fn parse_range_filters<C: Copy>(params: &QueryParams, allowed: &[(&str, C)]) -> Vec<RangeFilter<C>> {
    allowed
        .iter()
        .filter_map(|&(name, column)| {
            let min = params.get(&format!("{name}_min")).cloned();
            let max = params.get(&format!("{name}_max")).cloned();
            (min.is_some() || max.is_some()).then_some(RangeFilter { column, min, max })
        })
        .collect()
}

fn parse_search<C>(params: &QueryParams, fields: &[C]) -> Option<String> {
    if fields.is_empty() {
        return None;
    }
    params.get(SEARCH_PARAM).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    enum Col {
        Id,
        Title,
        Year,
        Rating,
    }

    const FIELDS: FieldSet<Col> = FieldSet {
        id: Col::Id,
        sortable: &[("title", Col::Title), ("rating", Col::Rating)],
        exact: &[("release_year", Col::Year)],
        range: &[("release_year", Col::Year), ("rating", Col::Rating)],
        search: &[Col::Title],
    };

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn pagination_defaults() {
        let p = Pagination::from_params(&params(&[]), 100).unwrap();
        assert_eq!(p, Pagination { page: 1, per_page: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn pagination_rejects_non_integers() {
        for (key, value) in [("page", "two"), ("per_page", "1.5"), ("page", "0"), ("per_page", "-3")] {
            let err = Pagination::from_params(&params(&[(key, value)]), 100).unwrap_err();
            assert!(matches!(err, AppError::InvalidParameter(ref k) if k == key), "{key}={value}");
        }
    }

    #[test]
    fn per_page_is_clamped() {
        let p = Pagination::from_params(&params(&[("page", "3"), ("per_page", "5000")]), 100).unwrap();
        assert_eq!(p.per_page, 100);
        assert_eq!(p.offset(), 200);
    }

    #[test]
    fn sort_outside_allow_list_is_ignored() {
        assert!(parse_sort(&params(&[("sort_by", "slug")]), FIELDS.sortable).is_none());
        assert!(parse_sort(&params(&[]), FIELDS.sortable).is_none());
    }

    #[test]
    fn ascending_only_accepts_literal_true() {
        let sort = parse_sort(&params(&[("sort_by", "rating")]), FIELDS.sortable).unwrap();
        assert_eq!(sort.column, Col::Rating);
        assert!(sort.ascending);

        for (value, expected) in [("TRUE", true), ("True", true), ("false", false), ("1", false), ("yes", false)] {
            let sort = parse_sort(&params(&[("sort_by", "title"), ("ascending", value)]), FIELDS.sortable).unwrap();
            assert_eq!(sort.ascending, expected, "ascending={value}");
        }
    }

    #[test]
    fn exact_filters_only_for_allowed_fields() {
        let q = params(&[("release_year", "1999"), ("mpaa_rating", "R")]);
        let exact = parse_exact_filters(&q, FIELDS.exact);
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].column, Col::Year);
        assert_eq!(exact[0].value, "1999");
    }

    #[test]
    fn range_filters_need_at_least_one_bound() {
        let q = params(&[("rating_min", "7.5"), ("release_year", "2000")]);
        let ranges = parse_range_filters(&q, FIELDS.range);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].column, Col::Rating);
        assert_eq!(ranges[0].min.as_deref(), Some("7.5"));
        assert_eq!(ranges[0].max, None);
    }

    #[test]
    fn full_parse() {
        let q = params(&[
            ("page", "2"),
            ("per_page", "5"),
            ("sort_by", "title"),
            ("ascending", "false"),
            ("search", "matrix"),
            ("release_year_max", "2003"),
        ]);
        let query = ListQuery::parse(&q, &FIELDS, 100).unwrap();
        assert_eq!(query.pagination, Pagination { page: 2, per_page: 5 });
        assert!(matches!(query.sort, Some(Sort { column: Col::Title, ascending: false })));
        assert!(query.exact.is_empty());
        assert_eq!(query.ranges.len(), 1);
        assert_eq!(query.search.as_deref(), Some("matrix"));
    }

    #[test]
    fn search_ignored_without_search_fields() {
        let fields = FieldSet { search: &[], ..FIELDS };
        let query = ListQuery::parse(&params(&[("search", "x")]), &fields, 100).unwrap();
        assert!(query.search.is_none());
    }
}
