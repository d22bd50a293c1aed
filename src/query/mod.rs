//! Generic list-query layer shared by every collection endpoint.
//!
//! Raw query-string parameters are parsed into typed descriptors
//! ([`ListQuery`]), composed onto a sea-orm [`Select`](sea_orm::Select) by
//! [`apply`], and executed one page at a time by [`fetch_page`].

mod filter;
mod paginate;
mod params;

pub use filter::apply;
pub use paginate::{Page, fetch_page};
pub use params::{
    DEFAULT_PAGE, DEFAULT_PER_PAGE, ExactFilter, FieldSet, ListQuery, Pagination, QueryParams,
    RangeFilter, SEARCH_PARAM, Sort,
};
