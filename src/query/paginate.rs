use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, Select};

use super::params::Pagination;
use crate::error::AppResult;

/// One page of rows plus the size of the whole filtered set.
#[derive(Debug)]
pub struct Page<M> {
    pub items: Vec<M>,
    pub total: u64,
}

/// Counts the filtered set, then fetches the requested window of it.
///
/// A page past the end yields no items while still reporting the total.
pub async fn fetch_page<E>(
    db: &DatabaseConnection,
    select: Select<E>,
    pagination: Pagination,
) -> AppResult<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: Send + Sync,
{
    let paginator = select.paginate(db, pagination.per_page);
    let total = paginator.num_items().await?;
    if pagination.offset() >= total {
        return Ok(Page { items: Vec::new(), total });
    }
    let items = paginator.fetch_page(pagination.page - 1).await?;
    Ok(Page { items, total })
}
