use sea_orm::{
    ColumnTrait, ColumnType, Condition, EntityTrait, Order, QueryFilter, QueryOrder, Select, Value,
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
};

use super::params::{FieldSet, ListQuery, RangeFilter, Sort};

/// Composes search, exact, range and sort descriptors onto `select`.
///
/// Predicates are AND-ed together. The primary key is always appended as
/// an ascending tiebreak so repeated page requests see a stable order.
pub fn apply<E>(mut select: Select<E>, query: &ListQuery<E::Column>, fields: &FieldSet<E::Column>) -> Select<E>
where
    E: EntityTrait,
{
    if let Some(term) = &query.search {
        select = select.filter(search_condition(term, fields.search));
    }

    for filter in &query.exact {
        select = select.filter(filter.column.eq(typed_value(filter.column, &filter.value)));
    }

    for range in &query.ranges {
        if let Some(expr) = range_expr(range) {
            select = select.filter(expr);
        }
    }

    match query.sort {
        Some(Sort { column, ascending }) => {
            let order = if ascending { Order::Asc } else { Order::Desc };
            select.order_by(column, order).order_by_asc(fields.id)
        }
        None => select.order_by_asc(fields.id),
    }
}

/// Case-insensitive substring match that must hold in every search column.
fn search_condition<C: ColumnTrait>(term: &str, columns: &[C]) -> Condition {
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
    columns.iter().fold(Condition::all(), |cond, &column| {
        let lowered = Func::lower(Expr::col((column.entity_name(), column)));
        cond.add(Expr::expr(lowered).like(LikeExpr::new(pattern.clone()).escape('\\')))
    })
}

fn escape_like(input: &str) -> String {
    input.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn range_expr<C: ColumnTrait>(range: &RangeFilter<C>) -> Option<SimpleExpr> {
    let min = range.min.as_deref().map(|v| typed_value(range.column, v));
    let max = range.max.as_deref().map(|v| typed_value(range.column, v));
    match (min, max) {
        (Some(lo), Some(hi)) => Some(range.column.between(lo, hi)),
        (Some(lo), None) => Some(range.column.gte(lo)),
        (None, Some(hi)) => Some(range.column.lte(hi)),
        (None, None) => None,
    }
}

/// Binds numeric columns with numeric values when the raw text parses;
/// anything else is passed through as text for the backend to coerce.
fn typed_value<C: ColumnTrait>(column: C, raw: &str) -> Value {
    let trimmed = raw.trim();
    let parsed = match column.def().get_column_type() {
        ColumnType::TinyInteger
        | ColumnType::SmallInteger
        | ColumnType::Integer
        | ColumnType::BigInteger => trimmed
            .parse::<i64>()
            .map(Value::from)
            .ok()
            .or_else(|| trimmed.parse::<f64>().ok().map(Value::from)),
        ColumnType::Float | ColumnType::Double | ColumnType::Decimal(_) => {
            trimmed.parse::<f64>().ok().map(Value::from)
        }
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::from(raw.to_string()))
}
