//! Transformation module.
//!
//! - Join: inner join of users and orders on `user_id`
//! - Category: `order_category` derivation from the amount column
//! - Pipeline: read -> transform -> write driver

pub mod category;
pub mod join;
pub mod pipeline;

use tracing::{debug, info, warn};

use crate::error::SchemaResult;
use crate::models::{
    JoinedRow, JoinedTable, OrderCategory, OrdersTable, Table, UsersTable, CATEGORY_COLUMN,
};

pub use category::categorize;
pub use join::{match_pairs, ColumnSource, JoinLayout, ORDERS_SUFFIX, USERS_SUFFIX};
pub use pipeline::*;

/// Join users with orders and derive `order_category`.
///
/// Pure: no I/O and no shared state. Fails with a schema error when
/// `user_id` is absent from either input, `amount_column` is absent from
/// orders, or a joined order's amount is not numeric.
pub fn transform(users: Table, orders: Table, amount_column: &str) -> SchemaResult<JoinedTable> {
    let users = UsersTable::new(users)?;
    let orders = OrdersTable::new(orders, amount_column)?;
    let layout = JoinLayout::new(&users, &orders)?;
    debug!(
        columns = ?layout.headers,
        amount_column = orders.amount_column(),
        "join layout"
    );

    let pairs = match_pairs(&users, &orders);

    let mut rows = Vec::with_capacity(pairs.len());
    for &(user_idx, order_idx) in &pairs {
        let category = categorize(&orders, order_idx)?;
        let cells = layout.project(
            &users.table().rows[user_idx],
            &orders.table().rows[order_idx],
        );
        rows.push(JoinedRow { cells, category });
    }

    let mut headers = layout.headers;
    headers.push(CATEGORY_COLUMN.to_string());
    let joined = JoinedTable { headers, rows };

    let matched_orders = {
        let mut seen: Vec<usize> = pairs.iter().map(|&(_, o)| o).collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    };
    let dropped_orders = orders.table().len() - matched_orders;
    if dropped_orders > 0 {
        warn!(dropped_orders, "orders without a matching user were dropped");
    }

    info!(
        amount_column = orders.amount_column(),
        rows = joined.len(),
        high = joined.count(OrderCategory::High),
        low = joined.count(OrderCategory::Low),
        "joined users and orders"
    );
    Ok(joined)
}
