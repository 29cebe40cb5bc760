//! Inner join of users and orders on `user_id`.
//!
//! # Column layout
//!
//! ```text
//! users:  user_id, name, city          orders: order_id, user_id, city, amount
//!                       │                                  │
//!                       └──────────────┬───────────────────┘
//!                                      ▼
//! joined: user_id, name, city_x, order_id, city_y, amount, order_category
//! ```
//!
//! The key appears once. A non-key column present on both sides is
//! suffixed `_x` (users) and `_y` (orders).
//!
//! # Row order
//!
//! Users are walked in input order; each user is paired with its matching
//! orders in input order.

use std::collections::{HashMap, HashSet};

use crate::error::{SchemaError, SchemaResult};
use crate::models::{JoinKey, OrdersTable, UsersTable, CATEGORY_COLUMN, KEY_COLUMN};

pub const USERS_SUFFIX: &str = "_x";
pub const ORDERS_SUFFIX: &str = "_y";

/// Where an output column takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    User(usize),
    Order(usize),
}

/// Output columns of the join, category excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinLayout {
    pub headers: Vec<String>,
    pub sources: Vec<ColumnSource>,
}

impl JoinLayout {
    pub fn new(users: &UsersTable, orders: &OrdersTable) -> SchemaResult<Self> {
        let user_headers = &users.table().headers;
        let order_headers = &orders.table().headers;

        let shared: HashSet<&str> = user_headers
            .iter()
            .filter(|h| h.as_str() != KEY_COLUMN)
            .filter(|h| order_headers.contains(*h))
            .map(String::as_str)
            .collect();

        let mut headers = vec![KEY_COLUMN.to_string()];
        let mut sources = vec![ColumnSource::User(users.key_index())];

        for (idx, name) in user_headers.iter().enumerate() {
            if idx == users.key_index() {
                continue;
            }
            headers.push(disambiguate(name, &shared, USERS_SUFFIX));
            sources.push(ColumnSource::User(idx));
        }
        for (idx, name) in order_headers.iter().enumerate() {
            if idx == orders.key_index() {
                continue;
            }
            headers.push(disambiguate(name, &shared, ORDERS_SUFFIX));
            sources.push(ColumnSource::Order(idx));
        }

        let mut seen = HashSet::new();
        for name in headers.iter().map(String::as_str).chain([CATEGORY_COLUMN]) {
            if !seen.insert(name) {
                return Err(SchemaError::ColumnConflict {
                    column: name.to_string(),
                });
            }
        }

        Ok(Self { headers, sources })
    }

    /// Output cells for one (user, order) pair.
    pub fn project(&self, user_row: &[String], order_row: &[String]) -> Vec<String> {
        self.sources
            .iter()
            .map(|source| {
                let cell = match *source {
                    ColumnSource::User(i) => user_row.get(i),
                    ColumnSource::Order(i) => order_row.get(i),
                };
                cell.cloned().unwrap_or_default()
            })
            .collect()
    }
}

fn disambiguate(name: &str, shared: &HashSet<&str>, suffix: &str) -> String {
    if shared.contains(name) {
        format!("{}{}", name, suffix)
    } else {
        name.to_string()
    }
}

/// Matching (user row, order row) index pairs in output order.
pub fn match_pairs(users: &UsersTable, orders: &OrdersTable) -> Vec<(usize, usize)> {
    let mut by_key: HashMap<JoinKey, Vec<usize>> = HashMap::new();
    for (idx, row) in orders.table().rows.iter().enumerate() {
        by_key.entry(orders.key(row)).or_default().push(idx);
    }

    let mut pairs = Vec::new();
    for (user_idx, row) in users.table().rows.iter().enumerate() {
        if let Some(order_idxs) = by_key.get(&users.key(row)) {
            pairs.extend(order_idxs.iter().map(|&o| (user_idx, o)));
        }
    }
    pairs
}
