//! Derivation of `order_category` from the order amount.

use crate::error::SchemaResult;
use crate::models::{OrderCategory, OrdersTable};

/// Category of the order at `order_idx`.
///
/// Fails with a schema error when the amount cell is not a number, rather
/// than defaulting to [`OrderCategory::Low`].
pub fn categorize(orders: &OrdersTable, order_idx: usize) -> SchemaResult<OrderCategory> {
    orders.amount(order_idx).map(OrderCategory::from_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::models::Table;

    fn orders(amounts: &[&str]) -> OrdersTable {
        let table = Table::new(
            vec!["user_id".into(), "amount".into()],
            amounts.iter().map(|a| vec!["1".to_string(), a.to_string()]).collect(),
        );
        OrdersTable::new(table, "amount").unwrap()
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let o = orders(&["100", "100.0", "99.999", "1e3"]);
        assert_eq!(categorize(&o, 0).unwrap(), OrderCategory::High);
        assert_eq!(categorize(&o, 1).unwrap(), OrderCategory::High);
        assert_eq!(categorize(&o, 2).unwrap(), OrderCategory::Low);
        assert_eq!(categorize(&o, 3).unwrap(), OrderCategory::High);
    }

    #[test]
    fn test_missing_amount_fails_loudly() {
        let o = orders(&[""]);
        let err = categorize(&o, 0).unwrap_err();
        assert!(matches!(err, SchemaError::NonNumericAmount { .. }));
    }
}
