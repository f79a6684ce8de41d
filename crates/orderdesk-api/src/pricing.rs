//! Exact decimal arithmetic for order totals

use rust_decimal::Decimal;

/// Largest price the `DECIMAL(10, 2)` column holds
pub fn max_price() -> Decimal {
    Decimal::new(99_999_999_99, 2)
}

/// Round a money value to two decimal places
pub fn money(value: Decimal) -> Decimal {
    let mut value = value.round_dp(2);
    value.rescale(2);
    value
}

/// `amount × price`, or `None` when the product overflows
pub fn line_total(amount: i32, price: Decimal) -> Option<Decimal> {
    Decimal::from(amount).checked_mul(price).map(money)
}

/// Sum of `amount × price` over `(amount, price)` pairs, or `None` on overflow
pub fn order_total<I>(lines: I) -> Option<Decimal>
where
    I: IntoIterator<Item = (i32, Decimal)>,
{
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |total, (amount, price)| {
            Decimal::from(amount)
                .checked_mul(price)
                .and_then(|line| total.checked_add(line))
        })
        .map(money)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_total_exact() {
        let total = order_total([(3, Decimal::new(10000, 2)), (13, Decimal::new(5000, 2))]).unwrap();
        assert_eq!(total, Decimal::new(95000, 2));
        assert_eq!(total.to_string(), "950.00");
    }

    #[test]
    fn test_empty_order_total() {
        let total = order_total(Vec::<(i32, Decimal)>::new()).unwrap();
        assert_eq!(total.to_string(), "0.00");
    }

    #[test]
    fn test_line_total_keeps_two_places() {
        assert_eq!(line_total(3, Decimal::new(1999, 2)).unwrap().to_string(), "59.97");
        assert_eq!(line_total(2, Decimal::new(5, 0)).unwrap().to_string(), "10.00");
    }

    #[test]
    fn test_no_float_drift() {
        // 0.1 + 0.2 style sums stay exact
        let total = order_total([(1, Decimal::new(10, 2)), (1, Decimal::new(20, 2))]).unwrap();
        assert_eq!(total.to_string(), "0.30");
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(line_total(1000, Decimal::MAX), None);
        assert_eq!(order_total([(1, Decimal::MAX), (1, Decimal::MAX)]), None);
    }

    #[test]
    fn test_largest_order_fits() {
        let total = order_total([(i32::MAX, max_price()), (i32::MAX, max_price())]);
        assert!(total.is_some());
    }
}
