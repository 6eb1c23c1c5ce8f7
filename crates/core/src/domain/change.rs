use crate::domain::fare::FareSnapshot;

/// Returns true when `current` is not structurally equal to `previous`.
///
/// Comparison is order-sensitive and field-exact; callers rely on `FareSnapshot::new` having
/// put both sides in canonical order.
pub fn detect_change(current: &FareSnapshot, previous: &FareSnapshot) -> bool {
    current != previous
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fare::tests::offer;
    use rust_decimal::Decimal;

    #[test]
    fn reflexive_including_empty() {
        let empty = FareSnapshot::empty();
        assert!(!detect_change(&empty, &empty));

        let s = FareSnapshot::new(vec![offer("2024-01-10", Decimal::from(38))]);
        assert!(!detect_change(&s, &s.clone()));
    }

    #[test]
    fn order_sensitive_without_canonical_sort() {
        let a = offer("2024-01-10", Decimal::from(38));
        let b = offer("2024-01-11", Decimal::from(39));
        let ab = FareSnapshot::from_ordered(vec![a.clone(), b.clone()]);
        let ba = FareSnapshot::from_ordered(vec![b.clone(), a.clone()]);
        assert!(detect_change(&ab, &ba));

        let sorted_ab = FareSnapshot::new(vec![a.clone(), b.clone()]);
        let sorted_ba = FareSnapshot::new(vec![b, a]);
        assert!(!detect_change(&sorted_ab, &sorted_ba));
    }

    #[test]
    fn converted_price_difference_is_a_change() {
        let base = offer("2024-01-10", Decimal::from(38));
        let with_rate = base.clone().with_converted(Some(Decimal::new(114000, 2)));
        let current = FareSnapshot::new(vec![with_rate]);
        let previous = FareSnapshot::new(vec![base]);
        assert!(detect_change(&current, &previous));
    }

    #[test]
    fn empty_vs_non_empty_is_a_change() {
        let previous = FareSnapshot::new(vec![offer("2024-01-10", Decimal::from(38))]);
        assert!(detect_change(&FareSnapshot::empty(), &previous));
    }
}
