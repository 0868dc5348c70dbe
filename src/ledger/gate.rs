use bigdecimal::{BigDecimal, Zero};

/// Outcome of comparing a balance with the amount an order needs.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceCheck {
    pub sufficient: bool,
    pub current: BigDecimal,
    pub required: BigDecimal,
    /// `max(0, required - current)`
    pub shortfall: BigDecimal,
}

impl BalanceCheck {
    pub fn evaluate(current: BigDecimal, required: BigDecimal) -> Self {
        let missing = &required - &current;
        let shortfall = if missing > BigDecimal::zero() {
            missing
        } else {
            BigDecimal::zero()
        };
        Self {
            sufficient: current >= required,
            current,
            required,
            shortfall,
        }
    }

    pub fn warning(&self) -> Option<String> {
        if self.sufficient {
            None
        } else {
            Some(format!(
                "insufficient balance: available {}, required {}, shortfall {}",
                self.current, self.required, self.shortfall
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::model::tests::decimal;
    use proptest::prelude::*;

    #[test]
    fn test_sufficient_balance() {
        let check = BalanceCheck::evaluate(decimal("1000"), decimal("400"));
        assert!(check.sufficient);
        assert_eq!(check.shortfall, decimal("0"));
        assert!(check.warning().is_none());
    }

    #[test]
    fn test_exact_balance_is_sufficient() {
        let check = BalanceCheck::evaluate(decimal("400"), decimal("400"));
        assert!(check.sufficient);
        assert_eq!(check.shortfall, decimal("0"));
    }

    #[test]
    fn test_negative_balance_shortfall() {
        let check = BalanceCheck::evaluate(decimal("-150"), decimal("100"));
        assert!(!check.sufficient);
        assert_eq!(check.shortfall, decimal("250"));
        assert!(check.warning().unwrap().contains("shortfall 250"));
    }

    proptest! {
        #[test]
        fn prop_shortfall_is_clamped_difference(current in -1_000_000i64..1_000_000, required in 0i64..1_000_000) {
            let check = BalanceCheck::evaluate(BigDecimal::from(current), BigDecimal::from(required));
            let expected = (required - current).max(0);
            prop_assert_eq!(check.shortfall, BigDecimal::from(expected));
            prop_assert_eq!(check.sufficient, current >= required);
        }
    }
}
