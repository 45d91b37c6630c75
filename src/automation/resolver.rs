use rust_decimal::Decimal;

use super::models::{ActionType, RuleAction};

/// Compute the transfer amount for `action` against a basis amount.
///
/// A result of zero or less means "nothing to do"; callers skip instead of
/// executing. `categorize` always resolves to zero because it has no
/// execution path.
pub fn resolve_amount(action: &RuleAction, basis: Decimal) -> Decimal {
    match action.action_type {
        ActionType::TransferPercentage => match action.percentage {
            Some(percentage) => (basis * percentage / Decimal::from(100)).round_dp(2),
            None => Decimal::ZERO,
        },
        ActionType::TransferFixed => action.fixed_amount.unwrap_or(Decimal::ZERO),
        ActionType::Categorize => Decimal::ZERO,
    }
}

/// Basis for a historical batch: the percentage is applied once to the sum
/// of all matching amounts, not per transaction.
pub fn batch_basis(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn percentage_action(pct: i64) -> RuleAction {
        RuleAction {
            action_type: ActionType::TransferPercentage,
            percentage: Some(Decimal::from(pct)),
            fixed_amount: None,
            target_account_id: Some(Uuid::new_v4()),
            target_goal_id: None,
        }
    }

    fn fixed_action(amount: i64) -> RuleAction {
        RuleAction {
            action_type: ActionType::TransferFixed,
            percentage: None,
            fixed_amount: Some(Decimal::from(amount)),
            target_account_id: Some(Uuid::new_v4()),
            target_goal_id: None,
        }
    }

    #[test]
    fn percentage_of_basis() {
        assert_eq!(
            resolve_amount(&percentage_action(10), Decimal::from(1000)),
            Decimal::from(100)
        );
    }

    #[test]
    fn percentage_rounds_to_cents() {
        // 33.333... rounds bankers-style at 2dp
        let amount = resolve_amount(&percentage_action(1), Decimal::new(333333, 2));
        assert_eq!(amount, Decimal::new(3333, 2));
    }

    #[test]
    fn fixed_ignores_basis() {
        assert_eq!(
            resolve_amount(&fixed_action(75), Decimal::from(1_000_000)),
            Decimal::from(75)
        );
        assert_eq!(
            resolve_amount(&fixed_action(75), Decimal::ZERO),
            Decimal::from(75)
        );
    }

    #[test]
    fn categorize_resolves_to_zero() {
        let action = RuleAction {
            action_type: ActionType::Categorize,
            percentage: None,
            fixed_amount: None,
            target_account_id: None,
            target_goal_id: None,
        };
        assert_eq!(resolve_amount(&action, Decimal::from(1000)), Decimal::ZERO);
    }

    #[test]
    fn batch_basis_sums_amounts() {
        let basis = batch_basis([Decimal::from(100), Decimal::from(250), Decimal::from(50)]);
        assert_eq!(basis, Decimal::from(400));
        // 10% once over the sum, not per transaction
        assert_eq!(
            resolve_amount(&percentage_action(10), basis),
            Decimal::from(40)
        );
    }
}
