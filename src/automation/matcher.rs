use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use super::models::{RuleTrigger, TriggerType};
use super::HISTORY_WINDOW_DAYS;
use crate::transaction::models::{Transaction, TransactionType};

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Does `transaction` satisfy `trigger`?
///
/// Unknown trigger types and unparseable thresholds match nothing; a
/// misconfigured rule must never take the evaluation loop down.
pub fn matches(transaction: &Transaction, trigger: &RuleTrigger) -> bool {
    match trigger.trigger_type {
        TriggerType::IncomeReceived => {
            transaction.get_type() == TransactionType::Income
                && (trigger.value.is_empty()
                    || contains_ignore_case(&transaction.category, &trigger.value)
                    || contains_ignore_case(&transaction.description, &trigger.value))
        }
        TriggerType::ExpenseContains => {
            transaction.get_type() == TransactionType::Expense
                && contains_ignore_case(&transaction.description, &trigger.value)
        }
        // Inclusive on purpose: "above" has always meant >= here and saved
        // rule configs rely on it.
        TriggerType::AmountAbove => match Decimal::from_str(trigger.value.trim()) {
            Ok(threshold) => transaction.amount >= threshold,
            Err(_) => false,
        },
        TriggerType::CategoryMatch => match &trigger.category {
            Some(category) => transaction.category == *category,
            None => false,
        },
        TriggerType::Unknown => false,
    }
}

/// Transactions within the trailing scan window that satisfy `trigger`,
/// newest first. Used by the manual run-now path instead of event-triggered
/// evaluation.
pub fn matching_in_window<'a>(
    transactions: &'a [Transaction],
    trigger: &RuleTrigger,
    now: DateTime<Utc>,
) -> Vec<&'a Transaction> {
    let cutoff = now - Duration::days(HISTORY_WINDOW_DAYS);
    let mut matched: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.date >= cutoff && t.date <= now)
        .filter(|t| matches(t, trigger))
        .collect();
    matched.sort_by(|a, b| b.date.cmp(&a.date));
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn txn(tx_type: &str, amount: i64, description: &str, category: &str) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            date: Utc::now(),
            description: description.to_string(),
            amount: Decimal::from(amount),
            transaction_type: tx_type.to_string(),
            category: category.to_string(),
            account_id: Some(Uuid::new_v4()),
            to_account_id: None,
            goal_id: None,
            is_recurring: false,
            recurring_frequency: None,
            rule_id: None,
            created_at: Utc::now(),
        }
    }

    fn trigger(trigger_type: TriggerType, value: &str) -> RuleTrigger {
        RuleTrigger {
            trigger_type,
            value: value.to_string(),
            category: None,
        }
    }

    #[test]
    fn income_received_with_empty_value_matches_any_income() {
        let t = trigger(TriggerType::IncomeReceived, "");
        assert!(matches(&txn("income", 1000, "Salário", "Trabalho"), &t));
        assert!(!matches(&txn("expense", 1000, "Mercado", "Alimentação"), &t));
    }

    #[test]
    fn income_received_filters_on_category_or_description() {
        let t = trigger(TriggerType::IncomeReceived, "salário");
        assert!(matches(&txn("income", 1000, "SALÁRIO Abril", "Trabalho"), &t));
        assert!(matches(&txn("income", 1000, "Depósito", "Salário"), &t));
        assert!(!matches(&txn("income", 1000, "Venda usados", "Extra"), &t));
    }

    #[test]
    fn expense_contains_is_case_insensitive() {
        let t = trigger(TriggerType::ExpenseContains, "netflix");
        assert!(matches(&txn("expense", 40, "NETFLIX Subscription", "Lazer"), &t));
        assert!(!matches(&txn("expense", 40, "Spotify", "Lazer"), &t));
        assert!(!matches(&txn("income", 40, "Netflix refund", "Lazer"), &t));
    }

    #[test]
    fn amount_above_is_inclusive() {
        let t = trigger(TriggerType::AmountAbove, "500");
        assert!(matches(&txn("expense", 501, "a", "c"), &t));
        assert!(matches(&txn("expense", 500, "a", "c"), &t));
        assert!(!matches(&txn("expense", 499, "a", "c"), &t));
    }

    #[test]
    fn amount_above_with_garbage_threshold_matches_nothing() {
        let t = trigger(TriggerType::AmountAbove, "lots");
        assert!(!matches(&txn("expense", 10_000, "a", "c"), &t));
    }

    #[test]
    fn category_match_is_exact_and_case_sensitive() {
        let t = RuleTrigger {
            trigger_type: TriggerType::CategoryMatch,
            value: String::new(),
            category: Some("Alimentação".to_string()),
        };
        assert!(matches(&txn("expense", 10, "a", "Alimentação"), &t));
        assert!(!matches(&txn("expense", 10, "a", "alimentação"), &t));
        assert!(!matches(&txn("expense", 10, "a", "Alimentação fora"), &t));
    }

    #[test]
    fn unknown_trigger_matches_nothing() {
        let t = trigger(TriggerType::Unknown, "whatever");
        assert!(!matches(&txn("income", 1000, "Salário", "Trabalho"), &t));
    }

    #[test]
    fn window_excludes_old_transactions() {
        let now = Utc::now();
        let mut recent = txn("income", 100, "Salário", "Trabalho");
        recent.date = now - Duration::days(5);
        let mut old = txn("income", 100, "Salário antigo", "Trabalho");
        old.date = now - Duration::days(45);

        let t = trigger(TriggerType::IncomeReceived, "");
        let window = [recent.clone(), old];
        let matched = matching_in_window(&window, &t, now);

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, recent.id);
    }

    #[test]
    fn window_sorts_newest_first() {
        let now = Utc::now();
        let mut a = txn("income", 100, "A", "Trabalho");
        a.date = now - Duration::days(10);
        let mut b = txn("income", 100, "B", "Trabalho");
        b.date = now - Duration::days(2);

        let t = trigger(TriggerType::IncomeReceived, "");
        let window = [a, b.clone()];
        let matched = matching_in_window(&window, &t, now);

        assert_eq!(matched[0].id, b.id);
    }
}
