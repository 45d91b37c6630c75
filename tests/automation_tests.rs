use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

mod common;
use common::{
    account, fixed_rule, goal, goal_rule, percentage_rule, transaction, MemoryLedger,
    MemoryRuleStore,
};

use fluxo_be::automation::executor::{self, RuleOutcome, SkipReason};
use fluxo_be::automation::models::{ActionType, RuleAction, RuleTrigger, TriggerType};
use fluxo_be::automation::service::{AutomationService, ManualRunOutcome};
use fluxo_be::errors::AppError;
use fluxo_be::state::StateCache;
use fluxo_be::transaction::models::{CreateTransactionDto, TransactionType};
use fluxo_be::transaction::service::TransactionService;

fn income_dto(account_id: Uuid, amount: i64, description: &str) -> CreateTransactionDto {
    CreateTransactionDto {
        date: None,
        description: description.to_string(),
        amount: Decimal::from(amount),
        transaction_type: TransactionType::Income,
        category: "Trabalho".to_string(),
        account_id: Some(account_id),
        to_account_id: None,
        goal_id: None,
        is_recurring: false,
        recurring_frequency: None,
    }
}

#[actix_rt::test]
async fn income_triggers_percentage_rule_end_to_end() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 2000);
    let savings = account(owner, "Poupança", 500);
    let rule = percentage_rule("Guardar 20%", 20, savings.id);
    let rule_id = rule.id;

    let ledger = MemoryLedger::new(vec![checking.clone(), savings.clone()], vec![], vec![]);
    let rules = MemoryRuleStore::with_rules(owner, vec![rule]);
    let cache = StateCache::new();

    let income = TransactionService::create_transaction(
        &ledger,
        &rules,
        &cache,
        owner,
        income_dto(checking.id, 1000, "Salário Abril"),
    )
    .await
    .expect("income should post");

    // 2000 + 1000 - 20% of 1000
    assert_eq!(ledger.account_balance(checking.id), Decimal::from(2800));
    assert_eq!(ledger.account_balance(savings.id), Decimal::from(700));

    // Conservation: total value changed only by the income amount
    assert_eq!(
        ledger.account_balance(checking.id) + ledger.account_balance(savings.id),
        Decimal::from(2000 + 500 + 1000)
    );

    let transactions = ledger.all_transactions();
    assert_eq!(transactions.len(), 2);
    let audit = transactions
        .iter()
        .find(|t| t.rule_id.is_some())
        .expect("audit transaction should exist");
    assert_eq!(audit.transaction_type, "transfer");
    assert_eq!(audit.amount, Decimal::from(200));
    assert_eq!(audit.account_id, Some(checking.id));
    assert_eq!(audit.to_account_id, Some(savings.id));
    assert_eq!(audit.rule_id, Some(rule_id));
    assert_eq!(
        audit.description,
        "Automação: Guardar 20% (20% de Salário Abril)"
    );

    let stored = &rules.rules(owner)[0];
    assert_eq!(stored.execution_count, 1);
    assert_eq!(stored.executions.len(), 1);
    assert!(stored.last_executed.is_some());
    let execution = &stored.executions[0];
    assert_eq!(execution.trigger_transaction_id, income.id);
    assert_eq!(execution.transaction_id, audit.id);
    assert!(!execution.reversed);
}

#[actix_rt::test]
async fn disabled_rule_never_executes() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 2000);
    let savings = account(owner, "Poupança", 500);
    let mut rule = percentage_rule("Guardar 20%", 20, savings.id);
    rule.enabled = false;

    let ledger = MemoryLedger::new(vec![checking.clone(), savings.clone()], vec![], vec![]);
    let rules = MemoryRuleStore::with_rules(owner, vec![rule]);
    let cache = StateCache::new();

    TransactionService::create_transaction(
        &ledger,
        &rules,
        &cache,
        owner,
        income_dto(checking.id, 1000, "Salário"),
    )
    .await
    .expect("income should post");

    // Income posted, but no transfer happened
    assert_eq!(ledger.account_balance(checking.id), Decimal::from(3000));
    assert_eq!(ledger.account_balance(savings.id), Decimal::from(500));
    assert_eq!(ledger.all_transactions().len(), 1);
    let stored = &rules.rules(owner)[0];
    assert_eq!(stored.execution_count, 0);
    assert!(stored.executions.is_empty());
}

#[actix_rt::test]
async fn fixed_amount_is_flat_regardless_of_basis() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 2000);
    let savings = account(owner, "Poupança", 0);
    let rule = fixed_rule("Poupança fixa", 75, savings.id);

    let ledger = MemoryLedger::new(vec![checking.clone(), savings.clone()], vec![], vec![]);
    let rules = MemoryRuleStore::with_rules(owner, vec![rule]);
    let cache = StateCache::new();

    TransactionService::create_transaction(
        &ledger,
        &rules,
        &cache,
        owner,
        income_dto(checking.id, 1_000_000, "Venda do apartamento"),
    )
    .await
    .expect("income should post");

    assert_eq!(ledger.account_balance(savings.id), Decimal::from(75));
    assert_eq!(
        ledger.account_balance(checking.id),
        Decimal::from(2000 + 1_000_000 - 75)
    );
}

#[actix_rt::test]
async fn insufficient_funds_skips_without_mutation() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 50);
    let savings = account(owner, "Poupança", 0);
    let rule = fixed_rule("Poupança fixa", 100, savings.id);
    let accounts = vec![checking.clone(), savings.clone()];

    let ledger = MemoryLedger::new(accounts.clone(), vec![], vec![]);
    let trigger = transaction(owner, checking.id, "income", 10, "Troco", Utc::now());

    let outcome = executor::execute_rule(&ledger, owner, &rule, &trigger, &accounts, &[])
        .await
        .expect("skip is not an error");

    assert!(matches!(
        outcome,
        RuleOutcome::Skipped(SkipReason::InsufficientFunds)
    ));
    assert_eq!(ledger.account_balance(checking.id), Decimal::from(50));
    assert_eq!(ledger.account_balance(savings.id), Decimal::ZERO);
    assert!(ledger.all_transactions().is_empty());
}

#[actix_rt::test]
async fn categorize_action_has_no_execution_path() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 2000);
    let mut rule = percentage_rule("Marcar", 20, Uuid::new_v4());
    rule.action = RuleAction {
        action_type: ActionType::Categorize,
        percentage: None,
        fixed_amount: None,
        target_account_id: None,
        target_goal_id: None,
    };
    let accounts = vec![checking.clone()];

    let ledger = MemoryLedger::new(accounts.clone(), vec![], vec![]);
    let trigger = transaction(owner, checking.id, "income", 1000, "Salário", Utc::now());

    let outcome = executor::execute_rule(&ledger, owner, &rule, &trigger, &accounts, &[])
        .await
        .expect("skip is not an error");

    assert!(matches!(
        outcome,
        RuleOutcome::Skipped(SkipReason::ActionNotExecutable)
    ));
}

#[actix_rt::test]
async fn failed_second_leg_rolls_back_the_debit() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 2000);
    let savings = account(owner, "Poupança", 500);
    let rule = percentage_rule("Guardar 20%", 20, savings.id);
    let accounts = vec![checking.clone(), savings.clone()];

    let ledger = MemoryLedger::new(accounts.clone(), vec![], vec![]);
    ledger.fail_updates_for(savings.id);

    let trigger = transaction(owner, checking.id, "income", 1000, "Salário", Utc::now());
    let outcome = executor::execute_rule(&ledger, owner, &rule, &trigger, &accounts, &[])
        .await
        .expect("rolled-back transfer is a skip, not an error");

    assert!(matches!(
        outcome,
        RuleOutcome::Skipped(SkipReason::PersistFailed)
    ));
    // The debit was compensated and no audit record exists
    assert_eq!(ledger.account_balance(checking.id), Decimal::from(2000));
    assert_eq!(ledger.account_balance(savings.id), Decimal::from(500));
    assert!(ledger.all_transactions().is_empty());
}

#[actix_rt::test]
async fn failed_rollback_surfaces_consistency_error() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 2000);
    let savings = account(owner, "Poupança", 500);
    let rule = percentage_rule("Guardar 20%", 20, savings.id);
    let accounts = vec![checking.clone(), savings.clone()];

    let ledger = MemoryLedger::new(accounts.clone(), vec![], vec![]);
    // The source debit succeeds, then the target credit fails, then the
    // compensating restore fails too.
    ledger.allow_updates(1);

    let trigger = transaction(owner, checking.id, "income", 1000, "Salário", Utc::now());
    let result = executor::execute_rule(&ledger, owner, &rule, &trigger, &accounts, &[]).await;

    assert!(matches!(result, Err(AppError::ConsistencyError(_))));
}

#[actix_rt::test]
async fn reversing_an_automation_transfer_restores_everything() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 2000);
    let savings = account(owner, "Poupança", 500);
    let rule = percentage_rule("Guardar 20%", 20, savings.id);

    let ledger = MemoryLedger::new(vec![checking.clone(), savings.clone()], vec![], vec![]);
    let rules = MemoryRuleStore::with_rules(owner, vec![rule]);
    let cache = StateCache::new();

    TransactionService::create_transaction(
        &ledger,
        &rules,
        &cache,
        owner,
        income_dto(checking.id, 1000, "Salário"),
    )
    .await
    .expect("income should post");

    let audit_id = ledger
        .all_transactions()
        .iter()
        .find(|t| t.rule_id.is_some())
        .expect("audit transaction should exist")
        .id;

    TransactionService::reverse_transaction(&ledger, &rules, &cache, owner, audit_id)
        .await
        .expect("reversal should succeed");

    // Balances back to their pre-transfer values (income still posted)
    assert_eq!(ledger.account_balance(checking.id), Decimal::from(3000));
    assert_eq!(ledger.account_balance(savings.id), Decimal::from(500));
    assert_eq!(ledger.all_transactions().len(), 1);

    // Execution flagged, live count floored back to zero
    let stored = &rules.rules(owner)[0];
    assert_eq!(stored.execution_count, 0);
    assert_eq!(stored.executions.len(), 1);
    assert!(stored.executions[0].reversed);
    assert!(stored.executions[0].reversed_at.is_some());
    assert_eq!(stored.active_executions(), stored.execution_count as usize);

    // Reversal is not re-entrant
    let second = TransactionService::reverse_transaction(&ledger, &rules, &cache, owner, audit_id)
        .await;
    assert!(matches!(second, Err(AppError::NotFound(_))));
}

#[actix_rt::test]
async fn reversing_a_goal_savings_restores_account_and_goal() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 2000);
    let viagem = goal(owner, "Viagem", 5000, 100);
    let rule = goal_rule("Guardar para viagem", 50, viagem.id);

    let ledger = MemoryLedger::new(vec![checking.clone()], vec![viagem.clone()], vec![]);
    let rules = MemoryRuleStore::with_rules(owner, vec![rule]);
    let cache = StateCache::new();

    TransactionService::create_transaction(
        &ledger,
        &rules,
        &cache,
        owner,
        income_dto(checking.id, 1000, "Salário"),
    )
    .await
    .expect("income should post");

    assert_eq!(ledger.account_balance(checking.id), Decimal::from(2500));
    assert_eq!(ledger.goal_amount(viagem.id), Decimal::from(600));

    let audit = ledger
        .all_transactions()
        .into_iter()
        .find(|t| t.rule_id.is_some())
        .expect("audit transaction should exist");
    assert_eq!(audit.transaction_type, "savings");
    assert_eq!(audit.goal_id, Some(viagem.id));

    TransactionService::reverse_transaction(&ledger, &rules, &cache, owner, audit.id)
        .await
        .expect("reversal should succeed");

    assert_eq!(ledger.account_balance(checking.id), Decimal::from(3000));
    assert_eq!(ledger.goal_amount(viagem.id), Decimal::from(100));
    let stored = &rules.rules(owner)[0];
    assert_eq!(stored.execution_count, 0);
    assert!(stored.executions[0].reversed);
}

#[actix_rt::test]
async fn legacy_free_text_transfer_reverses_by_name() {
    let owner = Uuid::new_v4();
    let corrente = account(owner, "Conta Corrente", 1000);
    let poupanca = account(owner, "Poupança", 500);

    let mut legacy = transaction(
        owner,
        corrente.id,
        "transfer",
        150,
        "Transferência: Conta Corrente → Poupança",
        Utc::now(),
    );
    legacy.account_id = None;

    let ledger = MemoryLedger::new(
        vec![corrente.clone(), poupanca.clone()],
        vec![],
        vec![legacy.clone()],
    );
    let rules = MemoryRuleStore::default();
    let cache = StateCache::new();

    TransactionService::reverse_transaction(&ledger, &rules, &cache, owner, legacy.id)
        .await
        .expect("legacy reversal should succeed");

    assert_eq!(ledger.account_balance(corrente.id), Decimal::from(1150));
    assert_eq!(ledger.account_balance(poupanca.id), Decimal::from(350));
    assert!(ledger.all_transactions().is_empty());
}

#[actix_rt::test]
async fn legacy_reversal_aborts_when_a_name_does_not_resolve() {
    let owner = Uuid::new_v4();
    let poupanca = account(owner, "Poupança", 500);

    let mut legacy = transaction(
        owner,
        poupanca.id,
        "transfer",
        150,
        "Transferência: Conta Antiga → Poupança",
        Utc::now(),
    );
    legacy.account_id = None;

    let ledger = MemoryLedger::new(vec![poupanca.clone()], vec![], vec![legacy.clone()]);
    let rules = MemoryRuleStore::default();
    let cache = StateCache::new();

    let result =
        TransactionService::reverse_transaction(&ledger, &rules, &cache, owner, legacy.id).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    // Nothing moved and the record survived
    assert_eq!(ledger.account_balance(poupanca.id), Decimal::from(500));
    assert_eq!(ledger.all_transactions().len(), 1);
}

#[actix_rt::test]
async fn plain_expense_reversal_credits_the_account_back() {
    let owner = Uuid::new_v4();
    // Balance already reflects the expense below
    let checking = account(owner, "Conta Corrente", 900);
    let expense = transaction(owner, checking.id, "expense", 100, "Mercado", Utc::now());

    let ledger = MemoryLedger::new(vec![checking.clone()], vec![], vec![expense.clone()]);
    let rules = MemoryRuleStore::default();
    let cache = StateCache::new();

    TransactionService::reverse_transaction(&ledger, &rules, &cache, owner, expense.id)
        .await
        .expect("reversal should succeed");

    assert_eq!(ledger.account_balance(checking.id), Decimal::from(1000));
    assert!(ledger.all_transactions().is_empty());
}

#[actix_rt::test]
async fn manual_run_reports_when_nothing_matches() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 1000);
    let savings = account(owner, "Poupança", 0);
    let mut rule = percentage_rule("Netflix para poupança", 10, savings.id);
    rule.trigger = RuleTrigger {
        trigger_type: TriggerType::ExpenseContains,
        value: "netflix".to_string(),
        category: None,
    };
    let rule_id = rule.id;

    let ledger = MemoryLedger::new(vec![checking, savings], vec![], vec![]);
    let rules = MemoryRuleStore::with_rules(owner, vec![rule]);
    let cache = StateCache::new();

    let outcome = AutomationService::run_rule_now(&ledger, &rules, &cache, owner, rule_id)
        .await
        .expect("manual run should not error");

    assert!(matches!(outcome, ManualRunOutcome::NoMatchingTransactions));
}

#[actix_rt::test]
async fn manual_run_applies_percentage_once_over_the_window_sum() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 5000);
    let savings = account(owner, "Poupança", 0);
    let rule = percentage_rule("Guardar 10%", 10, savings.id);
    let rule_id = rule.id;

    let now = Utc::now();
    let older = transaction(
        owner,
        checking.id,
        "income",
        1000,
        "Salário",
        now - Duration::days(5),
    );
    let newer = transaction(
        owner,
        checking.id,
        "income",
        500,
        "Freelance",
        now - Duration::days(2),
    );
    // Outside the 30-day window, must not count toward the basis
    let ancient = transaction(
        owner,
        checking.id,
        "income",
        800,
        "Salário antigo",
        now - Duration::days(45),
    );

    let ledger = MemoryLedger::new(
        vec![checking.clone(), savings.clone()],
        vec![],
        vec![older, newer, ancient],
    );
    let rules = MemoryRuleStore::with_rules(owner, vec![rule]);
    let cache = StateCache::new();

    let outcome = AutomationService::run_rule_now(&ledger, &rules, &cache, owner, rule_id)
        .await
        .expect("manual run should not error");

    // 10% of (1000 + 500), applied once
    match outcome {
        ManualRunOutcome::Executed { amount, .. } => {
            assert_eq!(amount, Decimal::from(150));
        }
        other => panic!("expected execution, got {other:?}"),
    }
    assert_eq!(ledger.account_balance(checking.id), Decimal::from(4850));
    assert_eq!(ledger.account_balance(savings.id), Decimal::from(150));
    assert_eq!(rules.rules(owner)[0].execution_count, 1);
}

#[actix_rt::test]
async fn rules_chain_off_the_same_updated_balance() {
    let owner = Uuid::new_v4();
    let checking = account(owner, "Conta Corrente", 0);
    let savings = account(owner, "Poupança", 0);
    let reserva = account(owner, "Reserva", 0);
    // Both rules transfer 60% of the income amount; after the first fires,
    // the second must see the reduced balance and be skipped for lack of
    // funds rather than overdraw the account.
    let first = percentage_rule("Primeira", 60, savings.id);
    let second = percentage_rule("Segunda", 60, reserva.id);

    let ledger = MemoryLedger::new(
        vec![checking.clone(), savings.clone(), reserva.clone()],
        vec![],
        vec![],
    );
    let rules = MemoryRuleStore::with_rules(owner, vec![first, second]);
    let cache = StateCache::new();

    TransactionService::create_transaction(
        &ledger,
        &rules,
        &cache,
        owner,
        income_dto(checking.id, 1000, "Salário"),
    )
    .await
    .expect("income should post");

    assert_eq!(ledger.account_balance(savings.id), Decimal::from(600));
    // Second rule resolved 600 but only 400 remained
    assert_eq!(ledger.account_balance(reserva.id), Decimal::ZERO);
    assert_eq!(ledger.account_balance(checking.id), Decimal::from(400));

    let stored = rules.rules(owner);
    assert_eq!(stored[0].execution_count, 1);
    assert_eq!(stored[1].execution_count, 0);
}
