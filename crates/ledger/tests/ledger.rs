use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use ledger::{
    Account, BalanceMode, Category, CategoryKind, Currency, DepositTerms, FixedRates, Frequency,
    Ledger, LedgerError, Money, RecurringSeries, SubscriptionStatus, Transaction, TransactionKind,
};
use memstore::MemoryStore;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn rates() -> FixedRates {
    FixedRates::new()
        .with_rate(Currency::Usd, Currency::Eur, 900_000)
        .with_rate(Currency::Gbp, Currency::Eur, 1_150_000)
}

async fn ledger_with_store() -> Ledger<MemoryStore, FixedRates> {
    Ledger::builder(MemoryStore::new(), rates())
        .base_currency(Currency::Eur)
        .debounce(Duration::from_millis(1))
        .build()
        .await
        .unwrap()
}

fn day(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn at(offset: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_750_000_000 + offset, 0).unwrap()
}

fn expense(
    date: &str,
    amount: i64,
    currency: Currency,
    account: &Account,
    category: &Category,
    stamp: i64,
) -> Transaction {
    Transaction::new(
        day(date),
        "expense",
        Money::new(amount),
        currency,
        TransactionKind::Expense,
        at(stamp),
    )
    .unwrap()
    .with_category(category.id, None)
    .with_source_account(account.id, account.name.clone())
}

fn income(
    date: &str,
    amount: i64,
    currency: Currency,
    account: &Account,
    category: &Category,
    stamp: i64,
) -> Transaction {
    Transaction::new(
        day(date),
        "income",
        Money::new(amount),
        currency,
        TransactionKind::Income,
        at(stamp),
    )
    .unwrap()
    .with_category(category.id, None)
    .with_target_account(account.id, account.name.clone())
}

#[tokio::test]
async fn income_add_then_delete_restores_balance() {
    init_tracing();
    let mut ledger = ledger_with_store().await;
    let account = Account::new("X", Currency::Usd, Money::ZERO);
    let salary = Category::new("Salary", CategoryKind::Income);
    ledger.add_account(account.clone()).await.unwrap();
    ledger.add_category(salary.clone()).await.unwrap();

    let tx = income("2025-05-02", 1000, Currency::Usd, &account, &salary, 0);
    let id = ledger.add_transaction(tx).await.unwrap();
    assert_eq!(ledger.balance(&account.id).unwrap(), Money::new(1000));

    ledger.delete_transaction(&id).await.unwrap();
    assert_eq!(ledger.balance(&account.id).unwrap(), Money::ZERO);
    // The immediate delete reached the store too.
    assert!(!ledger.store().contains_transaction(&id));
}

#[tokio::test]
async fn balance_tracks_random_operation_sequences() {
    // Deterministic LCG so failures reproduce.
    struct Lcg(u64);
    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }
    }

    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Eur, Money::new(12_345));
    let groceries = Category::new("Groceries", CategoryKind::Expense);
    let salary = Category::new("Salary", CategoryKind::Income);
    ledger.add_account(account.clone()).await.unwrap();
    ledger.add_category(groceries.clone()).await.unwrap();
    ledger.add_category(salary.clone()).await.unwrap();

    let mut rng = Lcg(42);
    let mut live: Vec<Transaction> = Vec::new();
    for step in 0..300 {
        match rng.next() % 4 {
            0 | 1 => {
                let amount = 1 + (rng.next() % 10_000) as i64;
                let tx = if rng.next() % 2 == 0 {
                    expense("2025-06-10", amount, Currency::Eur, &account, &groceries, step)
                } else {
                    income("2025-06-11", amount, Currency::Eur, &account, &salary, step)
                };
                ledger.add_transaction(tx.clone()).await.unwrap();
                live.push(tx);
            }
            2 if !live.is_empty() => {
                let index = (rng.next() as usize) % live.len();
                let mut new = live[index].clone();
                new.amount = Money::new(1 + (rng.next() % 10_000) as i64);
                ledger
                    .update_transaction(&new.id.clone(), new.clone())
                    .await
                    .unwrap();
                live[index] = new;
            }
            3 if !live.is_empty() => {
                let index = (rng.next() as usize) % live.len();
                let tx = live.swap_remove(index);
                ledger.delete_transaction(&tx.id).await.unwrap();
            }
            _ => {}
        }
    }

    let expected: i64 = 12_345
        + live
            .iter()
            .map(|tx| {
                if tx.target_account_id == Some(account.id) {
                    tx.amount.minor()
                } else {
                    -tx.amount.minor()
                }
            })
            .sum::<i64>();
    assert_eq!(ledger.balance(&account.id).unwrap(), Money::new(expected));
}

#[tokio::test]
async fn transfer_updates_both_sides_or_neither() {
    let mut ledger = ledger_with_store().await;
    let checking = Account::new("Checking", Currency::Usd, Money::new(50_000));
    let savings = Account::new("Savings", Currency::Eur, Money::ZERO);
    ledger.add_account(checking.clone()).await.unwrap();
    ledger.add_account(savings.clone()).await.unwrap();

    let transfer = Transaction::new(
        day("2025-05-10"),
        "usd to eur",
        Money::new(10_000),
        Currency::Usd,
        TransactionKind::Transfer,
        at(0),
    )
    .unwrap()
    .with_source_account(checking.id, "Checking")
    .with_target_account(savings.id, "Savings")
    .with_target_amount(Currency::Eur, Money::new(9_000));

    ledger.add_transaction(transfer.clone()).await.unwrap();
    assert_eq!(ledger.balance(&checking.id).unwrap(), Money::new(40_000));
    assert_eq!(ledger.balance(&savings.id).unwrap(), Money::new(9_000));

    // Deleting reverses both legs as one unit.
    ledger.delete_transaction(&transfer.id).await.unwrap();
    assert_eq!(ledger.balance(&checking.id).unwrap(), Money::new(50_000));
    assert_eq!(ledger.balance(&savings.id).unwrap(), Money::ZERO);
}

#[tokio::test]
async fn transfer_requires_existing_accounts() {
    let mut ledger = ledger_with_store().await;
    let checking = Account::new("Checking", Currency::Eur, Money::ZERO);
    ledger.add_account(checking.clone()).await.unwrap();

    let ghost = uuid::Uuid::new_v4();
    let transfer = Transaction::new(
        day("2025-05-10"),
        "nowhere",
        Money::new(100),
        Currency::Eur,
        TransactionKind::Transfer,
        at(0),
    )
    .unwrap()
    .with_source_account(checking.id, "Checking")
    .with_target_account(ghost, "Ghost");

    let err = ledger.add_transaction(transfer).await.unwrap_err();
    assert_eq!(err, LedgerError::TargetAccountNotFound(ghost.to_string()));
    // Nothing was applied.
    assert_eq!(ledger.state().transaction_count(), 0);
    assert_eq!(ledger.balance(&checking.id).unwrap(), Money::ZERO);
}

#[tokio::test]
async fn expense_requires_existing_category() {
    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Eur, Money::ZERO);
    ledger.add_account(account.clone()).await.unwrap();

    let ghost_category = uuid::Uuid::new_v4();
    let tx = Transaction::new(
        day("2025-05-10"),
        "mystery",
        Money::new(100),
        Currency::Eur,
        TransactionKind::Expense,
        at(0),
    )
    .unwrap()
    .with_category(ghost_category, None)
    .with_source_account(account.id, "Checking");

    let err = ledger.add_transaction(tx).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::CategoryNotFound(ghost_category.to_string())
    );
}

#[tokio::test]
async fn update_enforces_id_match_and_recurring_link() {
    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Eur, Money::ZERO);
    let groceries = Category::new("Groceries", CategoryKind::Expense);
    ledger.add_account(account.clone()).await.unwrap();
    ledger.add_category(groceries.clone()).await.unwrap();

    let tx = expense("2025-05-10", 500, Currency::Eur, &account, &groceries, 0);
    let id = ledger.add_transaction(tx.clone()).await.unwrap();

    // A replacement carrying a different id is rejected.
    let stranger = expense("2025-05-10", 600, Currency::Eur, &account, &groceries, 1);
    let err = ledger.update_transaction(&id, stranger).await.unwrap_err();
    assert!(matches!(err, LedgerError::IdMismatch(_)));

    // Stripping a recurring link is rejected.
    let series = RecurringSeries::new(
        "Rent",
        Money::new(90_000),
        Currency::Eur,
        TransactionKind::Expense,
        Frequency::Monthly,
        "2025-01-01",
    )
    .unwrap();
    let mut linked = tx.clone();
    linked.series_id = Some(series.id);
    linked.occurrence_id = Some(uuid::Uuid::new_v4());
    ledger.update_transaction(&id, linked.clone()).await.unwrap();

    let mut unlinked = linked.clone();
    unlinked.series_id = None;
    let err = ledger.update_transaction(&id, unlinked).await.unwrap_err();
    assert_eq!(err, LedgerError::RecurringLinkRemoval(id.to_string()));
}

#[tokio::test]
async fn monthly_series_generates_idempotently() {
    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Eur, Money::new(100_000));
    ledger.add_account(account.clone()).await.unwrap();

    let mut series = RecurringSeries::new(
        "Streaming",
        Money::new(5_000),
        Currency::Eur,
        TransactionKind::Expense,
        Frequency::Monthly,
        "2025-01-01",
    )
    .unwrap();
    series.source_account_id = Some(account.id);
    let series_id = ledger.create_series(series).await.unwrap();

    let generated = ledger.generate_due(day("2025-01-15"), at(0)).await.unwrap();
    // Start through today + 3 months: Jan, Feb, Mar, Apr.
    assert_eq!(generated, 4);
    assert_eq!(ledger.state().transaction_count(), 4);
    assert_eq!(
        ledger.balance(&account.id).unwrap(),
        Money::new(100_000 - 4 * 5_000)
    );

    // Same inputs, nothing new: January is not charged twice.
    let again = ledger.generate_due(day("2025-01-15"), at(60)).await.unwrap();
    assert_eq!(again, 0);
    let january_charges = ledger
        .state()
        .transactions()
        .filter(|tx| tx.series_id == Some(series_id) && tx.date == day("2025-01-01"))
        .count();
    assert_eq!(january_charges, 1);

    // A deleted generated entry stays deleted on the next run.
    let doomed = ledger
        .state()
        .transactions()
        .find(|tx| tx.date == day("2025-02-01"))
        .map(|tx| tx.id.clone())
        .unwrap();
    ledger.delete_transaction(&doomed).await.unwrap();
    let after_delete = ledger.generate_due(day("2025-01-15"), at(120)).await.unwrap();
    assert_eq!(after_delete, 0);
    assert_eq!(ledger.state().transaction_count(), 3);
}

#[tokio::test]
async fn frequency_change_replaces_future_occurrences() {
    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Eur, Money::ZERO);
    ledger.add_account(account.clone()).await.unwrap();

    let mut series = RecurringSeries::new(
        "Gym",
        Money::new(3_000),
        Currency::Eur,
        TransactionKind::Expense,
        Frequency::Monthly,
        "2025-01-01",
    )
    .unwrap();
    series.source_account_id = Some(account.id);
    let series_id = ledger.create_series(series.clone()).await.unwrap();

    let today = day("2025-02-15");
    ledger.generate_due(today, at(0)).await.unwrap();
    let before: Vec<NaiveDate> = ledger
        .state()
        .transactions()
        .filter(|tx| tx.series_id == Some(series_id))
        .map(|tx| tx.date)
        .collect();
    assert!(before.contains(&day("2025-03-01")));

    // Switch to weekly; future monthly charges disappear, past ones stay.
    let mut weekly = series.clone();
    weekly.frequency = Frequency::Weekly;
    ledger
        .update_series(&series_id, weekly, today, at(60))
        .await
        .unwrap();

    let after: Vec<NaiveDate> = ledger
        .state()
        .transactions()
        .filter(|tx| tx.series_id == Some(series_id))
        .map(|tx| tx.date)
        .collect();
    assert!(after.contains(&day("2025-01-01")));
    assert!(after.contains(&day("2025-02-01")));
    assert!(!after.contains(&day("2025-03-01")));
    // Weekly steps from the start date, only future ones are new.
    assert!(after.contains(&day("2025-02-19")));
    assert!(!after.contains(&day("2025-02-12")));
}

#[tokio::test]
async fn subscription_status_machine_is_enforced() {
    let mut ledger = ledger_with_store().await;
    let series = RecurringSeries::new(
        "News",
        Money::new(1_000),
        Currency::Eur,
        TransactionKind::Expense,
        Frequency::Monthly,
        "2025-01-01",
    )
    .unwrap();
    let id = ledger.create_series(series).await.unwrap();

    ledger
        .set_subscription_status(&id, SubscriptionStatus::Paused)
        .await
        .unwrap();
    assert_eq!(ledger.generate_due(day("2025-02-01"), at(0)).await.unwrap(), 0);

    ledger
        .set_subscription_status(&id, SubscriptionStatus::Active)
        .await
        .unwrap();
    ledger
        .set_subscription_status(&id, SubscriptionStatus::Archived)
        .await
        .unwrap();

    let err = ledger
        .set_subscription_status(&id, SubscriptionStatus::Active)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidSeriesData(_)));
    assert_eq!(ledger.generate_due(day("2025-03-01"), at(60)).await.unwrap(), 0);
}

#[tokio::test]
async fn bulk_import_matches_direct_scan() {
    init_tracing();
    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Eur, Money::ZERO);
    let groceries = Category::new("Groceries", CategoryKind::Expense);
    let salary = Category::new("Salary", CategoryKind::Income);
    ledger.add_account(account.clone()).await.unwrap();
    ledger.add_category(groceries.clone()).await.unwrap();
    ledger.add_category(salary.clone()).await.unwrap();

    let mut batch = Vec::with_capacity(10_000);
    for i in 0..10_000i64 {
        let currency = if i % 3 == 0 {
            Currency::Usd
        } else {
            Currency::Eur
        };
        let date = format!("2025-{:02}-{:02}", 1 + (i % 12), 1 + (i % 28));
        let tx = if i % 5 == 0 {
            income(&date, 100 + i % 900, currency, &account, &salary, i)
        } else {
            expense(&date, 100 + i % 900, currency, &account, &groceries, i)
        };
        batch.push(tx);
    }

    ledger.begin_import();
    for chunk in batch.chunks(1_000) {
        ledger.bulk_add_transactions(chunk.to_vec()).await.unwrap();
    }
    ledger.finish_import().await.unwrap();

    assert_eq!(ledger.state().transaction_count(), 10_000);
    assert_eq!(ledger.store().commit_count(), 1);
    assert_eq!(ledger.store().transaction_count(), 10_000);

    // Category aggregate equals a direct O(N) scan of the imported set.
    let conversion = rates();
    let scanned: i64 = batch
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Expense)
        .map(|tx| {
            ledger::Converter::convert_cached(&conversion, tx.amount, tx.currency, Currency::Eur)
                .unwrap()
                .minor()
        })
        .sum();
    let aggregated = ledger.category_total(&groceries.id);
    assert!(aggregated.abs_diff(Money::new(scanned)) <= Money::new(1));
}

#[tokio::test]
async fn failed_import_commit_is_loud() {
    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Eur, Money::ZERO);
    let groceries = Category::new("Groceries", CategoryKind::Expense);
    ledger.add_account(account.clone()).await.unwrap();
    ledger.add_category(groceries.clone()).await.unwrap();

    ledger.begin_import();
    ledger
        .bulk_add_transactions(vec![expense(
            "2025-05-01",
            100,
            Currency::Eur,
            &account,
            &groceries,
            0,
        )])
        .await
        .unwrap();

    ledger.store().set_fail_saves(true);
    let err = ledger.finish_import().await.unwrap_err();
    assert!(matches!(err, LedgerError::Persistence(_)));

    // In-memory state is still the session's truth and derived state is
    // consistent with it.
    assert_eq!(ledger.state().transaction_count(), 1);
    assert_eq!(ledger.category_total(&groceries.id), Money::new(100));
}

#[tokio::test]
async fn summary_reports_in_base_currency() {
    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Eur, Money::ZERO);
    let groceries = Category::new("Groceries", CategoryKind::Expense);
    let salary = Category::new("Salary", CategoryKind::Income);
    ledger.add_account(account.clone()).await.unwrap();
    ledger.add_category(groceries.clone()).await.unwrap();
    ledger.add_category(salary.clone()).await.unwrap();

    ledger
        .add_transaction(income("2025-05-01", 100_000, Currency::Eur, &account, &salary, 0))
        .await
        .unwrap();
    ledger
        .add_transaction(expense("2025-05-02", 10_000, Currency::Usd, &account, &groceries, 1))
        .await
        .unwrap();

    let summary = ledger.summary(day("2025-05-01"), day("2025-06-01")).unwrap();
    assert_eq!(summary.income, Money::new(100_000));
    // 100 USD at 0.90.
    assert_eq!(summary.expense, Money::new(9_000));
    assert_eq!(summary.net, Money::new(91_000));

    // A mutation inside the cached range invalidates it.
    ledger
        .add_transaction(expense("2025-05-03", 1_000, Currency::Eur, &account, &groceries, 2))
        .await
        .unwrap();
    let summary = ledger.summary(day("2025-05-01"), day("2025-06-01")).unwrap();
    assert_eq!(summary.expense, Money::new(10_000));

    let daily = ledger
        .daily_expenses(day("2025-05-01"), day("2025-06-01"))
        .unwrap();
    assert_eq!(
        daily,
        vec![
            (day("2025-05-02"), Money::new(9_000)),
            (day("2025-05-03"), Money::new(1_000)),
        ]
    );

    let by_category = ledger
        .category_expenses(day("2025-05-01"), day("2025-06-01"))
        .unwrap();
    assert_eq!(by_category, vec![(groceries.id, Money::new(10_000))]);
}

#[tokio::test]
async fn base_currency_change_rebuilds_aggregates() {
    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Usd, Money::ZERO);
    let groceries = Category::new("Groceries", CategoryKind::Expense);
    ledger.add_account(account.clone()).await.unwrap();
    ledger.add_category(groceries.clone()).await.unwrap();

    ledger
        .add_transaction(expense("2025-05-02", 10_000, Currency::Usd, &account, &groceries, 0))
        .await
        .unwrap();
    assert_eq!(ledger.category_total(&groceries.id), Money::new(9_000));

    ledger.set_base_currency(Currency::Usd);
    assert_eq!(ledger.category_total(&groceries.id), Money::new(10_000));
}

#[tokio::test]
async fn sectioned_view_groups_by_day_and_paginates() {
    let mut ledger = ledger_with_store().await;
    let account = Account::new("Checking", Currency::Eur, Money::ZERO);
    let groceries = Category::new("Groceries", CategoryKind::Expense);
    ledger.add_account(account.clone()).await.unwrap();
    ledger.add_category(groceries.clone()).await.unwrap();

    for (i, date) in ["2025-05-01", "2025-05-01", "2025-05-03", "2025-05-02"]
        .iter()
        .enumerate()
    {
        ledger
            .add_transaction(expense(date, 100 + i as i64, Currency::Eur, &account, &groceries, i as i64))
            .await
            .unwrap();
    }

    let view = ledger.view();
    assert_eq!(view.section_count(), 3);
    assert_eq!(view.section_date(0), Some(day("2025-05-03")));
    assert_eq!(view.section_len(2), Some(2));
    let row = view.row(ledger.state(), 0, 0).unwrap();
    assert_eq!(row.date, day("2025-05-03"));

    let (first_page, cursor) = ledger.page_transactions(None, 3).unwrap();
    assert_eq!(first_page.len(), 3);
    let (second_page, end) = ledger
        .page_transactions(cursor.as_deref(), 3)
        .unwrap();
    assert_eq!(second_page.len(), 1);
    assert!(end.is_none());
}

#[tokio::test]
async fn deposit_interest_posts_once_per_month_and_is_protected() {
    let mut ledger = ledger_with_store().await;
    let deposit = Account::new("Savings", Currency::Eur, Money::new(100_000)).with_deposit(
        DepositTerms {
            principal: Money::new(100_000),
            annual_rate_bps: 600,
            posting_day: 15,
            capitalize: true,
        },
    );
    ledger.add_account(deposit.clone()).await.unwrap();

    // Before the posting day nothing happens.
    assert_eq!(
        ledger.accrue_deposit_interest(day("2025-03-10"), at(0)).await.unwrap(),
        0
    );

    // 6 % p.a. on 1000.00 → 5.00 per month.
    assert_eq!(
        ledger.accrue_deposit_interest(day("2025-03-20"), at(60)).await.unwrap(),
        1
    );
    assert_eq!(ledger.balance(&deposit.id).unwrap(), Money::new(100_500));

    // Idempotent within the month.
    assert_eq!(
        ledger.accrue_deposit_interest(day("2025-03-25"), at(120)).await.unwrap(),
        0
    );

    // Capitalization folded the interest into the principal.
    let stored = ledger.state().account(&deposit.id).unwrap();
    assert_eq!(
        stored.deposit.as_ref().unwrap().principal,
        Money::new(100_500)
    );

    // The generated entry cannot be deleted.
    let interest_id = ledger
        .state()
        .transactions()
        .find(|tx| tx.kind == TransactionKind::DepositInterest)
        .map(|tx| tx.id.clone())
        .unwrap();
    let err = ledger.delete_transaction(&interest_id).await.unwrap_err();
    assert!(matches!(err, LedgerError::ProtectedTransaction(_)));
}

#[tokio::test]
async fn manual_account_balance_starts_from_entered_figure() {
    let mut ledger = ledger_with_store().await;
    let cash = Account::manual("Cash", Currency::Eur, Money::new(20_000));
    let groceries = Category::new("Groceries", CategoryKind::Expense);
    ledger.add_account(cash.clone()).await.unwrap();
    ledger.add_category(groceries.clone()).await.unwrap();

    ledger
        .add_transaction(expense("2025-05-02", 2_500, Currency::Eur, &cash, &groceries, 0))
        .await
        .unwrap();
    assert_eq!(ledger.balance(&cash.id).unwrap(), Money::new(17_500));

    // Re-entering the figure resets the baseline, not the history.
    ledger
        .set_initial_balance(Money::new(30_000), &cash.id)
        .await
        .unwrap();
    assert_eq!(ledger.balance(&cash.id).unwrap(), Money::new(27_500));
    assert_eq!(
        ledger.state().account(&cash.id).unwrap().mode,
        BalanceMode::Manual
    );
}

#[tokio::test]
async fn restart_rederives_balances_and_aggregates() {
    let store = {
        let mut ledger = ledger_with_store().await;
        let account = Account::new("Checking", Currency::Eur, Money::new(5_000));
        let groceries = Category::new("Groceries", CategoryKind::Expense);
        ledger.add_account(account.clone()).await.unwrap();
        ledger.add_category(groceries.clone()).await.unwrap();
        ledger
            .add_transaction(expense("2025-05-02", 1_200, Currency::Eur, &account, &groceries, 0))
            .await
            .unwrap();
        ledger.into_store()
    };

    let reopened = Ledger::builder(store, rates())
        .base_currency(Currency::Eur)
        .build()
        .await
        .unwrap();

    let account_id = reopened.state().accounts().next().unwrap().id;
    assert_eq!(reopened.balance(&account_id).unwrap(), Money::new(3_800));
    let category_id = reopened.state().categories().next().unwrap().id;
    assert_eq!(reopened.category_total(&category_id), Money::new(1_200));
    assert_eq!(reopened.view().section_count(), 1);
}

#[tokio::test]
async fn mutation_bursts_notify_once() {
    // Wide debounce so the five adds land safely inside one burst.
    let mut ledger = Ledger::builder(MemoryStore::new(), rates())
        .base_currency(Currency::Eur)
        .debounce(Duration::from_millis(40))
        .build()
        .await
        .unwrap();
    let account = Account::new("Checking", Currency::Eur, Money::ZERO);
    let groceries = Category::new("Groceries", CategoryKind::Expense);
    ledger.add_account(account.clone()).await.unwrap();
    ledger.add_category(groceries.clone()).await.unwrap();

    // Let the setup burst flush before measuring.
    tokio::time::sleep(Duration::from_millis(120)).await;
    let mut observer = ledger.subscribe_changes();
    let before = *observer.borrow_and_update();

    for i in 0..5 {
        ledger
            .add_transaction(expense("2025-05-02", 100 + i, Currency::Eur, &account, &groceries, i))
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_millis(150)).await;

    let after = *observer.borrow_and_update();
    assert_eq!(after - before, 1);
}
