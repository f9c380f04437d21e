//! Account lifecycle and balance access.

use uuid::Uuid;

use crate::{Account, Converter, Ledger, LedgerError, Money, ResultLedger, Store};

impl<S: Store, C: Converter> Ledger<S, C> {
    /// Registers a new account and starts tracking its balance.
    pub async fn add_account(&mut self, account: Account) -> ResultLedger<Uuid> {
        let id = account.id;
        self.balances.register_accounts([&account]);
        self.state.accounts.insert(id, account);
        self.persist_accounts().await;
        self.notifier.submit();
        Ok(id)
    }

    /// Replaces an account's record.
    ///
    /// Balance-affecting fields (currency, mode, baseline) are re-synced
    /// into the coordinator; the accumulated transaction delta is kept.
    pub async fn update_account(&mut self, account: Account) -> ResultLedger<()> {
        if self.state.account(&account.id).is_none() {
            return Err(LedgerError::AccountNotFound(account.id.to_string()));
        }
        self.balances.register_accounts([&account]);
        self.state.accounts.insert(account.id, account);
        self.persist_accounts().await;
        self.notifier.submit();
        Ok(())
    }

    /// Removes an account; its tracked balance is discarded. Transactions
    /// referencing it stay; they are history, not ownership.
    pub async fn delete_account(&mut self, id: &Uuid) -> ResultLedger<()> {
        if self.state.accounts.remove(id).is_none() {
            return Err(LedgerError::AccountNotFound(id.to_string()));
        }
        self.balances.remove_account(id);
        self.persist_accounts().await;
        self.notifier.submit();
        Ok(())
    }

    /// Sets the baseline figure the balance is computed from.
    pub async fn set_initial_balance(&mut self, amount: Money, id: &Uuid) -> ResultLedger<()> {
        let account = self
            .state
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
        account.initial_balance = amount;
        self.balances.set_initial_balance(amount, *id);
        self.persist_accounts().await;
        self.notifier.submit();
        Ok(())
    }

    /// Switches the account to a user-entered baseline.
    pub async fn mark_account_manual(&mut self, id: &Uuid) -> ResultLedger<()> {
        let account = self
            .state
            .accounts
            .get_mut(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
        account.mode = crate::BalanceMode::Manual;
        self.balances.mark_as_manual(*id);
        self.persist_accounts().await;
        self.notifier.submit();
        Ok(())
    }

    /// The authoritative current balance, from the coordinator.
    pub fn balance(&self, id: &Uuid) -> ResultLedger<Money> {
        self.balances
            .balance(id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }
}
