//! Category registry maintenance.

use uuid::Uuid;

use crate::{Category, Converter, Ledger, LedgerError, ResultLedger, Store, SubcategoryLink};

impl<S: Store, C: Converter> Ledger<S, C> {
    pub async fn add_category(&mut self, category: Category) -> ResultLedger<Uuid> {
        let id = category.id;
        self.state.categories.insert(id, category);
        self.persist_categories().await;
        self.notifier.submit();
        Ok(id)
    }

    /// Declares `subcategory_id` a child of an existing category.
    pub async fn add_subcategory_link(
        &mut self,
        subcategory_id: Uuid,
        category_id: Uuid,
    ) -> ResultLedger<()> {
        if self.state.category(&category_id).is_none() {
            return Err(LedgerError::CategoryNotFound(category_id.to_string()));
        }
        let link = SubcategoryLink {
            subcategory_id,
            category_id,
        };
        if !self.state.subcategory_links.contains(&link) {
            self.state.subcategory_links.push(link);
        }
        self.persist_categories().await;
        self.notifier.submit();
        Ok(())
    }
}
