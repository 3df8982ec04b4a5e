use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

use forgeerp_core::{DomainError, DomainResult, InvoiceId, SaleId, SaleLineId};
use forgeerp_sales::{SaleLine, SaleOrder, SaleRepository};

/// In-memory sales order store.
#[derive(Debug, Default)]
pub struct InMemorySaleRepository {
    inner: RwLock<HashMap<SaleId, SaleOrder>>,
}

impl InMemorySaleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, HashMap<SaleId, SaleOrder>>> {
        self.inner
            .read()
            .map_err(|_| DomainError::invariant("sale store lock poisoned"))
    }
}

impl SaleRepository for InMemorySaleRepository {
    fn get(&self, ids: &[SaleId]) -> DomainResult<Vec<SaleOrder>> {
        let map = self.read()?;
        ids.iter()
            .map(|id| {
                map.get(id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found(format!("sale {id}")))
            })
            .collect()
    }

    fn find_by_invoices(&self, invoices: &[InvoiceId]) -> DomainResult<Vec<SaleOrder>> {
        let map = self.read()?;
        let mut found: Vec<SaleOrder> = map
            .values()
            .filter(|sale| invoices.iter().any(|i| sale.has_invoice(*i)))
            .cloned()
            .collect();
        found.sort_by_key(|s| s.id_typed());
        Ok(found)
    }

    fn lines(&self, ids: &[SaleLineId]) -> DomainResult<Vec<SaleLine>> {
        let map = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                map.values()
                    .find_map(|sale| sale.line(*id))
                    .cloned()
            })
            .collect())
    }

    fn save(&self, sales: Vec<SaleOrder>) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("sale store lock poisoned"))?;
        for sale in sales {
            map.insert(sale.id_typed(), sale);
        }
        Ok(())
    }
}
