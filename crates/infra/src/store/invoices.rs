use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use forgeerp_core::{DomainError, DomainResult, InvoiceId, InvoiceLineId};
use forgeerp_invoicing::{Domain, Invoice, InvoiceRepository, Origin, OriginResolver};

/// In-memory invoice store. Iteration (and so search results) follows id order.
#[derive(Debug, Default)]
pub struct InMemoryInvoiceRepository {
    inner: RwLock<BTreeMap<InvoiceId, Invoice>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, BTreeMap<InvoiceId, Invoice>>> {
        self.inner
            .read()
            .map_err(|_| DomainError::invariant("invoice store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, BTreeMap<InvoiceId, Invoice>>> {
        self.inner
            .write()
            .map_err(|_| DomainError::invariant("invoice store lock poisoned"))
    }
}

impl InvoiceRepository for InMemoryInvoiceRepository {
    fn get(&self, ids: &[InvoiceId]) -> DomainResult<Vec<Invoice>> {
        let map = self.read()?;
        ids.iter()
            .map(|id| {
                map.get(id)
                    .cloned()
                    .ok_or_else(|| DomainError::not_found(format!("invoice {id}")))
            })
            .collect()
    }

    fn find(&self, ids: &[InvoiceId]) -> DomainResult<Vec<Invoice>> {
        let map = self.read()?;
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    fn save(&self, invoices: Vec<Invoice>) -> DomainResult<()> {
        let mut map = self.write()?;
        for invoice in invoices {
            map.insert(invoice.id_typed(), invoice);
        }
        Ok(())
    }

    fn remove(&self, ids: &[InvoiceId]) -> DomainResult<()> {
        let mut map = self.write()?;
        for id in ids {
            map.remove(id);
        }
        Ok(())
    }

    fn set_line_origin(&self, line: InvoiceLineId, origin: Option<Origin>) -> DomainResult<bool> {
        let mut map = self.write()?;
        Ok(map
            .values_mut()
            .any(|invoice| invoice.set_line_origin(line, origin)))
    }

    fn search(
        &self,
        domain: &Domain,
        resolver: &dyn OriginResolver,
    ) -> DomainResult<Vec<InvoiceId>> {
        let map = self.read()?;
        let mut ids = Vec::new();
        for invoice in map.values() {
            if domain.matches(invoice, resolver)? {
                ids.push(invoice.id_typed());
            }
        }
        Ok(ids)
    }
}
