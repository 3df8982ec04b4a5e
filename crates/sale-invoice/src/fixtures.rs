//! Shared test setup: in-memory sales and invoices wired through the extension.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use forgeerp_auth::AccessContext;
use forgeerp_core::{DomainResult, InvoiceId, SaleId, SaleLineId, UserId};
use forgeerp_infra::store::{InMemoryInvoiceRepository, InMemorySaleRepository};
use forgeerp_invoicing::permissions::{INVOICE_READ, INVOICE_WRITE};
use forgeerp_invoicing::{
    Invoice, InvoiceLine, InvoiceRepository, InvoiceService, InvoiceState, Origin,
};
use forgeerp_sales::permissions::SALE_READ;
use forgeerp_sales::{SaleLine, SaleOrder, SaleRepository};

use crate::SaleInvoiceExtension;

/// Sale store that counts writes, so tests can tell how often sales were processed.
#[derive(Default)]
pub struct CountingSales {
    inner: InMemorySaleRepository,
    saves: AtomicUsize,
}

impl CountingSales {
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.saves.store(0, Ordering::SeqCst);
    }
}

impl SaleRepository for CountingSales {
    fn get(&self, ids: &[SaleId]) -> DomainResult<Vec<SaleOrder>> {
        self.inner.get(ids)
    }

    fn find_by_invoices(&self, invoices: &[InvoiceId]) -> DomainResult<Vec<SaleOrder>> {
        self.inner.find_by_invoices(invoices)
    }

    fn lines(&self, ids: &[SaleLineId]) -> DomainResult<Vec<SaleLine>> {
        self.inner.lines(ids)
    }

    fn save(&self, sales: Vec<SaleOrder>) -> DomainResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(sales)
    }
}

pub type Extension = SaleInvoiceExtension<Arc<CountingSales>, Arc<InMemoryInvoiceRepository>>;

pub struct World {
    pub sales: Arc<CountingSales>,
    pub invoices: Arc<InMemoryInvoiceRepository>,
    pub extension: Arc<Extension>,
    pub service: InvoiceService<Arc<InMemoryInvoiceRepository>>,
}

impl World {
    pub fn new() -> Self {
        let sales = Arc::new(CountingSales::default());
        let invoices = Arc::new(InMemoryInvoiceRepository::new());
        let extension = Arc::new(SaleInvoiceExtension::new(sales.clone(), invoices.clone()));
        let service = InvoiceService::new(invoices.clone()).with_extension(extension.clone());
        Self {
            sales,
            invoices,
            extension,
            service,
        }
    }

    /// A user who may work on invoices but has no access to sales.
    pub fn clerk(&self) -> AccessContext {
        AccessContext::new(UserId::new(), [INVOICE_READ, INVOICE_WRITE])
    }

    /// Invoice user who may also read sales.
    pub fn accountant(&self) -> AccessContext {
        AccessContext::new(UserId::new(), [INVOICE_READ, INVOICE_WRITE, SALE_READ])
    }

    pub fn confirmed_sale(&self, number: &str, lines: usize) -> SaleId {
        let mut sale = SaleOrder::new(SaleId::new(), number);
        for n in 0..lines.max(1) {
            sale.add_line(format!("Item {n}"), 1, 100).unwrap();
        }
        sale.quote().unwrap();
        sale.confirm().unwrap();
        let id = sale.id_typed();
        self.sales.save(vec![sale]).unwrap();
        self.sales.reset();
        id
    }

    pub fn sale(&self, id: SaleId) -> SaleOrder {
        self.sales.get(&[id]).unwrap().remove(0)
    }

    pub fn update_sale(&self, id: SaleId, change: impl FnOnce(&mut SaleOrder)) {
        let mut sale = self.sale(id);
        change(&mut sale);
        self.sales.save(vec![sale]).unwrap();
        self.sales.reset();
    }

    pub fn line_ids(&self, sale: SaleId) -> Vec<SaleLineId> {
        self.sale(sale).lines().iter().map(|l| l.id).collect()
    }

    /// Invoice billing the given sale lines, attached to their sales.
    pub fn invoice_from(&self, sale_lines: &[SaleLineId]) -> InvoiceId {
        let lines = sale_lines
            .iter()
            .map(|l| InvoiceLine::new("Billed", 1, 100).with_origin(Origin::SaleLine(*l)))
            .collect();
        let id = self
            .service
            .create(&AccessContext::system(), None, lines)
            .unwrap();

        let parents: BTreeSet<SaleId> = self
            .sales
            .lines(sale_lines)
            .unwrap()
            .iter()
            .map(|l| l.sale)
            .collect();
        for sale in parents {
            self.update_sale(sale, |s| s.attach_invoice(id).unwrap());
        }
        id
    }

    /// Invoice with no sale behind it.
    pub fn manual_invoice(&self) -> InvoiceId {
        self.service
            .create(
                &AccessContext::system(),
                None,
                vec![InvoiceLine::new("Manual", 1, 100)],
            )
            .unwrap()
    }

    pub fn invoice(&self, id: InvoiceId) -> Invoice {
        self.invoices.get(&[id]).unwrap().remove(0)
    }

    pub fn state(&self, id: InvoiceId) -> InvoiceState {
        self.invoice(id).state()
    }
}
