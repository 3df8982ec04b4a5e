//! Reverse lookup from invoice lines to the sales they came from.

use std::collections::{BTreeSet, HashMap, HashSet};

use forgeerp_core::{SaleId, SaleLineId};
use forgeerp_invoicing::{Invoice, Origin};

/// Distinct sale lines referenced by `invoices`, in first-seen order.
pub fn sale_line_ids(invoices: &[Invoice]) -> Vec<SaleLineId> {
    let mut seen = HashSet::new();
    invoices
        .iter()
        .flat_map(|i| i.lines())
        .filter_map(|line| match line.origin {
            Some(Origin::SaleLine(sale_line)) => Some(sale_line),
            Some(Origin::InvoiceLine(_)) | None => None,
        })
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Parent sales of the invoice's sale line origins, distinct and sorted.
///
/// `parents` maps sale lines to their sale; lines missing from it are skipped.
pub fn sales_of(invoice: &Invoice, parents: &HashMap<SaleLineId, SaleId>) -> Vec<SaleId> {
    let mut sales = BTreeSet::new();
    for line in invoice.lines() {
        let Some(Origin::SaleLine(sale_line)) = line.origin else {
            continue;
        };
        match parents.get(&sale_line) {
            Some(sale) => {
                sales.insert(*sale);
            }
            None => tracing::warn!(
                invoice = %invoice.id_typed(),
                sale_line = %sale_line,
                "invoice line references an unknown sale line"
            ),
        }
    }
    sales.into_iter().collect()
}
