use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use forgeerp_core::InvoiceId;
use forgeerp_sales::SaleOrder;

/// How the sales an invoice came from treat it after an exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleExceptionState {
    #[default]
    #[serde(rename = "")]
    None,
    Ignored,
    Recreated,
}

impl SaleExceptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleExceptionState::None => "",
            SaleExceptionState::Ignored => "ignored",
            SaleExceptionState::Recreated => "recreated",
        }
    }
}

/// Exception state of each invoice, given the sales linked to the batch.
///
/// Recreated wins over ignored; invoices in neither set get [`SaleExceptionState::None`].
pub fn exception_states(
    invoices: &[InvoiceId],
    sales: &[SaleOrder],
) -> HashMap<InvoiceId, SaleExceptionState> {
    let recreated: HashSet<InvoiceId> = sales
        .iter()
        .flat_map(|s| s.invoices_recreated().iter().copied())
        .collect();
    let ignored: HashSet<InvoiceId> = sales
        .iter()
        .flat_map(|s| s.invoices_ignored().iter().copied())
        .collect();

    invoices
        .iter()
        .map(|id| {
            let state = if recreated.contains(id) {
                SaleExceptionState::Recreated
            } else if ignored.contains(id) {
                SaleExceptionState::Ignored
            } else {
                SaleExceptionState::None
            };
            (*id, state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeerp_core::SaleId;

    fn sale_with(invoices: &[InvoiceId]) -> SaleOrder {
        let mut sale = SaleOrder::new(SaleId::new(), "S1");
        sale.add_line("Widget", 1, 100).unwrap();
        sale.quote().unwrap();
        sale.confirm().unwrap();
        for invoice in invoices {
            sale.attach_invoice(*invoice).unwrap();
        }
        sale
    }

    #[test]
    fn recreated_wins_over_ignored() {
        let (a, b, c) = (InvoiceId::new(), InvoiceId::new(), InvoiceId::new());
        let mut first = sale_with(&[a, b]);
        first.ignore_invoice(a).unwrap();
        first.ignore_invoice(b).unwrap();
        let mut second = sale_with(&[a]);
        second.recreate_invoice(a).unwrap();

        let states = exception_states(&[a, b, c], &[first, second]);
        assert_eq!(states[&a], SaleExceptionState::Recreated);
        assert_eq!(states[&b], SaleExceptionState::Ignored);
        assert_eq!(states[&c], SaleExceptionState::None);
    }

    #[test]
    fn no_sales_means_no_exception() {
        let a = InvoiceId::new();
        assert_eq!(exception_states(&[a], &[])[&a], SaleExceptionState::None);
    }

    #[test]
    fn serializes_empty_state_as_empty_string() {
        assert_eq!(serde_json::to_string(&SaleExceptionState::None).unwrap(), "\"\"");
        assert_eq!(
            serde_json::to_string(&SaleExceptionState::Recreated).unwrap(),
            "\"recreated\""
        );
    }
}
