//! Search on the computed `sales` field.
//!
//! `sales` is not stored, so clauses on it are rewritten onto the sale lines
//! referenced by invoice line origins.

use forgeerp_invoicing::{Clause, Domain, Origin};

use crate::SALES_FIELD;

/// Path the `sales` field is searched through.
pub const SALE_PATH: &str = "lines.origin.sale";

/// Rewrite a clause on `sales`; other clauses are left alone (`None`).
///
/// Negative operators negate the positive lookup, so `sales != S` holds for
/// invoices none of whose lines came from `S`, including invoices with no sale
/// at all.
pub fn translate_sales_clause(clause: &Clause) -> Option<Domain> {
    if clause.field != SALES_FIELD {
        return None;
    }

    let translated = Domain::Clause(
        Clause::new(SALE_PATH, clause.operator.positive(), clause.operand.clone())
            .with_target_model(Origin::SALE_LINE_MODEL),
    );
    Some(if clause.operator.is_negative() {
        Domain::not(translated)
    } else {
        translated
    })
}
