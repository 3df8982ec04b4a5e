//! Search domains over invoices.
//!
//! A [`Domain`] is a boolean tree of [`Clause`]s. Clause fields are dotted
//! paths; paths into `lines` are one-to-many and match when any line matches.
//! A line without a value for the path never matches, negative operators
//! included (SQL `NULL` semantics).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use forgeerp_core::{DomainError, DomainResult};

use crate::{Invoice, Origin};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,
}

impl Operator {
    pub fn is_negative(&self) -> bool {
        matches!(self, Operator::NotEq | Operator::NotIn)
    }

    /// The operator with negation removed (`!=` → `=`, `not in` → `in`).
    pub fn positive(&self) -> Operator {
        match self {
            Operator::NotEq => Operator::Eq,
            Operator::NotIn => Operator::In,
            other => *other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchValue {
    Id(Uuid),
    Text(String),
}

impl From<Uuid> for SearchValue {
    fn from(value: Uuid) -> Self {
        SearchValue::Id(value)
    }
}

impl From<&str> for SearchValue {
    fn from(value: &str) -> Self {
        SearchValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operand {
    One(SearchValue),
    Many(Vec<SearchValue>),
}

impl Operand {
    pub fn contains(&self, value: &SearchValue) -> bool {
        match self {
            Operand::One(v) => v == value,
            Operand::Many(vs) => vs.contains(value),
        }
    }
}

/// `(field, operator, operand[, target model])`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    pub field: String,
    pub operator: Operator,
    pub operand: Operand,
    /// For reference paths: only follow references to this model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_model: Option<String>,
}

impl Clause {
    pub fn new(field: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Self {
            field: field.into(),
            operator,
            operand,
            target_model: None,
        }
    }

    pub fn with_target_model(mut self, model: impl Into<String>) -> Self {
        self.target_model = Some(model.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Clause(Clause),
    And(Vec<Domain>),
    Or(Vec<Domain>),
    Not(Box<Domain>),
}

/// Resolves fields of the record an origin points at (e.g. `sale` of a sale line).
pub trait OriginResolver {
    fn resolve(&self, origin: &Origin, field: &str) -> DomainResult<Option<SearchValue>>;
}

/// Resolver that knows no origin fields.
pub struct NoResolver;

impl OriginResolver for NoResolver {
    fn resolve(&self, _origin: &Origin, _field: &str) -> DomainResult<Option<SearchValue>> {
        Ok(None)
    }
}

impl Domain {
    pub fn clause(field: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Domain::Clause(Clause::new(field, operator, operand))
    }

    pub fn not(inner: Domain) -> Self {
        Domain::Not(Box::new(inner))
    }

    /// Replace clauses for which `rewrite` returns a domain, at any depth.
    pub fn rewrite(&self, rewrite: &dyn Fn(&Clause) -> Option<Domain>) -> Domain {
        match self {
            Domain::Clause(c) => rewrite(c).unwrap_or_else(|| Domain::Clause(c.clone())),
            Domain::And(ds) => Domain::And(ds.iter().map(|d| d.rewrite(rewrite)).collect()),
            Domain::Or(ds) => Domain::Or(ds.iter().map(|d| d.rewrite(rewrite)).collect()),
            Domain::Not(d) => Domain::not(d.rewrite(rewrite)),
        }
    }

    pub fn matches(&self, invoice: &Invoice, resolver: &dyn OriginResolver) -> DomainResult<bool> {
        match self {
            Domain::Clause(c) => c.matches(invoice, resolver),
            Domain::And(ds) => {
                for d in ds {
                    if !d.matches(invoice, resolver)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Domain::Or(ds) => {
                for d in ds {
                    if d.matches(invoice, resolver)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Domain::Not(d) => Ok(!d.matches(invoice, resolver)?),
        }
    }
}

impl Clause {
    pub fn matches(&self, invoice: &Invoice, resolver: &dyn OriginResolver) -> DomainResult<bool> {
        let values = self.values(invoice, resolver)?;
        let negative = self.operator.is_negative();
        Ok(values
            .iter()
            .any(|v| self.operand.contains(v) != negative))
    }

    fn values(
        &self,
        invoice: &Invoice,
        resolver: &dyn OriginResolver,
    ) -> DomainResult<Vec<SearchValue>> {
        let path: Vec<&str> = self.field.split('.').collect();
        match path.as_slice() {
            ["id"] => Ok(vec![SearchValue::Id(*invoice.id_typed().as_uuid())]),
            ["state"] => Ok(vec![SearchValue::from(invoice.state().as_str())]),
            ["lines", "origin"] => Ok(self
                .origins(invoice)
                .map(|o| SearchValue::Text(o.to_reference()))
                .collect()),
            ["lines", "origin", field] => {
                let mut values = Vec::new();
                for origin in self.origins(invoice) {
                    if let Some(v) = resolver.resolve(origin, field)? {
                        values.push(v);
                    }
                }
                Ok(values)
            }
            _ => Err(DomainError::validation(format!(
                "unknown search field '{}'",
                self.field
            ))),
        }
    }

    fn origins<'a>(&'a self, invoice: &'a Invoice) -> impl Iterator<Item = &'a Origin> + 'a {
        invoice
            .lines()
            .iter()
            .filter_map(|l| l.origin.as_ref())
            .filter(|o| {
                self.target_model
                    .as_deref()
                    .is_none_or(|model| o.model() == model)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forgeerp_core::{InvoiceId, InvoiceLineId, SaleLineId};

    use crate::InvoiceLine;

    fn invoice_with(lines: Vec<InvoiceLine>) -> Invoice {
        Invoice::draft(InvoiceId::new(), None, lines).unwrap()
    }

    #[test]
    fn state_clause_matches_current_state() {
        let invoice = invoice_with(vec![]);
        let draft = Domain::clause("state", Operator::Eq, Operand::One("draft".into()));
        let not_draft = Domain::clause("state", Operator::NotEq, Operand::One("draft".into()));
        assert!(draft.matches(&invoice, &NoResolver).unwrap());
        assert!(!not_draft.matches(&invoice, &NoResolver).unwrap());
    }

    #[test]
    fn one_to_many_path_matches_any_line() {
        let origin = Origin::SaleLine(SaleLineId::new());
        let invoice = invoice_with(vec![
            InvoiceLine::new("A", 1, 1),
            InvoiceLine::new("B", 1, 1).with_origin(origin),
        ]);
        let domain = Domain::clause(
            "lines.origin",
            Operator::In,
            Operand::Many(vec![SearchValue::Text(origin.to_reference())]),
        );
        assert!(domain.matches(&invoice, &NoResolver).unwrap());
    }

    #[test]
    fn lines_without_value_never_match() {
        let invoice = invoice_with(vec![InvoiceLine::new("A", 1, 1)]);
        let domain = Domain::clause(
            "lines.origin",
            Operator::NotEq,
            Operand::One("sale.line,x".into()),
        );
        assert!(!domain.matches(&invoice, &NoResolver).unwrap());
    }

    #[test]
    fn target_model_filters_references() {
        let credit = Origin::InvoiceLine(InvoiceLineId::new());
        let invoice = invoice_with(vec![InvoiceLine::new("A", 1, 1).with_origin(credit)]);
        let clause = Clause::new(
            "lines.origin",
            Operator::Eq,
            Operand::One(SearchValue::Text(credit.to_reference())),
        );
        assert!(clause.matches(&invoice, &NoResolver).unwrap());
        let typed = clause.with_target_model(Origin::SALE_LINE_MODEL);
        assert!(!typed.matches(&invoice, &NoResolver).unwrap());
    }

    #[test]
    fn unknown_field_is_a_validation_error() {
        let invoice = invoice_with(vec![]);
        let domain = Domain::clause("party", Operator::Eq, Operand::One("x".into()));
        assert!(matches!(
            domain.matches(&invoice, &NoResolver),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn boolean_operators_combine() {
        let invoice = invoice_with(vec![]);
        let yes = Domain::clause("state", Operator::Eq, Operand::One("draft".into()));
        let no = Domain::clause("state", Operator::Eq, Operand::One("paid".into()));
        assert!(!Domain::And(vec![yes.clone(), no.clone()]).matches(&invoice, &NoResolver).unwrap());
        assert!(Domain::Or(vec![no.clone(), yes]).matches(&invoice, &NoResolver).unwrap());
        assert!(Domain::not(no).matches(&invoice, &NoResolver).unwrap());
    }

    #[test]
    fn rewrite_reaches_nested_clauses() {
        let inner = Domain::clause("alias", Operator::Eq, Operand::One("draft".into()));
        let domain = Domain::not(Domain::And(vec![inner]));
        let rewritten = domain.rewrite(&|c| {
            (c.field == "alias").then(|| {
                Domain::Clause(Clause {
                    field: "state".to_string(),
                    ..c.clone()
                })
            })
        });
        let expected = Domain::not(Domain::And(vec![Domain::clause(
            "state",
            Operator::Eq,
            Operand::One("draft".into()),
        )]));
        assert_eq!(rewritten, expected);
    }

    #[test]
    fn operators_serialize_like_clause_syntax() {
        assert_eq!(serde_json::to_string(&Operator::NotIn).unwrap(), "\"not in\"");
    }
}
