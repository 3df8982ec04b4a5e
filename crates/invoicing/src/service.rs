//! Invoice operations with extension hooks.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use forgeerp_auth::AccessContext;
use forgeerp_core::{DomainError, DomainResult, InvoiceId};

use crate::permissions::{INVOICE_READ, INVOICE_WRITE};
use crate::{
    CopyDefaults, Domain, FieldValue, Invoice, InvoiceExtension, InvoiceLine, InvoiceOperation,
    InvoiceRepository, Origin, OriginResolver, SearchValue,
};

/// Base invoice behavior, composed with the registered extensions.
pub struct InvoiceService<R> {
    repo: R,
    extensions: Vec<Arc<dyn InvoiceExtension>>,
}

impl<R: InvoiceRepository> InvoiceService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            extensions: Vec::new(),
        }
    }

    /// Extensions wrap operations in registration order (first registered is outermost).
    pub fn register(&mut self, extension: Arc<dyn InvoiceExtension>) {
        tracing::debug!(extension = extension.name(), "invoice extension registered");
        self.extensions.push(extension);
    }

    pub fn with_extension(mut self, extension: Arc<dyn InvoiceExtension>) -> Self {
        self.register(extension);
        self
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Models that invoice line origins may reference.
    pub fn origin_models(&self) -> Vec<&'static str> {
        let mut models = vec![Origin::INVOICE_LINE_MODEL];
        for ext in &self.extensions {
            models.extend_from_slice(ext.origin_models());
        }
        models
    }

    #[instrument(skip_all, fields(lines = lines.len()))]
    pub fn create(
        &self,
        ctx: &AccessContext,
        description: Option<String>,
        lines: Vec<InvoiceLine>,
    ) -> DomainResult<InvoiceId> {
        ctx.check(&INVOICE_WRITE)?;

        let allowed = self.origin_models();
        for origin in lines.iter().filter_map(|l| l.origin.as_ref()) {
            if !allowed.contains(&origin.model()) {
                return Err(DomainError::validation(format!(
                    "origin model '{}' is not allowed on invoice lines",
                    origin.model()
                )));
            }
        }

        let invoice = Invoice::draft(InvoiceId::new(), description, lines)?;
        let id = invoice.id_typed();
        self.repo.save(vec![invoice])?;
        tracing::info!(invoice = %id, "invoice created");
        Ok(id)
    }

    pub fn browse(&self, ctx: &AccessContext, ids: &[InvoiceId]) -> DomainResult<Vec<Invoice>> {
        ctx.check(&INVOICE_READ)?;
        self.repo.get(ids)
    }

    /// Duplicate invoices as new drafts. Returns the copies' ids in order.
    #[instrument(skip_all, fields(invoices = ids.len()))]
    pub fn copy(
        &self,
        ctx: &AccessContext,
        ids: &[InvoiceId],
        mut defaults: CopyDefaults,
    ) -> DomainResult<Vec<InvoiceId>> {
        ctx.check(&INVOICE_WRITE)?;
        for ext in &self.extensions {
            ext.copy_defaults(&mut defaults);
        }

        let originals = self.repo.get(ids)?;
        let mut copies = Vec::with_capacity(originals.len());
        for original in &originals {
            let mut copy = original.duplicate(InvoiceId::new());
            if defaults.clears("lines.origin") {
                copy.retain_origins(|_| false);
            }
            if defaults.clears("description") {
                copy.clear_description();
            }
            for ext in &self.extensions {
                ext.finish_copy(&defaults, &mut copy);
            }
            copies.push(copy);
        }

        let new_ids: Vec<InvoiceId> = copies.iter().map(Invoice::id_typed).collect();
        self.repo.save(copies)?;
        Ok(new_ids)
    }

    pub fn validate_invoice(&self, ctx: &AccessContext, ids: &[InvoiceId]) -> DomainResult<()> {
        self.transition(ctx, InvoiceOperation::Validate, ids)
    }

    pub fn post(&self, ctx: &AccessContext, ids: &[InvoiceId]) -> DomainResult<()> {
        self.transition(ctx, InvoiceOperation::Post, ids)
    }

    pub fn paid(&self, ctx: &AccessContext, ids: &[InvoiceId]) -> DomainResult<()> {
        self.transition(ctx, InvoiceOperation::Paid, ids)
    }

    pub fn cancel(&self, ctx: &AccessContext, ids: &[InvoiceId]) -> DomainResult<()> {
        self.transition(ctx, InvoiceOperation::Cancel, ids)
    }

    /// Reset to draft.
    pub fn draft(&self, ctx: &AccessContext, ids: &[InvoiceId]) -> DomainResult<()> {
        self.transition(ctx, InvoiceOperation::Draft, ids)
    }

    /// Delete draft or cancelled invoices. One other invoice rejects the batch.
    #[instrument(skip_all, fields(invoices = ids.len()))]
    pub fn delete(&self, ctx: &AccessContext, ids: &[InvoiceId]) -> DomainResult<()> {
        ctx.check(&INVOICE_WRITE)?;
        let invoices = self.repo.get(ids)?;

        self.wrapped(ctx, InvoiceOperation::Delete, &invoices, &mut || {
            if let Some(blocking) = invoices.iter().find(|i| !i.can(InvoiceOperation::Delete)) {
                tracing::debug!(invoice = %blocking.id_typed(), state = %blocking.state(), "delete refused");
                return Err(DomainError::validation(
                    "invoice must be cancelled or draft before deletion",
                ));
            }
            for ext in &self.extensions {
                ext.check_operation(ctx, InvoiceOperation::Delete, &invoices)?;
            }
            self.repo.remove(ids)?;
            tracing::info!(count = ids.len(), "invoices deleted");
            Ok(())
        })
    }

    /// Search invoices; clauses on extension fields are rewritten first.
    pub fn search(&self, ctx: &AccessContext, domain: &Domain) -> DomainResult<Vec<InvoiceId>> {
        ctx.check(&INVOICE_READ)?;
        let rewritten = domain.rewrite(&|clause| {
            self.extensions
                .iter()
                .find_map(|ext| ext.rewrite_clause(clause))
        });
        let resolver = ExtensionResolver {
            ctx,
            extensions: &self.extensions,
        };
        self.repo.search(&rewritten, &resolver)
    }

    /// Read a stored or computed field for each invoice, in the order of `ids`.
    pub fn read_field(
        &self,
        ctx: &AccessContext,
        ids: &[InvoiceId],
        field: &str,
    ) -> DomainResult<Vec<(InvoiceId, FieldValue)>> {
        ctx.check(&INVOICE_READ)?;
        let invoices = self.repo.get(ids)?;

        if field == "state" {
            return Ok(invoices
                .iter()
                .map(|i| (i.id_typed(), FieldValue::Selection(i.state().as_str().to_string())))
                .collect());
        }

        for ext in &self.extensions {
            if let Some(values) = ext.read_field(ctx, field, &invoices) {
                return values;
            }
        }
        Err(DomainError::validation(format!("unknown invoice field '{field}'")))
    }

    /// Human-readable label of a line's origin.
    pub fn origin_name(&self, ctx: &AccessContext, line: &InvoiceLine) -> DomainResult<Option<String>> {
        ctx.check(&INVOICE_READ)?;
        let Some(origin) = &line.origin else {
            return Ok(None);
        };

        for ext in &self.extensions {
            if let Some(name) = ext.origin_name(ctx, origin)? {
                return Ok(Some(name));
            }
        }
        Ok(Some(origin.to_reference()))
    }

    #[instrument(skip(self, ctx, ids), fields(invoices = ids.len()))]
    fn transition(
        &self,
        ctx: &AccessContext,
        operation: InvoiceOperation,
        ids: &[InvoiceId],
    ) -> DomainResult<()> {
        ctx.check(&INVOICE_WRITE)?;
        let invoices = self.repo.get(ids)?;
        self.wrapped(ctx, operation, &invoices, &mut || {
            self.apply_transition(ctx, operation, &invoices)
        })
    }

    /// Base transition: invoices whose state does not allow it are left as they are.
    fn apply_transition(
        &self,
        ctx: &AccessContext,
        operation: InvoiceOperation,
        invoices: &[Invoice],
    ) -> DomainResult<()> {
        let (mut eligible, skipped): (Vec<Invoice>, Vec<Invoice>) =
            invoices.iter().cloned().partition(|i| i.can(operation));
        for invoice in &skipped {
            tracing::debug!(
                invoice = %invoice.id_typed(),
                state = %invoice.state(),
                ?operation,
                "transition not allowed, skipped"
            );
        }
        if eligible.is_empty() {
            return Ok(());
        }

        for ext in &self.extensions {
            ext.check_operation(ctx, operation, &eligible)?;
        }

        let now = Utc::now();
        for invoice in &mut eligible {
            invoice.transition(operation, now);
        }
        let count = eligible.len();
        self.repo.save(eligible)?;
        tracing::info!(count, ?operation, "invoices transitioned");
        Ok(())
    }

    fn wrapped(
        &self,
        ctx: &AccessContext,
        operation: InvoiceOperation,
        invoices: &[Invoice],
        base: &mut dyn FnMut() -> DomainResult<()>,
    ) -> DomainResult<()> {
        chain(&self.extensions, ctx, operation, invoices, base)
    }
}

fn chain(
    extensions: &[Arc<dyn InvoiceExtension>],
    ctx: &AccessContext,
    operation: InvoiceOperation,
    invoices: &[Invoice],
    base: &mut dyn FnMut() -> DomainResult<()>,
) -> DomainResult<()> {
    match extensions.split_first() {
        None => base(),
        Some((first, rest)) => first.around(ctx, operation, invoices, &mut || {
            chain(rest, ctx, operation, invoices, &mut *base)
        }),
    }
}

struct ExtensionResolver<'a> {
    ctx: &'a AccessContext,
    extensions: &'a [Arc<dyn InvoiceExtension>],
}

impl OriginResolver for ExtensionResolver<'_> {
    fn resolve(&self, origin: &Origin, field: &str) -> DomainResult<Option<SearchValue>> {
        for ext in self.extensions {
            if let Some(value) = ext.resolve_origin_field(self.ctx, origin, field)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}
