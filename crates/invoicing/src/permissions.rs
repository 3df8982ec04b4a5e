use forgeerp_auth::Permission;

pub const INVOICE_READ: Permission = Permission::from_static("invoicing.invoice.read");
pub const INVOICE_WRITE: Permission = Permission::from_static("invoicing.invoice.write");
