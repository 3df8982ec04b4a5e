use forgeerp_auth::Permission;

pub const SALE_READ: Permission = Permission::from_static("sales.sale.read");
pub const SALE_WRITE: Permission = Permission::from_static("sales.sale.write");
