//! Defaults applied when duplicating invoices.

use std::collections::BTreeMap;

/// What a copy does with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyValue {
    /// Carry the original's value over.
    Keep,
    /// Reset the field on the copy.
    Clear,
}

/// Per-field copy defaults, keyed by field name.
///
/// Values set by the caller win over those extensions add with
/// [`CopyDefaults::set_default`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyDefaults {
    values: BTreeMap<String, CopyValue>,
}

impl CopyDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: CopyValue) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: CopyValue) {
        self.values.insert(field.into(), value);
    }

    /// Set `field` only if nobody set it yet.
    pub fn set_default(&mut self, field: impl Into<String>, value: CopyValue) {
        self.values.entry(field.into()).or_insert(value);
    }

    pub fn get(&self, field: &str) -> Option<CopyValue> {
        self.values.get(field).copied()
    }

    pub fn clears(&self, field: &str) -> bool {
        self.get(field) == Some(CopyValue::Clear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_default_does_not_override_caller() {
        let mut defaults = CopyDefaults::new().with("sales", CopyValue::Keep);
        defaults.set_default("sales", CopyValue::Clear);
        defaults.set_default("description", CopyValue::Clear);
        assert_eq!(defaults.get("sales"), Some(CopyValue::Keep));
        assert!(defaults.clears("description"));
        assert!(!defaults.clears("lines.origin"));
    }
}
