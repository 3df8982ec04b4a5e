//! Values of computed invoice fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Selection key; the empty string is the "unset" choice.
    Selection(String),
    /// Related record ids of a to-many field.
    Many(Vec<Uuid>),
}
