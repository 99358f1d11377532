use serde::Serialize;

/// Accessor metadata for one field of a configuration record.
///
/// Generated by `#[derive(FieldSchema)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub readonly: bool,
    pub description: &'static str,
}
