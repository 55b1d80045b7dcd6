use std::fmt::Write;

use sha2::{Digest, Sha256};

use crate::field::FieldDefinition;

/// Computes the SHA-256 fingerprint of the structural parts of a field list.
///
/// Only identifier, parent, order, field type and relationship type take part, so
/// display-only edits keep the fingerprint stable. Input order does not matter.
#[must_use]
pub fn structural_fingerprint(fields: &[FieldDefinition]) -> String {
    let mut sorted: Vec<&FieldDefinition> = fields.iter().collect();
    sorted.sort_by(|left, right| left.id().cmp(right.id()));

    let mut hasher = Sha256::new();
    for field in sorted {
        hasher.update(field.id().as_bytes());
        hasher.update([0x1f]);
        hasher.update(field.parent_id().unwrap_or_default().as_bytes());
        hasher.update([0x1f]);
        hasher.update(field.order().to_be_bytes());
        hasher.update(field.field_type().as_str().as_bytes());
        hasher.update([0x1f]);
        hasher.update(
            field
                .relationship_type()
                .map(|relationship| relationship.as_str())
                .unwrap_or_default()
                .as_bytes(),
        );
        hasher.update([0x1e]);
    }

    hasher
        .finalize()
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}
