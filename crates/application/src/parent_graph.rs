use std::collections::{HashMap, HashSet};

use formloom_domain::FieldDefinition;

/// Read-only view of the parent links stored in a flat field list.
///
/// The first occurrence of an identifier owns it; later duplicates take no part
/// in parent resolution.
pub(crate) struct ParentGraph<'a> {
    fields: &'a [FieldDefinition],
    positions: HashMap<&'a str, usize>,
    duplicates: Vec<usize>,
}

impl<'a> ParentGraph<'a> {
    pub(crate) fn new(fields: &'a [FieldDefinition]) -> Self {
        let mut positions = HashMap::with_capacity(fields.len());
        let mut duplicates = Vec::new();
        for (position, field) in fields.iter().enumerate() {
            if positions.contains_key(field.id()) {
                duplicates.push(position);
            } else {
                positions.insert(field.id(), position);
            }
        }

        Self {
            fields,
            positions,
            duplicates,
        }
    }

    /// Positions whose identifier was already taken by an earlier field.
    pub(crate) fn duplicates(&self) -> &[usize] {
        &self.duplicates
    }

    pub(crate) fn is_duplicate(&self, position: usize) -> bool {
        self.positions.get(self.fields[position].id()) != Some(&position)
    }

    /// Positions of the fields that own their identifier, in input order.
    pub(crate) fn owners(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.fields.len()).filter(|position| !self.is_duplicate(*position))
    }

    pub(crate) fn position_of(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Resolved parent position of an owning field.
    pub(crate) fn parent_of(&self, position: usize) -> Option<usize> {
        if self.is_duplicate(position) {
            return None;
        }
        self.fields[position]
            .parent_id()
            .and_then(|parent_id| self.position_of(parent_id))
    }

    /// Whether the field names a parent that is not in the list.
    pub(crate) fn has_missing_parent(&self, position: usize) -> bool {
        !self.is_duplicate(position)
            && self.fields[position]
                .parent_id()
                .is_some_and(|parent_id| self.position_of(parent_id).is_none())
    }

    /// Positions of every field that is its own ancestor through resolved links.
    pub(crate) fn cycle_members(&self) -> HashSet<usize> {
        let links: Vec<Option<usize>> = (0..self.fields.len())
            .map(|position| self.parent_of(position))
            .collect();
        self.owners()
            .filter(|position| is_on_cycle(&links, *position))
            .collect()
    }

    /// Identifiers along the cycle starting at `position`, ending with the start again.
    pub(crate) fn cycle_path(&self, position: usize) -> String {
        let mut path = vec![self.fields[position].id()];
        let mut current = self.parent_of(position);
        while let Some(next) = current {
            path.push(self.fields[next].id());
            if next == position || path.len() > self.fields.len() {
                break;
            }
            current = self.parent_of(next);
        }
        path.join(" -> ")
    }
}

/// Whether following `links` from `start` leads back to `start`.
pub(crate) fn is_on_cycle(links: &[Option<usize>], start: usize) -> bool {
    let mut current = links[start];
    let mut steps = 0;
    while let Some(next) = current {
        if next == start {
            return true;
        }
        steps += 1;
        if steps > links.len() {
            return false;
        }
        current = links[next];
    }
    false
}
