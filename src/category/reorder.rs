//! Drag-and-drop reordering of the two-level category tree.
//!
//! The tree is kept as a flat arena of [`Category`] records; sibling groups are
//! recovered through a `parent_id -> [arena index]` map rebuilt for every move.
//! Nothing here touches the database: callers load one type's categories, call
//! [`reorder`], and persist whatever [`changed_placements`] reports.

use std::collections::HashMap;

use uuid::Uuid;

use super::models::{Category, CategoryPlacement, DropIntent};

/// A single drop gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMove {
    pub dragged_id: Uuid,
    /// `None` means the category was dropped on the background.
    pub target_id: Option<Uuid>,
    pub intent: DropIntent,
}

/// Arena indices grouped by parent, each group ordered by `sort_order`.
struct SiblingIndex {
    groups: HashMap<Option<Uuid>, Vec<usize>>,
}

impl SiblingIndex {
    fn build(categories: &[Category]) -> Self {
        let mut groups: HashMap<Option<Uuid>, Vec<usize>> = HashMap::new();
        for (ix, category) in categories.iter().enumerate() {
            groups.entry(category.parent_id).or_default().push(ix);
        }
        // Stable sort: duplicate sort orders keep their arena order.
        for members in groups.values_mut() {
            members.sort_by_key(|&ix| categories[ix].sort_order);
        }
        Self { groups }
    }

    /// Members of a group, minus the excluded arena index.
    fn group_without(&self, parent_id: Option<Uuid>, excluded: usize) -> Vec<usize> {
        self.groups
            .get(&parent_id)
            .map(|members| members.iter().copied().filter(|&ix| ix != excluded).collect())
            .unwrap_or_default()
    }

    fn has_children(&self, id: Uuid) -> bool {
        self.groups
            .get(&Some(id))
            .is_some_and(|members| !members.is_empty())
    }
}

enum Slot {
    End,
    Before(usize),
    After(usize),
}

/// Apply a move and return the full collection with updated `parent_id` and
/// `sort_order` values. The output keeps the input order. Moves that make no
/// sense (self-drop, unknown ids, a drop that would nest deeper than two
/// levels, a target of the other type) return the input unchanged.
pub fn reorder(categories: &[Category], mv: &CategoryMove) -> Vec<Category> {
    let mut result = categories.to_vec();

    if let Some(assignments) = plan(categories, mv) {
        for (ix, parent_id, sort_order) in assignments {
            result[ix].parent_id = parent_id;
            result[ix].sort_order = sort_order;
        }
    }

    result
}

/// Placements that differ between two snapshots of the same arena.
pub fn changed_placements(before: &[Category], after: &[Category]) -> Vec<CategoryPlacement> {
    before
        .iter()
        .zip(after)
        .filter(|(old, new)| {
            old.id == new.id
                && (old.parent_id != new.parent_id || old.sort_order != new.sort_order)
        })
        .map(|(_, new)| CategoryPlacement {
            id: new.id,
            parent_id: new.parent_id,
            sort_order: new.sort_order,
        })
        .collect()
}

fn plan(categories: &[Category], mv: &CategoryMove) -> Option<Vec<(usize, Option<Uuid>, i32)>> {
    let position = |id: Uuid| categories.iter().position(|c| c.id == id);

    let dragged_ix = position(mv.dragged_id)?;
    let dragged = &categories[dragged_ix];
    let index = SiblingIndex::build(categories);

    let (dest_parent, slot) = match mv.target_id {
        None => {
            if dragged.is_top_level() {
                return None;
            }
            (None, Slot::End)
        }
        Some(target_id) => {
            if target_id == mv.dragged_id {
                return None;
            }
            let target_ix = position(target_id)?;
            let target = &categories[target_ix];
            if target.parent_id == Some(mv.dragged_id) || target.get_type() != dragged.get_type()
            {
                return None;
            }

            match mv.intent.for_target(target.is_top_level()) {
                DropIntent::Inside => (Some(target.id), Slot::End),
                DropIntent::Before => (target.parent_id, Slot::Before(target_ix)),
                DropIntent::After => (target.parent_id, Slot::After(target_ix)),
            }
        }
    };

    // A category with children can only live at the top level.
    if dest_parent.is_some() && index.has_children(mv.dragged_id) {
        return None;
    }

    // Excise first, then locate the target, so a forward move within the
    // same group does not land one slot too far.
    let mut dest = index.group_without(dest_parent, dragged_ix);
    let insert_at = match slot {
        Slot::End => dest.len(),
        Slot::Before(target_ix) => dest.iter().position(|&ix| ix == target_ix)?,
        Slot::After(target_ix) => dest.iter().position(|&ix| ix == target_ix)? + 1,
    };
    dest.insert(insert_at, dragged_ix);

    let mut assignments = renumber(&dest, dest_parent);

    if dragged.parent_id != dest_parent {
        let source = index.group_without(dragged.parent_id, dragged_ix);
        assignments.extend(renumber(&source, dragged.parent_id));
    }

    Some(assignments)
}

fn renumber(members: &[usize], parent_id: Option<Uuid>) -> Vec<(usize, Option<Uuid>, i32)> {
    members
        .iter()
        .enumerate()
        .map(|(position, &ix)| (ix, parent_id, position as i32))
        .collect()
}
