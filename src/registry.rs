//! Editable-element registry and point lookup

use crate::page::{NodeId, PageTree};
use std::collections::BTreeMap;
use tracing::debug;

/// Index of input-capable elements keyed by stable-or-synthetic id.
///
/// Entries are created on scan and never explicitly removed; stale ids
/// are tolerated because every lookup re-validates against the live
/// tree (arena liveness plus bounding-rect checks).
#[derive(Debug, Default)]
pub struct EditableRegistry {
    entries: BTreeMap<String, NodeId>,
    next_synthetic: u64,
}

impl EditableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every input, textarea, and selection control, assigning a
    /// synthetic id to any element without one. Safe to re-invoke after
    /// the tree changes.
    pub fn scan(&mut self, page: &mut PageTree) {
        for node in page.walk() {
            let Some(el) = page.element(node) else {
                continue;
            };
            if !el.is_editable() {
                continue;
            }
            let id = match &el.id {
                Some(id) => id.clone(),
                None => {
                    self.next_synthetic += 1;
                    let synthetic = format!("_uir{}", self.next_synthetic);
                    if let Some(el) = page.element_mut(node) {
                        el.id = Some(synthetic.clone());
                    }
                    synthetic
                }
            };
            self.entries.insert(id, node);
        }
        debug!(count = self.entries.len(), "indexed editable elements");
    }

    pub fn get(&self, id: &str) -> Option<NodeId> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Topmost enabled editable element whose bounds contain the point,
    /// by resolved stacking order.
    pub fn element_at_point(&self, page: &PageTree, x: f64, y: f64) -> Option<NodeId> {
        let mut target = None;
        let mut max_order = -1i64;

        for &node in self.entries.values() {
            let Some(el) = page.element(node) else {
                continue; // stale entry, element is gone
            };
            if el.disabled || !el.bounds.contains(x, y) {
                continue;
            }
            let order = stacking_order(page, node);
            if order > max_order {
                target = Some(node);
                max_order = order;
            }
        }

        target
    }
}

/// An element's own numeric z-index if it has one, else the nearest
/// ancestor's; -1 when nothing in the chain resolves.
fn stacking_order(page: &PageTree, node: NodeId) -> i64 {
    let Some(el) = page.element(node) else {
        return -1;
    };
    if let Some(z) = el.styles.get("z-index").and_then(|v| v.parse::<i64>().ok()) {
        return z;
    }
    match page.parent(node) {
        Some(parent) => stacking_order(page, parent),
        None => -1,
    }
}
