//! Element location: structural paths, descriptor capture, and the
//! weighted fallback matcher
//!
//! Exact re-location goes through structural paths (fast, deterministic).
//! When a path no longer resolves because the tree drifted, the weighted
//! scorer degrades gracefully instead of failing outright.

use crate::element::ElementDescriptor;
use crate::error::{Error, Result};
use crate::page::{NodeId, PageTree};
use crate::path::{PathSegment, StructuralPath};
use std::collections::BTreeMap;
use tracing::debug;

const WEIGHT_ID: f64 = 100.0;
const WEIGHT_PATH: f64 = 90.0;
const WEIGHT_PROXIMITY: f64 = 80.0;
const WEIGHT_INPUT_TYPE: f64 = 70.0;
const WEIGHT_CLASS: f64 = 60.0;
const WEIGHT_TEXT: f64 = 50.0;
const WEIGHT_STYLE: f64 = 40.0;

/// Partial knowledge about a previously recorded element.
#[derive(Debug, Clone, Default)]
pub struct MatchCriteria {
    pub id: Option<String>,
    pub path: Option<String>,
    pub coordinates: Option<(f64, f64)>,
    pub input_type: Option<String>,
    pub classes: Option<Vec<String>>,
    pub text: Option<String>,
    pub styles: BTreeMap<String, String>,
}

impl MatchCriteria {
    pub fn from_descriptor(descriptor: &ElementDescriptor) -> Self {
        Self {
            id: descriptor.id.clone(),
            path: descriptor.path.clone(),
            coordinates: Some((descriptor.bounds.x, descriptor.bounds.y)),
            input_type: descriptor.input_type.clone(),
            classes: (!descriptor.classes.is_empty()).then(|| descriptor.classes.clone()),
            text: descriptor.text.clone(),
            styles: descriptor.styles.clone(),
        }
    }
}

pub struct Locator<'a> {
    page: &'a PageTree,
}

impl<'a> Locator<'a> {
    pub fn new(page: &'a PageTree) -> Self {
        Self { page }
    }

    /// Structural path for an element: id short-circuit, otherwise a
    /// root-to-element walk counting preceding same-tag siblings
    /// (1-based). A node with no chain to the document root has no path.
    pub fn compute_path(&self, node: NodeId) -> Option<StructuralPath> {
        let element = self.page.element(node)?;
        if let Some(id) = &element.id {
            return Some(StructuralPath::Id(id.clone()));
        }

        let mut segments = Vec::new();
        let mut current = node;
        loop {
            let tag = self.page.element(current)?.tag.clone();
            let index = match self.page.parent(current) {
                Some(parent) => {
                    let siblings = self.page.children(parent);
                    let pos = siblings.iter().position(|&s| s == current)?;
                    1 + siblings[..pos]
                        .iter()
                        .filter(|&&s| {
                            self.page.element(s).map(|e| e.tag == tag).unwrap_or(false)
                        })
                        .count()
                }
                None => 1,
            };
            segments.push(PathSegment { tag, index });
            match self.page.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        if current != self.page.root() {
            return None;
        }
        segments.reverse();
        Some(StructuralPath::Segments(segments))
    }

    /// First element satisfying the path against the current tree.
    pub fn resolve(&self, path: &StructuralPath) -> Option<NodeId> {
        match path {
            StructuralPath::Id(id) => self.page.find_by_id(id),
            StructuralPath::Segments(segments) => {
                let mut segs = segments.iter();
                let first = segs.next()?;
                let root = self.page.root();
                let root_el = self.page.element(root)?;
                if root_el.tag != first.tag || first.index != 1 {
                    return None;
                }
                let mut current = root;
                for seg in segs {
                    current = self.nth_child_with_tag(current, &seg.tag, seg.index)?;
                }
                Some(current)
            }
        }
    }

    fn nth_child_with_tag(&self, parent: NodeId, tag: &str, index: usize) -> Option<NodeId> {
        let mut seen = 0;
        for child in self.page.children(parent) {
            if self.page.element(child).map(|e| e.tag == tag).unwrap_or(false) {
                seen += 1;
                if seen == index {
                    return Some(child);
                }
            }
        }
        None
    }

    /// String-level resolution. Malformed input surfaces as a
    /// `PathInvalid` error, a missing element as `ElementNotFound`;
    /// neither panics.
    pub fn resolve_str(&self, path: &str) -> Result<NodeId> {
        let parsed = StructuralPath::parse(path)?;
        self.resolve(&parsed)
            .ok_or_else(|| Error::element_not_found(path))
    }

    /// Snapshot the element's identifying attributes at call time.
    pub fn descriptor(&self, node: NodeId) -> Option<ElementDescriptor> {
        let el = self.page.element(node)?;
        Some(ElementDescriptor {
            id: el.id.clone(),
            tag: el.tag.clone(),
            classes: el.classes.clone(),
            text: el.text.clone(),
            input_type: el.input_type.clone(),
            href: el.href.clone(),
            bounds: el.bounds,
            path: self.compute_path(node).map(|p| p.to_string()),
            styles: el.styles.clone(),
        })
    }

    /// Weighted-sum score of one element against partial criteria.
    /// Identifier, path, input-type, class, text, and style terms
    /// contribute their full weight on exact equality only; proximity
    /// decays linearly from full weight at distance 0 to nothing at
    /// 100 page pixels.
    pub fn score(&self, node: NodeId, criteria: &MatchCriteria) -> f64 {
        let Some(el) = self.page.element(node) else {
            return 0.0;
        };
        let mut score = 0.0;

        if let Some(id) = &criteria.id {
            if el.id.as_deref() == Some(id.as_str()) {
                score += WEIGHT_ID;
            }
        }

        if let Some(path) = &criteria.path {
            if self.compute_path(node).map(|p| p.to_string()).as_deref() == Some(path.as_str()) {
                score += WEIGHT_PATH;
            }
        }

        if let Some((x, y)) = criteria.coordinates {
            let dx = el.bounds.x - x;
            let dy = el.bounds.y - y;
            let distance = (dx * dx + dy * dy).sqrt();
            score += WEIGHT_PROXIMITY * (1.0 - (distance / 100.0).min(1.0));
        }

        if let Some(input_type) = &criteria.input_type {
            if el.input_type.as_deref() == Some(input_type.as_str()) {
                score += WEIGHT_INPUT_TYPE;
            }
        }

        if let Some(classes) = &criteria.classes {
            if &el.classes == classes {
                score += WEIGHT_CLASS;
            }
        }

        if let Some(text) = &criteria.text {
            if el.text.as_deref() == Some(text.as_str()) {
                score += WEIGHT_TEXT;
            }
        }

        if !criteria.styles.is_empty()
            && criteria
                .styles
                .iter()
                .all(|(k, v)| el.styles.get(k) == Some(v))
        {
            score += WEIGHT_STYLE;
        }

        score
    }

    /// Exhaustive document-order scan scoring every element; ties keep
    /// the first element enumerated. Runs at replay and record setup,
    /// not per frame.
    pub fn find_best_match(&self, criteria: &MatchCriteria) -> Option<NodeId> {
        let mut best: Option<(NodeId, f64)> = None;
        for node in self.page.walk() {
            let s = self.score(node, criteria);
            if best.map(|(_, b)| s > b).unwrap_or(true) {
                best = Some((node, s));
            }
        }
        if let Some((_, s)) = best {
            debug!(score = s, "best match selected");
        }
        best.map(|(node, _)| node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::error::ErrorCode;

    fn page_with_button() -> (PageTree, NodeId) {
        let mut page = PageTree::new();
        let body = page.insert(page.root(), Element::new("body"));
        let button = page.insert(body, Element::new("button").with_id("submit"));
        (page, button)
    }

    #[test]
    fn id_path_round_trips_despite_sibling_reorder() {
        let (mut page, button) = page_with_button();
        let path = Locator::new(&page).compute_path(button).unwrap();

        // Shuffle unrelated siblings in front of the button.
        page.insert_before(button, Element::new("div"));
        page.insert_before(button, Element::new("button"));

        assert_eq!(Locator::new(&page).resolve(&path), Some(button));
    }

    #[test]
    fn positional_path_walks_same_tag_index() {
        let mut page = PageTree::new();
        let body = page.insert(page.root(), Element::new("body"));
        page.insert(body, Element::new("div"));
        let second = page.insert(body, Element::new("div"));
        let loc = Locator::new(&page);
        let path = loc.compute_path(second).unwrap();
        assert_eq!(path.to_string(), "/html[1]/body[1]/div[2]");
        assert_eq!(loc.resolve(&path), Some(second));
    }

    #[test]
    fn different_tag_sibling_does_not_shift_path() {
        let mut page = PageTree::new();
        let body = page.insert(page.root(), Element::new("body"));
        let target = page.insert(body, Element::new("div"));
        let path = Locator::new(&page).compute_path(target).unwrap();

        page.insert_before(target, Element::new("span"));

        assert_eq!(Locator::new(&page).resolve(&path), Some(target));
    }

    #[test]
    fn same_tag_sibling_shifts_path_to_newcomer() {
        // Documented drift behavior: the old path now names the new
        // sibling, and the original element's index moved up by one.
        let mut page = PageTree::new();
        let body = page.insert(page.root(), Element::new("body"));
        let target = page.insert(body, Element::new("div"));
        let old_path = Locator::new(&page).compute_path(target).unwrap();

        let newcomer = page.insert_before(target, Element::new("div")).unwrap();

        let loc = Locator::new(&page);
        assert_eq!(loc.resolve(&old_path), Some(newcomer));
        assert_eq!(
            loc.compute_path(target).unwrap().to_string(),
            "/html[1]/body[1]/div[2]"
        );
    }

    #[test]
    fn detached_element_has_no_path() {
        let mut page = PageTree::new();
        let body = page.insert(page.root(), Element::new("body"));
        let div = page.insert(body, Element::new("div"));
        page.detach(div);
        assert!(Locator::new(&page).compute_path(div).is_none());
    }

    #[test]
    fn resolve_str_reports_instead_of_panicking() {
        let (page, _) = page_with_button();
        let loc = Locator::new(&page);
        assert_eq!(loc.resolve_str("garbage").unwrap_err().code, ErrorCode::PathInvalid);
        assert_eq!(
            loc.resolve_str("/html[1]/body[1]/table[4]").unwrap_err().code,
            ErrorCode::ElementNotFound
        );
    }

    #[test]
    fn proximity_decays_and_saturates() {
        let mut page = PageTree::new();
        let body = page.insert(page.root(), Element::new("body"));
        let el = page.insert(body, Element::new("div").at(200.0, 200.0, 10.0, 10.0));
        let loc = Locator::new(&page);

        let score_at = |x: f64, y: f64| {
            loc.score(
                el,
                &MatchCriteria {
                    coordinates: Some((x, y)),
                    ..Default::default()
                },
            )
        };

        let exact = score_at(200.0, 200.0);
        let near = score_at(230.0, 200.0);
        let far = score_at(290.0, 200.0);
        assert_eq!(exact, 80.0);
        assert!(near < exact);
        assert!(far < near);
        // At and beyond 100px the proximity term contributes nothing.
        assert_eq!(score_at(300.0, 200.0), 0.0);
        assert_eq!(score_at(1000.0, 1000.0), 0.0);
    }

    #[test]
    fn identifier_dominates_poor_proximity() {
        let mut page = PageTree::new();
        let body = page.insert(page.root(), Element::new("body"));
        let decoy = page.insert(body, Element::new("button").at(120.0, 80.0, 40.0, 20.0));
        let submit = page.insert(
            body,
            Element::new("button").with_id("submit").at(500.0, 500.0, 40.0, 20.0),
        );

        let found = Locator::new(&page).find_best_match(&MatchCriteria {
            id: Some("submit".to_string()),
            coordinates: Some((120.0, 80.0)),
            ..Default::default()
        });
        assert_eq!(found, Some(submit));
        assert_ne!(found, Some(decoy));
    }

    #[test]
    fn ties_keep_first_in_document_order() {
        let mut page = PageTree::new();
        let body = page.insert(page.root(), Element::new("body"));
        let first = page.insert(body, Element::new("div").with_text("dup"));
        page.insert(body, Element::new("div").with_text("dup"));

        let found = Locator::new(&page).find_best_match(&MatchCriteria {
            text: Some("dup".to_string()),
            ..Default::default()
        });
        assert_eq!(found, Some(first));
    }

    #[test]
    fn attribute_terms_require_exact_equality() {
        let mut page = PageTree::new();
        let body = page.insert(page.root(), Element::new("body"));
        let el = page.insert(
            body,
            Element::new("input")
                .with_input_type("text")
                .with_classes(&["form-control", "wide"])
                .with_style("display", "block"),
        );
        let loc = Locator::new(&page);

        let full = loc.score(
            el,
            &MatchCriteria {
                input_type: Some("text".to_string()),
                classes: Some(vec!["form-control".to_string(), "wide".to_string()]),
                styles: [("display".to_string(), "block".to_string())].into(),
                ..Default::default()
            },
        );
        assert_eq!(full, 70.0 + 60.0 + 40.0);

        let partial_class = loc.score(
            el,
            &MatchCriteria {
                classes: Some(vec!["form-control".to_string()]),
                ..Default::default()
            },
        );
        assert_eq!(partial_class, 0.0);

        let wrong_style = loc.score(
            el,
            &MatchCriteria {
                styles: [("display".to_string(), "inline".to_string())].into(),
                ..Default::default()
            },
        );
        assert_eq!(wrong_style, 0.0);
    }

    #[test]
    fn descriptor_carries_path_and_criteria_round_trip() {
        let (page, button) = page_with_button();
        let loc = Locator::new(&page);
        let descriptor = loc.descriptor(button).unwrap();
        assert_eq!(descriptor.path.as_deref(), Some("//*[@id=\"submit\"]"));

        let criteria = MatchCriteria::from_descriptor(&descriptor);
        assert_eq!(loc.find_best_match(&criteria), Some(button));
    }
}
