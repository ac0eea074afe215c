//! Retained element nodes used as render handles
//!
//! Shapes and layers are backed by lightweight retained elements: a tag, an
//! attribute map, a CSS-like style map, optional text content, and
//! parent/child links. The `Element` handle is reference-counted so that a
//! shape, the commands mutating it, and the layer holding it all share one
//! stable identity. The model is single-threaded (interior mutability via
//! `RefCell`, no locking).

use crate::{ArtModelError, Bounds, Offset, Point, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use uuid::Uuid;

/// Unique identifier for an element.
/// Uses UUID v4 for stable IDs that survive re-attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new random ElementId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of element behind a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementTag {
    Path,
    Rect,
    Ellipse,
    Image,
    Text,
    /// A container accepting shape elements as children
    Layer,
}

impl ElementTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementTag::Path => "path",
            ElementTag::Rect => "rect",
            ElementTag::Ellipse => "ellipse",
            ElementTag::Image => "image",
            ElementTag::Text => "text",
            ElementTag::Layer => "layer",
        }
    }
}

/// An attribute value: numeric geometry or free-form text.
/// Untagged so attribute maps round-trip as plain JSON numbers and strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Text(String),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Number(_) => None,
            AttrValue::Text(s) => Some(s),
        }
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A namespaced attribute (e.g. an xlink href on an image element)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespacedAttr {
    pub ns: String,
    pub name: String,
    pub value: String,
}

impl NamespacedAttr {
    pub fn new(
        ns: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            ns: ns.into(),
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Exclusivity lock for interactive dragging.
/// The generation counter invalidates superseded sessions; the origin is the
/// position the element reverts to when a session is cancelled.
#[derive(Debug, Clone, Copy)]
pub struct DragLock {
    pub generation: u64,
    pub origin: Point,
}

#[derive(Debug)]
struct ElementData {
    id: ElementId,
    tag: ElementTag,
    attrs: BTreeMap<String, AttrValue>,
    attrs_ns: Vec<NamespacedAttr>,
    style: BTreeMap<String, String>,
    text: Option<String>,
    children: Vec<Element>,
    parent: Option<WeakElement>,
    /// Memoized bounding box for path elements; kept current by offsetting
    /// on translation instead of reparsing the path data.
    path_bounds: Option<Bounds>,
    drag_lock: Option<DragLock>,
}

/// A shared handle to a retained element. Cloning the handle does not clone
/// the element; identity is the underlying allocation.
#[derive(Clone)]
pub struct Element(Rc<RefCell<ElementData>>);

/// A non-owning handle used for parent back-references
#[derive(Clone)]
pub struct WeakElement(Weak<RefCell<ElementData>>);

impl WeakElement {
    pub fn upgrade(&self) -> Option<Element> {
        self.0.upgrade().map(Element)
    }
}

impl std::fmt::Debug for WeakElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WeakElement")
    }
}

impl Element {
    /// Create a new detached element
    pub fn new(tag: ElementTag) -> Self {
        Self(Rc::new(RefCell::new(ElementData {
            id: ElementId::new(),
            tag,
            attrs: BTreeMap::new(),
            attrs_ns: Vec::new(),
            style: BTreeMap::new(),
            text: None,
            children: Vec::new(),
            parent: None,
            path_bounds: None,
            drag_lock: None,
        })))
    }

    /// Create a new layer container
    pub fn new_layer() -> Self {
        Self::new(ElementTag::Layer)
    }

    pub fn id(&self) -> ElementId {
        self.0.borrow().id
    }

    pub fn tag(&self) -> ElementTag {
        self.0.borrow().tag
    }

    pub fn downgrade(&self) -> WeakElement {
        WeakElement(Rc::downgrade(&self.0))
    }

    /// Handle identity: true iff both handles refer to the same element
    pub fn same_element(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // -------------------------------------------------------------------
    // Attributes
    // -------------------------------------------------------------------

    pub fn attr(&self, name: &str) -> Option<AttrValue> {
        self.0.borrow().attrs.get(name).cloned()
    }

    /// Numeric attribute accessor for geometry reads
    pub fn number_attr(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(|v| v.as_number())
    }

    pub fn set_attr(&self, name: impl Into<String>, value: impl Into<AttrValue>) {
        let name = name.into();
        let mut data = self.0.borrow_mut();
        // Any direct write to path data invalidates the memoized bounds;
        // AttrCommand re-seeds a shifted copy when the delta is known.
        if data.tag == ElementTag::Path && name == "d" {
            data.path_bounds = None;
        }
        data.attrs.insert(name, value.into());
    }

    pub fn remove_attr(&self, name: &str) -> Option<AttrValue> {
        let mut data = self.0.borrow_mut();
        if data.tag == ElementTag::Path && name == "d" {
            data.path_bounds = None;
        }
        data.attrs.remove(name)
    }

    pub fn attrs(&self) -> BTreeMap<String, AttrValue> {
        self.0.borrow().attrs.clone()
    }

    pub fn attr_ns(&self, ns: &str, name: &str) -> Option<String> {
        self.0
            .borrow()
            .attrs_ns
            .iter()
            .find(|a| a.ns == ns && a.name == name)
            .map(|a| a.value.clone())
    }

    pub fn set_attr_ns(&self, ns: &str, name: &str, value: impl Into<String>) {
        let value = value.into();
        let mut data = self.0.borrow_mut();
        if let Some(existing) = data
            .attrs_ns
            .iter_mut()
            .find(|a| a.ns == ns && a.name == name)
        {
            existing.value = value;
        } else {
            data.attrs_ns.push(NamespacedAttr::new(ns, name, value));
        }
    }

    pub fn remove_attr_ns(&self, ns: &str, name: &str) -> Option<String> {
        let mut data = self.0.borrow_mut();
        let index = data
            .attrs_ns
            .iter()
            .position(|a| a.ns == ns && a.name == name)?;
        Some(data.attrs_ns.remove(index).value)
    }

    pub fn attrs_ns(&self) -> Vec<NamespacedAttr> {
        self.0.borrow().attrs_ns.clone()
    }

    // -------------------------------------------------------------------
    // Style
    // -------------------------------------------------------------------

    pub fn style(&self, prop: &str) -> Option<String> {
        self.0.borrow().style.get(prop).cloned()
    }

    /// Set a style property. The stored value is the normalized form
    /// (surrounding whitespace stripped); readers always see the normalized
    /// value, which is what command snapshots cache.
    pub fn set_style(&self, prop: impl Into<String>, value: &str) {
        self.0
            .borrow_mut()
            .style
            .insert(prop.into(), value.trim().to_string());
    }

    pub fn remove_style(&self, prop: &str) -> Option<String> {
        self.0.borrow_mut().style.remove(prop)
    }

    pub fn styles(&self) -> BTreeMap<String, String> {
        self.0.borrow().style.clone()
    }

    // -------------------------------------------------------------------
    // Text content
    // -------------------------------------------------------------------

    pub fn text(&self) -> Option<String> {
        self.0.borrow().text.clone()
    }

    pub fn set_text(&self, text: Option<String>) {
        self.0.borrow_mut().text = text;
    }

    // -------------------------------------------------------------------
    // Tree structure
    // -------------------------------------------------------------------

    /// Attach `child` as the last child of this element. A child that is
    /// already attached elsewhere is moved.
    pub fn append_child(&self, child: &Element) -> Result<()> {
        if self.same_element(child) {
            return Err(ArtModelError::SelfAttachment);
        }
        child.detach();
        child.0.borrow_mut().parent = Some(self.downgrade());
        self.0.borrow_mut().children.push(child.clone());
        Ok(())
    }

    /// Detach `child` from this element. Returns false if it was not a child.
    pub fn remove_child(&self, child: &Element) -> bool {
        let mut data = self.0.borrow_mut();
        let index = data
            .children
            .iter()
            .position(|c| c.same_element(child));
        match index {
            Some(index) => {
                data.children.remove(index);
                drop(data);
                child.0.borrow_mut().parent = None;
                true
            }
            None => false,
        }
    }

    /// Detach this element from its parent, returning the former parent
    pub fn detach(&self) -> Option<Element> {
        let parent = self.parent()?;
        parent.remove_child(self);
        Some(parent)
    }

    pub fn parent(&self) -> Option<Element> {
        self.0.borrow().parent.as_ref().and_then(|p| p.upgrade())
    }

    pub fn is_attached(&self) -> bool {
        self.parent().is_some()
    }

    pub fn children(&self) -> Vec<Element> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn has_child(&self, child: &Element) -> bool {
        self.0
            .borrow()
            .children
            .iter()
            .any(|c| c.same_element(child))
    }

    // -------------------------------------------------------------------
    // Path bounds cache
    // -------------------------------------------------------------------

    pub fn cached_path_bounds(&self) -> Option<Bounds> {
        self.0.borrow().path_bounds
    }

    pub fn set_cached_path_bounds(&self, bounds: Option<Bounds>) {
        self.0.borrow_mut().path_bounds = bounds;
    }

    /// Offset the memoized path bounds in place, if present
    pub fn shift_cached_path_bounds(&self, offset: Offset) {
        let mut data = self.0.borrow_mut();
        if let Some(bounds) = data.path_bounds {
            data.path_bounds = Some(bounds.translated(offset));
        }
    }

    // -------------------------------------------------------------------
    // Drag lock
    // -------------------------------------------------------------------

    pub fn drag_lock(&self) -> Option<DragLock> {
        self.0.borrow().drag_lock
    }

    pub fn set_drag_lock(&self, lock: DragLock) {
        self.0.borrow_mut().drag_lock = Some(lock);
    }

    pub fn clear_drag_lock(&self) {
        self.0.borrow_mut().drag_lock = None;
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Element")
            .field("id", &data.id)
            .field("tag", &data.tag)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_and_detach() {
        let layer = Element::new_layer();
        let rect = Element::new(ElementTag::Rect);

        assert!(!rect.is_attached());
        layer.append_child(&rect).unwrap();
        assert!(rect.is_attached());
        assert!(layer.has_child(&rect));

        assert!(layer.remove_child(&rect));
        assert!(!rect.is_attached());
        assert_eq!(layer.child_count(), 0);
    }

    #[test]
    fn append_moves_between_layers() {
        let first = Element::new_layer();
        let second = Element::new_layer();
        let rect = Element::new(ElementTag::Rect);

        first.append_child(&rect).unwrap();
        second.append_child(&rect).unwrap();

        assert!(!first.has_child(&rect));
        assert!(second.has_child(&rect));
        assert!(rect.parent().unwrap().same_element(&second));
    }

    #[test]
    fn self_attachment_rejected() {
        let layer = Element::new_layer();
        assert!(matches!(
            layer.append_child(&layer),
            Err(ArtModelError::SelfAttachment)
        ));
    }

    #[test]
    fn style_values_are_normalized() {
        let rect = Element::new(ElementTag::Rect);
        rect.set_style("fill", "  #ff0000 ");
        assert_eq!(rect.style("fill").as_deref(), Some("#ff0000"));
    }

    #[test]
    fn path_data_write_invalidates_cached_bounds() {
        let path = Element::new(ElementTag::Path);
        path.set_cached_path_bounds(Some(Bounds::new(0.0, 0.0, 10.0, 10.0)));
        path.set_attr("d", "M 5 5 l 1 1");
        assert!(path.cached_path_bounds().is_none());
    }

    #[test]
    fn attr_value_round_trips_as_json_scalar() {
        let json = serde_json::to_string(&AttrValue::Number(12.5)).unwrap();
        assert_eq!(json, "12.5");
        let back: AttrValue = serde_json::from_str("\"#fff\"").unwrap();
        assert_eq!(back, AttrValue::Text("#fff".to_string()));
    }
}
