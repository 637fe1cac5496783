use crate::render::Element;
use bridge_types::{Bag, Value};
use std::fmt;

/// Opaque reference to the engine's instance of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(pub u32);

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque reference to a rendered DOM node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomNode(pub u64);

/// The operations the adapter needs from the virtual-DOM engine.
///
/// State and prop writes are requests: the engine decides when they are
/// applied and drives the lifecycle calls that follow.
pub trait NativeEngine {
    fn props(&self, handle: NativeHandle) -> Bag;
    fn state(&self, handle: NativeHandle) -> Option<Bag>;
    fn refs(&self, handle: NativeHandle) -> Bag;

    fn merge_state(&self, handle: NativeHandle, state: Bag);
    fn replace_state(&self, handle: NativeHandle, state: Bag);
    fn merge_props(&self, handle: NativeHandle, props: Bag);
    fn replace_props(&self, handle: NativeHandle, props: Bag);

    fn child_count(&self, handle: NativeHandle) -> usize;
    fn child_at(&self, handle: NativeHandle, index: usize) -> Option<Element>;

    fn find_dom_node(&self, handle: NativeHandle) -> Option<DomNode>;
    fn is_mounted(&self, handle: NativeHandle) -> bool;
    fn force_update(&self, handle: NativeHandle);

    /// Equality used when comparing param values for the update decision
    fn values_equal(&self, a: &Value, b: &Value) -> bool {
        a.eq_value(b)
    }
}
