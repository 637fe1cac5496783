use super::element::Element;
use crate::engine::{NativeEngine, NativeHandle};
use std::rc::Rc;

/// View over the children the engine passed to a component.
///
/// Nothing is copied up front: every call goes back to the engine.
pub struct Children {
    engine: Rc<dyn NativeEngine>,
    handle: NativeHandle,
}

impl Children {
    pub(crate) fn new(engine: Rc<dyn NativeEngine>, handle: NativeHandle) -> Self {
        Self { engine, handle }
    }

    pub fn len(&self) -> usize {
        self.engine.child_count(self.handle)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn for_each(&self, mut f: impl FnMut(Element)) {
        self.iter().for_each(&mut f);
    }

    /// Lazy, single-pass iterator; call again to start over
    pub fn iter(&self) -> ChildIter {
        ChildIter {
            engine: self.engine.clone(),
            handle: self.handle,
            index: 0,
        }
    }
}

pub struct ChildIter {
    engine: Rc<dyn NativeEngine>,
    handle: NativeHandle,
    index: usize,
}

impl Iterator for ChildIter {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        let child = self.engine.child_at(self.handle, self.index)?;
        self.index += 1;
        Some(child)
    }
}

impl IntoIterator for &Children {
    type Item = Element;
    type IntoIter = ChildIter;

    fn into_iter(self) -> ChildIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StubEngine;
    use bridge_types::Bag;

    #[test]
    fn test_children_are_reread_on_each_call() {
        let engine = Rc::new(StubEngine::new());
        let handle = engine.create_instance(
            Bag::new(),
            vec![Element::text("a"), Element::tag("b", Bag::new(), Vec::new())],
        );
        let children = Children::new(engine.clone(), handle);

        let mut iter = children.iter();
        assert_eq!(iter.next().map(|c| c.name().to_string()), Some("#text".to_string()));
        assert_eq!(children.len(), 2);

        let mut seen = Vec::new();
        children.for_each(|child| seen.push(child.name().to_string()));
        assert_eq!(seen, vec!["#text", "b"]);
        assert_eq!(children.iter().count(), 2);
    }
}
