use crate::component::ComponentClass;
use crate::console::Console;
use bridge_types::{Bag, Object, Value};
use smartstring::alias::String as SmartString;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

pub enum ElementKind {
    Tag(SmartString),
    Component(Rc<ComponentClass>),
    Text(String),
}

struct ElementData {
    kind: ElementKind,
    props: Bag,
    children: Vec<Element>,
    waiting_on_resources: Cell<bool>,
}

/// A finalized node of the tree handed to the engine. Cloning shares the
/// node; identity is pointer identity.
#[derive(Clone)]
pub struct Element(Rc<ElementData>);

impl Element {
    fn new(kind: ElementKind, props: Bag, children: Vec<Element>) -> Self {
        Self(Rc::new(ElementData {
            kind,
            props,
            children,
            waiting_on_resources: Cell::new(false),
        }))
    }

    pub fn tag(name: &str, props: Bag, children: Vec<Element>) -> Self {
        Self::new(ElementKind::Tag(name.into()), props, children)
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(ElementKind::Text(text.into()), Bag::new(), Vec::new())
    }

    /// Component element: declared defaults fill in missing params, then the
    /// result is validated. Violations are logged, never fatal.
    pub fn component(
        class: Rc<ComponentClass>,
        params: Bag,
        children: Vec<Element>,
        console: &dyn Console,
    ) -> Self {
        let validator = class.validator();
        let mut props = validator.default_props();
        props.extend(params);

        let violations = validator.validate(&props);
        if !violations.is_empty() {
            console.warn(&violations.warning(class.name()));
        }

        Self::new(ElementKind::Component(class), props, children)
    }

    pub fn kind(&self) -> &ElementKind {
        &self.0.kind
    }

    /// Tag name, component class name, or "#text"
    pub fn name(&self) -> &str {
        match &self.0.kind {
            ElementKind::Tag(name) => name,
            ElementKind::Component(class) => class.name(),
            ElementKind::Text(_) => "#text",
        }
    }

    pub fn props(&self) -> &Bag {
        &self.0.props
    }

    pub fn children(&self) -> &[Element] {
        &self.0.children
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.0.kind {
            ElementKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        self.as_text().is_some()
    }

    pub fn waiting_on_resources(&self) -> bool {
        self.0.waiting_on_resources.get()
    }

    pub(crate) fn set_waiting_on_resources(&self, waiting: bool) {
        self.0.waiting_on_resources.set(waiting);
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Wrap as a param value
    pub fn to_value(&self) -> Value {
        Value::Object(Object::new(self.clone()))
    }

    pub fn from_value(value: &Value) -> Option<Element> {
        value.downcast_ref::<Element>().cloned()
    }
}

impl From<Element> for Value {
    fn from(element: Element) -> Self {
        element.to_value()
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            ElementKind::Text(text) => write!(f, "{:?}", text),
            _ => f
                .debug_struct("Element")
                .field("name", &self.name())
                .field("props", &self.0.props)
                .field("children", &self.0.children)
                .finish(),
        }
    }
}
