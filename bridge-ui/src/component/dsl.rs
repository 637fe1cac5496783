use super::{Component, ComponentClass};
use crate::error::{AdapterError, Result};
use crate::render::{Block, Content, Element, RenderTarget, Resolution};
use crate::state::{Owner, StateAccessor, StateDecl};
use bridge_types::{Bag, Observable, Value};
use std::rc::Rc;

/// Result of sending an arbitrary name to a component
#[derive(Debug)]
pub enum Dispatched {
    Param(Value),
    Element(Element),
}

impl Dispatched {
    pub fn into_element(self) -> Option<Element> {
        match self {
            Dispatched::Element(element) => Some(element),
            Dispatched::Param(_) => None,
        }
    }
}

const AS_NODE: &str = "_as_node";

/// Tree-building and state helpers used from hooks and render functions
impl Component {
    /// Resolve `name` the way an unknown method call would be: a param of
    /// that name, else a built-in tag, else a component class visible from
    /// this class's scope. A `_as_node` suffix builds without attaching.
    pub fn dispatch(&self, name: &str, params: Bag, block: Option<Block<'_>>) -> anyhow::Result<Dispatched> {
        if self.params()?.contains_key(name) {
            return Ok(Dispatched::Param(self.param(name)?));
        }
        Ok(Dispatched::Element(self.render_named(name, params, block)?))
    }

    pub fn render(&self, name: &str, params: Bag) -> anyhow::Result<Element> {
        self.render_named(name, params, None)
    }

    pub fn render_with<'a>(
        &self,
        name: &str,
        params: Bag,
        block: impl FnOnce() -> anyhow::Result<Content> + 'a,
    ) -> anyhow::Result<Element> {
        self.render_named(name, params, Some(Box::new(block)))
    }

    /// Render a component class directly
    pub fn present(&self, class: &Rc<ComponentClass>, params: Bag) -> anyhow::Result<Element> {
        let target = RenderTarget::Component(class.clone());
        self.runtime.rendering().render(target, params, None)
    }

    pub fn present_with<'a>(
        &self,
        class: &Rc<ComponentClass>,
        params: Bag,
        block: impl FnOnce() -> anyhow::Result<Content> + 'a,
    ) -> anyhow::Result<Element> {
        let target = RenderTarget::Component(class.clone());
        self.runtime.rendering().render(target, params, Some(Box::new(block)))
    }

    /// Attach an already built element to the current frame
    pub fn insert(&self, element: &Element) -> anyhow::Result<Element> {
        self.runtime
            .rendering()
            .render(RenderTarget::Element(element.clone()), Bag::new(), None)
    }

    /// Take a rendered element back out of the current frame
    pub fn as_node(&self, element: &Element) -> Element {
        self.runtime.rendering().as_node(element)
    }

    /// Whatever renders next is marked as waiting on resources
    pub fn wait_on_resources(&self) {
        self.runtime.rendering().set_waiting_on_resources(true);
    }

    fn render_named(&self, name: &str, params: Bag, block: Option<Block<'_>>) -> anyhow::Result<Element> {
        let (base, node_only) = match name.strip_suffix(AS_NODE) {
            Some(base) => (base, true),
            None => (name, false),
        };

        let resolution = self.runtime.resolve(self.class.name(), base);
        let target = match resolution {
            Resolution::BuiltinTag(tag) => RenderTarget::Tag(tag),
            Resolution::Component(class) => RenderTarget::Component(class),
            Resolution::Unresolved => {
                return Err(AdapterError::NoMethod {
                    name: name.to_string(),
                    component: self.to_string(),
                }
                .into());
            }
        };

        let rendering = self.runtime.rendering();
        if node_only {
            rendering.build(|| rendering.render(target, params, block))
        } else {
            rendering.render(target, params, block)
        }
    }

    /// Accessor for a declared state field. Exported fields resolve to the
    /// class that owns them. Fails once the component has been unmounted.
    pub fn state(&self, name: &str) -> Result<StateAccessor> {
        self.native()?;
        let store = self.runtime.store().clone();
        if let Some(exported) = self.class.exported(name) {
            let owner = Owner::Class(exported.owner.clone());
            store.initialize_states(&owner, &StateDecl::defaults([&exported.decl]));
            let hook = exported.decl.on_change_hook();
            return Ok(StateAccessor::new(store, owner, name, hook));
        }
        let hook = self.class.state_decl(name).and_then(StateDecl::on_change_hook);
        Ok(StateAccessor::new(store, self.owner(), name, hook))
    }

    /// Extra state for this instance only
    pub fn define_state(&self, decl: StateDecl) -> Result<StateAccessor> {
        self.native()?;
        let store = self.runtime.store();
        store.initialize_states(&self.owner(), &StateDecl::defaults([&decl]));
        Ok(StateAccessor::new(store.clone(), self.owner(), decl.name(), decl.on_change_hook()))
    }

    /// Ad hoc Observable
    pub fn watch(&self, value: impl Into<Value>, on_change: impl Fn(Value) + 'static) -> Observable {
        Observable::new(value, on_change)
    }
}
