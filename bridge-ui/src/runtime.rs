use crate::component::{Component, ComponentClass};
use crate::config::AdapterConfig;
use crate::console::{Console, TracingConsole};
use crate::engine::{NativeEngine, NativeHandle};
use crate::error::Result;
use crate::render::{
    BuiltinTags, ComponentRegistry, Element, RenderingContext, Resolution, Resolver,
};
use crate::state::{InstanceId, Owner, SharedStateStore, StateAccessor, StateDecl, StateStore};
use bridge_types::Bag;
use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

/// Everything the adapter shares across component instances: the engine,
/// the state store, the rendering context and the class registry
pub struct Runtime {
    engine: Rc<dyn NativeEngine>,
    store: SharedStateStore,
    rendering: RenderingContext,
    registry: RefCell<ComponentRegistry>,
    tags: BuiltinTags,
    console: Rc<dyn Console>,
    config: AdapterConfig,
    next_instance: Cell<u64>,
}

impl Runtime {
    pub fn new(engine: Rc<dyn NativeEngine>, config: AdapterConfig, console: Rc<dyn Console>) -> Self {
        Self {
            store: Rc::new(StateStore::new(engine.clone())),
            rendering: RenderingContext::new(console.clone()),
            registry: RefCell::new(ComponentRegistry::new()),
            tags: BuiltinTags::html(),
            engine,
            console,
            config,
            next_instance: Cell::new(0),
        }
    }

    /// Default config, logging through `tracing`
    pub fn with_engine(engine: Rc<dyn NativeEngine>) -> Self {
        Self::new(engine, AdapterConfig::default(), Rc::new(TracingConsole))
    }

    pub fn with_tags(mut self, tags: BuiltinTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn engine(&self) -> &Rc<dyn NativeEngine> {
        &self.engine
    }

    pub fn store(&self) -> &SharedStateStore {
        &self.store
    }

    pub fn rendering(&self) -> &RenderingContext {
        &self.rendering
    }

    pub fn console(&self) -> &dyn Console {
        &*self.console
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn tags(&self) -> &BuiltinTags {
        &self.tags
    }

    pub fn registry(&self) -> Ref<'_, ComponentRegistry> {
        self.registry.borrow()
    }

    /// Make a class visible to name resolution and initialize the state it
    /// exports
    pub fn register(&self, class: &Rc<ComponentClass>) {
        self.seed_exported_state(class);
        if self.registry.borrow_mut().insert(class.clone()).is_some() {
            tracing::warn!("component class {} registered twice", class.name());
        }
    }

    /// Defaults of exported state, installed once per owning class
    fn seed_exported_state(&self, class: &ComponentClass) {
        for exported in class.exported_state() {
            self.store.initialize_states(
                &Owner::Class(exported.owner.clone()),
                &StateDecl::defaults([&exported.decl]),
            );
        }
    }

    pub fn resolve(&self, caller: &str, name: &str) -> Resolution {
        Resolver::new(&self.tags, &self.registry.borrow()).resolve(caller, name)
    }

    /// Wrap a freshly created native instance
    pub fn instantiate(
        runtime: &SharedRuntime,
        class: Rc<ComponentClass>,
        handle: NativeHandle,
    ) -> Rc<Component> {
        let id = InstanceId(runtime.next_instance.get() + 1);
        runtime.next_instance.set(id.0);
        runtime.store.attach(id, handle, class.name());
        runtime.seed_exported_state(&class);
        Rc::new(Component::new(runtime.clone(), id, class, handle))
    }

    /// Component element outside of any render; defaults and validation
    /// apply as usual
    pub fn create_element(&self, class: &Rc<ComponentClass>, params: Bag, children: Vec<Element>) -> Element {
        Element::component(class.clone(), params, children, &*self.console)
    }

    /// Accessor for a field exported by `class_name`, usable without an
    /// instance
    pub fn class_state(&self, class_name: &str, name: &str) -> Option<StateAccessor> {
        let class = self.registry.borrow().get(class_name)?;
        let exported = class.exported(name)?;
        Some(StateAccessor::new(
            self.store.clone(),
            Owner::Class(exported.owner.clone()),
            name,
            exported.decl.on_change_hook(),
        ))
    }

    /// Element for the component a controller asked for by name
    pub fn top_level_element(&self, controller: &str, component_name: &str, render_params: Bag) -> Result<Element> {
        let class = Resolver::new(&self.tags, &self.registry.borrow()).find_top_level(
            &self.config.search_path,
            controller,
            component_name,
        )?;
        tracing::debug!("{} / {} resolved to {}", controller, component_name, class.name());
        Ok(self.create_element(&class, render_params, Vec::new()))
    }
}

/// Shared reference to Runtime (interior mutability handled internally)
pub type SharedRuntime = Rc<Runtime>;
