use super::Component;
use super::callbacks::{Callbacks, LifecycleArgs};
use crate::render::Content;
use crate::state::StateDecl;
use bridge_types::guard::{ParamOptions, Validator};
use bridge_types::{Bag, Callback};
use smartstring::alias::String as SmartString;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub type RenderFn = Rc<dyn Fn(&Component) -> anyhow::Result<Content>>;
pub type NeedsUpdateFn = Rc<dyn Fn(&Component, LifecycleArgs<'_>) -> anyhow::Result<bool>>;

/// A state field exported by a class; `owner` is the class that declared it
#[derive(Clone, Debug)]
pub struct ExportedState {
    pub decl: StateDecl,
    pub owner: SmartString,
}

/// Immutable descriptor of a component class: param rules, declared state,
/// hooks and render function.
#[derive(Clone)]
pub struct ComponentClass {
    name: SmartString,
    parent: Option<SmartString>,
    validator: Validator,
    initial_state: Vec<StateDecl>,
    exported_state: Vec<ExportedState>,
    callbacks: Callbacks,
    render: Option<RenderFn>,
    needs_update: Option<NeedsUpdateFn>,
    backtrace: Option<bool>,
    reraise: Option<bool>,
    native_mixins: Vec<SmartString>,
    static_callbacks: BTreeMap<SmartString, Callback>,
}

impl ComponentClass {
    pub fn builder(name: &str) -> ComponentBuilder {
        ComponentBuilder {
            class: ComponentClass {
                name: name.into(),
                parent: None,
                validator: Validator::new(),
                initial_state: Vec::new(),
                exported_state: Vec::new(),
                callbacks: Callbacks::default(),
                render: None,
                needs_update: None,
                backtrace: None,
                reraise: None,
                native_mixins: Vec::new(),
                static_callbacks: BTreeMap::new(),
            },
        }
    }

    /// Start a subclass from a copy of every declaration of `parent`
    pub fn subclass(parent: &Rc<ComponentClass>, name: &str) -> ComponentBuilder {
        let mut class = (**parent).clone();
        class.name = name.into();
        class.parent = Some(parent.name.clone());
        ComponentBuilder { class }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn default_props(&self) -> Bag {
        self.validator.default_props()
    }

    pub fn initial_state(&self) -> Bag {
        StateDecl::defaults(&self.initial_state)
    }

    pub fn state_decl(&self, name: &str) -> Option<&StateDecl> {
        self.initial_state.iter().find(|decl| decl.name() == name)
    }

    pub fn exported_state(&self) -> &[ExportedState] {
        &self.exported_state
    }

    pub fn exported(&self, name: &str) -> Option<&ExportedState> {
        self.exported_state.iter().find(|e| e.decl.name() == name)
    }

    pub fn callbacks(&self) -> &Callbacks {
        &self.callbacks
    }

    pub fn render_fn(&self) -> Option<&RenderFn> {
        self.render.as_ref()
    }

    pub fn needs_update_fn(&self) -> Option<&NeedsUpdateFn> {
        self.needs_update.as_ref()
    }

    pub fn backtrace_setting(&self) -> Option<bool> {
        self.backtrace
    }

    pub fn reraise_setting(&self) -> Option<bool> {
        self.reraise
    }

    pub fn native_mixins(&self) -> &[SmartString] {
        &self.native_mixins
    }

    pub fn static_callbacks(&self) -> &BTreeMap<SmartString, Callback> {
        &self.static_callbacks
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("params", &self.validator.declarations())
            .field("initial_state", &self.initial_state)
            .finish()
    }
}

/// Collects class-level declarations; `build` freezes them
pub struct ComponentBuilder {
    class: ComponentClass,
}

impl ComponentBuilder {
    /// Optional when `options` carries a default, required otherwise
    pub fn param(self, name: &str, options: ParamOptions) -> Self {
        if options.has_default() {
            self.optional_param(name, options)
        } else {
            self.required_param(name, options)
        }
    }

    pub fn required_param(mut self, name: &str, options: ParamOptions) -> Self {
        self.class.validator.requires(name, options);
        self
    }

    pub fn optional_param(mut self, name: &str, options: ParamOptions) -> Self {
        self.class.validator.optional(name, options);
        self
    }

    /// Gather every undeclared param into one hash param
    pub fn collect_other_params_as(mut self, name: &str) -> Self {
        self.class.validator.all_others(name);
        self
    }

    pub fn define_state(mut self, decl: StateDecl) -> Self {
        let state = &mut self.class.initial_state;
        match state.iter_mut().find(|d| d.name() == decl.name()) {
            Some(existing) => *existing = decl,
            None => state.push(decl),
        }
        self
    }

    /// State owned by the class itself, shared by all its instances
    pub fn export_state(mut self, decl: StateDecl) -> Self {
        let owner = self.class.name.clone();
        self.class.exported_state.retain(|e| e.decl.name() != decl.name());
        self.class.exported_state.push(ExportedState { decl, owner });
        self
    }

    pub fn before_mount(mut self, hook: impl Fn(&Component) -> anyhow::Result<()> + 'static) -> Self {
        self.class.callbacks.before_mount.push(Rc::new(hook));
        self
    }

    pub fn after_mount(mut self, hook: impl Fn(&Component) -> anyhow::Result<()> + 'static) -> Self {
        self.class.callbacks.after_mount.push(Rc::new(hook));
        self
    }

    pub fn before_receive_props(
        mut self,
        hook: impl Fn(&Component, &Bag) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.class.callbacks.before_receive_props.push(Rc::new(hook));
        self
    }

    pub fn before_update(
        mut self,
        hook: impl Fn(&Component, LifecycleArgs<'_>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.class.callbacks.before_update.push(Rc::new(hook));
        self
    }

    pub fn after_update(
        mut self,
        hook: impl Fn(&Component, LifecycleArgs<'_>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        self.class.callbacks.after_update.push(Rc::new(hook));
        self
    }

    pub fn before_unmount(mut self, hook: impl Fn(&Component) -> anyhow::Result<()> + 'static) -> Self {
        self.class.callbacks.before_unmount.push(Rc::new(hook));
        self
    }

    pub fn render(mut self, render: impl Fn(&Component) -> anyhow::Result<Content> + 'static) -> Self {
        self.class.render = Some(Rc::new(render));
        self
    }

    /// Authoritative override of the update-skip decision
    pub fn needs_update(
        mut self,
        decide: impl Fn(&Component, LifecycleArgs<'_>) -> anyhow::Result<bool> + 'static,
    ) -> Self {
        self.class.needs_update = Some(Rc::new(decide));
        self
    }

    pub fn backtrace(mut self, on: bool) -> Self {
        self.class.backtrace = Some(on);
        self
    }

    pub fn reraise(mut self, on: bool) -> Self {
        self.class.reraise = Some(on);
        self
    }

    /// Name of an engine-side mixin for the native class factory
    pub fn native_mixin(mut self, name: &str) -> Self {
        self.class.native_mixins.push(name.into());
        self
    }

    pub fn static_call_back(mut self, name: &str, callback: Callback) -> Self {
        self.class.static_callbacks.insert(name.into(), callback);
        self
    }

    pub fn build(self) -> Rc<ComponentClass> {
        tracing::debug!(
            "defined component class {} ({} params, {} hooks)",
            self.class.name,
            self.class.validator.declarations().len(),
            self.class.callbacks.len()
        );
        Rc::new(self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_types::Value;
    use bridge_types::guard::ParamType;

    #[test]
    fn test_param_without_default_is_required() {
        let class = ComponentClass::builder("Foo")
            .param("foo", ParamOptions::new())
            .param("bar", ParamOptions::new().default_value("x").ty(ParamType::String))
            .build();

        let decls = class.validator().declarations();
        assert!(decls[0].is_required());
        assert!(!decls[1].is_required());
        assert_eq!(class.default_props().get("bar"), Some(&Value::from("x")));
    }

    #[test]
    fn test_subclass_copies_and_extends() {
        let parent = ComponentClass::builder("Foo")
            .param("foo", ParamOptions::new())
            .define_state(StateDecl::new("count", 0))
            .before_mount(|_| Ok(()))
            .export_state(StateDecl::new("shared", "s"))
            .build();
        let child = ComponentClass::subclass(&parent, "Bar")
            .define_state(StateDecl::new("label", "l"))
            .before_mount(|_| Ok(()))
            .build();

        assert_eq!(child.parent(), Some("Foo"));
        assert!(child.validator().rule("foo").is_some());
        assert_eq!(child.initial_state().len(), 2);
        assert_eq!(child.callbacks().before_mount.len(), 2);
        assert_eq!(parent.callbacks().before_mount.len(), 1);
        assert_eq!(child.exported("shared").map(|e| e.owner.as_str()), Some("Foo"));
    }

    #[test]
    fn test_native_mixins_and_static_callbacks() {
        let class = ComponentClass::builder("Foo")
            .native_mixin("LinkedStateMixin")
            .static_call_back("getDefaultProps", Callback::new(|_| Value::Nil))
            .build();

        assert_eq!(class.native_mixins()[0].as_str(), "LinkedStateMixin");
        assert!(class.static_callbacks().contains_key("getDefaultProps"));
    }
}
