use super::store::{Owner, SharedStateStore};
use crate::error::Result;
use bridge_types::{Bag, Observable, Value};
use smartstring::alias::String as SmartString;
use std::fmt;
use std::rc::Rc;

/// Called with `(name, old, new)` before a write through an accessor
pub type ChangeHook = Rc<dyn Fn(&str, &Value, &Value)>;

/// A declared state field
#[derive(Clone)]
pub struct StateDecl {
    name: SmartString,
    default: Value,
    on_change: Option<ChangeHook>,
}

impl StateDecl {
    pub fn new(name: &str, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
            on_change: None,
        }
    }

    pub fn on_change(mut self, hook: impl Fn(&str, &Value, &Value) + 'static) -> Self {
        self.on_change = Some(Rc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> &Value {
        &self.default
    }

    pub fn on_change_hook(&self) -> Option<ChangeHook> {
        self.on_change.clone()
    }

    pub fn defaults<'a>(decls: impl IntoIterator<Item = &'a StateDecl>) -> Bag {
        decls
            .into_iter()
            .map(|decl| (decl.name.clone(), decl.default.clone()))
            .collect()
    }
}

impl fmt::Debug for StateDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateDecl")
            .field("name", &self.name)
            .field("default", &self.default)
            .finish()
    }
}

/// Read, write and bang access to one field of one owner
#[derive(Clone)]
pub struct StateAccessor {
    store: SharedStateStore,
    owner: Owner,
    name: SmartString,
    on_change: Option<ChangeHook>,
}

impl StateAccessor {
    pub fn new(store: SharedStateStore, owner: Owner, name: &str, on_change: Option<ChangeHook>) -> Self {
        Self {
            store,
            owner,
            name: name.into(),
            on_change,
        }
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn get(&self) -> Value {
        self.store.get(&self.owner, &self.name)
    }

    /// Fails once the owning instance has been unmounted
    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        write(&self.store, &self.owner, &self.name, self.on_change.as_ref(), value.into())
    }

    /// Bang with an argument: write and return the previous value
    pub fn update(&self, value: impl Into<Value>) -> Result<Value> {
        let previous = self.get();
        self.set(value)?;
        Ok(previous)
    }

    /// Bang without an argument: the Observable the field already holds, or
    /// a fresh one over the current value whose writes go back through this
    /// field
    pub fn observe(&self) -> Observable {
        let current = self.get();
        if let Value::Observable(held) = current {
            return held;
        }
        let store = self.store.clone();
        let owner = self.owner.clone();
        let name = self.name.clone();
        let on_change = self.on_change.clone();
        Observable::new(current, move |update| {
            if let Err(err) = write(&store, &owner, &name, on_change.as_ref(), update) {
                tracing::warn!("dropped observable write: {}", err);
            }
        })
    }
}

fn write(
    store: &SharedStateStore,
    owner: &Owner,
    name: &str,
    on_change: Option<&ChangeHook>,
    value: Value,
) -> Result<()> {
    store.ensure_writable(owner, name)?;
    if let Some(hook) = on_change {
        hook(name, &store.peek(owner, name), &value);
    }
    store.set(owner, name, value)
}
