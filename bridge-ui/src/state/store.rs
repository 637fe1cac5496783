use super::graph::ObserverGraph;
use crate::engine::{NativeEngine, NativeHandle};
use crate::error::{AdapterError, Result};
use bridge_types::{Bag, Value};
use smallvec::SmallVec;
use smartstring::alias::String as SmartString;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Key stamped into every state bag forwarded to the engine
pub const STATE_UPDATED_AT: &str = "***_state_updated_at-***";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who a state field belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Owner {
    Instance(InstanceId),
    /// Exported state, owned by the component class itself
    Class(SmartString),
}

struct Attachment {
    handle: NativeHandle,
    class_name: SmartString,
}

/// Per-owner key/value store plus the "current component" context.
///
/// Writes are mirrored into the engine's state of every instance observing
/// the field, so the engine sees a change and asks whether to re-render.
pub struct StateStore {
    engine: Rc<dyn NativeEngine>,
    states: RefCell<HashMap<Owner, Bag>>,
    graph: RefCell<ObserverGraph>,
    context: RefCell<Vec<InstanceId>>,
    attached: RefCell<HashMap<InstanceId, Attachment>>,
    clock: Cell<i64>,
}

pub type SharedStateStore = Rc<StateStore>;

impl StateStore {
    pub fn new(engine: Rc<dyn NativeEngine>) -> Self {
        Self {
            engine,
            states: RefCell::new(HashMap::new()),
            graph: RefCell::new(ObserverGraph::new()),
            context: RefCell::new(Vec::new()),
            attached: RefCell::new(HashMap::new()),
            clock: Cell::new(0),
        }
    }

    /// Pair an instance with its native handle so writes can reach the engine
    pub fn attach(&self, id: InstanceId, handle: NativeHandle, class_name: &str) {
        self.attached.borrow_mut().insert(
            id,
            Attachment {
                handle,
                class_name: class_name.into(),
            },
        );
    }

    /// Install defaults for names the owner does not have yet
    pub fn initialize_states(&self, owner: &Owner, defaults: &Bag) {
        let mut states = self.states.borrow_mut();
        let entries = states.entry(owner.clone()).or_default();
        for (name, value) in defaults {
            entries
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }

    pub fn has_owner(&self, owner: &Owner) -> bool {
        self.states.borrow().contains_key(owner)
    }

    /// Read a field, recording the current component as an observer
    pub fn get(&self, owner: &Owner, name: &str) -> Value {
        if let Some(observer) = self.current() {
            self.graph.borrow_mut().record(observer, owner, name);
        }
        self.peek(owner, name)
    }

    /// Read without recording an observer
    pub fn peek(&self, owner: &Owner, name: &str) -> Value {
        self.states
            .borrow()
            .get(owner)
            .and_then(|entries| entries.get(name))
            .cloned()
            .unwrap_or(Value::Nil)
    }

    /// An instance owner that is neither attached nor holding state has been
    /// removed; writing to it would resurrect its entry
    pub fn ensure_writable(&self, owner: &Owner, name: &str) -> Result<()> {
        let Owner::Instance(id) = owner else {
            return Ok(());
        };
        if self.attached.borrow().contains_key(id) || self.has_owner(owner) {
            return Ok(());
        }
        Err(AdapterError::StateReleased {
            instance: id.to_string(),
            name: name.to_string(),
        })
    }

    /// Write a field and forward `{timestamp, key: value}` to the owner
    /// instance and every observer of the field
    pub fn set(&self, owner: &Owner, name: &str, value: Value) -> Result<()> {
        self.ensure_writable(owner, name)?;
        self.states
            .borrow_mut()
            .entry(owner.clone())
            .or_default()
            .insert(name.into(), value.clone());

        let mut targets: SmallVec<[InstanceId; 4]> = SmallVec::new();
        if let Owner::Instance(id) = owner {
            targets.push(*id);
        }
        for observer in self.graph.borrow().observers_of(owner, name) {
            if !targets.contains(observer) {
                targets.push(*observer);
            }
        }

        let stamp = self.tick();
        let owner_class = self.owner_class_name(owner);
        let forwards: Vec<(NativeHandle, SmartString)> = {
            let attached = self.attached.borrow();
            targets
                .iter()
                .filter_map(|id| attached.get(id).map(|a| (*id, a.handle)))
                .map(|(id, handle)| {
                    let key = if *owner == Owner::Instance(id) {
                        SmartString::from(name)
                    } else {
                        let mut key = owner_class.clone();
                        key.push('.');
                        key.push_str(name);
                        key
                    };
                    (handle, key)
                })
                .collect()
        };

        for (handle, key) in forwards {
            tracing::debug!("state {} -> native {}", key, handle);
            let mut bag = Bag::new();
            bag.insert(STATE_UPDATED_AT.into(), Value::Int(stamp));
            bag.insert(key, value.clone());
            self.engine.merge_state(handle, bag);
        }
        Ok(())
    }

    /// Run `f` with `id` as the current component. The previous context is
    /// restored on every exit path.
    pub fn with_context<T>(&self, id: InstanceId, f: impl FnOnce() -> T) -> T {
        self.context.borrow_mut().push(id);
        let _guard = ContextGuard { store: self };
        f()
    }

    pub fn current(&self) -> Option<InstanceId> {
        self.context.borrow().last().copied()
    }

    /// Commit the reads recorded for the current component as its
    /// subscriptions
    pub fn update_states_to_observe(&self) -> Result<()> {
        let observer = self.current().ok_or(AdapterError::NoObserverContext {
            operation: "update_states_to_observe",
        })?;
        self.graph.borrow_mut().commit(observer);
        Ok(())
    }

    /// Release everything owned by or observed for `owner`
    pub fn remove(&self, owner: &Owner) {
        self.states.borrow_mut().remove(owner);
        let mut graph = self.graph.borrow_mut();
        graph.forget_owner(owner);
        if let Owner::Instance(id) = owner {
            graph.clear_for(*id);
            self.attached.borrow_mut().remove(id);
        }
    }

    pub fn observers_of(&self, owner: &Owner, name: &str) -> Vec<InstanceId> {
        self.graph.borrow().observers_of(owner, name).to_vec()
    }

    fn owner_class_name(&self, owner: &Owner) -> SmartString {
        match owner {
            Owner::Class(name) => name.clone(),
            Owner::Instance(id) => self
                .attached
                .borrow()
                .get(id)
                .map(|a| a.class_name.clone())
                .unwrap_or_default(),
        }
    }

    /// Strictly increasing "last updated at" stamp
    fn tick(&self) -> i64 {
        let next = self.clock.get() + 1;
        self.clock.set(next);
        next
    }
}

struct ContextGuard<'a> {
    store: &'a StateStore,
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.store.context.borrow_mut().pop();
    }
}
