pub mod api;
pub mod callbacks;
pub mod class;
pub mod dsl;
pub mod lifecycle;
pub mod params;
pub mod report;

pub use callbacks::{Callbacks, LifecycleArgs};
pub use class::{ComponentBuilder, ComponentClass, ExportedState, NeedsUpdateFn, RenderFn};
pub use dsl::Dispatched;

use crate::SharedRuntime;
use crate::engine::NativeHandle;
use crate::state::{InstanceId, Owner};
use bridge_types::{Bag, Value};
use smartstring::alias::String as SmartString;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Managed side of one engine instance.
///
/// Paired with its native handle at construction; the handle is released at
/// unmount and never comes back.
pub struct Component {
    id: InstanceId,
    class: Rc<ComponentClass>,
    native: Cell<Option<NativeHandle>>,
    runtime: SharedRuntime,
    processed_params: RefCell<HashMap<SmartString, Value>>,
    all_others: RefCell<Option<Bag>>,
    waiting_on_resources: Cell<bool>,
}

impl Component {
    pub(crate) fn new(
        runtime: SharedRuntime,
        id: InstanceId,
        class: Rc<ComponentClass>,
        handle: NativeHandle,
    ) -> Self {
        Self {
            id,
            class,
            native: Cell::new(Some(handle)),
            runtime,
            processed_params: RefCell::new(HashMap::new()),
            all_others: RefCell::new(None),
            waiting_on_resources: Cell::new(false),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn class(&self) -> &Rc<ComponentClass> {
        &self.class
    }

    pub fn runtime(&self) -> &SharedRuntime {
        &self.runtime
    }

    pub fn owner(&self) -> Owner {
        Owner::Instance(self.id)
    }

    pub fn native_handle(&self) -> Option<NativeHandle> {
        self.native.get()
    }

    /// Whether the last render was still waiting on resources
    pub fn waiting_on_resources(&self) -> bool {
        self.waiting_on_resources.get()
    }

    /// Drop store entries and the native handle without running hooks
    pub fn detach(&self) {
        self.runtime.store().remove(&self.owner());
        self.native.set(None);
    }

    fn clear_param_cache(&self) {
        self.processed_params.borrow_mut().clear();
        self.all_others.borrow_mut().take();
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}:{}>", self.class.name(), self.id)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id)
            .field("class", &self.class.name())
            .field("native", &self.native.get())
            .finish()
    }
}
