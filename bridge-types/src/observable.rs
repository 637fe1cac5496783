use crate::value::{Callback, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Two-way bound value.
///
/// Holds the value it was created with plus the callback that commits a
/// change somewhere else (usually a state write in the component that owns
/// the value). Writing never schedules anything by itself: it calls the
/// callback and remembers the new value.
#[derive(Clone)]
pub struct Observable(Rc<ObservableInner>);

struct ObservableInner {
    value: RefCell<Value>,
    on_change: Box<dyn Fn(Value)>,
}

impl Observable {
    pub fn new(value: impl Into<Value>, on_change: impl Fn(Value) + 'static) -> Self {
        Self(Rc::new(ObservableInner {
            value: RefCell::new(value.into()),
            on_change: Box::new(on_change),
        }))
    }

    /// Current value
    pub fn get(&self) -> Value {
        self.0.value.borrow().clone()
    }

    /// Hand `new_value` to the callback and return the previous value
    pub fn set(&self, new_value: impl Into<Value>) -> Value {
        let new_value = new_value.into();
        (self.0.on_change)(new_value.clone());
        self.0.value.replace(new_value)
    }

    /// Zero-arg form reads, one-arg form writes (returning the previous value)
    pub fn call(&self, update: Option<Value>) -> Value {
        match update {
            Some(value) => self.set(value),
            None => self.get(),
        }
    }

    /// Mutate the held value in place, then notify with the result
    pub fn modify(&self, f: impl FnOnce(&mut Value)) {
        {
            let mut value = self.0.value.borrow_mut();
            f(&mut *value);
        }
        self.notify(self.get());
    }

    /// Callback form: calling it notifies with the first argument, or with
    /// the current value when called without arguments.
    pub fn to_callback(&self) -> Callback {
        let this = self.clone();
        Callback::new(move |args| {
            let value = args.first().cloned().unwrap_or_else(|| this.get());
            this.notify(value);
            Value::Nil
        })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn notify(&self, value: Value) {
        (self.0.on_change)(value);
    }
}

impl fmt::Debug for Observable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Observable").field(&*self.0.value.borrow()).finish()
    }
}
