use super::Component;
use crate::error::{AdapterError, Result};
use bridge_types::guard::ParamType;
use bridge_types::{Bag, Observable, Value};

impl Component {
    /// Raw params as the engine holds them
    pub fn params(&self) -> Result<Bag> {
        Ok(self.runtime.engine().props(self.native()?))
    }

    /// Declared params are coerced once and cached until the engine hands
    /// over new params. Observable params read the observable's value.
    pub fn param(&self, name: &str) -> Result<Value> {
        let validator = self.class.validator();
        let Some(rule) = validator.rule(name) else {
            if validator.others_name() == Some(name) {
                return Ok(Value::Hash(self.other_params()?));
            }
            return Ok(self.raw_param(name)?.unwrap_or(Value::Nil));
        };

        match rule.ty() {
            ParamType::Observable => Ok(self
                .raw_param(name)?
                .and_then(|value| value.as_observable().map(Observable::get))
                .unwrap_or(Value::Nil)),
            ParamType::Proc => Ok(self.raw_param(name)?.unwrap_or(Value::Nil)),
            _ => {
                if let Some(cached) = self.processed_params.borrow().get(name) {
                    return Ok(cached.clone());
                }
                let raw = self.raw_param(name)?;
                let value = validator.coerce_param(name, raw.as_ref());
                self.processed_params
                    .borrow_mut()
                    .insert(name.into(), value.clone());
                Ok(value)
            }
        }
    }

    /// Invoke a proc param; nil when the param is absent
    pub fn call_param(&self, name: &str, args: &[Value]) -> Result<Value> {
        Ok(match self.raw_param(name)? {
            Some(Value::Proc(callback)) => callback.call(args),
            _ => Value::Nil,
        })
    }

    /// The observable the parent passed for `name`. Only hands it back: the
    /// parent is not notified again, use `update_param` to write through it.
    pub fn observe_param(&self, name: &str) -> Result<Option<Observable>> {
        Ok(self
            .raw_param(name)?
            .and_then(|value| value.as_observable().cloned()))
    }

    /// Ask the parent to change an observable param; returns the previous
    /// value
    pub fn update_param(&self, name: &str, value: impl Into<Value>) -> Result<Value> {
        Ok(match self.observe_param(name)? {
            Some(observable) => observable.set(value),
            None => Value::Nil,
        })
    }

    /// Undeclared params, gathered once per set of params
    pub fn other_params(&self) -> Result<Bag> {
        if let Some(others) = self.all_others.borrow().as_ref() {
            return Ok(others.clone());
        }
        let others = self.class.validator().collect_all_others(&self.params()?);
        *self.all_others.borrow_mut() = Some(others.clone());
        Ok(others)
    }

    /// Call the `_on<Event>` proc param, e.g. `emit("value_changed", ..)`
    /// calls `_onValueChanged`
    pub fn emit(&self, event: &str, args: &[Value]) -> Result<Value> {
        let name = format!("_on{}", event_camelize(event));
        match self.raw_param(&name)? {
            Some(Value::Proc(callback)) => Ok(callback.call(args)),
            _ => Err(AdapterError::NoMethod {
                name,
                component: self.to_string(),
            }),
        }
    }

    fn raw_param(&self, name: &str) -> Result<Option<Value>> {
        Ok(self.params()?.remove(name))
    }
}

fn event_camelize(event: &str) -> String {
    event
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
