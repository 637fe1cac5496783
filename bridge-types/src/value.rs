use crate::observable::Observable;
use smartstring::alias::String as SmartString;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Named values handed across the engine boundary (params, state)
pub type Bag = BTreeMap<SmartString, Value>;

/// Value stored in a param or state bag
#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(SmartString),
    Array(Vec<Value>),
    Hash(Bag),
    Proc(Callback),
    Observable(Observable),
    Object(Object),
}

/// Callable param value. Compared by identity.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&[Value]) -> Value>);

impl Callback {
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

/// Opaque host object (an instance of a user-defined param type)
#[derive(Clone)]
pub struct Object {
    type_name: &'static str,
    inner: Rc<dyn Any>,
}

impl Object {
    pub fn new<T: Any>(value: T) -> Self {
        let full = std::any::type_name::<T>();
        Self {
            type_name: full.rsplit("::").next().unwrap_or(full),
            inner: Rc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<{}>", self.type_name)
    }
}

impl Value {
    /// Engine-style equality used for change detection.
    /// Procs, observables and objects compare by identity.
    pub fn eq_value(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.eq_value(y))
            }
            (Value::Hash(a), Value::Hash(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.eq_value(vb))
            }
            (Value::Proc(a), Value::Proc(b)) => a.ptr_eq(b),
            (Value::Observable(a), Value::Observable(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
            Value::Proc(_) => "proc",
            Value::Observable(_) => "observable",
            Value::Object(o) => o.type_name(),
        }
    }

    /// Text used when a value is rendered as element content
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Nil => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.1}", f),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.to_string(),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(Value::to_display_string).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Hash(bag) => {
                let parts: Vec<String> = bag
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v.to_display_string()))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Proc(_) => "#<Proc>".to_string(),
            Value::Observable(o) => o.get().to_display_string(),
            Value::Object(o) => format!("#<{}>", o.type_name()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Nil => Some(false),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&Bag> {
        match self {
            Value::Hash(bag) => Some(bag),
            _ => None,
        }
    }

    pub fn as_proc(&self) -> Option<&Callback> {
        match self {
            Value::Proc(cb) => Some(cb),
            _ => None,
        }
    }

    pub fn as_observable(&self) -> Option<&Observable> {
        match self {
            Value::Observable(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Borrow the host object behind this value if it is a `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object().and_then(|o| o.downcast_ref::<T>())
    }

    /// Marshal into JSON for hosts that only speak JSON.
    /// Procs and objects have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Nil | Value::Proc(_) | Value::Object(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.to_string()),
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Hash(bag) => Json::Object(
                bag.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Value::Observable(o) => o.get().to_json(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.eq_value(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("Nil"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::String(s) => write!(f, "String({:?})", s.as_str()),
            Value::Array(items) => f.debug_list().entries(items).finish(),
            Value::Hash(bag) => f
                .debug_map()
                .entries(bag.iter().map(|(k, v)| (k.as_str(), v)))
                .finish(),
            Value::Proc(cb) => cb.fmt(f),
            Value::Observable(o) => o.fmt(f),
            Value::Object(o) => o.fmt(f),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Nil,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s.into()),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Hash(
                map.into_iter()
                    .map(|(k, v)| (SmartString::from(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<SmartString> for Value {
    fn from(s: SmartString) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Bag> for Value {
    fn from(bag: Bag) -> Self {
        Value::Hash(bag)
    }
}

impl From<Callback> for Value {
    fn from(cb: Callback) -> Self {
        Value::Proc(cb)
    }
}

impl From<Observable> for Value {
    fn from(o: Observable) -> Self {
        Value::Observable(o)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Nil)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nil_equality() {
        assert!(Value::Nil.eq_value(&Value::Nil));
        assert!(!Value::Nil.eq_value(&Value::Bool(false)));
    }

    #[test]
    fn test_numeric_equality() {
        assert!(Value::Int(42).eq_value(&Value::Int(42)));
        assert!(!Value::Int(42).eq_value(&Value::Int(43)));
        assert!(Value::Int(1).eq_value(&Value::Float(1.0)));
        assert!(Value::Float(f64::NAN).eq_value(&Value::Float(f64::NAN)));
    }

    #[test]
    fn test_nested_equality() {
        let a = Value::Array(vec![Value::from("x"), Value::Int(1)]);
        let b = Value::Array(vec![Value::from("x"), Value::Int(1)]);
        let c = Value::Array(vec![Value::from("x")]);
        assert!(a.eq_value(&b));
        assert!(!a.eq_value(&c));
    }

    #[test]
    fn test_procs_compare_by_identity() {
        let cb = Callback::new(|_| Value::Nil);
        let same = Value::Proc(cb.clone());
        let other = Value::Proc(Callback::new(|_| Value::Nil));
        assert!(Value::Proc(cb).eq_value(&same));
        assert!(!same.eq_value(&other));
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::Nil.to_display_string(), "");
        assert_eq!(Value::Int(12).to_display_string(), "12");
        assert_eq!(Value::Float(2.0).to_display_string(), "2.0");
        assert_eq!(Value::from("bar").to_display_string(), "bar");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Int(2)]).to_display_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn test_truthy() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::from("").is_truthy());
    }

    #[test]
    fn test_object_downcast() {
        struct Point(i32);
        let value = Value::Object(Object::new(Point(3)));
        assert_eq!(value.downcast_ref::<Point>().map(|p| p.0), Some(3));
        assert_eq!(value.type_name(), "Point");
        assert!(value.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"name": "rover", "tags": [1, 2.5, null]});
        let value = Value::from(json.clone());
        assert_eq!(value.to_json(), json);
    }
}
