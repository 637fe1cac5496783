use serde_json::json;
use std::fmt;

pub mod guard;
mod observable;
mod value;

pub use observable::Observable;
pub use smartstring::alias::String as SmartString;
pub use value::{Bag, Callback, Object, Value};

/// Build a [`Bag`] from `key => value` pairs
#[macro_export]
macro_rules! bag {
    () => { $crate::Bag::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut bag = $crate::Bag::new();
        $( bag.insert($crate::SmartString::from($key), $crate::Value::from($value)); )+
        bag
    }};
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Required,
    Type,
    Value,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Required => "required",
            ViolationKind::Type => "type",
            ViolationKind::Value => "value",
        }
    }
}

/// A single failed prop check
#[derive(Debug, Clone)]
pub struct Violation {
    pub path: SmartString,
    pub message: String,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(path: &str, message: impl Into<String>, kind: ViolationKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    pub fn required(name: &str) -> Self {
        Self::new(
            name,
            format!("Required prop `{}` was not specified", name),
            ViolationKind::Required,
        )
    }

    /// `prefix` already names the prop, e.g. "Provided prop `foo`[0]"
    pub fn type_mismatch(path: &str, prefix: &str, type_name: &str) -> Self {
        Self::new(
            path,
            format!("{} could not be converted to {}", prefix, type_name),
            ViolationKind::Type,
        )
    }

    pub fn not_allowed(name: &str, value: &Value) -> Self {
        Self::new(
            name,
            format!(
                "Value `{}` for prop `{}` is not an allowed value",
                value.to_display_string(),
                name
            ),
            ViolationKind::Value,
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Every violation found for one set of props, in report order
#[derive(Debug, Clone, Default)]
pub struct Violations {
    pub violations: Vec<Violation>,
}

impl Violations {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }

    /// "In component `Foo`" followed by one violation per line
    pub fn prop_type_error(&self, component: &str) -> String {
        let mut out = format!("In component `{}`", component);
        for violation in &self.violations {
            out.push('\n');
            out.push_str(&violation.message);
        }
        out
    }

    /// The line logged when an element is created with bad props
    pub fn warning(&self, component: &str) -> String {
        format!("Warning: Failed propType: {}", self.prop_type_error(component))
    }

    pub fn to_json_string(&self) -> String {
        let errors: Vec<_> = self
            .violations
            .iter()
            .map(|v| {
                json!({
                    "prop": v.path.as_str(),
                    "message": v.message,
                    "type": v.kind.as_str()
                })
            })
            .collect();
        json!({ "errors": errors }).to_string()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for Violations {}
