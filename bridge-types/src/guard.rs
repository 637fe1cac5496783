use crate::value::{Bag, Value};
use crate::{Violation, Violations};
use smartstring::alias::String as SmartString;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// How a conversion hook is being asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionMode {
    /// Only answer whether the value could be converted
    ValidateOnly,
    Convert,
}

pub type ConversionFn = Rc<dyn Fn(&Value, ConversionMode) -> Option<Value>>;
type IsAFn = Rc<dyn Fn(&Value) -> bool>;

/// A user-defined param type: an is-a check plus an optional conversion hook
#[derive(Clone)]
pub struct CustomType {
    name: SmartString,
    is_a: IsAFn,
    conversion: Option<ConversionFn>,
}

impl CustomType {
    pub fn new(name: &str, is_a: impl Fn(&Value) -> bool + 'static) -> Self {
        Self {
            name: name.into(),
            is_a: Rc::new(is_a),
            conversion: None,
        }
    }

    /// Type satisfied by host objects of type `T`
    pub fn of<T: Any>(name: &str) -> Self {
        Self::new(name, |value| {
            matches!(value, Value::Object(object) if object.is::<T>())
        })
    }

    pub fn with_conversion(
        mut self,
        conversion: impl Fn(&Value, ConversionMode) -> Option<Value> + 'static,
    ) -> Self {
        self.conversion = Some(Rc::new(conversion));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Declared type of a param
#[derive(Clone)]
pub enum ParamType {
    /// No type declared, anything goes
    Any,
    String,
    Integer,
    Float,
    Number,
    Boolean,
    Hash,
    /// `[]` when `None`, `[T]` when `Some`
    Array(Option<Box<ParamType>>),
    /// Generates a pass-through invoker instead of a value accessor
    Proc,
    /// Generates the two-way read/bang accessor pair
    Observable,
    Custom(CustomType),
}

impl ParamType {
    pub fn array_of(element: ParamType) -> Self {
        ParamType::Array(Some(Box::new(element)))
    }

    pub fn name(&self) -> &str {
        match self {
            ParamType::Any => "Object",
            ParamType::String => "String",
            ParamType::Integer => "Integer",
            ParamType::Float => "Float",
            ParamType::Number => "Numeric",
            ParamType::Boolean => "Boolean",
            ParamType::Hash => "Hash",
            ParamType::Array(_) => "Array",
            ParamType::Proc => "Proc",
            ParamType::Observable => "Observable",
            ParamType::Custom(custom) => custom.name(),
        }
    }

    pub fn is_a(&self, value: &Value) -> bool {
        match self {
            ParamType::Any => true,
            ParamType::String => matches!(value, Value::String(_)),
            ParamType::Integer => matches!(value, Value::Int(_)),
            ParamType::Float => matches!(value, Value::Float(_)),
            ParamType::Number => matches!(value, Value::Int(_) | Value::Float(_)),
            ParamType::Boolean => matches!(value, Value::Bool(_)),
            ParamType::Hash => matches!(value, Value::Hash(_)),
            ParamType::Array(_) => matches!(value, Value::Array(_)),
            ParamType::Proc => matches!(value, Value::Proc(_)),
            ParamType::Observable => matches!(value, Value::Observable(_)),
            ParamType::Custom(custom) => (custom.is_a)(value),
        }
    }

    pub fn has_conversion(&self) -> bool {
        self.conversion().is_some()
    }

    fn conversion(&self) -> Option<&ConversionFn> {
        match self {
            ParamType::Custom(custom) => custom.conversion.as_ref(),
            _ => None,
        }
    }

    fn can_convert(&self, value: &Value) -> bool {
        self.conversion()
            .is_some_and(|convert| convert(value, ConversionMode::ValidateOnly).is_some())
    }

    /// Best-effort conversion. Values that already satisfy the type are
    /// returned unchanged, which keeps coercion idempotent.
    pub fn convert(&self, value: &Value) -> Value {
        if self.is_a(value) {
            return value.clone();
        }
        match self.conversion() {
            Some(convert) => convert(value, ConversionMode::Convert).unwrap_or(Value::Nil),
            None => value.clone(),
        }
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Array(Some(element)) => write!(f, "[{:?}]", element),
            ParamType::Array(None) => f.write_str("[]"),
            other => f.write_str(other.name()),
        }
    }
}

/// Options accepted by `requires` / `optional`
#[derive(Clone, Default)]
pub struct ParamOptions {
    ty: Option<ParamType>,
    default: Option<Value>,
    allow_nil: bool,
    values: Option<Vec<Value>>,
}

impl ParamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ty(mut self, ty: ParamType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn allow_nil(mut self) -> Self {
        self.allow_nil = true;
        self
    }

    /// Restrict the param to an explicit set of values
    pub fn values(mut self, values: Vec<Value>) -> Self {
        self.values = Some(values);
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// One compiled param declaration
#[derive(Clone, Debug)]
pub struct ParamDecl {
    name: SmartString,
    required: bool,
    default: Option<Value>,
    ty: ParamType,
    allow_nil: bool,
    values: Option<Vec<Value>>,
}

impl ParamDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn ty(&self) -> &ParamType {
        &self.ty
    }
}

/// Accumulated param declarations of a component class.
///
/// Rules keep declaration order; violations are reported in that order,
/// all missing-required violations first.
#[derive(Clone, Default)]
pub struct Validator {
    rules: Vec<ParamDecl>,
    all_others: Option<SmartString>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requires(&mut self, name: &str, options: ParamOptions) {
        self.define_rule(name, true, options);
    }

    /// Optional params without an explicit default default to nil and accept nil
    pub fn optional(&mut self, name: &str, options: ParamOptions) {
        self.define_rule(name, false, options);
    }

    /// Gather every undeclared param under `name`
    pub fn all_others(&mut self, name: &str) {
        self.all_others = Some(name.into());
    }

    fn define_rule(&mut self, name: &str, required: bool, options: ParamOptions) {
        let default = if required {
            options.default
        } else {
            Some(options.default.unwrap_or(Value::Nil))
        };
        let allow_nil = options.allow_nil || default.as_ref().is_some_and(Value::is_nil);
        let decl = ParamDecl {
            name: name.into(),
            required,
            default,
            ty: options.ty.unwrap_or(ParamType::Any),
            allow_nil,
            values: options.values,
        };

        // Redeclaring (e.g. in a subclass) replaces the rule in place
        match self.rules.iter_mut().find(|rule| rule.name == decl.name) {
            Some(existing) => *existing = decl,
            None => self.rules.push(decl),
        }
    }

    pub fn rule(&self, name: &str) -> Option<&ParamDecl> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn declarations(&self) -> &[ParamDecl] {
        &self.rules
    }

    pub fn others_name(&self) -> Option<&str> {
        self.all_others.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.all_others.is_none()
    }

    /// Defaults of every optional param
    pub fn default_props(&self) -> Bag {
        self.rules
            .iter()
            .filter_map(|rule| {
                rule.default
                    .as_ref()
                    .map(|default| (rule.name.clone(), default.clone()))
            })
            .collect()
    }

    pub fn validate(&self, props: &Bag) -> Violations {
        let mut violations = Vec::new();

        for rule in &self.rules {
            if rule.required && !props.contains_key(rule.name.as_str()) {
                violations.push(Violation::required(&rule.name));
            }
        }

        for rule in &self.rules {
            let Some(value) = props.get(rule.name.as_str()) else {
                continue;
            };

            match &rule.ty {
                ParamType::Any => {}
                ParamType::Array(Some(element)) => {
                    let prefix = format!("Provided prop `{}`", rule.name);
                    type_check(&mut violations, &rule.name, &prefix, value, &rule.ty, rule.allow_nil);
                    if let Value::Array(items) = value {
                        for (index, item) in items.iter().enumerate() {
                            let path = format!("{}[{}]", rule.name, index);
                            let prefix = format!("Provided prop `{}`[{}]", rule.name, index);
                            type_check(&mut violations, &path, &prefix, item, element, rule.allow_nil);
                        }
                    }
                }
                ty => {
                    let prefix = format!("Provided prop `{}`", rule.name);
                    type_check(&mut violations, &rule.name, &prefix, value, ty, rule.allow_nil);
                }
            }

            if value.is_nil() && rule.allow_nil {
                continue;
            }
            if let Some(allowed) = &rule.values {
                if !allowed.iter().any(|candidate| candidate.eq_value(value)) {
                    violations.push(Violation::not_allowed(&rule.name, value));
                }
            }
        }

        Violations::new(violations)
    }

    /// Coerced value of one param; `raw` is what the engine supplied
    pub fn coerce_param(&self, name: &str, raw: Option<&Value>) -> Value {
        let Some(rule) = self.rule(name) else {
            return raw.cloned().unwrap_or(Value::Nil);
        };
        let value = match raw {
            Some(value) => value.clone(),
            None => rule.default.clone().unwrap_or(Value::Nil),
        };

        match &rule.ty {
            ParamType::Array(Some(element)) if element.has_conversion() => match value {
                Value::Array(items) => {
                    Value::Array(items.iter().map(|item| element.convert(item)).collect())
                }
                other => other,
            },
            ty => ty.convert(&value),
        }
    }

    /// Declared params coerced, undeclared params passed through
    pub fn coerce(&self, props: &Bag) -> Bag {
        let mut coerced = props.clone();
        for rule in &self.rules {
            let value = self.coerce_param(&rule.name, props.get(rule.name.as_str()));
            coerced.insert(rule.name.clone(), value);
        }
        tracing::trace!("coerced {} declared params", self.rules.len());
        coerced
    }

    pub fn collect_all_others(&self, props: &Bag) -> Bag {
        props
            .iter()
            .filter(|(name, _)| self.rule(name).is_none())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

fn type_check(
    violations: &mut Vec<Violation>,
    path: &str,
    prefix: &str,
    value: &Value,
    ty: &ParamType,
    allow_nil: bool,
) {
    if value.is_nil() && allow_nil {
        return;
    }
    if !ty.is_a(value) && !ty.can_convert(value) {
        violations.push(Violation::type_mismatch(path, prefix, ty.name()));
    }
}
