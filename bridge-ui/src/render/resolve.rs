use crate::component::ComponentClass;
use crate::error::{AdapterError, Result};
use smartstring::alias::String as SmartString;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

/// Outcome of looking a name up from inside a component
pub enum Resolution {
    BuiltinTag(SmartString),
    Component(Rc<ComponentClass>),
    Unresolved,
}

const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "big", "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col",
    "colgroup", "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt",
    "em", "embed", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "head", "header", "hr", "html", "i", "iframe", "img", "input", "ins", "kbd",
    "keygen", "label", "legend", "li", "link", "main", "map", "mark", "menu", "menuitem", "meta",
    "meter", "nav", "noscript", "object", "ol", "optgroup", "option", "output", "p", "param",
    "picture", "pre", "progress", "q", "rp", "rt", "ruby", "s", "samp", "script", "section",
    "select", "small", "source", "span", "strong", "style", "sub", "summary", "sup", "table",
    "tbody", "td", "textarea", "tfoot", "th", "thead", "time", "title", "tr", "track", "u", "ul",
    "var", "video", "wbr", "circle", "clipPath", "defs", "ellipse", "g", "image", "line",
    "linearGradient", "mask", "path", "pattern", "polygon", "polyline", "radialGradient", "rect",
    "stop", "svg", "text", "tspan",
];

/// Reserved identifiers that render as plain tags
#[derive(Debug, Clone)]
pub struct BuiltinTags {
    tags: BTreeSet<SmartString>,
}

impl BuiltinTags {
    pub fn html() -> Self {
        Self::from_names(HTML_TAGS.iter().copied())
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            tags: names.into_iter().map(SmartString::from).collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains(name)
    }
}

impl Default for BuiltinTags {
    fn default() -> Self {
        Self::html()
    }
}

/// Component classes by fully qualified name ("Outer::Inner")
#[derive(Default)]
pub struct ComponentRegistry {
    classes: BTreeMap<SmartString, Rc<ComponentClass>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, class: Rc<ComponentClass>) -> Option<Rc<ComponentClass>> {
        self.classes.insert(class.name().into(), class)
    }

    pub fn get(&self, path: &str) -> Option<Rc<ComponentClass>> {
        self.classes.get(path.trim_start_matches("::")).cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", scope, name)
    }
}

pub struct Resolver<'a> {
    tags: &'a BuiltinTags,
    registry: &'a ComponentRegistry,
}

impl<'a> Resolver<'a> {
    pub fn new(tags: &'a BuiltinTags, registry: &'a ComponentRegistry) -> Self {
        Self { tags, registry }
    }

    /// Resolve `name` as used inside the class named `caller`: built-in tags
    /// first, then nested lookup
    pub fn resolve(&self, caller: &str, name: &str) -> Resolution {
        if self.tags.contains(name) {
            return Resolution::BuiltinTag(name.into());
        }
        match self.resolve_nested(caller, name) {
            Some(class) => Resolution::Component(class),
            None => Resolution::Unresolved,
        }
    }

    /// Search the caller's own scope, then each enclosing scope, then the
    /// global scope. `name` may itself be a `::` path. First hit wins.
    pub fn resolve_nested(&self, caller: &str, name: &str) -> Option<Rc<ComponentClass>> {
        if let Some(absolute) = name.strip_prefix("::") {
            return self.registry.get(absolute);
        }

        let segments: Vec<&str> = caller.split("::").filter(|s| !s.is_empty()).collect();
        (0..=segments.len()).rev().find_map(|depth| {
            let scope = segments[..depth].join("::");
            let found = self.registry.get(&qualify(&scope, name));
            if found.is_some() {
                tracing::debug!("resolved `{}` from `{}` in scope `{}`", name, caller, scope);
            }
            found
        })
    }

    /// Look up a component for a controller: `<path>::<controller>::<name>`
    /// for every path first, then `<path>::<name>`. A leading `::` skips the
    /// search entirely.
    pub fn find_top_level(
        &self,
        search_path: &[String],
        controller: &str,
        name: &str,
    ) -> Result<Rc<ComponentClass>> {
        if let Some(absolute) = name.strip_prefix("::") {
            return self
                .registry
                .get(absolute)
                .ok_or_else(|| AdapterError::ComponentNotFound {
                    name: name.to_string(),
                    searched: vec![name.to_string()],
                });
        }

        let controller_scoped = search_path
            .iter()
            .map(|path| qualify(&qualify(path, controller), name));
        let plain = search_path.iter().map(|path| qualify(path, name));

        let mut searched = Vec::new();
        for candidate in controller_scoped.chain(plain) {
            if let Some(class) = self.registry.get(&candidate) {
                return Ok(class);
            }
            searched.push(format!("::{}", candidate));
        }

        Err(AdapterError::ComponentNotFound {
            name: name.to_string(),
            searched,
        })
    }
}
