use super::traits::{DomNode, NativeEngine, NativeHandle};
use crate::component::{Component, ComponentClass};
use crate::config::AdapterConfig;
use crate::console::{Console, TracingConsole};
use crate::error::{AdapterError, Result};
use crate::render::{Element, ElementKind};
use crate::runtime::{Runtime, SharedRuntime};
use bridge_types::{Bag, Value};
use smartstring::alias::String as SmartString;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Upper bound on update passes in one `flush`
const MAX_FLUSH_PASSES: usize = 64;

const VOID_TAGS: &[&str] = &["area", "br", "col", "hr", "img", "input", "link", "meta", "wbr"];

struct StubInstance {
    props: Bag,
    state: Option<Bag>,
    pending_props: Option<Bag>,
    pending_state: Option<Bag>,
    children: Vec<Element>,
    mounted: bool,
    forced: bool,
}

/// In-memory engine for tests and debugging
///
/// State and prop writes are staged until the host commits them, the way a
/// real engine batches them until its next update pass.
pub struct StubEngine {
    instances: RefCell<BTreeMap<NativeHandle, StubInstance>>,
    next_handle: Cell<u32>,
    /// Optional log buffer for testing
    log_buffer: Option<Rc<RefCell<Vec<String>>>>,
}

impl StubEngine {
    pub fn new() -> Self {
        Self {
            instances: RefCell::new(BTreeMap::new()),
            next_handle: Cell::new(0),
            log_buffer: None,
        }
    }

    /// Create a StubEngine that records every engine call in `buffer`
    pub fn with_buffer(buffer: Rc<RefCell<Vec<String>>>) -> Self {
        Self {
            log_buffer: Some(buffer),
            ..Self::new()
        }
    }

    fn log(&self, msg: String) {
        tracing::trace!("{}", msg);
        if let Some(buffer) = &self.log_buffer {
            buffer.borrow_mut().push(msg);
        }
    }

    fn with_instance<T>(&self, handle: NativeHandle, f: impl FnOnce(&mut StubInstance) -> T) -> Option<T> {
        self.instances.borrow_mut().get_mut(&handle).map(f)
    }

    pub fn create_instance(&self, props: Bag, children: Vec<Element>) -> NativeHandle {
        let handle = NativeHandle(self.next_handle.get() + 1);
        self.next_handle.set(handle.0);
        self.instances.borrow_mut().insert(
            handle,
            StubInstance {
                props,
                state: None,
                pending_props: None,
                pending_state: None,
                children,
                mounted: false,
                forced: false,
            },
        );
        self.log(format!("create {}", handle));
        handle
    }

    pub fn destroy(&self, handle: NativeHandle) {
        if self.instances.borrow_mut().remove(&handle).is_some() {
            self.log(format!("destroy {}", handle));
        }
    }

    pub fn set_mounted(&self, handle: NativeHandle, mounted: bool) {
        self.with_instance(handle, |instance| instance.mounted = mounted);
    }

    pub fn len(&self) -> usize {
        self.instances.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.borrow().is_empty()
    }

    /// Instances with staged props, staged state, or a forced update
    pub fn pending_handles(&self) -> Vec<NativeHandle> {
        self.instances
            .borrow()
            .iter()
            .filter(|(_, i)| i.pending_props.is_some() || i.pending_state.is_some() || i.forced)
            .map(|(handle, _)| *handle)
            .collect()
    }

    pub fn has_pending_props(&self, handle: NativeHandle) -> bool {
        self.with_instance(handle, |i| i.pending_props.is_some())
            .unwrap_or(false)
    }

    /// State after the staged writes are applied
    pub fn next_state(&self, handle: NativeHandle) -> Option<Bag> {
        self.with_instance(handle, |i| i.pending_state.clone().or_else(|| i.state.clone()))
            .flatten()
    }

    pub fn next_props(&self, handle: NativeHandle) -> Bag {
        self.with_instance(handle, |i| i.pending_props.clone().unwrap_or_else(|| i.props.clone()))
            .unwrap_or_default()
    }

    pub fn take_forced(&self, handle: NativeHandle) -> bool {
        self.with_instance(handle, |i| std::mem::take(&mut i.forced))
            .unwrap_or(false)
    }

    /// Apply staged props and state
    pub fn commit(&self, handle: NativeHandle) {
        self.with_instance(handle, |i| {
            if let Some(props) = i.pending_props.take() {
                i.props = props;
            }
            if let Some(state) = i.pending_state.take() {
                i.state = Some(state);
            }
        });
    }

    /// Stage a full set of new params, as a parent re-render would
    pub fn receive_props(&self, handle: NativeHandle, props: Bag) {
        self.log(format!("receive_props {}", handle));
        self.with_instance(handle, |i| i.pending_props = Some(props));
    }
}

impl Default for StubEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEngine for StubEngine {
    fn props(&self, handle: NativeHandle) -> Bag {
        self.with_instance(handle, |i| i.props.clone())
            .unwrap_or_default()
    }

    fn state(&self, handle: NativeHandle) -> Option<Bag> {
        self.with_instance(handle, |i| i.state.clone()).flatten()
    }

    fn refs(&self, _handle: NativeHandle) -> Bag {
        Bag::new()
    }

    fn merge_state(&self, handle: NativeHandle, state: Bag) {
        self.log(format!("merge_state {} {:?}", handle, state.keys().collect::<Vec<_>>()));
        self.with_instance(handle, |i| {
            let mut next = i.pending_state.take().or_else(|| i.state.clone()).unwrap_or_default();
            next.extend(state);
            i.pending_state = Some(next);
        });
    }

    fn replace_state(&self, handle: NativeHandle, state: Bag) {
        self.log(format!("replace_state {} {:?}", handle, state.keys().collect::<Vec<_>>()));
        self.with_instance(handle, |i| i.pending_state = Some(state));
    }

    fn merge_props(&self, handle: NativeHandle, props: Bag) {
        self.log(format!("merge_props {}", handle));
        self.with_instance(handle, |i| {
            let mut next = i.pending_props.take().unwrap_or_else(|| i.props.clone());
            next.extend(props);
            i.pending_props = Some(next);
        });
    }

    fn replace_props(&self, handle: NativeHandle, props: Bag) {
        self.receive_props(handle, props);
    }

    fn child_count(&self, handle: NativeHandle) -> usize {
        self.with_instance(handle, |i| i.children.len())
            .unwrap_or(0)
    }

    fn child_at(&self, handle: NativeHandle, index: usize) -> Option<Element> {
        self.with_instance(handle, |i| i.children.get(index).cloned())
            .flatten()
    }

    fn find_dom_node(&self, handle: NativeHandle) -> Option<DomNode> {
        self.with_instance(handle, |i| i.mounted)
            .filter(|mounted| *mounted)
            .map(|_| DomNode(u64::from(handle.0)))
    }

    fn is_mounted(&self, handle: NativeHandle) -> bool {
        self.with_instance(handle, |i| i.mounted).unwrap_or(false)
    }

    fn force_update(&self, handle: NativeHandle) {
        self.log(format!("force_update {}", handle));
        self.with_instance(handle, |i| i.forced = true);
    }
}

/// What a mounted element turned into
enum Mounted {
    Tag {
        name: SmartString,
        attrs: Bag,
        children: Vec<Mounted>,
    },
    Text(String),
    Instance(NativeHandle),
}

struct MountedInstance {
    component: Rc<Component>,
    output: Option<Mounted>,
}

/// Drives components through the stub engine: static markup, mounting,
/// prop changes, state flushes and unmounting. Subtrees are replaced
/// wholesale on re-render.
pub struct StubHost {
    runtime: SharedRuntime,
    engine: Rc<StubEngine>,
    instances: RefCell<BTreeMap<NativeHandle, MountedInstance>>,
}

impl StubHost {
    pub fn new() -> Self {
        Self::with_config(AdapterConfig::default(), Rc::new(TracingConsole))
    }

    pub fn with_console(console: Rc<dyn Console>) -> Self {
        Self::with_config(AdapterConfig::default(), console)
    }

    pub fn with_config(config: AdapterConfig, console: Rc<dyn Console>) -> Self {
        Self::with_engine(Rc::new(StubEngine::new()), config, console)
    }

    pub fn with_engine(engine: Rc<StubEngine>, config: AdapterConfig, console: Rc<dyn Console>) -> Self {
        let runtime = Rc::new(Runtime::new(engine.clone(), config, console));
        Self {
            runtime,
            engine,
            instances: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn runtime(&self) -> &SharedRuntime {
        &self.runtime
    }

    pub fn engine(&self) -> &Rc<StubEngine> {
        &self.engine
    }

    pub fn register(&self, class: &Rc<ComponentClass>) {
        self.runtime.register(class);
    }

    pub fn create_element(&self, class: &Rc<ComponentClass>, params: Bag) -> Element {
        self.runtime.create_element(class, params, Vec::new())
    }

    pub fn component(&self, handle: NativeHandle) -> Option<Rc<Component>> {
        self.instances
            .borrow()
            .get(&handle)
            .map(|m| m.component.clone())
    }

    /// Render to markup without keeping anything mounted
    pub fn render_to_static_markup(&self, element: &Element) -> Result<String> {
        let mut out = String::new();
        self.static_markup(element, &mut out)?;
        Ok(out)
    }

    fn static_markup(&self, element: &Element, out: &mut String) -> Result<()> {
        match element.kind() {
            ElementKind::Text(text) => out.push_str(&escape(text)),
            ElementKind::Tag(name) => {
                open_tag(name, element.props(), out);
                for child in element.children() {
                    self.static_markup(child, out)?;
                }
                close_tag(name, out);
            }
            ElementKind::Component(class) => {
                let handle = self
                    .engine
                    .create_instance(element.props().clone(), element.children().to_vec());
                let component = Runtime::instantiate(&self.runtime, class.clone(), handle);
                component.will_mount()?;
                self.engine.commit(handle);
                let rendered = component.render_element();
                component.detach();
                self.engine.destroy(handle);
                if let Some(rendered) = rendered? {
                    self.static_markup(&rendered, out)?;
                }
            }
        }
        Ok(())
    }

    /// Mount a component element and return its handle. `did_mount` runs
    /// children first, once the whole tree is in place.
    pub fn mount(&self, element: &Element) -> Result<NativeHandle> {
        if !matches!(element.kind(), ElementKind::Component(_)) {
            return Err(AdapterError::NotMountable(element.name().to_string()));
        }
        let mut mounted = Vec::new();
        let node = self.mount_node(element, &mut mounted)?;
        self.finish_mount(&mounted)?;
        match node {
            Mounted::Instance(handle) => Ok(handle),
            _ => Err(AdapterError::NotMountable(element.name().to_string())),
        }
    }

    fn mount_node(&self, element: &Element, mounted: &mut Vec<NativeHandle>) -> Result<Mounted> {
        Ok(match element.kind() {
            ElementKind::Text(text) => Mounted::Text(text.clone()),
            ElementKind::Tag(name) => Mounted::Tag {
                name: name.clone(),
                attrs: element.props().clone(),
                children: element
                    .children()
                    .iter()
                    .map(|child| self.mount_node(child, mounted))
                    .collect::<Result<_>>()?,
            },
            ElementKind::Component(class) => {
                let handle = self
                    .engine
                    .create_instance(element.props().clone(), element.children().to_vec());
                let component = Runtime::instantiate(&self.runtime, class.clone(), handle);
                component.will_mount()?;
                self.engine.commit(handle);
                self.instances.borrow_mut().insert(
                    handle,
                    MountedInstance {
                        component: component.clone(),
                        output: None,
                    },
                );
                let output = self.render_output(&component, mounted)?;
                self.set_output(handle, output);
                self.engine.set_mounted(handle, true);
                mounted.push(handle);
                Mounted::Instance(handle)
            }
        })
    }

    fn render_output(&self, component: &Component, mounted: &mut Vec<NativeHandle>) -> Result<Option<Mounted>> {
        match component.render_element()? {
            Some(element) => Ok(Some(self.mount_node(&element, mounted)?)),
            None => Ok(None),
        }
    }

    fn finish_mount(&self, mounted: &[NativeHandle]) -> Result<()> {
        for handle in mounted {
            if let Some(component) = self.component(*handle) {
                component.did_mount()?;
            }
        }
        Ok(())
    }

    fn set_output(&self, handle: NativeHandle, output: Option<Mounted>) {
        if let Some(instance) = self.instances.borrow_mut().get_mut(&handle) {
            instance.output = output;
        }
    }

    /// Current markup of a mounted instance
    pub fn markup(&self, handle: NativeHandle) -> String {
        let mut out = String::new();
        self.write_instance(handle, &mut out);
        out
    }

    fn write_instance(&self, handle: NativeHandle, out: &mut String) {
        let instances = self.instances.borrow();
        if let Some(output) = instances.get(&handle).and_then(|m| m.output.as_ref()) {
            self.write_mounted(&instances, output, out);
        }
    }

    fn write_mounted(&self, instances: &BTreeMap<NativeHandle, MountedInstance>, node: &Mounted, out: &mut String) {
        match node {
            Mounted::Text(text) => out.push_str(&escape(text)),
            Mounted::Tag { name, attrs, children } => {
                open_tag(name, attrs, out);
                for child in children {
                    self.write_mounted(instances, child, out);
                }
                close_tag(name, out);
            }
            Mounted::Instance(handle) => {
                if let Some(output) = instances.get(handle).and_then(|m| m.output.as_ref()) {
                    self.write_mounted(instances, output, out);
                }
            }
        }
    }

    /// Stage new params for a mounted instance and run its update cycle
    pub fn update_props(&self, handle: NativeHandle, props: Bag) -> Result<bool> {
        self.engine.receive_props(handle, props);
        self.update(handle)
    }

    /// Run update cycles until no mounted instance has staged changes.
    /// Returns the number of re-renders.
    pub fn flush(&self) -> Result<usize> {
        let mut renders = 0;
        for _ in 0..MAX_FLUSH_PASSES {
            let pending: Vec<NativeHandle> = self
                .engine
                .pending_handles()
                .into_iter()
                .filter(|handle| self.instances.borrow().contains_key(handle))
                .collect();
            if pending.is_empty() {
                return Ok(renders);
            }
            for handle in pending {
                if self.update(handle)? {
                    renders += 1;
                }
            }
        }
        tracing::warn!("state still changing after {} update passes", MAX_FLUSH_PASSES);
        Ok(renders)
    }

    fn update(&self, handle: NativeHandle) -> Result<bool> {
        let Some(component) = self.component(handle) else {
            return Ok(false);
        };

        let next_props = self.engine.next_props(handle);
        if self.engine.has_pending_props(handle) {
            component.will_receive_props(&next_props)?;
        }
        let next_state = self.engine.next_state(handle);
        let forced = self.engine.take_forced(handle);

        if !forced && !component.should_update(&next_props, next_state.as_ref())? {
            self.engine.commit(handle);
            return Ok(false);
        }

        component.will_update(&next_props, next_state.as_ref())?;
        let prev_props = self.engine.props(handle);
        let prev_state = self.engine.state(handle);
        self.engine.commit(handle);

        let previous = self
            .instances
            .borrow_mut()
            .get_mut(&handle)
            .and_then(|m| m.output.take());
        if let Some(previous) = previous {
            self.unmount_tree(&previous)?;
        }
        let mut mounted = Vec::new();
        let output = self.render_output(&component, &mut mounted)?;
        self.set_output(handle, output);
        self.finish_mount(&mounted)?;

        component.did_update(&prev_props, prev_state.as_ref())?;
        Ok(true)
    }

    /// Unmount an instance and everything it rendered, parent first
    pub fn unmount(&self, handle: NativeHandle) -> Result<()> {
        let Some(instance) = self.instances.borrow_mut().remove(&handle) else {
            return Ok(());
        };
        self.engine.set_mounted(handle, false);
        let outcome = instance.component.will_unmount();
        if let Some(output) = &instance.output {
            self.unmount_tree(output)?;
        }
        self.engine.destroy(handle);
        outcome
    }

    fn unmount_tree(&self, node: &Mounted) -> Result<()> {
        match node {
            Mounted::Text(_) => Ok(()),
            Mounted::Tag { children, .. } => children.iter().try_for_each(|child| self.unmount_tree(child)),
            Mounted::Instance(handle) => self.unmount(*handle),
        }
    }
}

impl Default for StubHost {
    fn default() -> Self {
        Self::new()
    }
}

fn open_tag(name: &str, attrs: &Bag, out: &mut String) {
    out.push('<');
    out.push_str(name);
    for (key, value) in attrs {
        let rendered = match value {
            Value::String(_) | Value::Int(_) | Value::Float(_) => value.to_display_string(),
            Value::Bool(true) => String::new(),
            _ => continue,
        };
        let key = if key.as_str() == "className" { "class" } else { key.as_str() };
        out.push_str(&format!(" {}=\"{}\"", key, escape(&rendered)));
    }
    if VOID_TAGS.contains(&name) {
        out.push_str("/>");
    } else {
        out.push('>');
    }
}

fn close_tag(name: &str, out: &mut String) {
    if !VOID_TAGS.contains(&name) {
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_types::bag;

    #[test]
    fn test_merge_state_is_staged_until_commit() {
        let engine = StubEngine::new();
        let handle = engine.create_instance(Bag::new(), Vec::new());

        engine.merge_state(handle, bag! { "a" => 1 });
        engine.merge_state(handle, bag! { "b" => 2 });
        assert_eq!(engine.state(handle), None);
        assert_eq!(engine.pending_handles(), vec![handle]);

        engine.commit(handle);
        assert_eq!(engine.state(handle), Some(bag! { "a" => 1, "b" => 2 }));
        assert!(engine.pending_handles().is_empty());
    }

    #[test]
    fn test_replace_state_drops_previous_keys() {
        let engine = StubEngine::new();
        let handle = engine.create_instance(Bag::new(), Vec::new());
        engine.merge_state(handle, bag! { "a" => 1 });
        engine.commit(handle);

        engine.replace_state(handle, bag! { "b" => 2 });
        engine.commit(handle);

        assert_eq!(engine.state(handle), Some(bag! { "b" => 2 }));
    }

    #[test]
    fn test_log_buffer_records_calls() {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let engine = StubEngine::with_buffer(buffer.clone());
        let handle = engine.create_instance(Bag::new(), Vec::new());
        engine.force_update(handle);
        engine.destroy(handle);

        assert_eq!(*buffer.borrow(), vec!["create #1", "force_update #1", "destroy #1"]);
    }

    #[test]
    fn test_tag_markup() {
        let host = StubHost::new();
        let element = Element::tag(
            "div",
            bag! { "className" => "box", "onClick" => () },
            vec![Element::text("a < b"), Element::tag("br", Bag::new(), Vec::new())],
        );

        assert_eq!(
            host.render_to_static_markup(&element).unwrap(),
            r#"<div class="box">a &lt; b<br/></div>"#
        );
    }
}
