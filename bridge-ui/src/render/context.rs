use super::element::{Element, ElementKind};
use crate::component::ComponentClass;
use crate::console::Console;
use crate::error::AdapterError;
use bridge_types::{Bag, Value};
use smartstring::alias::String as SmartString;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// What a render block hands back
#[derive(Debug, Clone)]
pub enum Content {
    Empty,
    Text(String),
    Element(Element),
}

impl From<()> for Content {
    fn from(_: ()) -> Self {
        Content::Empty
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<Element> for Content {
    fn from(element: Element) -> Self {
        Content::Element(element)
    }
}

/// Nil is empty, wrapped elements stay elements, anything else is its
/// display string
impl From<Value> for Content {
    fn from(value: Value) -> Self {
        if value.is_nil() {
            return Content::Empty;
        }
        match Element::from_value(&value) {
            Some(element) => Content::Element(element),
            None => Content::Text(value.to_display_string()),
        }
    }
}

pub type Block<'a> = Box<dyn FnOnce() -> anyhow::Result<Content> + 'a>;

pub enum RenderTarget {
    /// The outermost frame of a component's render
    Root,
    Tag(SmartString),
    Component(Rc<ComponentClass>),
    /// An already built element, attached as is
    Element(Element),
}

/// Stack of build frames turning nested render calls into an element tree.
///
/// Every rendered element is appended to the innermost open frame; elements
/// rendered while no frame is open are returned but collected nowhere.
pub struct RenderingContext {
    frames: RefCell<Vec<Vec<Element>>>,
    waiting_on_resources: Cell<bool>,
    console: Rc<dyn Console>,
}

impl RenderingContext {
    pub fn new(console: Rc<dyn Console>) -> Self {
        Self {
            frames: RefCell::new(Vec::new()),
            waiting_on_resources: Cell::new(false),
            console,
        }
    }

    /// Run `f` with a fresh, empty frame that is discarded afterwards
    pub fn build<T>(&self, f: impl FnOnce() -> T) -> T {
        self.frames.borrow_mut().push(Vec::new());
        let _guard = FrameGuard { context: self };
        f()
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Mark whatever is rendered next as waiting on resources
    pub fn set_waiting_on_resources(&self, waiting: bool) {
        self.waiting_on_resources.set(waiting);
    }

    pub fn waiting_on_resources(&self) -> bool {
        self.waiting_on_resources.get()
    }

    pub fn render(&self, target: RenderTarget, params: Bag, block: Option<Block<'_>>) -> anyhow::Result<Element> {
        self.remove_nodes_from(&params);

        let element = match (target, block) {
            (target, Some(block)) => self.render_block(target, params, block)?,
            (RenderTarget::Element(element), None) => element,
            (RenderTarget::Root, None) => return Err(AdapterError::InvalidRender.into()),
            (target, None) => {
                let element = self.create(target, params, Vec::new());
                element.set_waiting_on_resources(self.waiting_on_resources.get());
                element
            }
        };

        self.push(element.clone());
        self.waiting_on_resources.set(false);
        Ok(element)
    }

    fn render_block(&self, target: RenderTarget, params: Bag, block: Block<'_>) -> anyhow::Result<Element> {
        self.build(|| -> anyhow::Result<Element> {
            let saved_waiting = self.waiting_on_resources.replace(false);
            let is_root = matches!(target, RenderTarget::Root);
            self.run_child_block(is_root, block)?;
            let buffer = self.current_frame();

            let element = match target {
                RenderTarget::Root => match buffer.last() {
                    Some(last) if !last.is_text() => {
                        if saved_waiting {
                            last.set_waiting_on_resources(true);
                        }
                        last.clone()
                    }
                    last => {
                        let text = last.and_then(Element::as_text).unwrap_or_default();
                        let span = Element::tag("span", Bag::new(), vec![Element::text(text)]);
                        span.set_waiting_on_resources(saved_waiting);
                        span
                    }
                },
                RenderTarget::Element(element) => element,
                target => {
                    let waiting = saved_waiting || buffer.iter().any(Element::waiting_on_resources);
                    let element = self.create(target, params, buffer);
                    element.set_waiting_on_resources(waiting);
                    element
                }
            };
            Ok(element)
        })
    }

    fn run_child_block(&self, is_root: bool, block: Block<'_>) -> anyhow::Result<()> {
        let result = block()?;
        let frame_empty = self.frames.borrow().last().is_none_or(Vec::is_empty);

        let pushed = match &result {
            Content::Text(text) => {
                self.push(Element::text(text.clone()));
                true
            }
            Content::Element(element) if frame_empty => {
                self.push(element.clone());
                true
            }
            _ => false,
        };

        if is_root {
            let buffer = self.current_frame();
            let exactly_result = buffer.len() == 1
                && match (&result, &buffer[0]) {
                    (Content::Text(text), only) => pushed && only.as_text() == Some(text.as_str()),
                    (Content::Element(element), only) => only.ptr_eq(element),
                    (Content::Empty, _) => false,
                };
            if !exactly_result {
                return Err(AdapterError::InvalidRender.into());
            }
        }
        Ok(())
    }

    fn create(&self, target: RenderTarget, params: Bag, children: Vec<Element>) -> Element {
        match target {
            RenderTarget::Tag(name) => Element::tag(&name, params, children),
            RenderTarget::Component(class) => Element::component(class, params, children, &*self.console),
            RenderTarget::Element(element) => element,
            RenderTarget::Root => Element::tag("span", params, children),
        }
    }

    fn current_frame(&self) -> Vec<Element> {
        self.frames.borrow().last().cloned().unwrap_or_default()
    }

    fn push(&self, element: Element) {
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            frame.push(element);
        }
    }

    /// Detach `element` from the current frame so it is only used where it
    /// is passed explicitly
    pub fn as_node(&self, element: &Element) -> Element {
        self.delete(element);
        element.clone()
    }

    /// Swap `old` for `new` in the current frame
    pub fn replace(&self, old: &Element, new: Element) {
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            if let Some(slot) = frame.iter_mut().find(|e| e.ptr_eq(old)) {
                *slot = new;
            }
        }
    }

    fn delete(&self, element: &Element) {
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            frame.retain(|e| !e.ptr_eq(element));
        }
    }

    /// Elements passed as params belong to the receiver, not the frame
    fn remove_nodes_from(&self, params: &Bag) {
        for value in params.values() {
            if let Some(element) = Element::from_value(value) {
                self.delete(&element);
            }
        }
    }
}

struct FrameGuard<'a> {
    context: &'a RenderingContext,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.context.frames.borrow_mut().pop();
    }
}
