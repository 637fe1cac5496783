use super::Component;
use bridge_types::Bag;
use std::rc::Rc;

/// Incoming (will-*) or previous (did-*) params and state of an update
#[derive(Debug, Clone, Copy)]
pub struct LifecycleArgs<'a> {
    pub props: &'a Bag,
    pub state: Option<&'a Bag>,
}

impl<'a> LifecycleArgs<'a> {
    pub fn new(props: &'a Bag, state: Option<&'a Bag>) -> Self {
        Self { props, state }
    }
}

pub type PlainHook = Rc<dyn Fn(&Component) -> anyhow::Result<()>>;
pub type PropsHook = Rc<dyn Fn(&Component, &Bag) -> anyhow::Result<()>>;
pub type UpdateHook = Rc<dyn Fn(&Component, LifecycleArgs<'_>) -> anyhow::Result<()>>;

/// Declared lifecycle hooks, kept in declaration order. A subclass starts
/// from a copy of its parent's hooks, so parent hooks run first.
#[derive(Clone, Default)]
pub struct Callbacks {
    pub(crate) before_mount: Vec<PlainHook>,
    pub(crate) after_mount: Vec<PlainHook>,
    pub(crate) before_receive_props: Vec<PropsHook>,
    pub(crate) before_update: Vec<UpdateHook>,
    pub(crate) after_update: Vec<UpdateHook>,
    pub(crate) before_unmount: Vec<PlainHook>,
}

impl Callbacks {
    pub fn len(&self) -> usize {
        self.before_mount.len()
            + self.after_mount.len()
            + self.before_receive_props.len()
            + self.before_update.len()
            + self.after_update.len()
            + self.before_unmount.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run hooks in order, stopping at the first failure
pub(crate) fn run_plain(hooks: &[PlainHook], component: &Component) -> anyhow::Result<()> {
    hooks.iter().try_for_each(|hook| hook(component))
}

pub(crate) fn run_props(hooks: &[PropsHook], component: &Component, props: &Bag) -> anyhow::Result<()> {
    hooks.iter().try_for_each(|hook| hook(component, props))
}

pub(crate) fn run_update(
    hooks: &[UpdateHook],
    component: &Component,
    args: LifecycleArgs<'_>,
) -> anyhow::Result<()> {
    hooks.iter().try_for_each(|hook| hook(component, args))
}
