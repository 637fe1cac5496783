use super::Component;
use super::callbacks::{LifecycleArgs, run_plain, run_props, run_update};
use crate::error::{AdapterError, Result};
use crate::render::{Content, Element, RenderTarget};
use crate::state::STATE_UPDATED_AT;
use bridge_types::{Bag, Value};

/// The six engine transition points plus the render wrapper. Hook failures
/// are reported through `process_exception` and only come back as `Err`
/// when re-raise is on.
impl Component {
    pub fn will_mount(&self) -> Result<()> {
        tracing::debug!("{} will mount", self);
        self.clear_param_cache();
        let store = self.runtime.store();

        let outcome = (|| -> anyhow::Result<()> {
            let initial = self.class.initial_state();
            if !initial.is_empty() {
                self.replace_state(initial.clone())?;
            }
            store.initialize_states(&self.owner(), &initial);
            store.with_context(self.id, || run_plain(&self.class.callbacks().before_mount, self))
        })();
        self.guarded(outcome)
    }

    pub fn did_mount(&self) -> Result<()> {
        tracing::debug!("{} did mount", self);
        let store = self.runtime.store();
        let outcome = store.with_context(self.id, || -> anyhow::Result<()> {
            run_plain(&self.class.callbacks().after_mount, self)?;
            store.update_states_to_observe()?;
            Ok(())
        });
        self.guarded(outcome)
    }

    pub fn will_receive_props(&self, next_props: &Bag) -> Result<()> {
        let outcome = self.runtime.store().with_context(self.id, || {
            run_props(&self.class.callbacks().before_receive_props, self, next_props)
        });
        self.clear_param_cache();
        self.guarded(outcome)
    }

    /// Whether the engine should re-render. A `needs_update` override is
    /// authoritative and unguarded: its error goes straight back.
    pub fn should_update(&self, next_props: &Bag, next_state: Option<&Bag>) -> Result<bool> {
        self.runtime.store().with_context(self.id, || {
            if let Some(decide) = self.class.needs_update_fn() {
                return decide(self, LifecycleArgs::new(next_props, next_state)).map_err(|source| {
                    AdapterError::HookFailed {
                        component: self.to_string(),
                        source,
                    }
                });
            }
            if self.runtime.config().force_update {
                return Ok(true);
            }
            if self.props_changed(next_props)? {
                return Ok(true);
            }

            let current_state = self.native_state()?;
            Ok(match (next_state, current_state.as_ref()) {
                (Some(_), None) | (None, Some(_)) => true,
                (None, None) => false,
                (Some(next), Some(current)) => {
                    let stamp = |state: &Bag| state.get(STATE_UPDATED_AT).cloned().unwrap_or(Value::Nil);
                    !stamp(next).eq_value(&stamp(current))
                }
            })
        })
    }

    pub fn will_update(&self, next_props: &Bag, next_state: Option<&Bag>) -> Result<()> {
        let outcome = self.runtime.store().with_context(self.id, || {
            run_update(
                &self.class.callbacks().before_update,
                self,
                LifecycleArgs::new(next_props, next_state),
            )
        });
        self.guarded(outcome)
    }

    pub fn did_update(&self, prev_props: &Bag, prev_state: Option<&Bag>) -> Result<()> {
        let store = self.runtime.store();
        let outcome = store.with_context(self.id, || -> anyhow::Result<()> {
            run_update(
                &self.class.callbacks().after_update,
                self,
                LifecycleArgs::new(prev_props, prev_state),
            )?;
            store.update_states_to_observe()?;
            Ok(())
        });
        self.guarded(outcome)
    }

    /// Terminal: state and subscriptions are released and the handle dropped
    /// even when a hook fails
    pub fn will_unmount(&self) -> Result<()> {
        tracing::debug!("{} will unmount", self);
        let outcome = self.runtime.store().with_context(self.id, || {
            run_plain(&self.class.callbacks().before_unmount, self)
        });
        self.detach();
        self.guarded(outcome)
    }

    /// Run the class's render function as the root frame. `Ok(None)` means
    /// the render failed and was reported.
    pub fn render_element(&self) -> Result<Option<Element>> {
        let outcome = self.runtime.store().with_context(self.id, || -> anyhow::Result<Element> {
            let render = self.class.render_fn().cloned().ok_or_else(|| AdapterError::NoRender {
                component: self.to_string(),
            })?;
            self.runtime.rendering().render(
                RenderTarget::Root,
                Bag::new(),
                Some(Box::new(move || -> anyhow::Result<Content> {
                    Ok(match render(self)? {
                        Content::Empty => Content::Text(String::new()),
                        content => content,
                    })
                })),
            )
        });

        match outcome {
            Ok(element) => {
                self.waiting_on_resources.set(element.waiting_on_resources());
                Ok(Some(element))
            }
            Err(error) => self.process_exception(error).map(|()| None),
        }
    }

    fn props_changed(&self, next_props: &Bag) -> Result<bool> {
        let current = self.params()?;
        if !current.keys().eq(next_props.keys()) {
            return Ok(true);
        }
        let engine = self.runtime.engine();
        Ok(current
            .iter()
            .any(|(name, value)| !next_props.get(name).is_some_and(|next| engine.values_equal(next, value))))
    }
}
