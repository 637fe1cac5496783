use super::Component;
use crate::engine::{DomNode, NativeHandle};
use crate::error::{AdapterError, Result};
use crate::render::Children;
use bridge_types::Bag;

impl Component {
    /// The native handle, or a descriptive error before mount / after unmount
    pub fn native(&self) -> Result<NativeHandle> {
        self.native.get().ok_or_else(|| AdapterError::NoNativeComponent {
            component: self.to_string(),
        })
    }

    pub fn dom_node(&self) -> Result<Option<DomNode>> {
        Ok(self.runtime.engine().find_dom_node(self.native()?))
    }

    pub fn is_mounted(&self) -> Result<bool> {
        Ok(self.runtime.engine().is_mounted(self.native()?))
    }

    pub fn force_update(&self) -> Result<()> {
        self.runtime.engine().force_update(self.native()?);
        Ok(())
    }

    /// Merge into the engine's state
    pub fn set_state(&self, state: Bag) -> Result<()> {
        self.runtime.engine().merge_state(self.native()?, state);
        Ok(())
    }

    pub fn replace_state(&self, state: Bag) -> Result<()> {
        self.runtime.engine().replace_state(self.native()?, state);
        Ok(())
    }

    pub fn set_props(&self, props: Bag) -> Result<()> {
        self.runtime.engine().merge_props(self.native()?, props);
        Ok(())
    }

    pub fn replace_props(&self, props: Bag) -> Result<()> {
        self.runtime.engine().replace_props(self.native()?, props);
        Ok(())
    }

    pub fn refs(&self) -> Result<Bag> {
        Ok(self.runtime.engine().refs(self.native()?))
    }

    /// The engine's view of this instance's state
    pub fn native_state(&self) -> Result<Option<Bag>> {
        Ok(self.runtime.engine().state(self.native()?))
    }

    pub fn children(&self) -> Result<Children> {
        Ok(Children::new(self.runtime.engine().clone(), self.native()?))
    }
}
