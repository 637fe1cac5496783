pub mod children;
pub mod context;
pub mod element;
pub mod resolve;

pub use children::Children;
pub use context::{Block, Content, RenderTarget, RenderingContext};
pub use element::{Element, ElementKind};
pub use resolve::{BuiltinTags, ComponentRegistry, Resolution, Resolver};
