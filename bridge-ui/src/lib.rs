pub mod component;
pub mod config;
pub mod console;
pub mod engine;
pub mod error;
pub mod render;
pub mod runtime;
pub mod state;

pub use component::{Component, ComponentBuilder, ComponentClass, Dispatched, LifecycleArgs};
pub use config::{AdapterConfig, ConfigError};
pub use console::{BufferConsole, Console, TracingConsole};
pub use engine::{DomNode, NativeEngine, NativeHandle, StubEngine, StubHost};
pub use error::{AdapterError, Result};
pub use render::{Content, Element, ElementKind, RenderingContext};
pub use runtime::{Runtime, SharedRuntime};

pub use bridge_types::{Bag, Observable, Value, bag};
