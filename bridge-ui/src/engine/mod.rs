pub mod stub;
pub mod traits;

pub use stub::{StubEngine, StubHost};
pub use traits::{DomNode, NativeEngine, NativeHandle};
