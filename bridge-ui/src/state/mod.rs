pub mod accessor;
pub mod graph;
pub mod store;

pub use accessor::{ChangeHook, StateAccessor, StateDecl};
pub use graph::ObserverGraph;
pub use store::{InstanceId, Owner, STATE_UPDATED_AT, SharedStateStore, StateStore};
