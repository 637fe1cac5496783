use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("No native ReactComponent associated with {component}")]
    NoNativeComponent { component: String },

    #[error("undefined method `{name}` for {component}")]
    NoMethod { name: String, component: String },

    #[error("a components render method must generate and return exactly 1 element or a string")]
    InvalidRender,

    #[error("no render defined for {component}")]
    NoRender { component: String },

    #[error("Could not find component class `{name}` (searched {})", .searched.join(", "))]
    ComponentNotFound { name: String, searched: Vec<String> },

    #[error("cannot mount `{0}`, it is not a component element")]
    NotMountable(String),

    #[error("Exception raised while rendering {component}")]
    HookFailed {
        component: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("state `{name}` of instance {instance} was released at unmount")]
    StateReleased { instance: String, name: String },

    #[error("{operation} called outside of a component context")]
    NoObserverContext { operation: &'static str },
}

pub type Result<T> = std::result::Result<T, AdapterError>;
