use std::cell::RefCell;
use std::rc::Rc;

/// Host log sink for validation warnings and hook failure reports
pub trait Console {
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards everything to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Captures lines for assertions
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    warnings: Rc<RefCell<Vec<String>>>,
    errors: Rc<RefCell<Vec<String>>>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.borrow().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }

    pub fn clear(&self) {
        self.warnings.borrow_mut().clear();
        self.errors.borrow_mut().clear();
    }
}

impl Console for BufferConsole {
    fn warn(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}
