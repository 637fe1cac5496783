use super::Component;
use crate::error::{AdapterError, Result};

impl Component {
    /// Report a failed hook on the console. The error is swallowed unless
    /// the class (or the runtime) asks for it to be raised again.
    pub(crate) fn process_exception(&self, error: anyhow::Error) -> Result<()> {
        let config = self.runtime.config();
        let backtrace = self.class.backtrace_setting().unwrap_or(config.backtrace);
        let reraise = self.class.reraise_setting().unwrap_or(config.reraise);

        let message = format_exception(&self.to_string(), &error, backtrace);
        self.runtime.console().error(&message);

        if reraise {
            return Err(AdapterError::HookFailed {
                component: self.to_string(),
                source: error,
            });
        }
        Ok(())
    }

    pub(crate) fn guarded(&self, outcome: anyhow::Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(error) => self.process_exception(error),
        }
    }
}

/// With a backtrace: the header followed by the error chain, one entry per
/// line. Without: the header and the top-level message on one line.
pub fn format_exception(component: &str, error: &anyhow::Error, backtrace: bool) -> String {
    let header = format!("Exception raised while rendering {}", component);
    if !backtrace {
        return format!("{}: {}", header, error);
    }

    let mut lines = vec![header];
    let mut chain = error.chain();
    if let Some(first) = chain.next() {
        lines.push(format!("    {}", first));
    }
    lines.extend(chain.map(|cause| cause.to_string()));
    lines.join("\n")
}
