use crate::{
    callbacks::{Callbacks, Options},
    compiler,
    error::FilterError,
    tree::Ast,
    MAX_STRING,
};
use parking_lot::Mutex;
use std::fmt;
use tracing::debug;

/// A compiled filter expression bound to the callbacks it was compiled with.
pub struct Filter<C> {
    options: Options<C>,
    ast: Ast,
    error: Mutex<String>,
}

impl<C> Filter<C>
where
    C: Callbacks,
{
    /// Compiles `expression`, resolving its fields and literals through `options`.
    pub fn compile(expression: &str, options: &Options<C>) -> Result<Self, FilterError> {
        match compiler::compile(options.callbacks(), expression) {
            Ok(ast) => {
                debug!(expression, nodes = ast.len(), "compiled filter");
                Ok(Self {
                    options: options.clone(),
                    ast,
                    error: Mutex::new(String::new()),
                })
            }
            Err(error) => {
                debug!(expression, %error, "failed to compile filter");
                Err(error)
            }
        }
    }

    /// Whether `record` passes the filter.
    ///
    /// Fields the record does not carry never match. Errors reported by the data callback are
    /// returned, and kept as the last error of the filter.
    pub fn evaluate(&self, record: &C::Record) -> Result<bool, FilterError> {
        self.ast
            .evaluate(self.options.callbacks(), record)
            .inspect_err(|error| self.set_error(format_args!("{error}")))
    }

    /// Like [`Filter::evaluate`], but a failed evaluation counts as no match.
    pub fn matches(&self, record: &C::Record) -> bool {
        self.evaluate(record).unwrap_or(false)
    }
}

impl<C> Filter<C> {
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn options(&self) -> &Options<C> {
        &self.options
    }

    /// Replaces the last error. Messages are cut to fit within [`MAX_STRING`] bytes.
    pub fn set_error(&self, message: fmt::Arguments<'_>) {
        let mut message = message.to_string();
        truncate(&mut message, MAX_STRING - 1);
        *self.error.lock() = message;
    }

    pub fn error(&self) -> String {
        self.error.lock().clone()
    }
}

impl<C> fmt::Display for Filter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ast)
    }
}

impl<C> fmt::Debug for Filter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("ast", &self.ast)
            .field("error", &*self.error.lock())
            .finish_non_exhaustive()
    }
}

fn truncate(message: &mut String, max: usize) {
    if message.len() <= max {
        return;
    }
    let mut end = max;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    message.truncate(end);
}
