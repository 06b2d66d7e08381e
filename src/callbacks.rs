use crate::{
    error::CallbackError,
    lvalue::{ExternId, Lvalue},
    types::ValueType,
};
use std::{borrow::Cow, sync::Arc};

/// The capabilities a host provides so filters can be compiled and evaluated against its records.
pub trait Callbacks {
    /// The host's record type. The engine only passes references to it back to [`Callbacks::data`].
    type Record: ?Sized;

    /// Describes the field named `field` in an expression.
    fn lookup(&self, field: &str) -> Result<Lvalue, CallbackError>;

    /// Fetches the bytes of the field identified by `id` from `record`, or `None` if the record
    /// does not carry it.
    fn data<'r>(
        &self,
        record: &'r Self::Record,
        id: ExternId,
    ) -> Result<Option<Cow<'r, [u8]>>, CallbackError>;

    /// Translates a literal the built-in converters could not decode, e.g. a protocol name.
    ///
    /// The bytes must use the same layout [`Callbacks::data`] uses for `ty`.
    fn map_literal(
        &self,
        _literal: &str,
        _ty: ValueType,
        _id: ExternId,
    ) -> Result<Vec<u8>, CallbackError> {
        Err(CallbackError::Unknown)
    }
}

/// A set of callbacks that can be shared by any number of filters.
pub struct Options<C> {
    callbacks: Arc<C>,
}

impl<C> Options<C>
where
    C: Callbacks,
{
    pub fn new(callbacks: C) -> Self {
        Self {
            callbacks: Arc::new(callbacks),
        }
    }

    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }
}

impl<C> Clone for Options<C> {
    fn clone(&self) -> Self {
        Self {
            callbacks: Arc::clone(&self.callbacks),
        }
    }
}

impl<C> From<Arc<C>> for Options<C> {
    fn from(callbacks: Arc<C>) -> Self {
        Self { callbacks }
    }
}
