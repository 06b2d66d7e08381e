//! A host backed by JSON records, used by the unit tests.
use crate::{
    callbacks::{Callbacks, Options},
    error::CallbackError,
    lvalue::{ExternId, Lvalue},
    types::ValueType,
};
use serde_json::Value as Json;
use std::{borrow::Cow, collections::HashMap, net::IpAddr};

/// Fields are looked up by name. The first field registered with a single identifier names the key
/// holding that identifier's value in a record; later fields sharing it read the same key.
///
/// A record value of the form `{"error": "message"}` makes the data callback fail. Lookups and
/// literal translations can be made to fail with [`TestHost::with_failing_field`] and
/// [`TestHost::with_failing_symbol`].
#[derive(Default)]
pub struct TestHost {
    fields: HashMap<String, Result<Lvalue, CallbackError>>,
    sources: HashMap<ExternId, (String, ValueType)>,
    symbols: HashMap<String, Result<Vec<u8>, CallbackError>>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, lvalue: Lvalue) -> Self {
        if let ([id], None) = (lvalue.ids.as_slice(), lvalue.constant()) {
            self.sources
                .entry(*id)
                .or_insert_with(|| (name.to_owned(), lvalue.ty));
        }
        self.fields.insert(name.to_owned(), Ok(lvalue));
        self
    }

    pub fn with_failing_field(mut self, name: &str, error: CallbackError) -> Self {
        self.fields.insert(name.to_owned(), Err(error));
        self
    }

    pub fn with_symbol(mut self, literal: &str, bytes: Vec<u8>) -> Self {
        self.symbols.insert(literal.to_owned(), Ok(bytes));
        self
    }

    pub fn with_failing_symbol(mut self, literal: &str, error: CallbackError) -> Self {
        self.symbols.insert(literal.to_owned(), Err(error));
        self
    }

    pub fn options(self) -> Options<Self> {
        Options::new(self)
    }
}

impl Callbacks for TestHost {
    type Record = Json;

    fn lookup(&self, field: &str) -> Result<Lvalue, CallbackError> {
        self.fields
            .get(field)
            .cloned()
            .unwrap_or(Err(CallbackError::Unknown))
    }

    fn data<'r>(
        &self,
        record: &'r Json,
        id: ExternId,
    ) -> Result<Option<Cow<'r, [u8]>>, CallbackError> {
        let (key, ty) = self.sources.get(&id).ok_or(CallbackError::Unknown)?;
        match record.get(key) {
            None | Some(Json::Null) => Ok(None),
            Some(Json::Object(object)) => {
                let message = object.get("error").and_then(Json::as_str).unwrap_or("");
                Err(CallbackError::Message(message.to_owned()))
            }
            Some(value) => encode(*ty, value)
                .map(|bytes| Some(Cow::Owned(bytes)))
                .ok_or(CallbackError::Other),
        }
    }

    fn map_literal(
        &self,
        literal: &str,
        _ty: ValueType,
        _id: ExternId,
    ) -> Result<Vec<u8>, CallbackError> {
        self.symbols
            .get(literal)
            .cloned()
            .unwrap_or(Err(CallbackError::Unknown))
    }
}

/// Lays a JSON value out the way a flow record would store it.
fn encode(ty: ValueType, value: &Json) -> Option<Vec<u8>> {
    let bytes = match ty {
        ValueType::UInt8 => vec![u8::try_from(value.as_u64()?).ok()?],
        ValueType::UInt16 => u16::try_from(value.as_u64()?).ok()?.to_ne_bytes().to_vec(),
        ValueType::UInt32 => u32::try_from(value.as_u64()?).ok()?.to_ne_bytes().to_vec(),
        ValueType::UInt64 | ValueType::Unsigned => value.as_u64()?.to_ne_bytes().to_vec(),
        ValueType::UnsignedBig => {
            let value = value.as_u64()?;
            match u32::try_from(value) {
                Ok(value) => value.to_be_bytes().to_vec(),
                Err(_) => value.to_be_bytes().to_vec(),
            }
        }
        ValueType::Int8 => vec![i8::try_from(value.as_i64()?).ok()? as u8],
        ValueType::Int16 => i16::try_from(value.as_i64()?).ok()?.to_ne_bytes().to_vec(),
        ValueType::Int32 => i32::try_from(value.as_i64()?).ok()?.to_ne_bytes().to_vec(),
        ValueType::Int64 | ValueType::Signed => value.as_i64()?.to_ne_bytes().to_vec(),
        ValueType::SignedBig => value.as_i64()?.to_be_bytes().to_vec(),
        ValueType::Double => value.as_f64()?.to_ne_bytes().to_vec(),
        ValueType::Timestamp => value.as_u64()?.to_ne_bytes().to_vec(),
        ValueType::TimestampBig => value.as_u64()?.to_be_bytes().to_vec(),
        ValueType::Addr => match value.as_str()?.parse::<IpAddr>().ok()? {
            IpAddr::V4(address) => address.octets().to_vec(),
            IpAddr::V6(address) => address.octets().to_vec(),
        },
        ValueType::Mac => value
            .as_str()?
            .split(':')
            .map(|octet| u8::from_str_radix(octet, 16).ok())
            .collect::<Option<Vec<_>>>()?,
        ValueType::String => value.as_str()?.as_bytes().to_vec(),
        ValueType::Mpls => value
            .as_array()?
            .iter()
            .map(|entry| Some(u32::try_from(entry.as_u64()?).ok()?.to_ne_bytes()))
            .collect::<Option<Vec<_>>>()?
            .concat(),
    };
    Some(bytes)
}
