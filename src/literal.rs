//! Conversion of literal text into values of a resolved field's type.
use crate::{
    callbacks::Callbacks,
    error::{CallbackError, FilterError},
    lvalue::{Lvalue, LvalueOptions},
    types::{MplsLabel, Value, ValueType, MPLS_STACK_DEPTH},
    MAX_STRING, SCALING_FACTOR,
};
use chrono::{NaiveDate, NaiveDateTime};
use cidr::{IpCidr, IpInet};
use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
};
use tracing::trace;

const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A literal encoded for the type of the field it is compared with.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Unsigned(u64),
    Signed(i64),
    Double(f64),
    /// A network. Host bits of the written address are cleared, plain addresses are host networks.
    Addr(IpCidr),
    Mac([u8; 6]),
    /// A raw stack entry or, with a selector, the value of the selected part.
    Mpls(u32),
    Timestamp(u64),
    String(Vec<u8>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(value) => write!(f, "{value}"),
            Self::Signed(value) => write!(f, "{value}"),
            Self::Double(value) => write!(f, "{value}"),
            Self::Addr(network) => write!(f, "{network}"),
            Self::Mac(octets) => write!(
                f,
                "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                octets[0], octets[1], octets[2], octets[3], octets[4], octets[5]
            ),
            Self::Mpls(value) => write!(f, "{value}"),
            Self::Timestamp(value) => write!(f, "{value}"),
            Self::String(bytes) => write!(f, "\"{}\"", String::from_utf8_lossy(bytes)),
        }
    }
}

/// Encodes `text` for the field `lvalue`, consulting the host when the built-in converters fail.
pub fn encode<C>(
    callbacks: &C,
    field: &str,
    lvalue: &Lvalue,
    text: &str,
) -> Result<Literal, FilterError>
where
    C: Callbacks + ?Sized,
{
    if lvalue.ty == ValueType::String && text.len() > MAX_STRING {
        return Err(FilterError::LiteralTooLong {
            field: field.to_owned(),
            length: text.len(),
        });
    }
    if let Some(literal) = decode(lvalue.ty, lvalue.options, text) {
        return Ok(literal);
    }

    trace!(field, literal = text, "falling back to the host literal map");
    let unknown = || FilterError::UnknownLiteral {
        field: field.to_owned(),
        literal: text.to_owned(),
        ty: lvalue.ty,
    };
    let bytes = match callbacks.map_literal(text, lvalue.ty, lvalue.ids[0]) {
        Ok(bytes) => bytes,
        Err(error @ (CallbackError::OutOfMemory | CallbackError::Message(_))) => {
            return Err(FilterError::Callback(error))
        }
        Err(_) => return Err(unknown()),
    };
    from_bytes(lvalue.ty, &bytes).ok_or_else(unknown)
}

/// The built-in converters.
pub fn decode(ty: ValueType, options: LvalueOptions, text: &str) -> Option<Literal> {
    match ty {
        ValueType::Unsigned | ValueType::UnsignedBig | ValueType::UInt64 => {
            parse_unsigned(text).map(Literal::Unsigned)
        }
        ValueType::UInt8 => narrow_unsigned(text, u64::from(u8::MAX)),
        ValueType::UInt16 => narrow_unsigned(text, u64::from(u16::MAX)),
        ValueType::UInt32 => narrow_unsigned(text, u64::from(u32::MAX)),
        ValueType::Signed | ValueType::SignedBig | ValueType::Int64 => {
            parse_signed(text).map(Literal::Signed)
        }
        ValueType::Int8 => narrow_signed(text, i64::from(i8::MIN), i64::from(i8::MAX)),
        ValueType::Int16 => narrow_signed(text, i64::from(i16::MIN), i64::from(i16::MAX)),
        ValueType::Int32 => narrow_signed(text, i64::from(i32::MIN), i64::from(i32::MAX)),
        ValueType::Double => parse_double(text).map(Literal::Double),
        ValueType::Addr => parse_network(text).map(Literal::Addr),
        ValueType::Mac => parse_mac(text).map(Literal::Mac),
        ValueType::Mpls => parse_mpls(text, options).map(Literal::Mpls),
        ValueType::Timestamp | ValueType::TimestampBig => {
            parse_timestamp(text).map(Literal::Timestamp)
        }
        ValueType::String => Some(Literal::String(text.as_bytes().to_vec())),
    }
}

/// Decodes bytes produced by the host in the record layout of `ty`.
fn from_bytes(ty: ValueType, bytes: &[u8]) -> Option<Literal> {
    let literal = match Value::decode(ty, bytes)? {
        Value::Unsigned(value) => Literal::Unsigned(value),
        Value::Signed(value) => Literal::Signed(value),
        Value::Double(value) => Literal::Double(value),
        Value::Addr(address) => Literal::Addr(IpCidr::new_host(address)),
        Value::Mac(octets) => Literal::Mac(octets),
        Value::Mpls(stack) => Literal::Mpls(stack.entry(1)?.raw()),
        Value::Timestamp(value) => Literal::Timestamp(value),
        Value::String(bytes) => Literal::String(bytes.to_vec()),
    };
    Some(literal)
}

fn split_unit(text: &str) -> (&str, u64) {
    let multiplier = match text.chars().last() {
        Some('k' | 'K') => 1_000,
        Some('m' | 'M') => 1_000_000,
        Some('g' | 'G') => 1_000_000_000,
        Some('t' | 'T') => 1_000_000_000_000,
        _ => return (text, 1),
    };
    (&text[..text.len() - 1], multiplier)
}

/// Parses an integer with an optional unit suffix.
///
/// Fractions are first quantized to the precision of [`SCALING_FACTOR`], so `1.0005k` is `1000`,
/// then multiplied by the unit and truncated.
///
/// The fixed-point scale only applies together with a unit: `5.5k` is `5500`, while a plain
/// `5.5` truncates to `5`. The reading of the ×1000 factor is recorded in DESIGN.md under
/// "Scaling".
fn parse_scaled(text: &str) -> Option<Decimal> {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(digits) => (-1, digits),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        let value = u64::from_str_radix(hex, 16).ok()?;
        return Some(Decimal::from(value) * Decimal::from(sign));
    }

    let (number, multiplier) = split_unit(digits);
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value = Decimal::from_str(number)
        .ok()?
        .round_dp_with_strategy(SCALING_FACTOR.ilog10(), RoundingStrategy::ToZero);
    let scaled = value.checked_mul(Decimal::from(multiplier))?.trunc();
    Some(scaled * Decimal::from(sign))
}

fn parse_unsigned(text: &str) -> Option<u64> {
    parse_scaled(text)?.to_u64()
}

fn parse_signed(text: &str) -> Option<i64> {
    parse_scaled(text)?.to_i64()
}

fn narrow_unsigned(text: &str, max: u64) -> Option<Literal> {
    parse_unsigned(text)
        .filter(|value| *value <= max)
        .map(Literal::Unsigned)
}

fn narrow_signed(text: &str, min: i64, max: i64) -> Option<Literal> {
    parse_signed(text)
        .filter(|value| (min..=max).contains(value))
        .map(Literal::Signed)
}

fn parse_double(text: &str) -> Option<f64> {
    let (number, multiplier) = split_unit(text);
    let value = f64::from_str(number).ok()?;
    Some(value * multiplier as f64)
}

fn parse_network(text: &str) -> Option<IpCidr> {
    let Some((address, prefix)) = text.split_once('/') else {
        return text.parse().ok().map(IpCidr::new_host);
    };
    let address = parse_network_address(address)?;
    let prefix = match prefix.parse::<u8>() {
        Ok(prefix) => prefix,
        Err(_) => netmask_length(prefix.parse().ok()?)?,
    };
    IpInet::new(address, prefix).ok().map(|inet| inet.network())
}

/// Accepts abbreviated IPv4 networks such as `10` or `192.168`.
fn parse_network_address(text: &str) -> Option<IpAddr> {
    if let Ok(address) = text.parse() {
        return Some(address);
    }
    let octets = text
        .split('.')
        .map(|octet| octet.parse::<u8>().ok())
        .collect::<Option<Vec<_>>>()?;
    if octets.len() >= 4 {
        return None;
    }
    let mut address = [0u8; 4];
    address[..octets.len()].copy_from_slice(&octets);
    Some(IpAddr::V4(Ipv4Addr::from(address)))
}

/// Only contiguous masks like `255.255.255.0` have a prefix length.
fn netmask_length(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    let ones = bits.leading_ones();
    let contiguous = u32::MAX.checked_shl(32 - ones).unwrap_or(0);
    (bits == contiguous).then_some(ones as u8)
}

fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let separator = if text.contains('-') { '-' } else { ':' };
    let octets = text
        .split(separator)
        .map(|octet| match octet.len() {
            1 | 2 => u8::from_str_radix(octet, 16).ok(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    octets.try_into().ok()
}

fn parse_mpls(text: &str, options: LvalueOptions) -> Option<u32> {
    let value = u32::try_from(parse_unsigned(text)?).ok()?;
    let selector = options.mpls_selector();
    let max = if selector.contains(LvalueOptions::MPLS_EOS) {
        MPLS_STACK_DEPTH as u32
    } else if selector.contains(LvalueOptions::MPLS_EXP) {
        MplsLabel::new(0, u8::MAX, false).exp()
    } else if selector.contains(LvalueOptions::MPLS_LABEL) {
        MplsLabel::new(u32::MAX, 0, false).label()
    } else {
        u32::MAX
    };
    (value <= max).then_some(value)
}

/// Milliseconds since the epoch, given either as a number or as a UTC date and time.
fn parse_timestamp(text: &str) -> Option<u64> {
    if text.chars().all(|c| c.is_ascii_digit()) {
        return text.parse().ok();
    }
    let date_time = DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })?;
    u64::try_from(date_time.and_utc().timestamp_millis()).ok()
}
