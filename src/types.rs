//! Canonical value types and the decoding of record bytes into comparable values.
use crate::MAX_STRING;
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};

/// Maximum number of entries in an MPLS label stack.
pub const MPLS_STACK_DEPTH: usize = 10;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ValueType {
    /// Unsigned integer of 1, 2, 4 or 8 bytes in host byte order.
    Unsigned,
    /// Unsigned integer of 1, 2, 4 or 8 bytes in network byte order.
    UnsignedBig,
    Signed,
    SignedBig,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Double,
    Addr,
    Mac,
    String,
    Mpls,
    /// Milliseconds since the epoch in host byte order.
    Timestamp,
    /// Milliseconds since the epoch in network byte order.
    TimestampBig,
}

impl ValueType {
    pub fn is_integer(&self) -> bool {
        self.is_unsigned() || self.is_signed()
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Unsigned
                | Self::UnsignedBig
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
        )
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            Self::Signed | Self::SignedBig | Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64
        )
    }

    /// Width in bytes of the integer types that have a fixed size.
    pub fn width(&self) -> Option<usize> {
        match self {
            Self::UInt8 | Self::Int8 => Some(1),
            Self::UInt16 | Self::Int16 => Some(2),
            Self::UInt32 | Self::Int32 => Some(4),
            Self::UInt64 | Self::Int64 | Self::Double | Self::Timestamp | Self::TimestampBig => {
                Some(8)
            }
            _ => None,
        }
    }

    fn is_network_order(&self) -> bool {
        matches!(
            self,
            Self::UnsignedBig | Self::SignedBig | Self::TimestampBig
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unsigned => "unsigned",
            Self::UnsignedBig => "unsigned (network order)",
            Self::Signed => "signed",
            Self::SignedBig => "signed (network order)",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Double => "double",
            Self::Addr => "address",
            Self::Mac => "mac",
            Self::String => "string",
            Self::Mpls => "mpls",
            Self::Timestamp => "timestamp",
            Self::TimestampBig => "timestamp (network order)",
        };
        write!(f, "{name}")
    }
}

/// A single label stack entry: end-of-stack in bit 0, experimental bits in 1-3, label in 4-23.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct MplsLabel(u32);

impl MplsLabel {
    pub fn new(label: u32, exp: u8, eos: bool) -> Self {
        Self(((label & 0xF_FFFF) << 4) | ((u32::from(exp) & 0x7) << 1) | u32::from(eos))
    }

    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn label(&self) -> u32 {
        (self.0 >> 4) & 0xF_FFFF
    }

    pub fn exp(&self) -> u32 {
        (self.0 >> 1) & 0x7
    }

    pub fn eos(&self) -> bool {
        self.0 & 0x1 == 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MplsStack<'a>(&'a [u8]);

impl<'a> MplsStack<'a> {
    fn new(bytes: &'a [u8]) -> Option<Self> {
        let valid = !bytes.is_empty()
            && bytes.len() % 4 == 0
            && bytes.len() / 4 <= MPLS_STACK_DEPTH;
        valid.then_some(Self(bytes))
    }

    /// The entry at a 1-based depth.
    pub fn entry(&self, depth: usize) -> Option<MplsLabel> {
        let start = depth.checked_sub(1)?.checked_mul(4)?;
        let bytes = self.0.get(start..start.checked_add(4)?)?;
        Some(MplsLabel(u32::from_ne_bytes(bytes.try_into().ok()?)))
    }

    /// The 1-based depth of the first entry that has its end-of-stack bit set.
    pub fn bottom(&self) -> Option<usize> {
        (1..=self.0.len() / 4).find(|depth| self.entry(*depth).is_some_and(|entry| entry.eos()))
    }
}

/// The address as an unsigned integer occupying its 128-bit slot.
pub fn address_bits(address: &IpAddr) -> u128 {
    match address {
        IpAddr::V4(address) => u128::from(u32::from(*address)),
        IpAddr::V6(address) => u128::from(*address),
    }
}

/// A record value decoded according to its field type.
#[derive(Clone, Debug, PartialEq)]
pub enum Value<'a> {
    Unsigned(u64),
    Signed(i64),
    Double(f64),
    Addr(IpAddr),
    Mac([u8; 6]),
    Mpls(MplsStack<'a>),
    Timestamp(u64),
    String(&'a [u8]),
}

impl<'a> Value<'a> {
    /// Returns `None` when the length of the bytes does not fit the type.
    pub fn decode(ty: ValueType, bytes: &'a [u8]) -> Option<Self> {
        if let Some(width) = ty.width() {
            if bytes.len() != width {
                return None;
            }
        }
        let big = ty.is_network_order();
        match ty {
            ValueType::Unsigned
            | ValueType::UnsignedBig
            | ValueType::UInt8
            | ValueType::UInt16
            | ValueType::UInt32
            | ValueType::UInt64 => decode_unsigned(bytes, big).map(Self::Unsigned),
            ValueType::Signed
            | ValueType::SignedBig
            | ValueType::Int8
            | ValueType::Int16
            | ValueType::Int32
            | ValueType::Int64 => decode_signed(bytes, big).map(Self::Signed),
            ValueType::Timestamp | ValueType::TimestampBig => {
                decode_unsigned(bytes, big).map(Self::Timestamp)
            }
            ValueType::Double => Some(Self::Double(f64::from_ne_bytes(bytes.try_into().ok()?))),
            ValueType::Addr => match bytes.len() {
                4 => {
                    let octets: [u8; 4] = bytes.try_into().ok()?;
                    Some(Self::Addr(IpAddr::V4(Ipv4Addr::from(octets))))
                }
                16 => {
                    let octets: [u8; 16] = bytes.try_into().ok()?;
                    Some(Self::Addr(IpAddr::V6(Ipv6Addr::from(octets))))
                }
                _ => None,
            },
            ValueType::Mac => Some(Self::Mac(bytes.get(..6)?.try_into().ok()?)),
            ValueType::Mpls => MplsStack::new(bytes).map(Self::Mpls),
            ValueType::String => {
                let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                (end <= MAX_STRING).then(|| Self::String(&bytes[..end]))
            }
        }
    }
}

fn decode_unsigned(bytes: &[u8], big: bool) -> Option<u64> {
    let value = match bytes.len() {
        1 => u64::from(bytes[0]),
        2 => {
            let bytes = bytes.try_into().ok()?;
            u64::from(if big {
                u16::from_be_bytes(bytes)
            } else {
                u16::from_ne_bytes(bytes)
            })
        }
        4 => {
            let bytes = bytes.try_into().ok()?;
            u64::from(if big {
                u32::from_be_bytes(bytes)
            } else {
                u32::from_ne_bytes(bytes)
            })
        }
        8 => {
            let bytes = bytes.try_into().ok()?;
            if big {
                u64::from_be_bytes(bytes)
            } else {
                u64::from_ne_bytes(bytes)
            }
        }
        _ => return None,
    };
    Some(value)
}

fn decode_signed(bytes: &[u8], big: bool) -> Option<i64> {
    let value = match bytes.len() {
        1 => i64::from(bytes[0] as i8),
        2 => {
            let bytes = bytes.try_into().ok()?;
            i64::from(if big {
                i16::from_be_bytes(bytes)
            } else {
                i16::from_ne_bytes(bytes)
            })
        }
        4 => {
            let bytes = bytes.try_into().ok()?;
            i64::from(if big {
                i32::from_be_bytes(bytes)
            } else {
                i32::from_ne_bytes(bytes)
            })
        }
        8 => {
            let bytes = bytes.try_into().ok()?;
            if big {
                i64::from_be_bytes(bytes)
            } else {
                i64::from_ne_bytes(bytes)
            }
        }
        _ => return None,
    };
    Some(value)
}
