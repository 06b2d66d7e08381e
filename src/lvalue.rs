use crate::{
    callbacks::Callbacks,
    error::{CallbackError, FilterError},
    types::ValueType,
    MULTINODE_MAX,
};
use smallvec::SmallVec;
use std::ops::{BitOr, BitOrAssign};
use tracing::debug;

/// Identifies a field inside a record. Only the host interprets it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ExternId {
    Index(u64),
    /// A pointer-sized handle owned by the host.
    Handle(usize),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct LvalueOptions(u32);

impl LvalueOptions {
    pub const NONE: Self = Self(0);
    /// A bit-flag field: comparisons without an operator test bits instead of equality.
    pub const FLAGS: Self = Self(0x01);
    pub const MPLS_EXP: Self = Self(0x02);
    pub const MPLS_EOS: Self = Self(0x04);
    pub const MPLS_LABEL: Self = Self(0x08);
    /// The field carries its own literal and can be used without a value.
    pub const CONST: Self = Self(0x10);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Only the bits that change how MPLS stacks are compared.
    pub fn mpls_selector(&self) -> Self {
        Self(self.0 & (Self::MPLS_EXP.0 | Self::MPLS_EOS.0 | Self::MPLS_LABEL.0))
    }
}

impl BitOr for LvalueOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LvalueOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A field reference as described by the host lookup callback.
#[derive(Clone, Debug, PartialEq)]
pub struct Lvalue {
    pub ty: ValueType,
    /// Alternative sources of the field; a record matches if any of them does.
    pub ids: SmallVec<[ExternId; MULTINODE_MAX]>,
    pub options: LvalueOptions,
    /// Value compared against when the field is used on its own.
    pub literal: Option<String>,
    /// 1-based MPLS stack entry inspected by label, exp and unselected comparisons.
    pub label_depth: Option<usize>,
}

impl Lvalue {
    pub fn new(ty: ValueType, id: ExternId) -> Self {
        let mut ids = SmallVec::new();
        ids.push(id);
        Self {
            ty,
            ids,
            options: LvalueOptions::NONE,
            literal: None,
            label_depth: None,
        }
    }

    pub fn with_id(mut self, id: ExternId) -> Self {
        self.ids.push(id);
        self
    }

    pub fn with_options(mut self, options: LvalueOptions) -> Self {
        self.options |= options;
        self
    }

    /// Marks the field as a constant standing for `literal`.
    pub fn with_literal(mut self, literal: &str) -> Self {
        self.options |= LvalueOptions::CONST;
        self.literal = Some(literal.to_owned());
        self
    }

    pub fn with_label_depth(mut self, depth: usize) -> Self {
        self.label_depth = Some(depth);
        self
    }

    pub fn is_flags(&self) -> bool {
        self.options.contains(LvalueOptions::FLAGS)
    }

    /// The inline literal, if the field is a constant.
    pub fn constant(&self) -> Option<&str> {
        if self.options.contains(LvalueOptions::CONST) {
            self.literal.as_deref()
        } else {
            None
        }
    }
}

/// Resolves a field name through the host and checks the shape of the answer.
pub fn resolve<C>(callbacks: &C, name: &str) -> Result<Lvalue, FilterError>
where
    C: Callbacks + ?Sized,
{
    let lvalue = callbacks.lookup(name).map_err(|error| {
        debug!(field = name, %error, "lookup failed");
        match error {
            CallbackError::OutOfMemory | CallbackError::Message(_) => FilterError::Callback(error),
            _ => FilterError::UnknownField(name.to_owned()),
        }
    })?;
    let count = lvalue.ids.len();
    if !(1..=MULTINODE_MAX).contains(&count) {
        return Err(FilterError::InvalidLvalue {
            field: name.to_owned(),
            count,
        });
    }
    Ok(lvalue)
}
