use crate::{
    literal::Literal,
    lvalue::LvalueOptions,
    types::{address_bits, Value, ValueType},
};
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CompareOp {
    Equal,
    LessThan,
    GreaterThan,
    /// Every bit of the literal is set in the value.
    IsSet,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::IsSet => "&",
        }
    }

    /// Whether the operator is implemented for fields of type `ty`.
    pub fn supports(&self, ty: ValueType) -> bool {
        match self {
            Self::Equal => true,
            Self::LessThan | Self::GreaterThan => ty != ValueType::String,
            Self::IsSet => ty.is_integer(),
        }
    }

    fn apply<T: PartialOrd>(&self, value: &T, literal: &T) -> bool {
        match self {
            Self::Equal => value == literal,
            Self::LessThan => value < literal,
            Self::GreaterThan => value > literal,
            Self::IsSet => false,
        }
    }

    fn apply_bits(&self, value: u64, literal: u64) -> bool {
        match self {
            Self::IsSet => value & literal == literal,
            _ => self.apply(&value, &literal),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PredicateKind {
    /// The record carries the field.
    Exist,
    Compare(CompareOp, Literal),
}

/// A comparison of one field of a record with an encoded literal.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    ty: ValueType,
    options: LvalueOptions,
    label_depth: usize,
    kind: PredicateKind,
}

impl Predicate {
    pub fn new(
        ty: ValueType,
        options: LvalueOptions,
        label_depth: Option<usize>,
        kind: PredicateKind,
    ) -> Self {
        Self {
            ty,
            options,
            label_depth: label_depth.unwrap_or(1),
            kind,
        }
    }

    pub fn ty(&self) -> ValueType {
        self.ty
    }

    pub fn kind(&self) -> &PredicateKind {
        &self.kind
    }

    /// Evaluates the predicate against the bytes of one source of the field, `None` when the
    /// record does not carry it.
    pub fn evaluate(&self, data: Option<&[u8]>) -> bool {
        let (operator, literal) = match &self.kind {
            PredicateKind::Exist => return data.is_some(),
            PredicateKind::Compare(operator, literal) => (*operator, literal),
        };
        let Some(value) = data.and_then(|bytes| Value::decode(self.ty, bytes)) else {
            return false;
        };
        self.compare(operator, literal, &value)
    }

    fn compare(&self, operator: CompareOp, literal: &Literal, value: &Value) -> bool {
        match (literal, value) {
            (Literal::Unsigned(literal), Value::Unsigned(value)) => {
                operator.apply_bits(*value, *literal)
            }
            (Literal::Signed(literal), Value::Signed(value)) => match operator {
                CompareOp::IsSet => operator.apply_bits(*value as u64, *literal as u64),
                _ => operator.apply(value, literal),
            },
            (Literal::Double(literal), Value::Double(value)) => operator.apply(value, literal),
            (Literal::Timestamp(literal), Value::Timestamp(value)) => {
                operator.apply(value, literal)
            }
            (Literal::Mac(literal), Value::Mac(value)) => operator.apply(value, literal),
            (Literal::String(literal), Value::String(value)) => {
                operator == CompareOp::Equal && literal.as_slice() == *value
            }
            (Literal::Addr(network), Value::Addr(address)) => match operator {
                CompareOp::Equal => network.contains(address),
                CompareOp::LessThan | CompareOp::GreaterThan => {
                    let literal = network.first_address();
                    literal.is_ipv4() == address.is_ipv4()
                        && operator.apply(&address_bits(address), &address_bits(&literal))
                }
                CompareOp::IsSet => false,
            },
            (Literal::Mpls(literal), Value::Mpls(stack)) => {
                let selector = self.options.mpls_selector();
                let selected = if selector.contains(LvalueOptions::MPLS_EOS) {
                    stack.bottom().map(|depth| depth as u32)
                } else {
                    stack.entry(self.label_depth).map(|entry| {
                        if selector.contains(LvalueOptions::MPLS_LABEL) {
                            entry.label()
                        } else if selector.contains(LvalueOptions::MPLS_EXP) {
                            entry.exp()
                        } else {
                            entry.raw()
                        }
                    })
                };
                selected.is_some_and(|selected| {
                    operator.apply_bits(u64::from(selected), u64::from(*literal))
                })
            }
            _ => false,
        }
    }
}
