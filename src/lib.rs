//! A compiler and evaluator for boolean filter expressions over flow records.
//!
//! Expressions such as `proto tcp and not dstport in [22 80 443]` are compiled into an [`Ast`]
//! once, then evaluated against any number of records. The engine never looks inside a record
//! itself: field names, symbolic literals and record bytes are all resolved through a host
//! implementation of [`Callbacks`].
mod ast;
mod callbacks;
mod compiler;
mod error;
mod filter;
mod lexer;
mod literal;
mod lvalue;
mod parser;
mod predicates;
#[cfg(test)]
mod testing;
mod tree;
mod types;

pub use crate::{
    callbacks::{Callbacks, Options},
    compiler::{implied_operator, MAX_NESTING},
    error::{CallbackError, ErrorKind, FilterError, LexicalError},
    filter::Filter,
    literal::Literal,
    lvalue::{ExternId, Lvalue, LvalueOptions},
    predicates::{CompareOp, Predicate, PredicateKind},
    tree::{Ast, Leaf, Node, NodeId},
    types::{MplsLabel, MplsStack, Value, ValueType, MPLS_STACK_DEPTH},
};

/// The longest string a literal or a record field may hold, in bytes.
pub const MAX_STRING: usize = 1024;
/// Fractional integer literals are quantized to this precision before being scaled by their unit.
pub const SCALING_FACTOR: u64 = 1000;
/// The most identifiers a single field may resolve to.
pub const MULTINODE_MAX: usize = 4;
