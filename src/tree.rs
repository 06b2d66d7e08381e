use crate::{
    callbacks::Callbacks,
    error::{CallbackError, FilterError},
    lvalue::ExternId,
    predicates::{Predicate, PredicateKind},
    MULTINODE_MAX,
};
use slab::Slab;
use smallvec::SmallVec;
use std::fmt;
use tracing::{trace, warn};

pub type NodeId = usize;

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    And(NodeId, NodeId),
    Or(NodeId, NodeId),
    Not(NodeId),
    /// Always matches.
    Yes,
    /// Never matches.
    Noop,
    Leaf(Leaf),
}

/// A comparison applied to every source of one field.
#[derive(Clone, Debug, PartialEq)]
pub struct Leaf {
    field: String,
    ids: SmallVec<[ExternId; MULTINODE_MAX]>,
    predicate: Predicate,
}

impl Leaf {
    pub fn new(field: &str, ids: &[ExternId], predicate: Predicate) -> Self {
        Self {
            field: field.to_owned(),
            ids: SmallVec::from_slice(ids),
            predicate,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn ids(&self) -> &[ExternId] {
        &self.ids
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Matches when any source of the field matches. Absent sources are skipped.
    fn evaluate<C>(&self, callbacks: &C, record: &C::Record) -> Result<bool, FilterError>
    where
        C: Callbacks + ?Sized,
    {
        for id in &self.ids {
            let data = match callbacks.data(record, *id) {
                Ok(data) => data,
                Err(CallbackError::Unknown) => None,
                Err(error) => {
                    warn!(field = %self.field, ?id, %error, "failed to fetch record data");
                    return Err(FilterError::Callback(error));
                }
            };
            let matched = self.predicate.evaluate(data.as_deref());
            trace!(field = %self.field, ?id, present = data.is_some(), matched);
            if matched {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.predicate.kind() {
            PredicateKind::Exist => write!(f, "exist {}", self.field),
            PredicateKind::Compare(operator, literal) => {
                write!(f, "{} {operator} {literal}", self.field)
            }
        }
    }
}

/// A compiled expression. Nodes live in an arena and refer to their children by index.
#[derive(Debug)]
pub struct Ast {
    nodes: Slab<Node>,
    root: NodeId,
}

impl Ast {
    pub(crate) fn new(nodes: Slab<Node>, root: NodeId) -> Self {
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Leaf> {
        self.nodes.iter().filter_map(|(_, node)| match node {
            Node::Leaf(leaf) => Some(leaf),
            _ => None,
        })
    }

    pub fn evaluate<C>(&self, callbacks: &C, record: &C::Record) -> Result<bool, FilterError>
    where
        C: Callbacks + ?Sized,
    {
        self.evaluate_node(self.root, callbacks, record)
    }

    fn evaluate_node<C>(
        &self,
        id: NodeId,
        callbacks: &C,
        record: &C::Record,
    ) -> Result<bool, FilterError>
    where
        C: Callbacks + ?Sized,
    {
        match &self.nodes[id] {
            Node::And(left, right) => Ok(self.evaluate_node(*left, callbacks, record)?
                && self.evaluate_node(*right, callbacks, record)?),
            Node::Or(left, right) => Ok(self.evaluate_node(*left, callbacks, record)?
                || self.evaluate_node(*right, callbacks, record)?),
            Node::Not(child) => Ok(!self.evaluate_node(*child, callbacks, record)?),
            Node::Yes => Ok(true),
            Node::Noop => Ok(false),
            Node::Leaf(leaf) => leaf.evaluate(callbacks, record),
        }
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.nodes[id] {
            Node::And(left, right) => {
                write!(f, "(")?;
                self.fmt_node(*left, f)?;
                write!(f, " and ")?;
                self.fmt_node(*right, f)?;
                write!(f, ")")
            }
            Node::Or(left, right) => {
                write!(f, "(")?;
                self.fmt_node(*left, f)?;
                write!(f, " or ")?;
                self.fmt_node(*right, f)?;
                write!(f, ")")
            }
            Node::Not(child) => {
                write!(f, "not ")?;
                self.fmt_node(*child, f)
            }
            Node::Yes => write!(f, "any"),
            Node::Noop => write!(f, "none"),
            Node::Leaf(leaf) => write!(f, "{leaf}"),
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}
