//! Lowers a syntax tree into an evaluable [`Ast`], resolving fields and encoding literals.
use crate::{
    ast::{self, Expr, Field, Operator},
    callbacks::Callbacks,
    error::FilterError,
    literal,
    lvalue::{self, Lvalue},
    parser,
    predicates::{CompareOp, Predicate, PredicateKind},
    tree::{Ast, Leaf, Node, NodeId},
};
use slab::Slab;
use tracing::debug;

/// Deepest chain of `and`, `or`, `not` and parentheses accepted in one expression.
pub const MAX_NESTING: usize = 128;

pub fn compile<C>(callbacks: &C, input: &str) -> Result<Ast, FilterError>
where
    C: Callbacks + ?Sized,
{
    let expr = parser::parse(input)?;
    let mut compiler = Compiler {
        callbacks,
        nodes: Slab::new(),
    };
    let root = compiler.lower(&expr, 0)?;
    Ok(Ast::new(compiler.nodes, root))
}

struct Compiler<'c, C: ?Sized> {
    callbacks: &'c C,
    nodes: Slab<Node>,
}

impl<C> Compiler<'_, C>
where
    C: Callbacks + ?Sized,
{
    fn lower(&mut self, expr: &Expr, depth: usize) -> Result<NodeId, FilterError> {
        if depth > MAX_NESTING {
            return Err(FilterError::Syntax(format!(
                "expression nests deeper than {MAX_NESTING} levels"
            )));
        }
        let node = match expr {
            Expr::And(left, right) => {
                let left = self.lower(left, depth + 1)?;
                let right = self.lower(right, depth + 1)?;
                Node::And(left, right)
            }
            Expr::Or(left, right) => {
                let left = self.lower(left, depth + 1)?;
                let right = self.lower(right, depth + 1)?;
                Node::Or(left, right)
            }
            Expr::Not(child) => Node::Not(self.lower(child, depth + 1)?),
            Expr::Any => Node::Yes,
            Expr::Nothing => Node::Noop,
            Expr::Exist(field) => {
                let lvalue = self.resolve(field)?;
                self.leaf(field, &lvalue, PredicateKind::Exist)
            }
            Expr::Compare {
                field,
                operator,
                value,
            } => {
                let lvalue = self.resolve(field)?;
                return self.lower_operator(field, &lvalue, *operator, value);
            }
            Expr::Implied { field, value } => {
                let lvalue = self.resolve(field)?;
                return self.value(field, &lvalue, implied_operator(&lvalue), value);
            }
            Expr::Bare(field) => {
                let lvalue = self.resolve(field)?;
                match lvalue.constant() {
                    Some(text) => {
                        return self.comparison(field, &lvalue, implied_operator(&lvalue), text)
                    }
                    None => self.leaf(field, &lvalue, PredicateKind::Exist),
                }
            }
            Expr::In { field, values } => {
                let lvalue = self.resolve(field)?;
                let mut level = values
                    .iter()
                    .map(|value| self.value(field, &lvalue, CompareOp::Equal, value))
                    .collect::<Result<Vec<_>, _>>()?;
                // Pairwise so that long lists stay shallow.
                while level.len() > 1 {
                    level = level
                        .chunks(2)
                        .filter_map(|pair| {
                            pair.iter()
                                .copied()
                                .reduce(|left, right| self.nodes.insert(Node::Or(left, right)))
                        })
                        .collect();
                }
                return level.first().copied().ok_or_else(|| {
                    FilterError::Syntax(format!("empty list for field '{}'", field.name))
                });
            }
        };
        Ok(self.nodes.insert(node))
    }

    fn resolve(&self, field: &Field) -> Result<Lvalue, FilterError> {
        lvalue::resolve(self.callbacks, &field.name).inspect_err(|error| {
            debug!(field = %field.name, offset = field.offset, %error, "rejected field");
        })
    }

    /// Operators without a counterpart in the tree are negations of the ones that have one.
    fn lower_operator(
        &mut self,
        field: &Field,
        lvalue: &Lvalue,
        operator: Operator,
        value: &ast::Literal,
    ) -> Result<NodeId, FilterError> {
        let (operator, negated) = match operator {
            Operator::Equal => (CompareOp::Equal, false),
            Operator::NotEqual => (CompareOp::Equal, true),
            Operator::LessThan => (CompareOp::LessThan, false),
            Operator::LessThanEqual => (CompareOp::GreaterThan, true),
            Operator::GreaterThan => (CompareOp::GreaterThan, false),
            Operator::GreaterThanEqual => (CompareOp::LessThan, true),
            Operator::IsSet => (CompareOp::IsSet, false),
        };
        let comparison = self.value(field, lvalue, operator, value)?;
        if negated {
            Ok(self.nodes.insert(Node::Not(comparison)))
        } else {
            Ok(comparison)
        }
    }

    fn value(
        &mut self,
        field: &Field,
        lvalue: &Lvalue,
        operator: CompareOp,
        value: &ast::Literal,
    ) -> Result<NodeId, FilterError> {
        self.comparison(field, lvalue, operator, &value.text)
            .inspect_err(|error| {
                debug!(field = %field.name, offset = value.offset, %error, "rejected literal");
            })
    }

    fn comparison(
        &mut self,
        field: &Field,
        lvalue: &Lvalue,
        operator: CompareOp,
        text: &str,
    ) -> Result<NodeId, FilterError> {
        if !operator.supports(lvalue.ty) {
            return Err(FilterError::UnsupportedOperator {
                field: field.name.clone(),
                operator: operator.symbol(),
                ty: lvalue.ty,
            });
        }
        let literal = literal::encode(self.callbacks, &field.name, lvalue, text)?;
        let node = self.leaf(field, lvalue, PredicateKind::Compare(operator, literal));
        Ok(self.nodes.insert(node))
    }

    fn leaf(&self, field: &Field, lvalue: &Lvalue, kind: PredicateKind) -> Node {
        let predicate = Predicate::new(lvalue.ty, lvalue.options, lvalue.label_depth, kind);
        Node::Leaf(Leaf::new(&field.name, &lvalue.ids, predicate))
    }
}

/// Flag fields test bits when no operator is given, every other field tests equality.
pub fn implied_operator(lvalue: &Lvalue) -> CompareOp {
    if lvalue.is_flags() {
        CompareOp::IsSet
    } else {
        CompareOp::Equal
    }
}
