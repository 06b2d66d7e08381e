//! Syntax tree produced by the grammar, before fields and literals are resolved.

pub type TreeNode = Box<Expr>;

#[derive(PartialEq, Clone, Debug)]
pub enum Expr {
    And(TreeNode, TreeNode),
    Or(TreeNode, TreeNode),
    Not(TreeNode),
    /// Always passes.
    Any,
    /// Never passes.
    Nothing,
    Exist(Field),
    Compare {
        field: Field,
        operator: Operator,
        value: Literal,
    },
    /// A field followed by a literal, without an explicit operator.
    Implied { field: Field, value: Literal },
    /// A field on its own.
    Bare(Field),
    In { field: Field, values: Vec<Literal> },
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Field {
    pub name: String,
    pub offset: usize,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Literal {
    pub text: String,
    pub offset: usize,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    IsSet,
}

impl Field {
    pub fn new(name: &str, offset: usize) -> Self {
        Self {
            name: name.to_owned(),
            offset,
        }
    }
}

impl Literal {
    pub fn new(text: &str, offset: usize) -> Self {
        Self {
            text: text.to_owned(),
            offset,
        }
    }
}
