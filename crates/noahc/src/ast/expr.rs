//! Noah expression AST nodes

use super::{Ident, KindExpr, Param, Stmt};
use crate::common::Span;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_EXPR_ID: AtomicU32 = AtomicU32::new(0);

/// Identity of one expression node, used to key per-expression results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// An expression
#[derive(Debug)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub span: Span,
}

/// A clone is a distinct node and receives its own id.
impl Clone for Expr {
    fn clone(&self) -> Self {
        Self::new(self.kind.clone(), self.span)
    }
}

/// Expression kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Number literal: 42, 1.5, -12
    NumberLiteral(f64),
    /// String literal: "hello"
    StringLiteral(String),
    /// Character literal: 'a'
    CharLiteral(char),
    /// Boolean literal: true, false
    BoolLiteral(bool),
    /// `null`
    NullLiteral,

    /// Identifier: x, foo
    Identifier(Ident),

    /// Member access: shape.area, geo.origin, Color.Red
    Member {
        object: Box<Expr>,
        property: Ident,
    },
    /// Index: items[i]
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// Call: area(), shape.scale(2)
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    /// Binary operation: a + b
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation: -x, !x, ~x
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Kind cast: x as number
    Cast {
        expr: Box<Expr>,
        kind: KindExpr,
    },
    /// Kind test: x is string
    KindTest {
        expr: Box<Expr>,
        kind: KindExpr,
    },
    /// Assignment: x = 5
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },

    /// Function literal: fn(x: number) -> number { return x }
    Func(FuncExpr),
    /// Struct literal: Point { x: 1, y: 2 } or { x: 1 }
    Struct {
        kind: Option<KindExpr>,
        fields: Vec<FieldInit>,
    },
    /// Array literal: [1, 2, 3]
    Array(Vec<Expr>),
}

/// Anonymous function
#[derive(Debug, Clone)]
pub struct FuncExpr {
    pub params: Vec<Param>,
    pub ret: Option<KindExpr>,
    pub body: Vec<Stmt>,
}

/// `key: value` in a struct literal
#[derive(Debug, Clone)]
pub struct FieldInit {
    pub key: Ident,
    pub value: Expr,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            id: ExprId::fresh(),
            kind,
            span,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn number(value: f64) -> Self {
        Self::new(ExprKind::NumberLiteral(value), Span::default())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ExprKind::StringLiteral(value.into()), Span::default())
    }

    pub fn char(value: char) -> Self {
        Self::new(ExprKind::CharLiteral(value), Span::default())
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ExprKind::BoolLiteral(value), Span::default())
    }

    pub fn null() -> Self {
        Self::new(ExprKind::NullLiteral, Span::default())
    }

    pub fn ident(name: impl Into<Ident>) -> Self {
        Self::new(ExprKind::Identifier(name.into()), Span::default())
    }

    pub fn member(object: Expr, property: impl Into<Ident>) -> Self {
        Self::new(
            ExprKind::Member {
                object: Box::new(object),
                property: property.into(),
            },
            Span::default(),
        )
    }

    pub fn index(object: Expr, index: Expr) -> Self {
        Self::new(
            ExprKind::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
            Span::default(),
        )
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
            Span::default(),
        )
    }

    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            Span::default(),
        )
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            Span::default(),
        )
    }

    pub fn cast(expr: Expr, kind: KindExpr) -> Self {
        Self::new(
            ExprKind::Cast {
                expr: Box::new(expr),
                kind,
            },
            Span::default(),
        )
    }

    pub fn kind_test(expr: Expr, kind: KindExpr) -> Self {
        Self::new(
            ExprKind::KindTest {
                expr: Box::new(expr),
                kind,
            },
            Span::default(),
        )
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            Span::default(),
        )
    }

    pub fn func(params: Vec<Param>, ret: Option<KindExpr>, body: Vec<Stmt>) -> Self {
        Self::new(ExprKind::Func(FuncExpr { params, ret, body }), Span::default())
    }

    pub fn structure(kind: Option<KindExpr>, fields: Vec<(&str, Expr)>) -> Self {
        let fields = fields
            .into_iter()
            .map(|(key, value)| FieldInit {
                key: Ident::from(key),
                value,
            })
            .collect();
        Self::new(ExprKind::Struct { kind, fields }, Span::default())
    }

    pub fn array(elements: Vec<Expr>) -> Self {
        Self::new(ExprKind::Array(elements), Span::default())
    }
}
