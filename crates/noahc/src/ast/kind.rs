//! Kind (type) expressions as written in source

use super::{Expr, Ident};
use crate::common::Span;

/// A type expression
#[derive(Debug, Clone)]
pub struct KindExpr {
    pub kind: KindExprKind,
    pub span: Span,
}

/// Type expression kinds
#[derive(Debug, Clone)]
pub enum KindExprKind {
    /// `number`
    Number,
    /// `byte`
    Byte,
    /// `char`
    Char,
    /// `string`
    String,
    /// `bool`
    Bool,
    /// `any`
    Any,
    /// `Self` inside an impl or interface body
    SelfKind,
    /// `[T; N]` or, without a length, the vector `[T]`
    Array {
        element: Box<KindExpr>,
        len: Option<Box<Expr>>,
    },
    /// A named kind: `Point`
    Identifier(Ident),
    /// A kind exported by an imported module: `geo.Point`
    Member(Vec<Ident>),
    /// `fn(number, ...string) -> bool`
    Func(FuncKindExpr),
    /// `struct : Base { x: number }`
    Struct(StructKindExpr),
}

/// Function signature expression
#[derive(Debug, Clone, Default)]
pub struct FuncKindExpr {
    pub params: Vec<KindParam>,
    pub ret: Option<Box<KindExpr>>,
}

/// Parameter of a function kind expression
#[derive(Debug, Clone)]
pub struct KindParam {
    pub kind: KindExpr,
    /// Marked `...`; only legal on the last parameter
    pub rest: bool,
    pub span: Span,
}

/// Structure body: extended kinds plus named properties
#[derive(Debug, Clone, Default)]
pub struct StructKindExpr {
    pub extends: Vec<KindExpr>,
    pub properties: Vec<KindProperty>,
}

/// `key: Kind` pair in a struct or interface body
#[derive(Debug, Clone)]
pub struct KindProperty {
    pub key: Ident,
    pub kind: KindExpr,
    pub span: Span,
}

impl KindExpr {
    pub fn new(kind: KindExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn number() -> Self {
        Self::new(KindExprKind::Number, Span::default())
    }

    pub fn byte() -> Self {
        Self::new(KindExprKind::Byte, Span::default())
    }

    pub fn char() -> Self {
        Self::new(KindExprKind::Char, Span::default())
    }

    pub fn string() -> Self {
        Self::new(KindExprKind::String, Span::default())
    }

    pub fn bool() -> Self {
        Self::new(KindExprKind::Bool, Span::default())
    }

    pub fn any() -> Self {
        Self::new(KindExprKind::Any, Span::default())
    }

    pub fn self_kind() -> Self {
        Self::new(KindExprKind::SelfKind, Span::default())
    }

    pub fn named(name: impl Into<Ident>) -> Self {
        Self::new(KindExprKind::Identifier(name.into()), Span::default())
    }

    pub fn member(path: &[&str]) -> Self {
        let path = path.iter().map(|s| Ident::from(*s)).collect();
        Self::new(KindExprKind::Member(path), Span::default())
    }

    pub fn array(element: KindExpr, len: Option<Expr>) -> Self {
        Self::new(
            KindExprKind::Array {
                element: Box::new(element),
                len: len.map(Box::new),
            },
            Span::default(),
        )
    }

    pub fn vector(element: KindExpr) -> Self {
        Self::array(element, None)
    }

    pub fn func(params: Vec<KindParam>, ret: Option<KindExpr>) -> Self {
        Self::new(
            KindExprKind::Func(FuncKindExpr {
                params,
                ret: ret.map(Box::new),
            }),
            Span::default(),
        )
    }

    pub fn structure(extends: Vec<KindExpr>, properties: Vec<KindProperty>) -> Self {
        Self::new(
            KindExprKind::Struct(StructKindExpr { extends, properties }),
            Span::default(),
        )
    }
}

impl KindParam {
    pub fn new(kind: KindExpr) -> Self {
        let span = kind.span;
        Self {
            kind,
            rest: false,
            span,
        }
    }

    pub fn rest(kind: KindExpr) -> Self {
        Self {
            rest: true,
            ..Self::new(kind)
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl KindProperty {
    pub fn new(key: impl Into<Ident>, kind: KindExpr) -> Self {
        let key = key.into();
        let span = key.span.merge(kind.span);
        Self { key, kind, span }
    }
}

impl From<KindExpr> for KindParam {
    fn from(kind: KindExpr) -> Self {
        Self::new(kind)
    }
}
