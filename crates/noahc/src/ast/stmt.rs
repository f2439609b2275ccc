//! Noah statement and declaration AST nodes

use super::{Expr, Ident, KindExpr, KindProperty, StructKindExpr};
use crate::common::Span;

/// A statement
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// import geo.shapes as shapes / import std:io
    Import(ImportDecl),
    /// fn area() -> number { }
    Func(FuncDecl),
    /// impl Shape for Circle { }
    Impl(ImplDecl),
    /// let x: number = 1 / const y = 2
    Var(VarDecl),
    /// type Meters = number
    TypeAlias(TypeAliasDecl),
    /// type Shape interface { }
    Interface(InterfaceDecl),
    /// type Point struct { }
    Struct(StructDecl),
    /// type Color enum { }
    Enum(EnumDecl),

    /// { ... }
    Block(Vec<Stmt>),
    /// return x
    Return(Option<Expr>),
    /// Expression statement: foo()
    Expr(Expr),
    /// if cond { } else { }
    If {
        condition: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    /// for init; cond; update { }
    For {
        label: Option<Ident>,
        init: Option<Box<Stmt>>,
        condition: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Box<Stmt>,
    },
    /// for item of items { }
    ForOf {
        label: Option<Ident>,
        binding: Ident,
        iterable: Expr,
        body: Box<Stmt>,
    },
    /// break / break outer
    Break(Option<Ident>),
    /// continue / continue outer
    Continue(Option<Ident>),
}

/// Import declaration
#[derive(Debug, Clone)]
pub struct ImportDecl {
    /// External package; `None` means the importing module's own package
    pub package: Option<Ident>,
    pub paths: Vec<Ident>,
    /// Local binding; defaults to the last path segment
    pub local: Option<Ident>,
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: Ident,
    pub kind: KindExpr,
    pub rest: bool,
    pub span: Span,
}

/// Function declaration
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: Ident,
    pub params: Vec<Param>,
    pub ret: Option<KindExpr>,
    pub body: Vec<Stmt>,
    pub public: bool,
    pub span: Span,
}

/// Impl block; the body holds only methods
#[derive(Debug, Clone)]
pub struct ImplDecl {
    pub target: KindExpr,
    pub interface: Option<KindExpr>,
    pub methods: Vec<FuncDecl>,
}

/// Variable or constant declaration
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: Ident,
    pub kind: Option<KindExpr>,
    pub init: Option<Expr>,
    pub is_const: bool,
    pub public: bool,
}

/// Type alias declaration
#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub name: Ident,
    pub kind: KindExpr,
    pub public: bool,
}

/// Interface declaration; every property is a method signature
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: Ident,
    pub properties: Vec<KindProperty>,
    pub public: bool,
}

/// Struct type declaration
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: Ident,
    pub body: StructKindExpr,
    pub public: bool,
}

/// Enum declaration
#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Ident,
    pub choices: Vec<Ident>,
    pub public: bool,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn expr(expr: Expr) -> Self {
        let span = expr.span;
        Self::new(StmtKind::Expr(expr), span)
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Return(value), Span::default())
    }

    pub fn block(body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::Block(body), Span::default())
    }

    pub fn import(paths: &[&str]) -> Self {
        Self::new(
            StmtKind::Import(ImportDecl {
                package: None,
                paths: paths.iter().map(|p| Ident::from(*p)).collect(),
                local: None,
            }),
            Span::default(),
        )
    }

    pub fn alias(name: impl Into<Ident>, kind: KindExpr) -> Self {
        Self::new(
            StmtKind::TypeAlias(TypeAliasDecl {
                name: name.into(),
                kind,
                public: false,
            }),
            Span::default(),
        )
    }

    pub fn structure(name: impl Into<Ident>, body: StructKindExpr) -> Self {
        Self::new(
            StmtKind::Struct(StructDecl {
                name: name.into(),
                body,
                public: false,
            }),
            Span::default(),
        )
    }

    pub fn interface(name: impl Into<Ident>, properties: Vec<KindProperty>) -> Self {
        Self::new(
            StmtKind::Interface(InterfaceDecl {
                name: name.into(),
                properties,
                public: false,
            }),
            Span::default(),
        )
    }

    pub fn enumeration(name: impl Into<Ident>, choices: &[&str]) -> Self {
        Self::new(
            StmtKind::Enum(EnumDecl {
                name: name.into(),
                choices: choices.iter().map(|c| Ident::from(*c)).collect(),
                public: false,
            }),
            Span::default(),
        )
    }

    pub fn func(decl: FuncDecl) -> Self {
        let span = decl.span;
        Self::new(StmtKind::Func(decl), span)
    }

    pub fn imp(target: KindExpr, interface: Option<KindExpr>, methods: Vec<FuncDecl>) -> Self {
        Self::new(
            StmtKind::Impl(ImplDecl {
                target,
                interface,
                methods,
            }),
            Span::default(),
        )
    }

    pub fn var(name: impl Into<Ident>, kind: Option<KindExpr>, init: Option<Expr>) -> Self {
        Self::new(
            StmtKind::Var(VarDecl {
                name: name.into(),
                kind,
                init,
                is_const: false,
                public: false,
            }),
            Span::default(),
        )
    }

    pub fn constant(name: impl Into<Ident>, kind: Option<KindExpr>, init: Option<Expr>) -> Self {
        let mut stmt = Self::var(name, kind, init);
        if let StmtKind::Var(decl) = &mut stmt.kind {
            decl.is_const = true;
        }
        stmt
    }

    /// Mark a declaration `pub`; other statements are returned unchanged
    pub fn public(mut self) -> Self {
        match &mut self.kind {
            StmtKind::Func(d) => d.public = true,
            StmtKind::Var(d) => d.public = true,
            StmtKind::TypeAlias(d) => d.public = true,
            StmtKind::Interface(d) => d.public = true,
            StmtKind::Struct(d) => d.public = true,
            StmtKind::Enum(d) => d.public = true,
            _ => {}
        }
        self
    }
}

impl Param {
    pub fn new(name: impl Into<Ident>, kind: KindExpr) -> Self {
        let name = name.into();
        let span = name.span.merge(kind.span);
        Self {
            name,
            kind,
            rest: false,
            span,
        }
    }

    pub fn rest(name: impl Into<Ident>, kind: KindExpr) -> Self {
        Self {
            rest: true,
            ..Self::new(name, kind)
        }
    }
}

impl FuncDecl {
    pub fn new(name: impl Into<Ident>, params: Vec<Param>, ret: Option<KindExpr>, body: Vec<Stmt>) -> Self {
        let name = name.into();
        let span = name.span;
        Self {
            name,
            params,
            ret,
            body,
            public: false,
            span,
        }
    }

    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}
