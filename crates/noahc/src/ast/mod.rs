//! Noah AST definitions
//!
//! The tree is produced by the parser collaborator and consumed read-only by
//! semantic analysis. Every node carries the [`Span`] diagnostics point at.
//! The constructor helpers exist for embedders and tests that build trees by
//! hand; spans default to empty and are attached with `at`.

mod kind;
mod expr;
mod stmt;

pub use kind::*;
pub use expr::*;
pub use stmt::*;

use crate::common::Span;

/// A complete source file
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
    pub span: Span,
}

impl Program {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self {
            body,
            span: Span::default(),
        }
    }
}

/// A name together with where it was written
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Self::new(name, Span::default())
    }
}
