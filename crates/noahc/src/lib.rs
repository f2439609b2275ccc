//! Noah Compiler - semantic analysis core for the Noah language
//!
//! This library turns parsed Noah modules into a resolved, structurally
//! typed symbol graph that a code generator can consume.
//!
//! ## Architecture
//!
//! The compiler is organized into:
//! - **AST** (`ast/`): The tree handed over by the external parser
//! - **Semantic analysis** (`sema/`): Kinds, scopes, comparison, inference
//!   and the two-pass declaration compiler
//! - **Modules** (`module/`): Module cache and the virtual file system
//! - **Driver** (`driver/`): Compilation session and configuration
//! - **Common** (`common/`): Shared infrastructure (errors, spans)

pub mod common;
pub mod ast;
pub mod sema;
pub mod module;
pub mod driver;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, DiagnosticReporter, Span};
pub use driver::{Compiler, CompilerConfig, SourceParser};
pub use module::{MemoryFs, Module, ModuleGraph, ModuleId, OsFs, VirtualFs};
pub use sema::{Kind, KindArena, KindRef, Value, compare_kind};
