//! Test helpers: a parser that serves prebuilt trees

use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Compiler, CompilerConfig, SourceParser};
use crate::ast::{Program, Stmt};
use crate::common::{CompileError, CompileResult, FileId, Span};
use crate::module::{MemoryFs, ModuleId};

/// Maps whole source texts to the programs they stand for
#[derive(Default)]
pub(crate) struct FixtureParser {
    programs: HashMap<String, Program>,
    parses: Rc<Cell<usize>>,
}

impl FixtureParser {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, source: &str, body: Vec<Stmt>) -> Self {
        self.programs.insert(source.to_string(), Program::new(body));
        self
    }

    /// Shared counter of `parse` calls
    pub(crate) fn parse_count(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.parses)
    }
}

impl SourceParser for FixtureParser {
    fn parse(&self, source: &str, file: FileId) -> CompileResult<Program> {
        self.parses.set(self.parses.get() + 1);
        self.programs
            .get(source)
            .cloned()
            .ok_or_else(|| CompileError::parse("Unexpected input", Span::default(), file))
    }
}

/// Compile `body` as a standalone entry module
pub(crate) fn compile(body: Vec<Stmt>) -> (Compiler, CompileResult<ModuleId>) {
    let mut compiler = Compiler::new(CompilerConfig::default(), MemoryFs::new(), FixtureParser::new());
    let result = compiler.compile_program("main", "", Program::new(body));
    (compiler, result)
}
