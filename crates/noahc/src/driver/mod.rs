//! Compilation session: configuration, collaborators and module loading

mod loader;
#[cfg(test)]
pub(crate) mod fixture;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ast::Program;
use crate::common::{CompileError, CompileResult, DiagnosticReporter, FileId};
use crate::module::{Module, ModuleGraph, ModuleId, VirtualFs, module_name};
use crate::sema::KindArena;

/// Turns source text into a [`Program`]
///
/// Lexing and parsing live outside this crate; the session only needs a tree
/// whose spans point into `source`.
pub trait SourceParser {
    fn parse(&self, source: &str, file: FileId) -> CompileResult<Program>;
}

/// Session-wide settings
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Root of the current package; in-package imports resolve below it
    pub project_root: PathBuf,
    /// File extension of source modules, without the dot
    pub source_extension: String,
    /// External packages by name, each mapped to its root directory
    pub packages: HashMap<String, PathBuf>,
    /// Leading character of private names
    pub private_marker: char,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            source_extension: "noah".to_string(),
            packages: HashMap::new(),
            private_marker: '_',
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }

    pub fn with_package(mut self, name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.packages.insert(name.into(), root.into());
        self
    }

    pub fn with_private_marker(mut self, marker: char) -> Self {
        self.private_marker = marker;
        self
    }

    /// Root directory of `package`; the empty name is the current package
    pub fn package_root(&self, package: &str) -> Option<&Path> {
        if package.is_empty() {
            Some(&self.project_root)
        } else {
            self.packages.get(package).map(PathBuf::as_path)
        }
    }
}

/// One compilation run
///
/// Owns the kind arena and the module cache shared by every module compiled
/// in the run. The first error aborts the run.
pub struct Compiler {
    pub(crate) config: CompilerConfig,
    vfs: Box<dyn VirtualFs>,
    parser: Box<dyn SourceParser>,
    pub(crate) kinds: KindArena,
    pub(crate) modules: ModuleGraph,
    reporter: DiagnosticReporter,
}

impl Compiler {
    pub fn new(config: CompilerConfig, vfs: impl VirtualFs + 'static, parser: impl SourceParser + 'static) -> Self {
        Self {
            config,
            vfs: Box::new(vfs),
            parser: Box::new(parser),
            kinds: KindArena::new(),
            modules: ModuleGraph::new(),
            reporter: DiagnosticReporter::new(),
        }
    }

    /// Load and compile the entry module at `path` (slash-separated, no
    /// extension) of the current package
    pub fn compile_entry(&mut self, path: &str) -> CompileResult<ModuleId> {
        self.load_module("", path, None)
    }

    /// Compile an already parsed tree as an entry module named `name`.
    /// `source` is the text the tree's spans point into.
    pub fn compile_program(&mut self, name: &str, source: &str, program: Program) -> CompileResult<ModuleId> {
        let key = module_name("", name);
        let file = self.reporter.add_file(name, source);
        if self.modules.find(&key).is_some() {
            return Err(CompileError::structural(
                format!("Module already loaded: {key}"),
                program.span,
                file,
            ));
        }
        let id = self.modules.register(key, String::new(), file, program);
        self.compile_module(id)?;
        Ok(id)
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn kinds(&self) -> &KindArena {
        &self.kinds
    }

    pub fn modules(&self) -> &ModuleGraph {
        &self.modules
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        self.modules.get(id)
    }

    pub fn reporter(&self) -> &DiagnosticReporter {
        &self.reporter
    }

    /// Print `error` to stderr with its source excerpt
    pub fn report(&self, error: &CompileError) {
        self.reporter.report_error(error);
    }
}
