//! Modules and the process-wide module cache

mod vfs;

pub use vfs::{MemoryFs, OsFs, VirtualFs};

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::ast::{ExprId, Program};
use crate::common::FileId;
use crate::sema::{Frame, KindRef, Value};

/// Handle of a module in the [`ModuleGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(usize);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Compilation progress of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// In the cache, compilation not started
    Registered,
    Precompiling,
    Compiling,
    Compiled,
}

/// Names a module publishes to its importers
#[derive(Debug, Clone, Default)]
pub struct Exports {
    values: IndexMap<String, Value>,
    kinds: IndexMap<String, KindRef>,
}

impl Exports {
    pub fn set_value(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn set_kind(&mut self, name: &str, kind: KindRef) {
        self.kinds.insert(name.to_string(), kind);
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn kind(&self, name: &str) -> Option<KindRef> {
        self.kinds.get(name).copied()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.values()
    }

    pub fn kinds(&self) -> impl Iterator<Item = (&str, KindRef)> {
        self.kinds.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len() + self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A loaded source module
#[derive(Debug)]
pub struct Module {
    pub id: ModuleId,
    /// `package:path/segments`
    pub name: String,
    pub package: String,
    pub file: FileId,
    pub state: ModuleState,
    pub exports: Exports,
    /// Top-level frame, available once compiled
    pub scope: Option<Frame>,
    /// Inferred kind of every expression compiled in this module
    pub expr_kinds: HashMap<ExprId, KindRef>,
    pub(crate) program: Option<Program>,
}

impl Module {
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    pub fn expr_kind(&self, expr: ExprId) -> Option<KindRef> {
        self.expr_kinds.get(&expr).copied()
    }

    pub fn is_compiled(&self) -> bool {
        self.state == ModuleState::Compiled
    }
}

/// Build the cache key of a module
pub fn module_name(package: &str, path: &str) -> String {
    format!("{package}:{path}")
}

/// Cache of every module loaded in one compilation session
///
/// A module is registered before its own compilation starts, so an import
/// cycle finds the partially compiled module instead of loading it again.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    by_name: HashMap<String, ModuleId>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    /// Insert a module that is about to be compiled
    pub fn register(&mut self, name: String, package: String, file: FileId, program: Program) -> ModuleId {
        debug_assert!(!self.by_name.contains_key(&name), "module registered twice");
        let id = ModuleId(self.modules.len());
        self.by_name.insert(name.clone(), id);
        self.modules.push(Module {
            id,
            name,
            package,
            file,
            state: ModuleState::Registered,
            exports: Exports::default(),
            scope: None,
            expr_kinds: HashMap::new(),
            program: Some(program),
        });
        id
    }

    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn get_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    pub fn by_name(&self, name: &str) -> Option<&Module> {
        self.find(name).map(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.iter()
    }
}
