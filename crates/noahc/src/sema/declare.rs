//! Two-pass declaration compiler
//!
//! Pass 1 (precompile) registers every declaration of a block before any
//! body is looked at, so siblings may reference each other in any order.
//! Pass 2 (compile) resolves variable initializers and function bodies
//! against the completed tables.

use indexmap::IndexMap;
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

use crate::ast::*;
use crate::common::{CompileError, CompileResult, FileId, Span};
use crate::driver::Compiler;
use crate::module::{Exports, ModuleId};
use super::compare::{KindComparator, compare_kind};
use super::infer::InferenceCache;
use super::kind::{EnumKind, InterfaceKind, Kind, KindArena, KindRef};
use super::resolve::{DeferredCheck, Requirement};
use super::scope::{Frame, Scope};
use super::value::{FuncValue, ModuleValue, VarValue};

/// Compiles the declarations of one module
pub(crate) struct DeclCompiler<'c> {
    pub(crate) compiler: &'c mut Compiler,
    pub(crate) module: ModuleId,
    pub(crate) file: FileId,
    package: String,
    pub(crate) scope: Scope,
    pub(crate) cache: InferenceCache,
    /// Declared return kinds of the enclosing functions, innermost last
    pub(crate) returns: Vec<KindRef>,
    /// Targets of top-level impl blocks, in source order
    impl_targets: VecDeque<KindRef>,
    /// Shape checks waiting for forward-declared kinds
    pub(crate) deferred: Vec<DeferredCheck>,
}

impl<'c> DeclCompiler<'c> {
    pub(crate) fn new(compiler: &'c mut Compiler, module: ModuleId) -> Self {
        let (file, package) = {
            let m = compiler.modules.get(module);
            (m.file, m.package.clone())
        };
        let mut scope = Scope::new();
        scope.push();
        Self {
            compiler,
            module,
            file,
            package,
            scope,
            cache: InferenceCache::new(),
            returns: Vec::new(),
            impl_targets: VecDeque::new(),
            deferred: Vec::new(),
        }
    }

    /// Top-level frame and inferred expression kinds
    pub(crate) fn finish(mut self) -> (Frame, InferenceCache) {
        let frame = self.scope.pop().unwrap_or_default();
        (frame, self.cache)
    }

    pub(crate) fn kinds(&self) -> &KindArena {
        &self.compiler.kinds
    }

    pub(crate) fn kinds_mut(&mut self) -> &mut KindArena {
        &mut self.compiler.kinds
    }

    /// Pass 1 over the module body
    pub(crate) fn precompile_program(&mut self, program: &Program) -> CompileResult<()> {
        debug!("precompiling {}", self.compiler.modules.get(self.module).name);
        self.precompile_block(&program.body, true)
    }

    /// Pass 2 over the module body
    pub(crate) fn compile_program(&mut self, program: &Program) -> CompileResult<()> {
        debug!("compiling {}", self.compiler.modules.get(self.module).name);
        // Initializers go first so function bodies see inferred variable kinds
        for stmt in &program.body {
            if let StmtKind::Var(decl) = &stmt.kind {
                let kind = self.top_level_var_kind(&decl.name)?;
                self.init_var(decl, kind)?;
            }
        }
        for stmt in &program.body {
            match &stmt.kind {
                StmtKind::Var(_) => {}
                StmtKind::Impl(decl) => self.compile_impl(decl, stmt.span)?,
                _ => self.compile_stmt(stmt)?,
            }
        }
        Ok(())
    }

    /// Register the declarations of a block, in phases: imports, type
    /// slots, type bodies, then function, variable and impl signatures.
    /// Local variables are declared in place by the compile pass instead.
    pub(crate) fn precompile_block(&mut self, stmts: &[Stmt], top_level: bool) -> CompileResult<()> {
        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Import(decl) if top_level => self.precompile_import(decl, stmt.span)?,
                StmtKind::Import(_) => {
                    return Err(CompileError::structural(
                        "Import is only allowed at module level",
                        stmt.span,
                        self.file,
                    ));
                }
                StmtKind::Impl(_) if !top_level => {
                    return Err(CompileError::structural(
                        "Impl is only allowed at module level",
                        stmt.span,
                        self.file,
                    ));
                }
                _ => {}
            }
        }

        let mut types = Vec::new();
        for stmt in stmts {
            if let Some((name, public)) = type_decl_name(stmt) {
                let cell = self.reserve_kind(name, public)?;
                types.push((stmt, cell));
            }
        }
        for (stmt, cell) in &types {
            self.resolve_type_decl(stmt, *cell)?;
        }
        for (stmt, cell) in &types {
            if let StmtKind::TypeAlias(decl) = &stmt.kind {
                self.check_alias_cycle(*cell, &decl.name)?;
            }
        }
        self.check_deferred()?;

        for stmt in stmts {
            match &stmt.kind {
                StmtKind::Func(decl) => self.precompile_func(decl)?,
                StmtKind::Var(decl) if top_level => {
                    self.declare_var(decl)?;
                }
                StmtKind::Impl(decl) => self.precompile_impl(decl)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn precompile_import(&mut self, decl: &ImportDecl, span: Span) -> CompileResult<()> {
        let package = match &decl.package {
            Some(package) => {
                if !self.compiler.config.packages.contains_key(&package.name) {
                    return Err(CompileError::lookup(
                        format!("Cannot find package: {}", package.name),
                        package.span,
                        self.file,
                    ));
                }
                package.name.clone()
            }
            None => self.package.clone(),
        };
        let Some(last) = decl.paths.last() else {
            return Err(CompileError::structural("Expect an import path", span, self.file));
        };
        let local = decl.local.as_ref().unwrap_or(last);
        let path = decl
            .paths
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join("/");

        let module = self.compiler.load_module(&package, &path, Some((self.file, span)))?;
        trace!("import {package}:{path} as {}", local.name);
        let value = ModuleValue {
            name: local.name.clone(),
            module,
        };
        self.scope
            .put_value(&local.name, value.into())
            .map_err(|e| CompileError::structural(e, local.span, self.file))
    }

    fn reserve_kind(&mut self, name: &Ident, public: bool) -> CompileResult<KindRef> {
        let cell = self.kinds_mut().pending();
        self.scope
            .put_kind(&name.name, cell)
            .map_err(|e| CompileError::structural(e, name.span, self.file))?;
        if public && self.at_module_level() {
            self.exports().set_kind(&name.name, cell);
        }
        Ok(cell)
    }

    fn resolve_type_decl(&mut self, stmt: &Stmt, cell: KindRef) -> CompileResult<()> {
        let (name, kind) = match &stmt.kind {
            StmtKind::TypeAlias(decl) => {
                let inner = self.resolve_kind(Some(&decl.kind))?;
                (&decl.name, Kind::Custom(inner))
            }
            StmtKind::Struct(decl) => (&decl.name, self.resolve_struct_kind(&decl.body)?),
            StmtKind::Interface(decl) => {
                self.scope.put_self_kind(cell);
                let methods = self.interface_methods(decl);
                self.scope.pop_self_kind();
                (
                    &decl.name,
                    Kind::Interface(InterfaceKind {
                        methods: methods?,
                        implementers: Vec::new(),
                    }),
                )
            }
            StmtKind::Enum(decl) => (&decl.name, self.enum_kind(decl)?),
            _ => return Ok(()),
        };
        trace!("precompile type {}", name.name);
        let kinds = self.kinds_mut();
        kinds.fill(cell, kind);
        kinds.set_name(cell, name.name.clone());
        Ok(())
    }

    fn interface_methods(&mut self, decl: &InterfaceDecl) -> CompileResult<IndexMap<String, KindRef>> {
        let marker = self.compiler.config.private_marker;
        let mut methods = IndexMap::new();
        for property in &decl.properties {
            let key = &property.key;
            if methods.contains_key(&key.name) {
                return Err(CompileError::structural(
                    format!("Duplicate key: {}", key.name),
                    key.span,
                    self.file,
                ));
            }
            if key.name.starts_with(marker) {
                return Err(CompileError::structural(
                    format!("Should not be private method: {}", key.name),
                    key.span,
                    self.file,
                ));
            }
            let kind = self.resolve_kind(Some(&property.kind))?;
            self.require(kind, property.kind.span, Requirement::Method(key.name.clone()))?;
            methods.insert(key.name.clone(), kind);
        }
        Ok(methods)
    }

    fn enum_kind(&self, decl: &EnumDecl) -> CompileResult<Kind> {
        let mut kind = EnumKind::default();
        for choice in &decl.choices {
            if kind.choices.contains_key(&choice.name) {
                return Err(CompileError::structural(
                    format!("Duplicate item: {}", choice.name),
                    choice.span,
                    self.file,
                ));
            }
            let ordinal = kind.choices.len();
            kind.choices.insert(choice.name.clone(), ordinal);
        }
        Ok(Kind::Enum(kind))
    }

    /// Aliases must bottom out in something other than another alias of themselves
    fn check_alias_cycle(&self, cell: KindRef, name: &Ident) -> CompileResult<()> {
        let kinds = self.kinds();
        let mut seen = HashSet::new();
        let mut current = cell;
        while let Kind::Custom(inner) = kinds.get(current) {
            if !seen.insert(kinds.node(current)) {
                return Err(CompileError::structural(
                    format!("Cyclic type alias: {}", name.name),
                    name.span,
                    self.file,
                ));
            }
            current = *inner;
        }
        Ok(())
    }

    fn precompile_func(&mut self, decl: &FuncDecl) -> CompileResult<()> {
        let kind = self.resolve_signature(&decl.params, decl.ret.as_ref())?;
        trace!("precompile fn {}", decl.name.name);
        let value = FuncValue {
            name: decl.name.name.clone(),
            kind,
        };
        self.scope
            .put_value(&decl.name.name, value.clone().into())
            .map_err(|e| CompileError::structural(e, decl.name.span, self.file))?;
        if decl.public && self.at_module_level() {
            self.exports().set_value(&decl.name.name, value.into());
        }
        Ok(())
    }

    /// Bind a variable; without an annotation its kind stays pending until
    /// the initializer is inferred
    pub(crate) fn declare_var(&mut self, decl: &VarDecl) -> CompileResult<KindRef> {
        if decl.kind.is_none() && decl.init.is_none() {
            return Err(CompileError::type_error(
                format!("Cannot infer kind of {}", decl.name.name),
                decl.name.span,
                self.file,
            ));
        }
        let kind = self.resolve_kind(decl.kind.as_ref())?;
        trace!("declare var {}", decl.name.name);
        let value = VarValue {
            name: decl.name.name.clone(),
            kind,
            is_const: decl.is_const,
        };
        self.scope
            .put_value(&decl.name.name, value.clone().into())
            .map_err(|e| CompileError::structural(e, decl.name.span, self.file))?;
        if decl.public && self.at_module_level() {
            self.exports().set_value(&decl.name.name, value.into());
        }
        Ok(kind)
    }

    pub(crate) fn init_var(&mut self, decl: &VarDecl, kind: KindRef) -> CompileResult<()> {
        let Some(init) = &decl.init else {
            return Ok(());
        };
        let value = self.infer(init)?;
        if decl.kind.is_some() {
            return self.expect_assignable(kind, value, init.span);
        }
        if self.kinds().is_pending(value) {
            return Err(CompileError::type_error(
                format!("Cannot infer kind of {}", decl.name.name),
                init.span,
                self.file,
            ));
        }
        self.kinds_mut().link(kind, value);
        Ok(())
    }

    fn top_level_var_kind(&self, name: &Ident) -> CompileResult<KindRef> {
        self.scope
            .find_value(&name.name)
            .and_then(|v| v.kind())
            .ok_or_else(|| {
                CompileError::lookup(format!("Cannot find value: {}", name.name), name.span, self.file)
            })
    }

    fn precompile_impl(&mut self, decl: &ImplDecl) -> CompileResult<()> {
        let target = self.resolve_kind(Some(&decl.target))?;
        self.check_impl_target(target, decl.target.span)?;
        trace!("precompile impl for {}", self.kinds().describe(target));

        self.scope.put_self_kind(target);
        let methods = self.precompile_methods(target, &decl.methods);
        self.scope.pop_self_kind();
        let methods = methods?;

        if let Some(interface) = &decl.interface {
            self.check_conformance(target, interface, &methods, decl.target.span)?;
        }
        self.impl_targets.push_back(target);
        Ok(())
    }

    fn check_impl_target(&self, target: KindRef, span: Span) -> CompileResult<()> {
        let kinds = self.kinds();
        if matches!(kinds.get(target), Kind::SelfKind(_)) {
            return Err(CompileError::structural("Cannot implements for self type", span, self.file));
        }
        let message = match kinds.get(kinds.unwrap_alias(target)) {
            Kind::Interface(_) => "Cannot implements for interface type",
            Kind::Any => "Cannot implements for any type",
            Kind::Pending => {
                return Err(CompileError::lookup(
                    format!("Kind is not resolved yet: {}", kinds.describe(target)),
                    span,
                    self.file,
                ));
            }
            _ => return Ok(()),
        };
        Err(CompileError::structural(message, span, self.file))
    }

    /// Attach each method to the target's method table
    fn precompile_methods(
        &mut self,
        target: KindRef,
        methods: &[FuncDecl],
    ) -> CompileResult<IndexMap<String, (KindRef, Span)>> {
        let mut declared = IndexMap::new();
        for method in methods {
            let kind = self.resolve_signature(&method.params, method.ret.as_ref())?;
            let name = &method.name;
            trace!("precompile method {}", name.name);
            let file = self.file;
            let Some(table) = self.kinds_mut().methods_mut(target) else {
                return Err(CompileError::lookup("Kind is not resolved yet", name.span, file));
            };
            if table.has(&name.name) {
                return Err(CompileError::structural(
                    format!("Duplicate key: {}", name.name),
                    name.span,
                    file,
                ));
            }
            table.insert(FuncValue {
                name: name.name.clone(),
                kind,
            });
            declared.insert(name.name.clone(), (kind, method.span));
        }
        Ok(declared)
    }

    /// Every interface method must be declared by this impl block with a
    /// strictly identical signature
    fn check_conformance(
        &mut self,
        target: KindRef,
        interface: &KindExpr,
        declared: &IndexMap<String, (KindRef, Span)>,
        target_span: Span,
    ) -> CompileResult<()> {
        let resolved = self.resolve_kind(Some(interface))?;
        let kinds = self.kinds();
        let iface = kinds.unwrap_alias(resolved);
        let required = match kinds.get(iface) {
            Kind::Interface(i) => i.methods.clone(),
            _ => {
                return Err(CompileError::structural(
                    "Expect be an interface type",
                    interface.span,
                    self.file,
                ));
            }
        };
        trace!("checking {} against {}", kinds.describe(target), kinds.describe(iface));

        for (name, wanted) in &required {
            let Some((offered, span)) = declared.get(name) else {
                return Err(CompileError::conformance(
                    format!("No implement method: {name}"),
                    target_span,
                    self.file,
                ));
            };
            let matched = KindComparator::new(kinds, true)
                .with_self_binding(iface, target)
                .compare(*wanted, *offered);
            if !matched {
                return Err(CompileError::conformance(
                    format!("Unable to match interface method signature: {name}"),
                    *span,
                    self.file,
                ));
            }
        }

        if let Some(Kind::Interface(i)) = self.kinds_mut().get_mut(iface) {
            i.implementers.push(target);
        }
        Ok(())
    }

    /// Compile the method bodies of an impl block
    fn compile_impl(&mut self, decl: &ImplDecl, span: Span) -> CompileResult<()> {
        let Some(target) = self.impl_targets.pop_front() else {
            return Err(CompileError::structural("Impl block was not precompiled", span, self.file));
        };
        self.scope.put_self_kind(target);
        for method in &decl.methods {
            let kind = self
                .kinds()
                .methods(target)
                .and_then(|table| table.get(&method.name.name))
                .map(|f| f.kind);
            let Some(kind) = kind else {
                return Err(CompileError::lookup(
                    format!("Cannot find method: {}", method.name.name),
                    method.name.span,
                    self.file,
                ));
            };
            self.compile_function(&method.params, kind, &method.body, Some(target))?;
        }
        self.scope.pop_self_kind();
        Ok(())
    }

    /// Non-strict compatibility check, as a Type error
    pub(crate) fn expect_assignable(&self, target: KindRef, source: KindRef, span: Span) -> CompileResult<()> {
        let kinds = self.kinds();
        if compare_kind(kinds, target, source, false) {
            return Ok(());
        }
        Err(CompileError::type_error(
            format!("Expect {}, got {}", kinds.describe(target), kinds.describe(source)),
            span,
            self.file,
        ))
    }

    fn at_module_level(&self) -> bool {
        self.scope.depth() == 1
    }

    fn exports(&mut self) -> &mut Exports {
        &mut self.compiler.modules.get_mut(self.module).exports
    }
}

fn type_decl_name(stmt: &Stmt) -> Option<(&Ident, bool)> {
    match &stmt.kind {
        StmtKind::TypeAlias(d) => Some((&d.name, d.public)),
        StmtKind::Struct(d) => Some((&d.name, d.public)),
        StmtKind::Interface(d) => Some((&d.name, d.public)),
        StmtKind::Enum(d) => Some((&d.name, d.public)),
        _ => None,
    }
}
