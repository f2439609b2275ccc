//! Compile pass over statements and function bodies

use crate::ast::{Expr, Ident, Param, Stmt, StmtKind};
use crate::common::{CompileError, CompileResult, Span};
use super::declare::DeclCompiler;
use super::kind::{ArrayLen, Kind, KindRef};
use super::value::{Value, VarValue};

impl DeclCompiler<'_> {
    /// Compile a function body against its resolved signature. Methods get
    /// an implicit constant `self` of the impl target.
    pub(crate) fn compile_function(
        &mut self,
        params: &[Param],
        kind: KindRef,
        body: &[Stmt],
        self_kind: Option<KindRef>,
    ) -> CompileResult<()> {
        let Kind::Func(func) = self.kinds().get(kind).clone() else {
            return Err(CompileError::type_error(
                format!("Expect be a function kind, got {}", self.kinds().describe(kind)),
                Span::default(),
                self.file,
            ));
        };

        let loops = self.scope.take_loops();
        self.scope.push();
        if let Some(target) = self_kind {
            self.bind_var("self", target, true, Span::default())?;
        }
        for (param, &kind) in params.iter().zip(func.params.iter()) {
            let kind = if param.rest {
                self.kinds_mut().alloc(Kind::Array {
                    element: kind,
                    len: ArrayLen::Dynamic,
                })
            } else {
                kind
            };
            self.bind_var(&param.name.name, kind, false, param.name.span)?;
        }

        self.returns.push(func.ret);
        let result = self.compile_block(body);
        self.returns.pop();
        self.scope.pop();
        self.scope.restore_loops(loops);
        result
    }

    /// Statements of a block whose frame the caller opened
    pub(crate) fn compile_block(&mut self, stmts: &[Stmt]) -> CompileResult<()> {
        self.precompile_block(stmts, false)?;
        for stmt in stmts {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    pub(crate) fn compile_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match &stmt.kind {
            // Fully handled by precompile
            StmtKind::Import(_)
            | StmtKind::Impl(_)
            | StmtKind::TypeAlias(_)
            | StmtKind::Interface(_)
            | StmtKind::Struct(_)
            | StmtKind::Enum(_) => Ok(()),

            StmtKind::Func(decl) => {
                let kind = match self.scope.find_value(&decl.name.name) {
                    Some(Value::Func(f)) => f.kind,
                    _ => {
                        return Err(CompileError::lookup(
                            format!("Cannot find value: {}", decl.name.name),
                            decl.name.span,
                            self.file,
                        ));
                    }
                };
                self.compile_function(&decl.params, kind, &decl.body, None)
            }
            StmtKind::Var(decl) => {
                let kind = self.declare_var(decl)?;
                self.init_var(decl, kind)
            }
            StmtKind::Block(body) => {
                self.scope.push();
                let result = self.compile_block(body);
                self.scope.pop();
                result
            }
            StmtKind::Return(value) => self.compile_return(value.as_ref(), stmt.span),
            StmtKind::Expr(expr) => self.infer(expr).map(|_| ()),
            StmtKind::If {
                condition,
                consequent,
                alternate,
            } => {
                self.expect_bool(condition)?;
                self.compile_stmt(consequent)?;
                match alternate {
                    Some(alternate) => self.compile_stmt(alternate),
                    None => Ok(()),
                }
            }
            StmtKind::For {
                label,
                init,
                condition,
                update,
                body,
            } => {
                self.scope.push();
                if let Some(init) = init {
                    self.compile_stmt(init)?;
                }
                if let Some(condition) = condition {
                    self.expect_bool(condition)?;
                }
                if let Some(update) = update {
                    self.compile_stmt(update)?;
                }
                self.scope.enter_loop(label.as_ref().map(|l| l.name.as_str()));
                let result = self.compile_stmt(body);
                self.scope.exit_loop();
                self.scope.pop();
                result
            }
            StmtKind::ForOf {
                label,
                binding,
                iterable,
                body,
            } => {
                let element = self.element_kind(iterable)?;
                self.scope.push();
                self.bind_var(&binding.name, element, false, binding.span)?;
                self.scope.enter_loop(label.as_ref().map(|l| l.name.as_str()));
                let result = self.compile_stmt(body);
                self.scope.exit_loop();
                self.scope.pop();
                result
            }
            StmtKind::Break(label) => self.check_loop_jump("break", label.as_ref(), stmt.span),
            StmtKind::Continue(label) => self.check_loop_jump("continue", label.as_ref(), stmt.span),
        }
    }

    fn compile_return(&mut self, value: Option<&Expr>, span: Span) -> CompileResult<()> {
        let Some(&expected) = self.returns.last() else {
            return Err(CompileError::structural("Return outside of a function", span, self.file));
        };
        let is_void = matches!(self.kinds().get(expected), Kind::Void);
        match value {
            Some(value) => {
                let kind = self.infer(value)?;
                if is_void {
                    return Err(CompileError::type_error(
                        "Unexpected return value in a void function",
                        value.span,
                        self.file,
                    ));
                }
                self.expect_assignable(expected, kind, value.span)
            }
            None if is_void => Ok(()),
            None => Err(CompileError::type_error(
                format!("Missing return value of kind {}", self.kinds().describe(expected)),
                span,
                self.file,
            )),
        }
    }

    fn expect_bool(&mut self, condition: &Expr) -> CompileResult<()> {
        let kind = self.infer(condition)?;
        let boolean = self.kinds().bool();
        self.expect_assignable(boolean, kind, condition.span)
    }

    /// Element kind produced by iterating `iterable`
    fn element_kind(&mut self, iterable: &Expr) -> CompileResult<KindRef> {
        let kind = self.infer(iterable)?;
        let kinds = self.kinds();
        match kinds.get(kinds.unwrap_alias(kind)) {
            Kind::Array { element, .. } => Ok(*element),
            Kind::String => Ok(kinds.char()),
            Kind::Any => Ok(kinds.any()),
            _ => Err(CompileError::type_error(
                format!("Expect be an iterable value, got {}", kinds.describe(kind)),
                iterable.span,
                self.file,
            )),
        }
    }

    fn check_loop_jump(&self, keyword: &str, label: Option<&Ident>, span: Span) -> CompileResult<()> {
        if !self.scope.in_loop() {
            return Err(CompileError::structural(
                format!("{keyword} outside of a loop"),
                span,
                self.file,
            ));
        }
        match label {
            Some(label) if !self.scope.has_loop_label(&label.name) => Err(CompileError::lookup(
                format!("Cannot find loop label: {}", label.name),
                label.span,
                self.file,
            )),
            _ => Ok(()),
        }
    }

    fn bind_var(&mut self, name: &str, kind: KindRef, is_const: bool, span: Span) -> CompileResult<()> {
        let value = VarValue {
            name: name.to_string(),
            kind,
            is_const,
        };
        self.scope
            .put_value(name, value.into())
            .map_err(|e| CompileError::structural(e, span, self.file))
    }
}
