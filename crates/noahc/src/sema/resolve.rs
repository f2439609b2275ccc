//! Kind resolution: kind expressions to kind cells

use crate::ast::{Expr, ExprKind, FuncKindExpr, Ident, KindExpr, KindExprKind, Param, StructKindExpr, UnaryOp};
use crate::common::{CompileError, CompileResult, Span};
use super::declare::DeclCompiler;
use super::kind::{ArrayLen, FuncKind, Kind, KindRef, StructKind};
use super::value::Value;

/// Shape a kind must have; checked again once the block's type slots are
/// filled if the kind was still pending
#[derive(Debug, Clone)]
pub(crate) enum Requirement {
    /// `extends` entry of a struct
    Struct,
    /// Interface property `name`
    Method(String),
}

#[derive(Debug, Clone)]
pub(crate) struct DeferredCheck {
    pub(crate) kind: KindRef,
    pub(crate) span: Span,
    pub(crate) requirement: Requirement,
}

/// Parameter shape shared by function kind expressions and declarations
struct SignatureParam<'a> {
    kind: &'a KindExpr,
    rest: bool,
    span: Span,
}

impl DeclCompiler<'_> {
    /// Resolve a kind expression. No expression yields a pending cell that
    /// inference fills later.
    pub(crate) fn resolve_kind(&mut self, expr: Option<&KindExpr>) -> CompileResult<KindRef> {
        let Some(expr) = expr else {
            return Ok(self.kinds_mut().pending());
        };
        match &expr.kind {
            KindExprKind::Number => Ok(self.kinds().number()),
            KindExprKind::Byte => Ok(self.kinds().byte()),
            KindExprKind::Char => Ok(self.kinds().char()),
            KindExprKind::String => Ok(self.kinds().string()),
            KindExprKind::Bool => Ok(self.kinds().bool()),
            KindExprKind::Any => Ok(self.kinds().any()),
            KindExprKind::SelfKind => match self.scope.find_self_kind() {
                Some(owner) => Ok(self.kinds_mut().alloc(Kind::SelfKind(owner))),
                None => Err(CompileError::lookup(
                    "Cannot use Self outside of an impl or interface",
                    expr.span,
                    self.file,
                )),
            },
            KindExprKind::Array { element, len } => {
                let element = self.resolve_kind(Some(element))?;
                let len = match len {
                    Some(len) => ArrayLen::Fixed(self.array_length(len)?),
                    None => ArrayLen::Dynamic,
                };
                Ok(self.kinds_mut().alloc(Kind::Array { element, len }))
            }
            KindExprKind::Identifier(name) => self
                .find_identifier_kind(name, true)?
                .ok_or_else(|| self.kind_not_found(&name.name, name.span)),
            KindExprKind::Member(path) => self
                .find_member_kind(path, true)?
                .ok_or_else(|| self.kind_not_found(&join_path(path), expr.span)),
            KindExprKind::Func(func) => self.resolve_func_kind(func),
            KindExprKind::Struct(body) => {
                let kind = self.resolve_struct_kind(body)?;
                Ok(self.kinds_mut().alloc(kind))
            }
        }
    }

    /// A kind bound to `name` in scope
    pub(crate) fn find_identifier_kind(&self, name: &Ident, required: bool) -> CompileResult<Option<KindRef>> {
        match self.scope.find_kind(&name.name) {
            Some(kind) => Ok(Some(kind)),
            None if required => Err(self.kind_not_found(&name.name, name.span)),
            None => Ok(None),
        }
    }

    /// A kind exported by an imported module: `geo.Point`
    pub(crate) fn find_member_kind(&self, path: &[Ident], required: bool) -> CompileResult<Option<KindRef>> {
        let Some((last, modules)) = path.split_last() else {
            return Ok(None);
        };
        let Some((first, nested)) = modules.split_first() else {
            return self.find_identifier_kind(last, required);
        };

        let mut module = match self.scope.find_value(&first.name) {
            Some(Value::Module(m)) => m.module,
            _ if required => {
                return Err(CompileError::lookup(
                    format!("Cannot find module: {}", first.name),
                    first.span,
                    self.file,
                ));
            }
            _ => return Ok(None),
        };
        for segment in nested {
            match self.compiler.modules.get(module).exports.value(&segment.name) {
                Some(Value::Module(m)) => module = m.module,
                _ if required => {
                    return Err(CompileError::lookup(
                        format!("Cannot find module: {}", segment.name),
                        segment.span,
                        self.file,
                    ));
                }
                _ => return Ok(None),
            }
        }

        match self.compiler.modules.get(module).exports.kind(&last.name) {
            Some(kind) => Ok(Some(kind)),
            None if required => Err(self.kind_not_found(&join_path(path), last.span)),
            None => Ok(None),
        }
    }

    pub(crate) fn resolve_func_kind(&mut self, func: &FuncKindExpr) -> CompileResult<KindRef> {
        let params = func
            .params
            .iter()
            .map(|p| SignatureParam {
                kind: &p.kind,
                rest: p.rest,
                span: p.span,
            })
            .collect();
        self.resolve_signature_params(params, func.ret.as_deref())
    }

    /// Signature of a declared function or function literal
    pub(crate) fn resolve_signature(&mut self, params: &[Param], ret: Option<&KindExpr>) -> CompileResult<KindRef> {
        let params = params
            .iter()
            .map(|p| SignatureParam {
                kind: &p.kind,
                rest: p.rest,
                span: p.span,
            })
            .collect();
        self.resolve_signature_params(params, ret)
    }

    fn resolve_signature_params(
        &mut self,
        params: Vec<SignatureParam<'_>>,
        ret: Option<&KindExpr>,
    ) -> CompileResult<KindRef> {
        let last = params.len().saturating_sub(1);
        let mut resolved = Vec::with_capacity(params.len());
        let mut variadic = false;
        for (i, param) in params.iter().enumerate() {
            if param.rest {
                if i != last {
                    return Err(CompileError::structural(
                        "The rest arguments should be placed last",
                        param.span,
                        self.file,
                    ));
                }
                variadic = true;
            }
            resolved.push(self.resolve_kind(Some(param.kind))?);
        }
        let ret = match ret {
            Some(ret) => self.resolve_kind(Some(ret))?,
            None => self.kinds().void(),
        };
        Ok(self.kinds_mut().alloc(Kind::Func(FuncKind {
            params: resolved,
            ret,
            variadic,
        })))
    }

    /// Struct body, returned unallocated so declarations can fill their slot
    pub(crate) fn resolve_struct_kind(&mut self, body: &StructKindExpr) -> CompileResult<Kind> {
        let mut resolved = StructKind::default();
        for ext in &body.extends {
            let kind = self.resolve_kind(Some(ext))?;
            self.require(kind, ext.span, Requirement::Struct)?;
            resolved.extends.push(kind);
        }
        for property in &body.properties {
            let key = &property.key;
            if resolved.properties.contains_key(&key.name) {
                return Err(CompileError::structural(
                    format!("Duplicate key: {}", key.name),
                    key.span,
                    self.file,
                ));
            }
            let kind = self.resolve_kind(Some(&property.kind))?;
            resolved.properties.insert(key.name.clone(), kind);
        }
        Ok(Kind::Struct(resolved))
    }

    /// Check `requirement` now, or defer it while `kind` is pending
    pub(crate) fn require(&mut self, kind: KindRef, span: Span, requirement: Requirement) -> CompileResult<()> {
        if !self.satisfies(kind, span, &requirement)? {
            self.deferred.push(DeferredCheck { kind, span, requirement });
        }
        Ok(())
    }

    /// Re-run the checks deferred on pending kinds
    pub(crate) fn check_deferred(&mut self) -> CompileResult<()> {
        let checks = std::mem::take(&mut self.deferred);
        for check in checks {
            if !self.satisfies(check.kind, check.span, &check.requirement)? {
                self.deferred.push(check);
            }
        }
        Ok(())
    }

    /// `Ok(false)` while the kind is unresolved
    fn satisfies(&self, kind: KindRef, span: Span, requirement: &Requirement) -> CompileResult<bool> {
        let kinds = self.kinds();
        let resolved = kinds.get(kinds.unwrap_alias(kind));
        if matches!(resolved, Kind::Pending) {
            return Ok(false);
        }
        let message = match requirement {
            Requirement::Struct if matches!(resolved, Kind::Struct(_)) => return Ok(true),
            Requirement::Method(_) if matches!(resolved, Kind::Func(_)) => return Ok(true),
            Requirement::Struct => format!("Expect be a struct type: {}", kinds.describe(kind)),
            Requirement::Method(name) => format!("Expect be a function kind: {name}"),
        };
        Err(CompileError::structural(message, span, self.file))
    }

    /// Constant length of `[T; N]`
    fn array_length(&self, expr: &Expr) -> CompileResult<usize> {
        let value = match &expr.kind {
            ExprKind::NumberLiteral(n) => Some(*n),
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand,
            } => match operand.kind {
                ExprKind::NumberLiteral(n) => Some(-n),
                _ => None,
            },
            _ => None,
        };
        match value {
            Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => Ok(n as usize),
            _ => Err(CompileError::literal("Expect be a positive integer", expr.span, self.file)),
        }
    }

    pub(crate) fn kind_not_found(&self, name: &str, span: Span) -> CompileError {
        CompileError::lookup(format!("Cannot find kind: {name}"), span, self.file)
    }
}

fn join_path(path: &[Ident]) -> String {
    path.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(".")
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::common::{CompileError, Span};
    use crate::driver::fixture::compile;
    use crate::sema::{ArrayLen, Kind, compare_kind};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_primitive_resolves_to_equal_kinds() {
        let body = vec![
            Stmt::alias("A", KindExpr::number()),
            Stmt::alias("B", KindExpr::number()),
            Stmt::alias("S", KindExpr::string()),
        ];
        let (compiler, result) = compile(body);
        let scope = compiler.module(result.unwrap()).scope.as_ref().unwrap();
        let (a, b, s) = (
            scope.kind("A").unwrap(),
            scope.kind("B").unwrap(),
            scope.kind("S").unwrap(),
        );

        assert!(compare_kind(compiler.kinds(), a, b, true));
        assert!(!compare_kind(compiler.kinds(), a, s, true));
    }

    #[test]
    fn test_array_lengths() {
        let body = vec![
            Stmt::alias("Triple", KindExpr::array(KindExpr::number(), Some(Expr::number(3.0)))),
            Stmt::alias("Numbers", KindExpr::vector(KindExpr::number())),
        ];
        let (compiler, result) = compile(body);
        let scope = compiler.module(result.unwrap()).scope.as_ref().unwrap();
        let kinds = compiler.kinds();

        let triple = kinds.unwrap_alias(scope.kind("Triple").unwrap());
        let numbers = kinds.unwrap_alias(scope.kind("Numbers").unwrap());
        match (kinds.get(triple), kinds.get(numbers)) {
            (Kind::Array { len: a, .. }, Kind::Array { len: b, .. }) => {
                assert_eq!(*a, ArrayLen::Fixed(3));
                assert_eq!(*b, ArrayLen::Dynamic);
            }
            other => panic!("expected arrays, got {other:?}"),
        }
    }

    fn assert_bad_length(len: Expr) {
        let span = Span::new(12, 16);
        let body = vec![Stmt::alias("Bad", KindExpr::array(KindExpr::number(), Some(len.at(span))))];
        match compile(body).1.unwrap_err() {
            CompileError::Literal { message, span: at, .. } => {
                assert_eq!(message, "Expect be a positive integer");
                assert_eq!(at, span);
            }
            other => panic!("expected literal error, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_array_length() {
        assert_bad_length(Expr::unary(UnaryOp::Neg, Expr::number(1.0)));
        assert_bad_length(Expr::number(-1.0));
    }

    #[test]
    fn test_fractional_array_length() {
        assert_bad_length(Expr::number(1.5));
    }

    #[test]
    fn test_non_constant_array_length() {
        assert_bad_length(Expr::ident("n"));
    }

    #[test]
    fn test_rest_param_must_be_last() {
        let span = Span::new(4, 13);
        let func = KindExpr::func(
            vec![
                KindParam::rest(KindExpr::number()).at(span),
                KindParam::new(KindExpr::string()),
            ],
            None,
        );
        match compile(vec![Stmt::alias("F", func)]).1.unwrap_err() {
            CompileError::Structural { message, span: at, .. } => {
                assert_eq!(message, "The rest arguments should be placed last");
                assert_eq!(at, span);
            }
            other => panic!("expected structural error, got {other:?}"),
        }
    }

    #[test]
    fn test_func_kind_without_return_is_void() {
        let func = KindExpr::func(vec![KindParam::rest(KindExpr::string())], None);
        let (compiler, result) = compile(vec![Stmt::alias("Log", func)]);
        let scope = compiler.module(result.unwrap()).scope.as_ref().unwrap();
        let kinds = compiler.kinds();

        match kinds.get(kinds.unwrap_alias(scope.kind("Log").unwrap())) {
            Kind::Func(f) => {
                assert!(f.variadic);
                assert_eq!(kinds.get(f.ret), &Kind::Void);
            }
            other => panic!("expected func, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_kind() {
        let body = vec![Stmt::alias("P", KindExpr::named(Ident::new("Missing", Span::new(9, 16))))];
        match compile(body).1.unwrap_err() {
            CompileError::Lookup { message, span, .. } => {
                assert_eq!(message, "Cannot find kind: Missing");
                assert_eq!(span, Span::new(9, 16));
            }
            other => panic!("expected lookup error, got {other:?}"),
        }
    }

    #[test]
    fn test_self_outside_impl() {
        let body = vec![Stmt::alias("Me", KindExpr::self_kind())];
        assert!(matches!(compile(body).1, Err(CompileError::Lookup { .. })));
    }

    #[test]
    fn test_member_kind_needs_module() {
        let body = vec![Stmt::alias("P", KindExpr::member(&["geo", "Point"]))];
        match compile(body).1.unwrap_err() {
            CompileError::Lookup { message, .. } => assert_eq!(message, "Cannot find module: geo"),
            other => panic!("expected lookup error, got {other:?}"),
        }
    }
}
