//! Type inference over expressions, memoized per expression node

use log::trace;
use std::collections::{HashMap, HashSet};

use crate::ast::{BinOp, Expr, ExprId, ExprKind, FieldInit, Ident, KindExpr, UnaryOp};
use crate::common::{CompileError, CompileResult, Span};
use crate::module::ModuleId;
use super::compare::{compare_kind, flatten_properties};
use super::declare::DeclCompiler;
use super::kind::{ArrayLen, FuncKind, Kind, KindRef, StructKind};
use super::value::Value;

/// Inferred kind of every expression seen so far
#[derive(Debug, Clone, Default)]
pub struct InferenceCache {
    kinds: HashMap<ExprId, KindRef>,
}

impl InferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, expr: ExprId) -> Option<KindRef> {
        self.kinds.get(&expr).copied()
    }

    pub fn insert(&mut self, expr: ExprId, kind: KindRef) {
        self.kinds.insert(expr, kind);
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn into_inner(self) -> HashMap<ExprId, KindRef> {
        self.kinds
    }
}

impl DeclCompiler<'_> {
    /// Kind of `expr`, computed once per node
    pub(crate) fn infer(&mut self, expr: &Expr) -> CompileResult<KindRef> {
        if let Some(kind) = self.cache.get(expr.id) {
            return Ok(kind);
        }
        let kind = self.infer_uncached(expr)?;
        trace!("{} : {}", expr.span, self.kinds().describe(kind));
        self.cache.insert(expr.id, kind);
        Ok(kind)
    }

    fn infer_uncached(&mut self, expr: &Expr) -> CompileResult<KindRef> {
        match &expr.kind {
            ExprKind::NumberLiteral(_) => Ok(self.kinds().number()),
            ExprKind::StringLiteral(_) => Ok(self.kinds().string()),
            ExprKind::CharLiteral(_) => Ok(self.kinds().char()),
            ExprKind::BoolLiteral(_) => Ok(self.kinds().bool()),
            ExprKind::NullLiteral => Ok(self.kinds().any()),

            ExprKind::Identifier(name) => self.infer_identifier(name),
            ExprKind::Member { object, property } => {
                if let Some(kind) = self.infer_static_member(object, property)? {
                    return Ok(kind);
                }
                let object = self.infer(object)?;
                self.find_member(object, property)
            }
            ExprKind::Index { object, index } => self.infer_index(object, index),
            ExprKind::Call { callee, args } => self.infer_call(callee, args, expr.span),

            ExprKind::Binary { op, left, right } => self.infer_binary(*op, left, right, expr.span),
            ExprKind::Unary { op, operand } => self.infer_unary(*op, operand, expr.span),
            ExprKind::Cast { expr, kind } => {
                self.infer(expr)?;
                self.resolve_kind(Some(kind))
            }
            ExprKind::KindTest { expr, kind } => {
                self.infer(expr)?;
                self.resolve_kind(Some(kind))?;
                Ok(self.kinds().bool())
            }
            ExprKind::Assign { target, value } => {
                let target_kind = self.infer_assign_target(target)?;
                let value_kind = self.infer(value)?;
                self.expect_assignable(target_kind, value_kind, value.span)?;
                Ok(self.kinds().void())
            }

            ExprKind::Func(func) => {
                let kind = self.resolve_signature(&func.params, func.ret.as_ref())?;
                self.compile_function(&func.params, kind, &func.body, None)?;
                Ok(kind)
            }
            ExprKind::Struct { kind, fields } => self.infer_struct_literal(kind.as_ref(), fields, expr.span),
            ExprKind::Array(elements) => self.infer_array_literal(elements),
        }
    }

    /// A value bound to `name` in scope
    pub(crate) fn find_value(&self, name: &Ident, required: bool) -> CompileResult<Option<Value>> {
        match self.scope.find_value(&name.name) {
            Some(value) => Ok(Some(value.clone())),
            None if required => Err(CompileError::lookup(
                format!("Cannot find value: {}", name.name),
                name.span,
                self.file,
            )),
            None => Ok(None),
        }
    }

    fn infer_identifier(&self, name: &Ident) -> CompileResult<KindRef> {
        let kind = match self.find_value(name, true)? {
            Some(Value::Func(f)) => f.kind,
            Some(Value::Var(v)) => v.kind,
            Some(Value::Module(m)) => {
                return Err(CompileError::type_error(
                    format!("Module {} is not a value", m.name),
                    name.span,
                    self.file,
                ));
            }
            None => {
                return Err(CompileError::lookup(
                    format!("Cannot find value: {}", name.name),
                    name.span,
                    self.file,
                ));
            }
        };
        self.ready(kind, &name.name, name.span)
    }

    /// Variables whose initializer has not been inferred yet cannot be used
    fn ready(&self, kind: KindRef, name: &str, span: Span) -> CompileResult<KindRef> {
        if self.kinds().is_pending(kind) {
            return Err(CompileError::type_error(
                format!("Cannot infer kind of {name} before its initializer"),
                span,
                self.file,
            ));
        }
        Ok(kind)
    }

    /// `module.value`, `Enum.Choice` and `module.Enum.Choice`
    fn infer_static_member(&mut self, object: &Expr, property: &Ident) -> CompileResult<Option<KindRef>> {
        match &object.kind {
            ExprKind::Identifier(name) => match self.find_value(name, false)? {
                Some(Value::Module(m)) => self.module_member(m.module, &m.name, property).map(Some),
                Some(_) => Ok(None),
                None => {
                    let Some(kind) = self.find_identifier_kind(name, false)? else {
                        return Err(CompileError::lookup(
                            format!("Cannot find value: {}", name.name),
                            name.span,
                            self.file,
                        ));
                    };
                    self.enum_member(kind, property).map(Some)
                }
            },
            ExprKind::Member {
                object: inner,
                property: name,
            } => {
                let ExprKind::Identifier(module) = &inner.kind else {
                    return Ok(None);
                };
                let Some(Value::Module(m)) = self.find_value(module, false)? else {
                    return Ok(None);
                };
                let exports = &self.compiler.modules.get(m.module).exports;
                if exports.value(&name.name).is_some() {
                    return Ok(None);
                }
                match exports.kind(&name.name) {
                    Some(kind) => self.enum_member(kind, property).map(Some),
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    fn module_member(&self, module: ModuleId, alias: &str, property: &Ident) -> CompileResult<KindRef> {
        let exports = &self.compiler.modules.get(module).exports;
        match exports.value(&property.name).and_then(Value::kind) {
            Some(kind) => self.ready(kind, &format!("{alias}.{}", property.name), property.span),
            None => Err(CompileError::lookup(
                format!("Cannot find member: {alias}.{}", property.name),
                property.span,
                self.file,
            )),
        }
    }

    fn enum_member(&self, kind: KindRef, property: &Ident) -> CompileResult<KindRef> {
        let kinds = self.kinds();
        match kinds.get(kinds.unwrap_alias(kind)) {
            Kind::Enum(e) if e.choices.contains_key(&property.name) => Ok(kind),
            Kind::Enum(_) => Err(CompileError::lookup(
                format!("Cannot find member: {}.{}", kinds.describe(kind), property.name),
                property.span,
                self.file,
            )),
            _ => Err(CompileError::type_error(
                format!("Expect be an enum kind: {}", kinds.describe(kind)),
                property.span,
                self.file,
            )),
        }
    }

    /// Property lookup: own properties, then `extends` depth-first, then methods
    fn find_member(&self, object: KindRef, property: &Ident) -> CompileResult<KindRef> {
        let kinds = self.kinds();
        let cell = kinds.unwrap_alias(object);
        match kinds.get(cell) {
            Kind::Any => return Ok(kinds.any()),
            Kind::Struct(_) => {
                if let Some(kind) = flatten_properties(kinds, cell).get(&property.name) {
                    return Ok(*kind);
                }
            }
            Kind::Interface(i) => {
                if let Some(kind) = i.methods.get(&property.name) {
                    return Ok(*kind);
                }
            }
            _ => {}
        }
        if let Some(method) = self.find_method(object, &property.name) {
            return Ok(method);
        }
        Err(CompileError::lookup(
            format!("Cannot find member: {}.{}", kinds.describe(object), property.name),
            property.span,
            self.file,
        ))
    }

    /// Impl method attached anywhere along the alias chain of `kind`
    pub(crate) fn find_method(&self, kind: KindRef, name: &str) -> Option<KindRef> {
        let kinds = self.kinds();
        let mut cell = kind;
        let mut seen = HashSet::new();
        loop {
            if let Some(method) = kinds.methods(cell).and_then(|table| table.get(name)) {
                return Some(method.kind);
            }
            if !seen.insert(cell) {
                return None;
            }
            match kinds.get(cell) {
                Kind::Custom(inner) | Kind::SelfKind(inner) => cell = *inner,
                _ => return None,
            }
        }
    }

    fn infer_index(&mut self, object: &Expr, index: &Expr) -> CompileResult<KindRef> {
        let object_kind = self.infer(object)?;
        let index_kind = self.infer(index)?;
        let number = self.kinds().number();
        self.expect_assignable(number, index_kind, index.span)?;

        let kinds = self.kinds();
        match kinds.get(kinds.unwrap_alias(object_kind)) {
            Kind::Array { element, .. } => Ok(*element),
            Kind::String => Ok(kinds.char()),
            Kind::Any => Ok(kinds.any()),
            _ => Err(CompileError::type_error(
                format!("Cannot index into {}", kinds.describe(object_kind)),
                object.span,
                self.file,
            )),
        }
    }

    fn infer_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> CompileResult<KindRef> {
        let callee_kind = self.infer(callee)?;
        let kinds = self.kinds();
        let func = match kinds.get(kinds.unwrap_alias(callee_kind)) {
            Kind::Func(func) => Some(func.clone()),
            Kind::Any => None,
            _ => {
                return Err(CompileError::type_error(
                    format!("Expect be a callable value, got {}", kinds.describe(callee_kind)),
                    callee.span,
                    self.file,
                ));
            }
        };
        let Some(func) = func else {
            for arg in args {
                self.infer(arg)?;
            }
            return Ok(self.kinds().any());
        };
        self.check_args(&func, args, span)?;
        Ok(func.ret)
    }

    fn check_args(&mut self, func: &FuncKind, args: &[Expr], span: Span) -> CompileResult<()> {
        let required = if func.variadic {
            func.params.len().saturating_sub(1)
        } else {
            func.params.len()
        };
        let arity_ok = if func.variadic {
            args.len() >= required
        } else {
            args.len() == required
        };
        if !arity_ok {
            let at_least = if func.variadic { "at least " } else { "" };
            return Err(CompileError::type_error(
                format!("Expect {at_least}{required} arguments, got {}", args.len()),
                span,
                self.file,
            ));
        }

        for (i, arg) in args.iter().enumerate() {
            let Some(&param) = func.params.get(i).or(func.params.last()) else {
                continue;
            };
            let kind = self.infer(arg)?;
            self.expect_assignable(param, kind, arg.span)?;
        }
        Ok(())
    }

    fn infer_binary(&mut self, op: BinOp, left: &Expr, right: &Expr, span: Span) -> CompileResult<KindRef> {
        let l = self.infer(left)?;
        let r = self.infer(right)?;
        let kinds = self.kinds();
        let (lk, rk) = (kinds.get(kinds.unwrap_alias(l)), kinds.get(kinds.unwrap_alias(r)));

        let result = match op {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => match (lk, rk) {
                (Kind::Number, Kind::Number) => Some(kinds.number()),
                (Kind::Byte, Kind::Byte) => Some(kinds.byte()),
                (Kind::String, Kind::String) if op == BinOp::Add => Some(kinds.string()),
                _ => None,
            },
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => match (lk, rk) {
                (Kind::Number, Kind::Number)
                | (Kind::Byte, Kind::Byte)
                | (Kind::Char, Kind::Char)
                | (Kind::String, Kind::String) => Some(kinds.bool()),
                _ => None,
            },
            BinOp::Eq | BinOp::Ne => {
                let comparable = compare_kind(kinds, l, r, false) || compare_kind(kinds, r, l, false);
                comparable.then(|| kinds.bool())
            }
            BinOp::And | BinOp::Or => {
                matches!((lk, rk), (Kind::Bool, Kind::Bool)).then(|| kinds.bool())
            }
            BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor | BinOp::Shl | BinOp::Shr => match (lk, rk) {
                (Kind::Number, Kind::Number) => Some(kinds.number()),
                (Kind::Byte, Kind::Byte) => Some(kinds.byte()),
                _ => None,
            },
        };

        result.ok_or_else(|| {
            CompileError::type_error(
                format!(
                    "Operator {} cannot be applied to {} and {}",
                    op.symbol(),
                    kinds.describe(l),
                    kinds.describe(r)
                ),
                span,
                self.file,
            )
        })
    }

    fn infer_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> CompileResult<KindRef> {
        let kind = self.infer(operand)?;
        let kinds = self.kinds();
        let result = match (op, kinds.get(kinds.unwrap_alias(kind))) {
            (UnaryOp::Neg | UnaryOp::BitNot, Kind::Number) => Some(kinds.number()),
            (UnaryOp::Neg | UnaryOp::BitNot, Kind::Byte) => Some(kinds.byte()),
            (UnaryOp::Not, Kind::Bool) => Some(kinds.bool()),
            _ => None,
        };
        result.ok_or_else(|| {
            CompileError::type_error(
                format!("Operator {} cannot be applied to {}", op.symbol(), kinds.describe(kind)),
                span,
                self.file,
            )
        })
    }

    fn infer_assign_target(&mut self, target: &Expr) -> CompileResult<KindRef> {
        match &target.kind {
            ExprKind::Identifier(name) => match self.find_value(name, true)? {
                Some(Value::Var(v)) if v.is_const => Err(CompileError::type_error(
                    format!("Cannot assign to constant: {}", name.name),
                    target.span,
                    self.file,
                )),
                Some(Value::Var(_)) => self.infer(target),
                _ => Err(CompileError::type_error(
                    format!("Cannot assign to {}", name.name),
                    target.span,
                    self.file,
                )),
            },
            ExprKind::Member { .. } | ExprKind::Index { .. } => self.infer(target),
            _ => Err(CompileError::type_error("Invalid assignment target", target.span, self.file)),
        }
    }

    fn infer_struct_literal(
        &mut self,
        kind: Option<&KindExpr>,
        fields: &[FieldInit],
        span: Span,
    ) -> CompileResult<KindRef> {
        let mut seen = HashSet::new();
        for field in fields {
            if !seen.insert(field.key.name.as_str()) {
                return Err(CompileError::structural(
                    format!("Duplicate key: {}", field.key.name),
                    field.key.span,
                    self.file,
                ));
            }
        }

        let Some(kind_expr) = kind else {
            let mut anonymous = StructKind::default();
            for field in fields {
                let kind = self.infer(&field.value)?;
                anonymous.properties.insert(field.key.name.clone(), kind);
            }
            return Ok(self.kinds_mut().alloc(Kind::Struct(anonymous)));
        };

        let kind = self.resolve_kind(Some(kind_expr))?;
        let kinds = self.kinds();
        let cell = kinds.unwrap_alias(kind);
        if !matches!(kinds.get(cell), Kind::Struct(_)) {
            return Err(CompileError::type_error(
                format!("Expect be a struct kind: {}", kinds.describe(kind)),
                kind_expr.span,
                self.file,
            ));
        }
        let wanted = flatten_properties(kinds, cell);

        for field in fields {
            let Some(&property) = wanted.get(&field.key.name) else {
                return Err(CompileError::lookup(
                    format!("Cannot find member: {}.{}", self.kinds().describe(kind), field.key.name),
                    field.key.span,
                    self.file,
                ));
            };
            let value = self.infer(&field.value)?;
            self.expect_assignable(property, value, field.value.span)?;
        }
        if let Some(missing) = wanted.keys().find(|k| !seen.contains(k.as_str())) {
            return Err(CompileError::type_error(
                format!("Missing field: {missing}"),
                span,
                self.file,
            ));
        }
        Ok(kind)
    }

    fn infer_array_literal(&mut self, elements: &[Expr]) -> CompileResult<KindRef> {
        let Some((first, rest)) = elements.split_first() else {
            let any = self.kinds().any();
            return Ok(self.kinds_mut().alloc(Kind::Array {
                element: any,
                len: ArrayLen::Fixed(0),
            }));
        };
        let element = self.infer(first)?;
        for item in rest {
            let kind = self.infer(item)?;
            self.expect_assignable(element, kind, item.span)?;
        }
        Ok(self.kinds_mut().alloc(Kind::Array {
            element,
            len: ArrayLen::Fixed(elements.len()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::common::{CompileError, Span};
    use crate::driver::fixture::compile;
    use crate::sema::{ArrayLen, Kind, Value};
    use pretty_assertions::assert_eq;

    fn point() -> Stmt {
        Stmt::structure(
            "Point",
            StructKindExpr {
                extends: Vec::new(),
                properties: vec![
                    KindProperty::new("x", KindExpr::number()),
                    KindProperty::new("y", KindExpr::number()),
                ],
            },
        )
    }

    /// Kind of the untyped top-level variable `name`
    fn inferred(body: Vec<Stmt>, name: &str) -> String {
        let (compiler, result) = compile(body);
        let module = compiler.module(result.unwrap());
        let kind = module.scope.as_ref().and_then(|s| s.value(name)).and_then(Value::kind).unwrap();
        compiler.kinds().describe(kind)
    }

    fn type_message(body: Vec<Stmt>) -> String {
        match compile(body).1.unwrap_err() {
            CompileError::Type { message, .. } => message,
            other => panic!("expected type error, got {other:?}"),
        }
    }

    #[test]
    fn test_literals() {
        let body = vec![
            Stmt::var("n", None, Some(Expr::number(1.0))),
            Stmt::var("s", None, Some(Expr::string("a"))),
            Stmt::var("c", None, Some(Expr::char('a'))),
            Stmt::var("b", None, Some(Expr::bool(true))),
            Stmt::var("z", None, Some(Expr::null())),
        ];
        for (name, expected) in [("n", "number"), ("s", "string"), ("c", "char"), ("b", "bool"), ("z", "any")] {
            assert_eq!(inferred(body.clone(), name), expected);
        }
    }

    #[test]
    fn test_each_expression_inferred_once() {
        let value = Expr::binary(BinOp::Add, Expr::number(1.0), Expr::number(2.0));
        let id = value.id;
        let (compiler, result) = compile(vec![Stmt::var("sum", None, Some(value))]);
        let module = compiler.module(result.unwrap());

        assert_eq!(module.expr_kinds.len(), 3);
        let kind = module.expr_kind(id).unwrap();
        assert!(compiler.kinds().same(kind, compiler.kinds().number()));
    }

    #[test]
    fn test_binary_operators() {
        let cases = [
            (BinOp::Add, Expr::string("a"), Expr::string("b"), "string"),
            (BinOp::Lt, Expr::number(1.0), Expr::number(2.0), "bool"),
            (BinOp::Eq, Expr::string("a"), Expr::null(), "bool"),
            (BinOp::And, Expr::bool(true), Expr::bool(false), "bool"),
            (BinOp::Shl, Expr::number(1.0), Expr::number(2.0), "number"),
        ];
        for (op, left, right, expected) in cases {
            let body = vec![Stmt::var("v", None, Some(Expr::binary(op, left, right)))];
            assert_eq!(inferred(body, "v"), expected);
        }
    }

    #[test]
    fn test_operand_mismatch() {
        let body = vec![Stmt::var(
            "v",
            None,
            Some(Expr::binary(BinOp::Sub, Expr::string("a"), Expr::number(1.0))),
        )];
        assert_eq!(type_message(body), "Operator - cannot be applied to string and number");

        let body = vec![Stmt::var("v", None, Some(Expr::unary(UnaryOp::Not, Expr::number(1.0))))];
        assert_eq!(type_message(body), "Operator ! cannot be applied to number");
    }

    #[test]
    fn test_struct_literal() {
        let literal = Expr::structure(
            Some(KindExpr::named("Point")),
            vec![("x", Expr::number(1.0)), ("y", Expr::number(2.0))],
        );
        let body = vec![point(), Stmt::var("p", None, Some(literal))];
        assert_eq!(inferred(body, "p"), "Point");
    }

    #[test]
    fn test_struct_literal_missing_field() {
        let literal = Expr::structure(Some(KindExpr::named("Point")), vec![("x", Expr::number(1.0))]);
        let body = vec![point(), Stmt::var("p", None, Some(literal))];
        assert_eq!(type_message(body), "Missing field: y");
    }

    #[test]
    fn test_struct_literal_unknown_field() {
        let literal = Expr::structure(
            Some(KindExpr::named("Point")),
            vec![("x", Expr::number(1.0)), ("y", Expr::number(2.0)), ("z", Expr::number(3.0))],
        );
        let body = vec![point(), Stmt::var("p", None, Some(literal))];
        match compile(body).1.unwrap_err() {
            CompileError::Lookup { message, .. } => assert_eq!(message, "Cannot find member: Point.z"),
            other => panic!("expected lookup error, got {other:?}"),
        }
    }

    #[test]
    fn test_width_assignment_and_member() {
        let anonymous = Expr::structure(
            None,
            vec![("x", Expr::number(1.0)), ("y", Expr::number(2.0)), ("label", Expr::string("a"))],
        );
        let body = vec![
            point(),
            Stmt::var("p", Some(KindExpr::named("Point")), Some(anonymous)),
            Stmt::var("x", None, Some(Expr::member(Expr::ident("p"), "x"))),
        ];
        assert_eq!(inferred(body, "x"), "number");
    }

    #[test]
    fn test_member_through_extends() {
        let labelled = Stmt::structure(
            "Labelled",
            StructKindExpr {
                extends: vec![KindExpr::named("Point")],
                properties: vec![KindProperty::new("label", KindExpr::string())],
            },
        );
        let literal = Expr::structure(
            Some(KindExpr::named("Labelled")),
            vec![("label", Expr::string("a")), ("x", Expr::number(1.0)), ("y", Expr::number(2.0))],
        );
        let body = vec![
            point(),
            labelled,
            Stmt::var("l", None, Some(literal)),
            Stmt::var("y", None, Some(Expr::member(Expr::ident("l"), "y"))),
        ];
        assert_eq!(inferred(body, "y"), "number");
    }

    #[test]
    fn test_unknown_member() {
        let body = vec![
            point(),
            Stmt::var("p", Some(KindExpr::named("Point")), None),
            Stmt::var(
                "z",
                None,
                Some(Expr::member(Expr::ident("p"), Ident::new("z", Span::new(30, 31)))),
            ),
        ];
        match compile(body).1.unwrap_err() {
            CompileError::Lookup { message, span, .. } => {
                assert_eq!(message, "Cannot find member: Point.z");
                assert_eq!(span, Span::new(30, 31));
            }
            other => panic!("expected lookup error, got {other:?}"),
        }
    }

    #[test]
    fn test_enum_member() {
        let body = vec![
            Stmt::enumeration("Color", &["Red", "Green"]),
            Stmt::var("c", None, Some(Expr::member(Expr::ident("Color"), "Green"))),
        ];
        assert_eq!(inferred(body, "c"), "Color");

        let body = vec![
            Stmt::enumeration("Color", &["Red"]),
            Stmt::var("c", None, Some(Expr::member(Expr::ident("Color"), "Blue"))),
        ];
        assert!(matches!(compile(body).1, Err(CompileError::Lookup { .. })));
    }

    #[test]
    fn test_array_literal_and_index() {
        let items = Expr::array(vec![Expr::number(1.0), Expr::number(2.0), Expr::number(3.0)]);
        let body = vec![
            Stmt::var("items", None, Some(items)),
            Stmt::var("second", None, Some(Expr::index(Expr::ident("items"), Expr::number(1.0)))),
        ];
        let (compiler, result) = compile(body);
        let scope = compiler.module(result.unwrap()).scope.as_ref().unwrap();
        let kinds = compiler.kinds();

        let items = scope.value("items").and_then(Value::kind).unwrap();
        match kinds.get(items) {
            Kind::Array { len, .. } => assert_eq!(*len, ArrayLen::Fixed(3)),
            other => panic!("expected array, got {other:?}"),
        }
        let second = scope.value("second").and_then(Value::kind).unwrap();
        assert_eq!(kinds.describe(second), "number");
    }

    #[test]
    fn test_mixed_array_literal() {
        let body = vec![Stmt::var(
            "items",
            None,
            Some(Expr::array(vec![Expr::number(1.0), Expr::string("two")])),
        )];
        assert_eq!(type_message(body), "Expect number, got string");
    }

    #[test]
    fn test_empty_array_literal() {
        let empty_any = KindExpr::array(KindExpr::any(), Some(Expr::number(0.0)));
        let body = vec![
            Stmt::var("a", None, Some(Expr::array(Vec::new()))),
            Stmt::var("b", Some(empty_any), Some(Expr::array(Vec::new()))),
        ];
        assert!(compile(body).1.is_ok());

        let body = vec![Stmt::var("v", Some(KindExpr::vector(KindExpr::number())), Some(Expr::array(Vec::new())))];
        assert!(matches!(compile(body).1, Err(CompileError::Type { .. })));
    }

    #[test]
    fn test_call_arity_and_arguments() {
        let log = Stmt::func(FuncDecl::new(
            "log",
            vec![Param::new("level", KindExpr::number()), Param::rest("parts", KindExpr::string())],
            None,
            Vec::new(),
        ));

        let ok = Expr::call(
            Expr::ident("log"),
            vec![Expr::number(1.0), Expr::string("a"), Expr::string("b")],
        );
        let body = vec![log.clone(), Stmt::var("r", None, Some(ok))];
        assert_eq!(inferred(body, "r"), "void");

        let too_few = Expr::call(Expr::ident("log"), Vec::new());
        let body = vec![log.clone(), Stmt::var("r", None, Some(too_few))];
        assert_eq!(type_message(body), "Expect at least 1 arguments, got 0");

        let wrong = Expr::call(Expr::ident("log"), vec![Expr::number(1.0), Expr::number(2.0)]);
        let body = vec![log, Stmt::var("r", None, Some(wrong))];
        assert_eq!(type_message(body), "Expect string, got number");
    }

    #[test]
    fn test_call_non_callable() {
        let body = vec![
            Stmt::var("n", None, Some(Expr::number(1.0))),
            Stmt::var("r", None, Some(Expr::call(Expr::ident("n"), Vec::new()))),
        ];
        assert_eq!(type_message(body), "Expect be a callable value, got number");
    }

    #[test]
    fn test_unknown_identifier() {
        let body = vec![Stmt::var("r", None, Some(Expr::ident(Ident::new("ghost", Span::new(8, 13)))))];
        match compile(body).1.unwrap_err() {
            CompileError::Lookup { message, span, .. } => {
                assert_eq!(message, "Cannot find value: ghost");
                assert_eq!(span, Span::new(8, 13));
            }
            other => panic!("expected lookup error, got {other:?}"),
        }
    }

    #[test]
    fn test_use_before_initializer() {
        let body = vec![
            Stmt::var("a", None, Some(Expr::ident("b"))),
            Stmt::var("b", None, Some(Expr::number(1.0))),
        ];
        assert_eq!(type_message(body), "Cannot infer kind of b before its initializer");
    }

    #[test]
    fn test_interface_value() {
        let shape = Stmt::interface(
            "Shape",
            vec![KindProperty::new("area", KindExpr::func(Vec::new(), Some(KindExpr::number())))],
        );
        let circle = Stmt::structure("Circle", StructKindExpr::default());
        let area = FuncDecl::new(
            "area",
            Vec::new(),
            Some(KindExpr::number()),
            vec![Stmt::ret(Some(Expr::number(1.0)))],
        );
        let body = vec![
            shape,
            circle,
            Stmt::imp(KindExpr::named("Circle"), Some(KindExpr::named("Shape")), vec![area]),
            Stmt::var(
                "s",
                Some(KindExpr::named("Shape")),
                Some(Expr::structure(Some(KindExpr::named("Circle")), Vec::new())),
            ),
            Stmt::var("a", None, Some(Expr::call(Expr::member(Expr::ident("s"), "area"), Vec::new()))),
        ];
        assert_eq!(inferred(body, "a"), "number");
    }

    #[test]
    fn test_interface_on_alias_not_on_aliased_kind() {
        let shape = Stmt::interface(
            "Shape",
            vec![KindProperty::new("area", KindExpr::func(Vec::new(), Some(KindExpr::number())))],
        );
        let area = FuncDecl::new(
            "area",
            Vec::new(),
            Some(KindExpr::number()),
            vec![Stmt::ret(Some(Expr::number(1.0)))],
        );
        let declarations = vec![
            shape,
            Stmt::alias("Meters", KindExpr::number()),
            Stmt::imp(KindExpr::named("Meters"), Some(KindExpr::named("Shape")), vec![area]),
        ];

        let mut through_alias = declarations.clone();
        through_alias.push(Stmt::var("m", Some(KindExpr::named("Meters")), Some(Expr::number(5.0))));
        through_alias.push(Stmt::var("s", Some(KindExpr::named("Shape")), Some(Expr::ident("m"))));
        assert!(compile(through_alias).1.is_ok());

        let mut plain = declarations;
        plain.push(Stmt::var("s", Some(KindExpr::named("Shape")), Some(Expr::number(5.0))));
        assert_eq!(type_message(plain), "Expect Shape, got number");
    }

    #[test]
    fn test_cast_and_kind_test() {
        let body = vec![
            Stmt::var("raw", Some(KindExpr::any()), Some(Expr::number(1.0))),
            Stmt::var("n", None, Some(Expr::cast(Expr::ident("raw"), KindExpr::number()))),
            Stmt::var("is_text", None, Some(Expr::kind_test(Expr::ident("raw"), KindExpr::string()))),
        ];
        assert_eq!(inferred(body.clone(), "n"), "number");
        assert_eq!(inferred(body, "is_text"), "bool");
    }

    #[test]
    fn test_function_literal() {
        let double = Expr::func(
            vec![Param::new("x", KindExpr::number())],
            Some(KindExpr::number()),
            vec![Stmt::ret(Some(Expr::binary(BinOp::Mul, Expr::ident("x"), Expr::number(2.0))))],
        );
        let body = vec![Stmt::var("double", None, Some(double))];
        assert_eq!(inferred(body, "double"), "fn(number) -> number");
    }
}
