//! Module loading through the module cache

use log::debug;
use std::io;

use super::Compiler;
use crate::common::{CompileError, CompileResult, FileId, Span};
use crate::module::{ModuleId, ModuleState, module_name};
use crate::sema::DeclCompiler;

impl Compiler {
    /// Return the cached module `package:path`, loading and compiling it on
    /// first use. `origin` is the import that asked for it.
    pub(crate) fn load_module(
        &mut self,
        package: &str,
        path: &str,
        origin: Option<(FileId, Span)>,
    ) -> CompileResult<ModuleId> {
        let name = module_name(package, path);
        if let Some(id) = self.modules.find(&name) {
            debug!("module {name} served from cache");
            return Ok(id);
        }

        let Some(root) = self.config.package_root(package) else {
            let (file, span) = origin.unwrap_or_default();
            return Err(CompileError::lookup(format!("Cannot find package: {package}"), span, file));
        };
        let file_path = root.join(format!("{path}.{}", self.config.source_extension));
        let display = file_path.display().to_string();

        debug!("loading {name} from {display}");
        let bytes = self
            .vfs
            .read_file(&file_path)
            .map_err(|e| CompileError::io(&display, origin, e))?;
        let source = String::from_utf8(bytes).map_err(|e| {
            CompileError::io(&display, origin, io::Error::new(io::ErrorKind::InvalidData, e))
        })?;

        let file = self.reporter.add_file(display, source.clone());
        let program = self.parser.parse(&source, file)?;
        // Registered before compiling so import cycles find it
        let id = self.modules.register(name, package.to_string(), file, program);
        debug!("registered module {}", self.modules.get(id).name);
        self.compile_module(id)?;
        Ok(id)
    }

    /// Precompile then compile a registered module, exactly once
    pub(crate) fn compile_module(&mut self, id: ModuleId) -> CompileResult<()> {
        let Some(program) = self.modules.get_mut(id).program.take() else {
            return Ok(());
        };

        self.modules.get_mut(id).state = ModuleState::Precompiling;
        let mut decls = DeclCompiler::new(self, id);
        decls.precompile_program(&program)?;
        decls.compiler.modules.get_mut(id).state = ModuleState::Compiling;
        decls.compile_program(&program)?;
        let (frame, cache) = decls.finish();

        let module = self.modules.get_mut(id);
        module.program = Some(program);
        module.scope = Some(frame);
        module.expr_kinds = cache.into_inner();
        module.state = ModuleState::Compiled;
        debug!("compiled {}", module.name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::common::{CompileError, Span};
    use crate::driver::fixture::FixtureParser;
    use crate::driver::{Compiler, CompilerConfig};
    use crate::module::{MemoryFs, ModuleState};
    use crate::sema::{Kind, Value};
    use pretty_assertions::assert_eq;

    fn import(paths: &[&str]) -> Stmt {
        Stmt::import(paths).at(Span::new(0, 10))
    }

    fn import_from(package: &str, paths: &[&str]) -> Stmt {
        let mut stmt = Stmt::import(paths);
        if let StmtKind::Import(decl) = &mut stmt.kind {
            decl.package = Some(Ident::new(package, Span::new(7, 7 + package.len())));
        }
        stmt
    }

    fn point_module() -> Vec<Stmt> {
        vec![
            Stmt::structure(
                "Point",
                StructKindExpr {
                    extends: Vec::new(),
                    properties: vec![KindProperty::new("x", KindExpr::number())],
                },
            )
            .public(),
            Stmt::var(
                "origin",
                Some(KindExpr::named("Point")),
                Some(Expr::structure(Some(KindExpr::named("Point")), vec![("x", Expr::number(0.0))])),
            )
            .public(),
        ]
    }

    #[test]
    fn test_shared_import_compiled_once() {
        let vfs = MemoryFs::new()
            .with_file("./main.noah", "main")
            .with_file("./a.noah", "a")
            .with_file("./b.noah", "b")
            .with_file("./geo/point.noah", "geo/point");
        let parser = FixtureParser::new()
            .with("main", vec![import(&["a"]), import(&["b"])])
            .with("a", vec![import(&["geo", "point"])])
            .with("b", vec![import(&["geo", "point"])])
            .with("geo/point", point_module());
        let parses = parser.parse_count();
        let mut compiler = Compiler::new(CompilerConfig::default(), vfs, parser);

        let main = compiler.compile_entry("main").unwrap();
        assert_eq!(parses.get(), 4);
        assert_eq!(compiler.modules().len(), 4);

        let imported = |name: &str, alias: &str| {
            let module = compiler.modules().by_name(name).unwrap();
            match module.scope.as_ref().and_then(|s| s.value(alias)) {
                Some(Value::Module(m)) => m.module,
                other => panic!("expected module value, got {other:?}"),
            }
        };
        assert_eq!(imported(":a", "point"), imported(":b", "point"));
        assert!(compiler.module(main).is_compiled());
        assert!(compiler.modules().iter().all(|m| m.state == ModuleState::Compiled));
    }

    #[test]
    fn test_member_access_across_modules() {
        let vfs = MemoryFs::new()
            .with_file("./main.noah", "main")
            .with_file("./geo.noah", "geo");
        let main = vec![
            import(&["geo"]),
            Stmt::var("p", Some(KindExpr::member(&["geo", "Point"])), Some(Expr::member(Expr::ident("geo"), "origin"))),
            Stmt::var("x", None, Some(Expr::member(Expr::ident("p"), "x"))),
        ];
        let parser = FixtureParser::new().with("main", main).with("geo", point_module());
        let mut compiler = Compiler::new(CompilerConfig::default(), vfs, parser);

        let id = compiler.compile_entry("main").unwrap();
        let x = compiler.module(id).scope.as_ref().and_then(|s| s.value("x")).and_then(Value::kind).unwrap();
        assert_eq!(compiler.kinds().get(x), &Kind::Number);
    }

    #[test]
    fn test_private_names_not_visible() {
        let vfs = MemoryFs::new()
            .with_file("./main.noah", "main")
            .with_file("./geo.noah", "geo");
        let geo = vec![Stmt::var("secret", Some(KindExpr::number()), Some(Expr::number(1.0)))];
        let main = vec![
            import(&["geo"]),
            Stmt::var("s", None, Some(Expr::member(Expr::ident("geo"), "secret"))),
        ];
        let parser = FixtureParser::new().with("main", main).with("geo", geo);
        let mut compiler = Compiler::new(CompilerConfig::default(), vfs, parser);

        match compiler.compile_entry("main").unwrap_err() {
            CompileError::Lookup { message, .. } => assert_eq!(message, "Cannot find member: geo.secret"),
            other => panic!("expected lookup error, got {other:?}"),
        }
    }

    #[test]
    fn test_import_cycle_terminates() {
        let vfs = MemoryFs::new()
            .with_file("./a.noah", "a")
            .with_file("./b.noah", "b");
        let parser = FixtureParser::new()
            .with("a", vec![import(&["b"])])
            .with("b", vec![import(&["a"])]);
        let parses = parser.parse_count();
        let mut compiler = Compiler::new(CompilerConfig::default(), vfs, parser);

        compiler.compile_entry("a").unwrap();
        assert_eq!(parses.get(), 2);
        assert_eq!(compiler.modules().len(), 2);
    }

    #[test]
    fn test_missing_module_is_io_error() {
        let vfs = MemoryFs::new().with_file("./main.noah", "main");
        let parser = FixtureParser::new().with("main", vec![import(&["missing"])]);
        let mut compiler = Compiler::new(CompilerConfig::default(), vfs, parser);

        match compiler.compile_entry("main").unwrap_err() {
            CompileError::Io { path, origin, .. } => {
                assert_eq!(path, "./missing.noah");
                assert_eq!(origin.map(|(_, span)| span), Some(Span::new(0, 10)));
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        let vfs = MemoryFs::new().with_file("./main.noah", vec![0xff, 0xfe]);
        let mut compiler = Compiler::new(CompilerConfig::default(), vfs, FixtureParser::new());
        assert!(matches!(compiler.compile_entry("main"), Err(CompileError::Io { .. })));
    }

    #[test]
    fn test_external_package() {
        let vfs = MemoryFs::new()
            .with_file("app/main.noah", "main")
            .with_file("/lib/std/math.noah", "math")
            .with_file("/lib/std/consts.noah", "consts");
        let parser = FixtureParser::new()
            .with("main", vec![import_from("std", &["math"])])
            // No package: stays inside std
            .with("math", vec![import(&["consts"])])
            .with("consts", Vec::new());
        let config = CompilerConfig::new()
            .with_project_root("app")
            .with_package("std", "/lib/std");
        let mut compiler = Compiler::new(config, vfs, parser);

        compiler.compile_entry("main").unwrap();
        assert!(compiler.modules().by_name("std:math").is_some());
        assert!(compiler.modules().by_name("std:consts").is_some());
        assert!(compiler.modules().by_name(":consts").is_none());
    }

    #[test]
    fn test_unknown_package() {
        let vfs = MemoryFs::new().with_file("./main.noah", "main");
        let parser = FixtureParser::new().with("main", vec![import_from("net", &["http"])]);
        let mut compiler = Compiler::new(CompilerConfig::default(), vfs, parser);

        match compiler.compile_entry("main").unwrap_err() {
            CompileError::Lookup { message, span, .. } => {
                assert_eq!(message, "Cannot find package: net");
                assert_eq!(span, Span::new(7, 10));
            }
            other => panic!("expected lookup error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_forwarded() {
        let vfs = MemoryFs::new().with_file("./main.noah", "unparsable");
        let mut compiler = Compiler::new(CompilerConfig::default(), vfs, FixtureParser::new());
        let error = compiler.compile_entry("main").unwrap_err();

        assert!(matches!(error, CompileError::Parse { .. }));
        assert!(compiler.reporter().render(&error).contains("./main.noah"));
    }
}
