//! Lexical scopes and the self-kind stack

use std::collections::HashMap;

use super::kind::KindRef;
use super::value::Value;

/// One lexical frame: values and kinds are separate namespaces
#[derive(Debug, Clone, Default)]
pub struct Frame {
    values: HashMap<String, Value>,
    kinds: HashMap<String, KindRef>,
}

impl Frame {
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
}

/// Stack of frames, innermost last
#[derive(Debug, Default)]
pub struct Scope {
    frames: Vec<Frame>,
    /// Targets of the enclosing impl/interface bodies, innermost last
    self_kinds: Vec<KindRef>,
    /// Enclosing loops with their optional labels, innermost last
    loops: Vec<Option<String>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self) {
        self.frames.push(Frame::default());
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Bind a value in the innermost frame
    pub fn put_value(&mut self, name: &str, value: Value) -> Result<(), String> {
        let frame = self.innermost()?;
        if frame.values.contains_key(name) {
            return Err(format!("Duplicate declaration: {name}"));
        }
        frame.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Bind a kind in the innermost frame
    pub fn put_kind(&mut self, name: &str, kind: KindRef) -> Result<(), String> {
        let frame = self.innermost()?;
        if frame.kinds.contains_key(name) {
            return Err(format!("Duplicate kind: {name}"));
        }
        frame.kinds.insert(name.to_string(), kind);
        Ok(())
    }

    /// Look up a value from the innermost frame outwards
    pub fn find_value(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.values.get(name))
    }

    /// Look up a kind from the innermost frame outwards
    pub fn find_kind(&self, name: &str) -> Option<KindRef> {
        self.frames.iter().rev().find_map(|frame| frame.kinds.get(name).copied())
    }

    pub fn put_self_kind(&mut self, kind: KindRef) {
        self.self_kinds.push(kind);
    }

    pub fn pop_self_kind(&mut self) -> Option<KindRef> {
        self.self_kinds.pop()
    }

    /// Innermost active self kind
    pub fn find_self_kind(&self) -> Option<KindRef> {
        self.self_kinds.last().copied()
    }

    /// Enter a loop
    pub fn enter_loop(&mut self, label: Option<&str>) {
        self.loops.push(label.map(str::to_string));
    }

    /// Exit a loop
    pub fn exit_loop(&mut self) {
        self.loops.pop();
    }

    /// Check if we're inside a loop
    pub fn in_loop(&self) -> bool {
        !self.loops.is_empty()
    }

    pub fn has_loop_label(&self, label: &str) -> bool {
        self.loops.iter().any(|l| l.as_deref() == Some(label))
    }

    /// Loops do not continue across function bodies
    pub fn take_loops(&mut self) -> Vec<Option<String>> {
        std::mem::take(&mut self.loops)
    }

    pub fn restore_loops(&mut self, loops: Vec<Option<String>>) {
        self.loops = loops;
    }

    fn innermost(&mut self) -> Result<&mut Frame, String> {
        self.frames
            .last_mut()
            .ok_or_else(|| "no open scope".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::kind::KindArena;
    use crate::sema::value::VarValue;

    fn var(name: &str, kind: KindRef) -> Value {
        Value::Var(VarValue {
            name: name.to_string(),
            kind,
            is_const: false,
        })
    }

    #[test]
    fn test_shadowing_and_pop() {
        let arena = KindArena::new();
        let mut scope = Scope::new();
        scope.push();
        scope.put_value("x", var("x", arena.number())).unwrap();
        scope.push();
        scope.put_value("x", var("x", arena.string())).unwrap();

        assert_eq!(scope.find_value("x").and_then(Value::kind), Some(arena.string()));
        scope.pop();
        assert_eq!(scope.find_value("x").and_then(Value::kind), Some(arena.number()));
    }

    #[test]
    fn test_duplicate_in_same_frame() {
        let arena = KindArena::new();
        let mut scope = Scope::new();
        scope.push();
        scope.put_kind("Point", arena.number()).unwrap();
        assert!(scope.put_kind("Point", arena.string()).is_err());
        assert!(scope.put_value("x", var("x", arena.number())).is_ok());
        assert!(scope.put_value("x", var("x", arena.number())).is_err());
    }

    #[test]
    fn test_values_and_kinds_are_separate() {
        let arena = KindArena::new();
        let mut scope = Scope::new();
        scope.push();
        scope.put_kind("Point", arena.number()).unwrap();
        assert!(scope.find_value("Point").is_none());
        assert_eq!(scope.find_kind("Point"), Some(arena.number()));
    }

    #[test]
    fn test_self_kind_nesting() {
        let arena = KindArena::new();
        let mut scope = Scope::new();
        assert!(scope.find_self_kind().is_none());
        scope.put_self_kind(arena.number());
        scope.put_self_kind(arena.string());
        assert_eq!(scope.find_self_kind(), Some(arena.string()));
        scope.pop_self_kind();
        assert_eq!(scope.find_self_kind(), Some(arena.number()));
    }

    #[test]
    fn test_loop_labels() {
        let mut scope = Scope::new();
        assert!(!scope.in_loop());
        scope.enter_loop(Some("outer"));
        scope.enter_loop(None);
        assert!(scope.in_loop());
        assert!(scope.has_loop_label("outer"));
        assert!(!scope.has_loop_label("inner"));
        scope.exit_loop();
        scope.exit_loop();
        assert!(!scope.in_loop());
    }

    #[test]
    fn test_put_without_frame_fails() {
        let arena = KindArena::new();
        let mut scope = Scope::new();
        assert!(scope.put_value("x", var("x", arena.number())).is_err());
    }
}
