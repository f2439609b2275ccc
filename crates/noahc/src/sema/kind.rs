//! Resolved kinds and the arena that owns them
//!
//! A [`KindRef`] is a cell. It is either empty (pending) or points at exactly
//! one [`Kind`] node. Declarations reserve an empty cell under their name
//! before their body is resolved, so recursive and out-of-order references
//! can be taken early and filled in place later. Kinds reference each other
//! only through cells; nothing is deep-copied.

use indexmap::IndexMap;
use std::collections::HashSet;

use super::value::FuncValue;

/// Handle to a kind cell in the [`KindArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindRef(u32);

/// Identity of a kind node; two refs denote the same kind iff their nodes match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

/// Length policy of an array kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayLen {
    Fixed(usize),
    /// Vector: no length in the kind
    Dynamic,
}

/// A resolved kind
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// Cell not resolved yet
    Pending,
    /// Return kind of a function without a declared return
    Void,
    Number,
    Byte,
    Char,
    String,
    Bool,
    Any,
    /// Back-reference to the enclosing impl target or interface
    SelfKind(KindRef),
    Array { element: KindRef, len: ArrayLen },
    /// Named alias of another kind
    Custom(KindRef),
    Func(FuncKind),
    Struct(StructKind),
    Interface(InterfaceKind),
    Enum(EnumKind),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncKind {
    pub params: Vec<KindRef>,
    pub ret: KindRef,
    /// Final parameter accepts any number of arguments
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructKind {
    pub extends: Vec<KindRef>,
    pub properties: IndexMap<String, KindRef>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceKind {
    /// Method name to `Func` kind
    pub methods: IndexMap<String, KindRef>,
    /// Kinds whose impl blocks claimed and satisfied this interface
    pub implementers: Vec<KindRef>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumKind {
    /// Choice name to zero-based ordinal, in declaration order
    pub choices: IndexMap<String, usize>,
}

/// Methods attached to a kind by `impl` blocks
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    methods: IndexMap<String, FuncValue>,
}

impl MethodTable {
    pub fn has(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FuncValue> {
        self.methods.get(name)
    }

    pub fn insert(&mut self, value: FuncValue) {
        self.methods.insert(value.name.clone(), value);
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FuncValue> {
        self.methods.values()
    }
}

#[derive(Debug)]
struct KindNode {
    kind: Kind,
    methods: MethodTable,
    name: Option<String>,
}

/// Owner of every kind created during one compilation session
///
/// Primitive kinds are shared singletons, so methods attached to `number`
/// are visible on every use of `number`.
#[derive(Debug)]
pub struct KindArena {
    cells: Vec<Option<NodeId>>,
    nodes: Vec<KindNode>,
}

const VOID: KindRef = KindRef(0);
const NUMBER: KindRef = KindRef(1);
const BYTE: KindRef = KindRef(2);
const CHAR: KindRef = KindRef(3);
const STRING: KindRef = KindRef(4);
const BOOL: KindRef = KindRef(5);
const ANY: KindRef = KindRef(6);

static PENDING: Kind = Kind::Pending;

impl KindArena {
    pub fn new() -> Self {
        let mut arena = Self {
            cells: Vec::new(),
            nodes: Vec::new(),
        };
        for kind in [
            Kind::Void,
            Kind::Number,
            Kind::Byte,
            Kind::Char,
            Kind::String,
            Kind::Bool,
            Kind::Any,
        ] {
            arena.alloc(kind);
        }
        arena
    }

    pub fn void(&self) -> KindRef {
        VOID
    }

    pub fn number(&self) -> KindRef {
        NUMBER
    }

    pub fn byte(&self) -> KindRef {
        BYTE
    }

    pub fn char(&self) -> KindRef {
        CHAR
    }

    pub fn string(&self) -> KindRef {
        STRING
    }

    pub fn bool(&self) -> KindRef {
        BOOL
    }

    pub fn any(&self) -> KindRef {
        ANY
    }

    /// Create a node and a cell pointing at it
    pub fn alloc(&mut self, kind: Kind) -> KindRef {
        let cell = self.pending();
        self.fill(cell, kind);
        cell
    }

    /// Create an empty cell
    pub fn pending(&mut self) -> KindRef {
        let cell = KindRef(self.cells.len() as u32);
        self.cells.push(None);
        cell
    }

    /// Resolve a cell with a new node
    pub fn fill(&mut self, cell: KindRef, kind: Kind) {
        debug_assert!(self.cells[cell.0 as usize].is_none(), "cell resolved twice");
        let node = NodeId(self.nodes.len() as u32);
        self.nodes.push(KindNode {
            kind,
            methods: MethodTable::default(),
            name: None,
        });
        self.cells[cell.0 as usize] = Some(node);
    }

    /// Resolve a cell to the node another cell already holds
    pub fn link(&mut self, cell: KindRef, target: KindRef) {
        debug_assert!(self.cells[cell.0 as usize].is_none(), "cell resolved twice");
        self.cells[cell.0 as usize] = self.cells[target.0 as usize];
    }

    pub fn node(&self, cell: KindRef) -> Option<NodeId> {
        self.cells.get(cell.0 as usize).copied().flatten()
    }

    pub fn is_pending(&self, cell: KindRef) -> bool {
        self.node(cell).is_none()
    }

    pub fn get(&self, cell: KindRef) -> &Kind {
        match self.node(cell) {
            Some(node) => &self.nodes[node.0 as usize].kind,
            None => &PENDING,
        }
    }

    /// Mutable access to a resolved node, for filling interface implementers
    pub fn get_mut(&mut self, cell: KindRef) -> Option<&mut Kind> {
        let node = self.node(cell)?;
        Some(&mut self.nodes[node.0 as usize].kind)
    }

    /// Whether two cells hold the same node
    pub fn same(&self, a: KindRef, b: KindRef) -> bool {
        match (self.node(a), self.node(b)) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        }
    }

    pub fn methods(&self, cell: KindRef) -> Option<&MethodTable> {
        self.node(cell).map(|node| &self.nodes[node.0 as usize].methods)
    }

    pub fn methods_mut(&mut self, cell: KindRef) -> Option<&mut MethodTable> {
        let node = self.node(cell)?;
        Some(&mut self.nodes[node.0 as usize].methods)
    }

    /// Record the declared name of a kind, used in diagnostics
    pub fn set_name(&mut self, cell: KindRef, name: impl Into<String>) {
        if let Some(node) = self.node(cell) {
            self.nodes[node.0 as usize].name = Some(name.into());
        }
    }

    pub fn name(&self, cell: KindRef) -> Option<&str> {
        self.node(cell)
            .and_then(|node| self.nodes[node.0 as usize].name.as_deref())
    }

    /// Follow alias and `Self` indirections down to a concrete kind
    pub fn unwrap_alias(&self, mut cell: KindRef) -> KindRef {
        let mut seen = HashSet::new();
        while seen.insert(cell) {
            match self.get(cell) {
                Kind::Custom(inner) | Kind::SelfKind(inner) => cell = *inner,
                _ => break,
            }
        }
        cell
    }

    /// Number of cells, including pending ones
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Short human-readable form used in diagnostics
    pub fn describe(&self, cell: KindRef) -> String {
        if let Some(name) = self.name(cell) {
            return name.to_string();
        }
        match self.get(cell) {
            Kind::Pending => "<pending>".to_string(),
            Kind::Void => "void".to_string(),
            Kind::Number => "number".to_string(),
            Kind::Byte => "byte".to_string(),
            Kind::Char => "char".to_string(),
            Kind::String => "string".to_string(),
            Kind::Bool => "bool".to_string(),
            Kind::Any => "any".to_string(),
            Kind::SelfKind(_) => "Self".to_string(),
            Kind::Array { element, len } => match len {
                ArrayLen::Fixed(n) => format!("[{}; {}]", self.describe(*element), n),
                ArrayLen::Dynamic => format!("[{}]", self.describe(*element)),
            },
            Kind::Custom(inner) => self.describe(*inner),
            Kind::Func(func) => {
                let last = func.params.len().saturating_sub(1);
                let params: Vec<String> = func
                    .params
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let rest = if func.variadic && i == last { "..." } else { "" };
                        format!("{rest}{}", self.describe(*p))
                    })
                    .collect();
                format!("fn({}) -> {}", params.join(", "), self.describe(func.ret))
            }
            Kind::Struct(s) => {
                let props: Vec<String> = s
                    .properties
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", self.describe(*v)))
                    .collect();
                format!("struct {{ {} }}", props.join(", "))
            }
            Kind::Interface(i) => {
                let methods: Vec<&str> = i.methods.keys().map(String::as_str).collect();
                format!("interface {{ {} }}", methods.join(", "))
            }
            Kind::Enum(e) => {
                let choices: Vec<&str> = e.choices.keys().map(String::as_str).collect();
                format!("enum {{ {} }}", choices.join(", "))
            }
        }
    }
}

impl Default for KindArena {
    fn default() -> Self {
        Self::new()
    }
}
