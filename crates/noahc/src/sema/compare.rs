//! Kind comparison: strict identity and non-strict assignability

use indexmap::IndexMap;
use std::collections::HashSet;

use super::kind::{Kind, KindArena, KindRef, NodeId, StructKind};

/// Compare `target` with `source`.
///
/// Strict mode demands structural identity and is what interface
/// conformance uses. Non-strict mode decides whether a `source` value may be
/// stored where `target` is expected.
pub fn compare_kind(kinds: &KindArena, target: KindRef, source: KindRef, strict: bool) -> bool {
    KindComparator::new(kinds, strict).compare(target, source)
}

/// Structural comparator over the kind graph
pub struct KindComparator<'a> {
    kinds: &'a KindArena,
    strict: bool,
    /// While checking an impl against an interface, the interface's `Self`
    /// stands for the impl target
    self_binding: Option<(KindRef, KindRef)>,
    /// Node pairs under comparison; revisiting one is assumed to succeed
    assumed: HashSet<(NodeId, NodeId)>,
}

impl<'a> KindComparator<'a> {
    pub fn new(kinds: &'a KindArena, strict: bool) -> Self {
        Self {
            kinds,
            strict,
            self_binding: None,
            assumed: HashSet::new(),
        }
    }

    /// Treat `Self` of `interface` as `target`
    pub fn with_self_binding(mut self, interface: KindRef, target: KindRef) -> Self {
        self.self_binding = Some((interface, target));
        self
    }

    pub fn compare(&mut self, target: KindRef, source: KindRef) -> bool {
        let declared = source;
        let target = self.normalize(target);
        let source = self.normalize(source);

        if self.kinds.same(target, source) && !self.kinds.is_pending(target) {
            return true;
        }

        let (Some(t), Some(s)) = (self.kinds.node(target), self.kinds.node(source)) else {
            return false;
        };
        if !self.assumed.insert((t, s)) {
            return true;
        }

        let result = self.compare_nodes(target, source, declared);
        self.assumed.remove(&(t, s));
        result
    }

    /// `declared` is `source` before alias and `Self` indirections are followed
    fn compare_nodes(&mut self, target: KindRef, source: KindRef, declared: KindRef) -> bool {
        let kinds = self.kinds;
        match (kinds.get(target), kinds.get(source)) {
            (Kind::Any, _) if !self.strict => true,
            (Kind::Void, Kind::Void)
            | (Kind::Number, Kind::Number)
            | (Kind::Byte, Kind::Byte)
            | (Kind::Char, Kind::Char)
            | (Kind::String, Kind::String)
            | (Kind::Bool, Kind::Bool)
            | (Kind::Any, Kind::Any) => true,
            (
                Kind::Array { element: te, len: tl },
                Kind::Array { element: se, len: sl },
            ) => tl == sl && self.compare(*te, *se),
            (Kind::Func(tf), Kind::Func(sf)) => {
                tf.variadic == sf.variadic
                    && tf.params.len() == sf.params.len()
                    && tf
                        .params
                        .iter()
                        .zip(sf.params.iter())
                        .all(|(a, b)| self.compare(*a, *b))
                    && self.compare(tf.ret, sf.ret)
            }
            (Kind::Struct(ts), Kind::Struct(ss)) => {
                if self.strict {
                    self.structs_identical(ts, ss)
                } else {
                    self.struct_assignable(target, source)
                }
            }
            (Kind::Interface(ti), Kind::Interface(si)) => {
                let same_keys = ti.methods.len() == si.methods.len();
                (same_keys || !self.strict)
                    && ti.methods.iter().all(|(name, t)| {
                        si.methods.get(name).is_some_and(|s| self.compare(*t, *s))
                    })
            }
            (Kind::Interface(ti), _) if !self.strict => self.implemented_by(&ti.implementers, declared),
            (Kind::Enum(te), Kind::Enum(se)) => te.choices == se.choices,
            _ => false,
        }
    }

    fn structs_identical(&mut self, t: &StructKind, s: &StructKind) -> bool {
        t.extends.len() == s.extends.len()
            && t.properties.len() == s.properties.len()
            && t.extends
                .iter()
                .zip(s.extends.iter())
                .all(|(a, b)| self.compare(*a, *b))
            && t.properties.iter().all(|(name, tk)| {
                s.properties.get(name).is_some_and(|sk| self.compare(*tk, *sk))
            })
    }

    /// Width compatibility: the source has every property the target needs
    fn struct_assignable(&mut self, target: KindRef, source: KindRef) -> bool {
        let wanted = flatten_properties(self.kinds, target);
        let offered = flatten_properties(self.kinds, source);
        wanted.iter().all(|(name, tk)| {
            offered.get(name).is_some_and(|sk| self.compare(*tk, *sk))
        })
    }

    /// Whether `source` or a kind it aliases is one of `implementers`.
    /// Methods live on the aliased node, so `number` never reaches an
    /// implementer declared as `type Meters = number`.
    fn implemented_by(&self, implementers: &[KindRef], source: KindRef) -> bool {
        let mut seen = HashSet::new();
        let mut cell = source;
        loop {
            if implementers.iter().any(|i| self.kinds.same(*i, cell)) {
                return true;
            }
            if !seen.insert(cell) {
                return false;
            }
            match self.step(cell) {
                Some(next) => cell = next,
                None => return false,
            }
        }
    }

    fn normalize(&self, mut cell: KindRef) -> KindRef {
        let mut seen = HashSet::new();
        while seen.insert(cell) {
            match self.step(cell) {
                Some(next) => cell = next,
                None => break,
            }
        }
        cell
    }

    /// One alias or `Self` indirection
    fn step(&self, cell: KindRef) -> Option<KindRef> {
        match self.kinds.get(cell) {
            Kind::Custom(inner) => Some(*inner),
            Kind::SelfKind(owner) => Some(match self.self_binding {
                Some((interface, target)) if self.kinds.same(*owner, interface) => target,
                _ => *owner,
            }),
            _ => None,
        }
    }
}

/// All properties of a struct kind, own ones first, then each `extends`
/// entry depth-first; earlier entries win on name clashes
pub fn flatten_properties(kinds: &KindArena, cell: KindRef) -> IndexMap<String, KindRef> {
    let mut out = IndexMap::new();
    let mut seen = HashSet::new();
    collect_properties(kinds, cell, &mut out, &mut seen);
    out
}

fn collect_properties(
    kinds: &KindArena,
    cell: KindRef,
    out: &mut IndexMap<String, KindRef>,
    seen: &mut HashSet<NodeId>,
) {
    let cell = kinds.unwrap_alias(cell);
    let Some(node) = kinds.node(cell) else {
        return;
    };
    if !seen.insert(node) {
        return;
    }
    if let Kind::Struct(s) = kinds.get(cell) {
        for (name, kind) in &s.properties {
            out.entry(name.clone()).or_insert(*kind);
        }
        for ext in &s.extends {
            collect_properties(kinds, *ext, out, seen);
        }
    }
}
