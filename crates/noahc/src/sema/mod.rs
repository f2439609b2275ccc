//! Semantic analysis: kinds, scopes and the two-pass declaration compiler

mod kind;
mod value;
mod scope;
mod compare;
mod resolve;
mod infer;
mod declare;
mod body;

pub use kind::{ArrayLen, EnumKind, FuncKind, InterfaceKind, Kind, KindArena, KindRef, MethodTable, NodeId, StructKind};
pub use value::{FuncValue, ModuleValue, Value, VarValue};
pub use scope::{Frame, Scope};
pub use compare::{KindComparator, compare_kind, flatten_properties};
pub use infer::InferenceCache;
pub(crate) use declare::DeclCompiler;
