//! Values bound to names: functions, variables and imported modules

use super::kind::KindRef;
use crate::module::ModuleId;

#[derive(Debug, Clone, PartialEq)]
pub struct FuncValue {
    pub name: String,
    pub kind: KindRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarValue {
    pub name: String,
    pub kind: KindRef,
    pub is_const: bool,
}

/// Binding of an imported module; refers to the cached module, never owns it
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleValue {
    pub name: String,
    pub module: ModuleId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Func(FuncValue),
    Var(VarValue),
    Module(ModuleValue),
}

impl Value {
    pub fn name(&self) -> &str {
        match self {
            Value::Func(f) => &f.name,
            Value::Var(v) => &v.name,
            Value::Module(m) => &m.name,
        }
    }

    /// Kind of the value; modules have none
    pub fn kind(&self) -> Option<KindRef> {
        match self {
            Value::Func(f) => Some(f.kind),
            Value::Var(v) => Some(v.kind),
            Value::Module(_) => None,
        }
    }
}

impl From<FuncValue> for Value {
    fn from(value: FuncValue) -> Self {
        Value::Func(value)
    }
}

impl From<VarValue> for Value {
    fn from(value: VarValue) -> Self {
        Value::Var(value)
    }
}

impl From<ModuleValue> for Value {
    fn from(value: ModuleValue) -> Self {
        Value::Module(value)
    }
}
