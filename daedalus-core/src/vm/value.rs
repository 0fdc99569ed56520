use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::format::DataType;
use crate::vm::instance::InstanceHandle;

/// Kind of a value crossing the evaluation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    Int,
    Float,
    String,
    Instance,
    Void,
}

impl ValueKind {
    /// Stack representation of a script data type. Function references travel as ints.
    pub fn from_data_type(ty: DataType) -> Option<Self> {
        match ty {
            DataType::Int | DataType::Function => Some(ValueKind::Int),
            DataType::Float => Some(ValueKind::Float),
            DataType::String => Some(ValueKind::String),
            DataType::Instance => Some(ValueKind::Instance),
            DataType::Void => Some(ValueKind::Void),
            DataType::Class | DataType::Prototype => None,
        }
    }
}

/// A script value. `Instance(None)` is the script's null instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    String(String),
    Instance(Option<InstanceHandle>),
    Void,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Instance(_) => ValueKind::Instance,
            Value::Void => ValueKind::Void,
        }
    }

    /// What an unregistered external yields for a declared return of `kind`.
    pub fn default_for(kind: ValueKind) -> Value {
        match kind {
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Instance => Value::Instance(None),
            ValueKind::Void => Value::Void,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<Option<InstanceHandle>> {
        match self {
            Value::Instance(v) => Some(*v),
            _ => None,
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        self.kind().into()
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Int(v as i32)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<InstanceHandle> for Value {
    fn from(v: InstanceHandle) -> Self {
        Value::Instance(Some(v))
    }
}

impl From<Option<InstanceHandle>> for Value {
    fn from(v: Option<InstanceHandle>) -> Self {
        Value::Instance(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Instance(Some(h)) => write!(f, "instance(#{})", h.index()),
            Value::Instance(None) => write!(f, "null"),
            Value::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_types_map_to_stack_kinds() {
        assert_eq!(Value::from(true), Value::Int(1));
        assert_eq!(Value::from(2.5f32).kind(), ValueKind::Float);
        assert_eq!(Value::from("x").kind(), ValueKind::String);
        assert_eq!(Value::from(None::<InstanceHandle>).kind(), ValueKind::Instance);
    }

    #[test]
    fn defaults_are_zeroes() {
        assert_eq!(Value::default_for(ValueKind::Int), Value::Int(0));
        assert_eq!(Value::default_for(ValueKind::String), Value::String(String::new()));
        assert_eq!(Value::default_for(ValueKind::Instance), Value::Instance(None));
        assert_eq!(ValueKind::from_data_type(DataType::Function), Some(ValueKind::Int));
        assert_eq!(ValueKind::from_data_type(DataType::Class), None);
    }
}
