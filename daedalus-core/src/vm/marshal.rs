//! Conversions between Rust types and script values for typed externals and calls.
//!
//! A callback `Fn(&mut DaedalusVm, (i32, String)) -> anyhow::Result<f32>` derives its script
//! signature `(int, string) -> float` from these traits.

use crate::error::{Result, VmError};
use crate::vm::instance::InstanceHandle;
use crate::vm::value::{Value, ValueKind};

fn mismatch(expected: ValueKind, found: &Value) -> VmError {
    VmError::StackTypeMismatch { expected: expected.into(), found: found.kind_name() }
}

/// A Rust type that can be taken out of a script value.
pub trait FromValue: Sized {
    const KIND: ValueKind;

    fn from_value(value: Value) -> Result<Self>;
}

/// A Rust type that can be handed to script code.
pub trait IntoValue {
    const KIND: ValueKind;

    fn into_value(self) -> Value;
}

impl FromValue for i32 {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Int(v) => Ok(v),
            other => Err(mismatch(<Self as FromValue>::KIND, &other)),
        }
    }
}

/// Script booleans are ints; anything non-zero is true.
impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Int;

    fn from_value(value: Value) -> Result<Self> {
        i32::from_value(value).map(|v| v != 0)
    }
}

impl FromValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(v),
            other => Err(mismatch(<Self as FromValue>::KIND, &other)),
        }
    }
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(mismatch(<Self as FromValue>::KIND, &other)),
        }
    }
}

impl FromValue for Option<InstanceHandle> {
    const KIND: ValueKind = ValueKind::Instance;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Instance(v) => Ok(v),
            other => Err(mismatch(<Self as FromValue>::KIND, &other)),
        }
    }
}

/// Fails on the null instance. Take `Option<InstanceHandle>` where scripts may pass null.
impl FromValue for InstanceHandle {
    const KIND: ValueKind = ValueKind::Instance;

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Instance(Some(h)) => Ok(h),
            Value::Instance(None) => {
                Err(VmError::StackTypeMismatch { expected: "instance", found: "null instance" })
            }
            other => Err(mismatch(<Self as FromValue>::KIND, &other)),
        }
    }
}

macro_rules! into_value {
    ($ty:ty, $kind:ident, $v:ident => $e:expr) => {
        impl IntoValue for $ty {
            const KIND: ValueKind = ValueKind::$kind;

            fn into_value(self) -> Value {
                let $v = self;
                $e
            }
        }
    };
}

into_value!(i32, Int, v => Value::Int(v));
into_value!(bool, Int, v => Value::Int(v as i32));
into_value!(f32, Float, v => Value::Float(v));
into_value!(String, String, v => Value::String(v));
into_value!(&str, String, v => Value::String(v.to_string()));
into_value!(InstanceHandle, Instance, v => Value::Instance(Some(v)));
into_value!(Option<InstanceHandle>, Instance, v => Value::Instance(v));

/// What an external callback returns to the script.
pub trait ExternalReturn {
    const KIND: ValueKind;

    fn into_result(self) -> Value;
}

impl ExternalReturn for () {
    const KIND: ValueKind = ValueKind::Void;

    fn into_result(self) -> Value {
        Value::Void
    }
}

macro_rules! external_return {
    ($($ty:ty),+) => {
        $(
            impl ExternalReturn for $ty {
                const KIND: ValueKind = <$ty as IntoValue>::KIND;

                fn into_result(self) -> Value {
                    self.into_value()
                }
            }
        )+
    };
}

external_return!(i32, bool, f32, String, InstanceHandle, Option<InstanceHandle>);

/// Arguments of an external callback, popped from the stack in declaration order.
pub trait ExternalArgs: Sized {
    fn kinds() -> Vec<ValueKind>;

    fn from_values(values: Vec<Value>) -> Result<Self>;
}

impl ExternalArgs for () {
    fn kinds() -> Vec<ValueKind> {
        Vec::new()
    }

    fn from_values(_: Vec<Value>) -> Result<Self> {
        Ok(())
    }
}

impl<T: FromValue> ExternalArgs for T {
    fn kinds() -> Vec<ValueKind> {
        vec![T::KIND]
    }

    fn from_values(values: Vec<Value>) -> Result<Self> {
        let value = values.into_iter().next().ok_or(VmError::StackUnderflow)?;
        T::from_value(value)
    }
}

/// Arguments the host passes to a script function.
pub trait CallArgs {
    fn into_values(self) -> Vec<Value>;
}

impl CallArgs for () {
    fn into_values(self) -> Vec<Value> {
        Vec::new()
    }
}

impl<T: IntoValue> CallArgs for T {
    fn into_values(self) -> Vec<Value> {
        vec![self.into_value()]
    }
}

macro_rules! tuple_impls {
    ($($name:ident),+) => {
        impl<$($name: FromValue),+> ExternalArgs for ($($name,)+) {
            fn kinds() -> Vec<ValueKind> {
                vec![$($name::KIND),+]
            }

            fn from_values(values: Vec<Value>) -> Result<Self> {
                let mut values = values.into_iter();
                Ok(($($name::from_value(values.next().ok_or(VmError::StackUnderflow)?)?,)+))
            }
        }

        impl<$($name: IntoValue),+> CallArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_values(self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.into_value()),+]
            }
        }
    };
}

tuple_impls!(A);
tuple_impls!(A, B);
tuple_impls!(A, B, C);
tuple_impls!(A, B, C, D);
tuple_impls!(A, B, C, D, E);
tuple_impls!(A, B, C, D, E, F);
tuple_impls!(A, B, C, D, E, F, G);
tuple_impls!(A, B, C, D, E, F, G, H);
tuple_impls!(A, B, C, D, E, F, G, H, I);
tuple_impls!(A, B, C, D, E, F, G, H, I, J);

/// What the host expects back from a script function.
pub trait CallReturn: Sized {
    /// `None` discards whatever the function returns.
    const KIND: Option<ValueKind>;

    fn from_result(value: Value) -> Result<Self>;
}

impl CallReturn for () {
    const KIND: Option<ValueKind> = None;

    fn from_result(_: Value) -> Result<Self> {
        Ok(())
    }
}

impl<T: FromValue> CallReturn for T {
    const KIND: Option<ValueKind> = Some(T::KIND);

    fn from_result(value: Value) -> Result<Self> {
        T::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn signatures_follow_rust_types() {
        assert_eq!(<(i32, String, f32)>::kinds(), vec![ValueKind::Int, ValueKind::String, ValueKind::Float]);
        assert_eq!(<bool>::kinds(), vec![ValueKind::Int]);
        assert_eq!(<()>::kinds(), Vec::<ValueKind>::new());
        assert_eq!(<Option<InstanceHandle> as ExternalReturn>::KIND, ValueKind::Instance);
        assert_eq!(<() as CallReturn>::KIND, None);
    }

    #[test]
    fn values_convert_in_order() {
        let (a, b): (i32, String) =
            ExternalArgs::from_values(vec![Value::Int(3), Value::String("x".into())]).unwrap();
        assert_eq!((a, b.as_str()), (3, "x"));

        let err = <(i32, i32)>::from_values(vec![Value::Int(1), Value::Float(1.0)]).unwrap_err();
        assert!(matches!(err, VmError::StackTypeMismatch { expected: "int", found: "float" }));
        assert!(InstanceHandle::from_value(Value::Instance(None)).is_err());
        assert_eq!((1i32, "a", true).into_values(), vec![Value::Int(1), Value::String("a".into()), Value::Int(1)]);
    }
}
