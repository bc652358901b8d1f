//! Bound values
//!
//! The registry only binds a closed set of primitive kinds. Each kind has a
//! variant in [`ValueKind`] (the tag), [`Value`] (an owned snapshot) and
//! [`Target`] (a reference to caller-owned storage, a [`Var`]).

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{BoxError, EnvError, Result};

/// Kind of a bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl ValueKind {
    /// Zero value of this kind (empty string, `false`, `0`)
    pub fn zero(&self) -> Value {
        match self {
            ValueKind::String => Value::String(String::new()),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::I8 => Value::I8(0),
            ValueKind::I16 => Value::I16(0),
            ValueKind::I32 => Value::I32(0),
            ValueKind::I64 => Value::I64(0),
            ValueKind::Isize => Value::Isize(0),
            ValueKind::U8 => Value::U8(0),
            ValueKind::U16 => Value::U16(0),
            ValueKind::U32 => Value::U32(0),
            ValueKind::U64 => Value::U64(0),
            ValueKind::Usize => Value::Usize(0),
            ValueKind::F32 => Value::F32(0.0),
            ValueKind::F64 => Value::F64(0.0),
        }
    }

    /// Rust type name for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "String",
            ValueKind::Bool => "bool",
            ValueKind::I8 => "i8",
            ValueKind::I16 => "i16",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::Isize => "isize",
            ValueKind::U8 => "u8",
            ValueKind::U16 => "u16",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::Usize => "usize",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned snapshot of a bound value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    F32(f32),
    F64(f64),
}

impl Value {
    /// Convert `raw` with the default converter for `kind`
    ///
    /// Strings are taken verbatim. Integers are base 10 and range-checked
    /// against the width of `kind`; unsigned kinds reject any sign.
    /// Floats accept decimal and scientific notation and fail when the value
    /// overflows the width of `kind`.
    pub fn parse(kind: ValueKind, raw: &str) -> std::result::Result<Value, BoxError> {
        let value = match kind {
            ValueKind::String => Value::String(raw.to_string()),
            ValueKind::Bool => Value::Bool(parse_bool(raw)?),
            ValueKind::I8 => Value::I8(raw.parse()?),
            ValueKind::I16 => Value::I16(raw.parse()?),
            ValueKind::I32 => Value::I32(raw.parse()?),
            ValueKind::I64 => Value::I64(raw.parse()?),
            ValueKind::Isize => Value::Isize(raw.parse()?),
            ValueKind::U8 => Value::U8(unsigned(raw)?.parse()?),
            ValueKind::U16 => Value::U16(unsigned(raw)?.parse()?),
            ValueKind::U32 => Value::U32(unsigned(raw)?.parse()?),
            ValueKind::U64 => Value::U64(unsigned(raw)?.parse()?),
            ValueKind::Usize => Value::Usize(unsigned(raw)?.parse()?),
            ValueKind::F32 => {
                let v: f32 = raw.parse()?;
                in_range(raw, v.is_infinite())?;
                Value::F32(v)
            }
            ValueKind::F64 => {
                let v: f64 = raw.parse()?;
                in_range(raw, v.is_infinite())?;
                Value::F64(v)
            }
        };
        Ok(value)
    }

    /// Kind tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Bool(_) => ValueKind::Bool,
            Value::I8(_) => ValueKind::I8,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::Isize(_) => ValueKind::Isize,
            Value::U8(_) => ValueKind::U8,
            Value::U16(_) => ValueKind::U16,
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::Usize(_) => ValueKind::Usize,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => f.write_str(v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::Isize(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::Usize(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
        }
    }
}

/// Rejected boolean literal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid boolean literal {0:?}")]
pub struct ParseBoolError(String);

/// Rejected numeric literal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseNumberError {
    #[error("sign not allowed in unsigned value {0:?}")]
    Signed(String),

    #[error("value out of range {0:?}")]
    OutOfRange(String),
}

fn unsigned(raw: &str) -> std::result::Result<&str, ParseNumberError> {
    // `-` is already rejected by the unsigned parsers
    if raw.starts_with('+') {
        return Err(ParseNumberError::Signed(raw.to_string()));
    }
    Ok(raw)
}

/// An infinite result is an overflow unless `raw` spells infinity
fn in_range(raw: &str, infinite: bool) -> std::result::Result<(), ParseNumberError> {
    let literal = raw.trim_start_matches(['+', '-']).to_ascii_lowercase();
    if infinite && literal != "inf" && literal != "infinity" {
        return Err(ParseNumberError::OutOfRange(raw.to_string()));
    }
    Ok(())
}

/// Parse the canonical boolean literals
///
/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(raw: &str) -> std::result::Result<bool, ParseBoolError> {
    match raw {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ParseBoolError(raw.to_string())),
    }
}

/// Caller-owned storage a binding writes into
///
/// Cloning a `Var` shares the same storage location; two registrations of
/// clones of one `Var` are the same target.
pub struct Var<T>(Arc<RwLock<T>>);

impl<T: Primitive> Var<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(RwLock::new(value)))
    }

    /// Current value
    pub fn get(&self) -> T {
        self.read().clone()
    }

    /// Replace the current value
    pub fn set(&self, value: T) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value;
    }

    /// True if both handles refer to the same storage location
    pub fn ptr_eq(&self, other: &Var<T>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Value {
        self.get().into_value()
    }

    fn assign(&self, value: Value) -> Result<()> {
        let value = T::from_value(value).ok_or(EnvError::ValueInvalid)?;
        self.set(value);
        Ok(())
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: Primitive + Default> Default for Var<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Primitive + fmt::Debug> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Var").field(&*self.read()).finish()
    }
}

mod private {
    pub trait Sealed {}
}

/// Types a [`Var`] may hold to be registered
///
/// Sealed: the supported set is fixed.
pub trait Primitive: private::Sealed + Clone + Send + Sync + 'static {
    const KIND: ValueKind;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Option<Self>;

    fn into_target(var: Var<Self>) -> Target;
}

macro_rules! primitives {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl private::Sealed for $ty {}

            impl Primitive for $ty {
                const KIND: ValueKind = ValueKind::$variant;

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }

                fn into_target(var: Var<Self>) -> Target {
                    Target::$variant(var)
                }
            }
        )*

        impl Target {
            /// Build a target from a type-erased reference
            ///
            /// Anything other than a `Var` of a supported primitive (or a
            /// `Target`) fails with [`EnvError::ValueInvalid`].
            pub fn from_any(value: &dyn Any) -> Result<Target> {
                if let Some(target) = value.downcast_ref::<Target>() {
                    return Ok(target.clone());
                }
                $(
                    if let Some(var) = value.downcast_ref::<Var<$ty>>() {
                        return Ok(Target::$variant(var.clone()));
                    }
                )*
                Err(EnvError::ValueInvalid)
            }
        }
    };
}

primitives! {
    String => String,
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
    f32 => F32,
    f64 => F64,
}

/// Reference to caller-owned storage of one supported kind
#[derive(Debug, Clone)]
pub enum Target {
    String(Var<String>),
    Bool(Var<bool>),
    I8(Var<i8>),
    I16(Var<i16>),
    I32(Var<i32>),
    I64(Var<i64>),
    Isize(Var<isize>),
    U8(Var<u8>),
    U16(Var<u16>),
    U32(Var<u32>),
    U64(Var<u64>),
    Usize(Var<usize>),
    F32(Var<f32>),
    F64(Var<f64>),
}

macro_rules! with_var {
    ($target:expr, $var:ident => $body:expr) => {
        match $target {
            Target::String($var) => $body,
            Target::Bool($var) => $body,
            Target::I8($var) => $body,
            Target::I16($var) => $body,
            Target::I32($var) => $body,
            Target::I64($var) => $body,
            Target::Isize($var) => $body,
            Target::U8($var) => $body,
            Target::U16($var) => $body,
            Target::U32($var) => $body,
            Target::U64($var) => $body,
            Target::Usize($var) => $body,
            Target::F32($var) => $body,
            Target::F64($var) => $body,
        }
    };
}

impl Target {
    pub fn kind(&self) -> ValueKind {
        match self {
            Target::String(_) => ValueKind::String,
            Target::Bool(_) => ValueKind::Bool,
            Target::I8(_) => ValueKind::I8,
            Target::I16(_) => ValueKind::I16,
            Target::I32(_) => ValueKind::I32,
            Target::I64(_) => ValueKind::I64,
            Target::Isize(_) => ValueKind::Isize,
            Target::U8(_) => ValueKind::U8,
            Target::U16(_) => ValueKind::U16,
            Target::U32(_) => ValueKind::U32,
            Target::U64(_) => ValueKind::U64,
            Target::Usize(_) => ValueKind::Usize,
            Target::F32(_) => ValueKind::F32,
            Target::F64(_) => ValueKind::F64,
        }
    }

    /// Read the current value of the storage location
    pub fn current(&self) -> Value {
        with_var!(self, var => var.snapshot())
    }

    /// Write `value` into the storage location
    ///
    /// Fails with [`EnvError::ValueInvalid`] if the kinds differ.
    pub fn assign(&self, value: Value) -> Result<()> {
        with_var!(self, var => var.assign(value))
    }

    /// Convert `raw` with the default converter and store it
    pub fn parse_default(&self, raw: &str) -> std::result::Result<(), BoxError> {
        let value = Value::parse(self.kind(), raw)?;
        self.assign(value)?;
        Ok(())
    }

    /// Identity comparison of the underlying storage locations
    pub fn same_location(&self, other: &Target) -> bool {
        self.kind() == other.kind() && self.addr() == other.addr()
    }

    fn addr(&self) -> *const () {
        with_var!(self, var => var.addr())
    }
}

/// Fresh storage location holding `value`
impl From<Value> for Target {
    fn from(value: Value) -> Self {
        match value {
            Value::String(v) => Target::String(Var::new(v)),
            Value::Bool(v) => Target::Bool(Var::new(v)),
            Value::I8(v) => Target::I8(Var::new(v)),
            Value::I16(v) => Target::I16(Var::new(v)),
            Value::I32(v) => Target::I32(Var::new(v)),
            Value::I64(v) => Target::I64(Var::new(v)),
            Value::Isize(v) => Target::Isize(Var::new(v)),
            Value::U8(v) => Target::U8(Var::new(v)),
            Value::U16(v) => Target::U16(Var::new(v)),
            Value::U32(v) => Target::U32(Var::new(v)),
            Value::U64(v) => Target::U64(Var::new(v)),
            Value::Usize(v) => Target::Usize(Var::new(v)),
            Value::F32(v) => Target::F32(Var::new(v)),
            Value::F64(v) => Target::F64(Var::new(v)),
        }
    }
}

impl<T: Primitive> From<Var<T>> for Target {
    fn from(var: Var<T>) -> Self {
        T::into_target(var)
    }
}

impl<T: Primitive> From<&Var<T>> for Target {
    fn from(var: &Var<T>) -> Self {
        T::into_target(var.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_literals() {
        for raw in ["1", "t", "T", "TRUE", "true", "True"] {
            assert_eq!(parse_bool(raw), Ok(true), "{}", raw);
        }
        for raw in ["0", "f", "F", "FALSE", "false", "False"] {
            assert_eq!(parse_bool(raw), Ok(false), "{}", raw);
        }
        assert!(parse_bool("yes").is_err());
        assert!(parse_bool("tRUE").is_err());
    }

    #[test]
    fn test_parse_integer_ranges() {
        assert_eq!(Value::parse(ValueKind::I8, "-128").unwrap(), Value::I8(-128));
        assert!(Value::parse(ValueKind::I8, "128").is_err());
        assert_eq!(Value::parse(ValueKind::U16, "65535").unwrap(), Value::U16(65535));
        assert!(Value::parse(ValueKind::U16, "65536").is_err());
        assert!(Value::parse(ValueKind::U32, "-1").is_err());
        assert!(Value::parse(ValueKind::I64, "0x10").is_err());
        assert_eq!(Value::parse(ValueKind::Usize, "42").unwrap(), Value::Usize(42));
    }

    #[test]
    fn test_parse_floats() {
        assert_eq!(Value::parse(ValueKind::F64, "2.5e3").unwrap(), Value::F64(2500.0));
        assert_eq!(Value::parse(ValueKind::F32, "1.01").unwrap(), Value::F32(1.01));
        assert!(Value::parse(ValueKind::F64, "one").is_err());
    }

    #[test]
    fn test_float_overflow_is_rejected() {
        let err = Value::parse(ValueKind::F32, "1e40").unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(Value::parse(ValueKind::F64, "1e400").is_err());
        assert!(Value::parse(ValueKind::F64, "-1e400").is_err());
        // fits in f64, not in f32
        assert_eq!(Value::parse(ValueKind::F64, "1e40").unwrap(), Value::F64(1e40));
    }

    #[test]
    fn test_float_infinity_literals() {
        assert_eq!(Value::parse(ValueKind::F32, "inf").unwrap(), Value::F32(f32::INFINITY));
        assert_eq!(
            Value::parse(ValueKind::F64, "-Infinity").unwrap(),
            Value::F64(f64::NEG_INFINITY)
        );
        assert_eq!(Value::parse(ValueKind::F64, "+INF").unwrap(), Value::F64(f64::INFINITY));
    }

    #[test]
    fn test_unsigned_rejects_plus_sign() {
        for kind in [ValueKind::U8, ValueKind::U16, ValueKind::U32, ValueKind::U64, ValueKind::Usize] {
            let err = Value::parse(kind, "+5").unwrap_err();
            assert!(err.to_string().contains("sign not allowed"), "{}", kind);
        }
        assert_eq!(Value::parse(ValueKind::I32, "+5").unwrap(), Value::I32(5));
        assert_eq!(Value::parse(ValueKind::U8, "5").unwrap(), Value::U8(5));
    }

    #[test]
    fn test_string_is_verbatim() {
        let value = Value::parse(ValueKind::String, r"a\nb").unwrap();
        assert_eq!(value, Value::String(r"a\nb".to_string()));
    }

    #[test]
    fn test_var_identity() {
        let a = Var::new(1u32);
        let b = a.clone();
        let c = Var::new(1u32);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));

        let ta = Target::from(&a);
        assert!(ta.same_location(&Target::from(b)));
        assert!(!ta.same_location(&Target::from(c)));
    }

    #[test]
    fn test_assign_checks_kind() {
        let port = Var::new(8080u16);
        let target = Target::from(&port);

        target.assign(Value::U16(9090)).unwrap();
        assert_eq!(port.get(), 9090);

        let err = target.assign(Value::I64(1)).unwrap_err();
        assert!(matches!(err, EnvError::ValueInvalid));
        assert_eq!(port.get(), 9090);
    }

    #[test]
    fn test_from_any() {
        let name = Var::new("x".to_string());
        let target = Target::from_any(&name).unwrap();
        assert_eq!(target.kind(), ValueKind::String);

        assert!(matches!(Target::from_any(&5i32), Err(EnvError::ValueInvalid)));
        assert!(matches!(
            Target::from_any(&Vec::<String>::new()),
            Err(EnvError::ValueInvalid)
        ));
        assert!(matches!(
            Target::from_any(&Some(Var::new(1u8))),
            Err(EnvError::ValueInvalid)
        ));
    }

    #[test]
    fn test_target_from_value_is_fresh() {
        let a = Target::from(ValueKind::U32.zero());
        let b = Target::from(Value::U32(0));
        assert_eq!(a.current(), Value::U32(0));
        assert!(!a.same_location(&b));
    }

    #[test]
    fn test_value_display_and_json() {
        assert_eq!(Value::F64(11.2).to_string(), "11.2");
        assert_eq!(Value::String("s".into()).to_string(), "s");
        assert_eq!(serde_json::to_string(&Value::I32(456)).unwrap(), "456");
        assert_eq!(serde_json::to_string(&ValueKind::Usize).unwrap(), "\"usize\"");
    }
}
