//! Scalar field coercion.
//!
//! Reactive fields hold primitive scalars. Values arrive from the browser as
//! text, so each scalar type knows how to parse itself from the raw string and
//! how to present itself to the template engine.

use minijinja::Value;

/// A primitive type usable as a reactive field.
pub trait Scalar: Sized + 'static {
    /// Parse the raw text sent by the client.
    fn parse_scalar(raw: &str) -> Result<Self, String>;

    /// Convert to a template value.
    fn to_value(&self) -> Value;
}

impl Scalar for String {
    fn parse_scalar(raw: &str) -> Result<Self, String> {
        Ok(raw.to_owned())
    }

    fn to_value(&self) -> Value {
        Value::from(self.as_str())
    }
}

impl Scalar for bool {
    fn parse_scalar(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "true" | "on" | "1" => Ok(true),
            "false" | "off" | "0" | "" => Ok(false),
            other => Err(format!("expected a boolean, got {other:?}")),
        }
    }

    fn to_value(&self) -> Value {
        Value::from(*self)
    }
}

impl Scalar for char {
    fn parse_scalar(raw: &str) -> Result<Self, String> {
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err("expected exactly one character".to_owned()),
        }
    }

    fn to_value(&self) -> Value {
        Value::from(self.to_string())
    }
}

macro_rules! scalar_number {
    ($via:ty => $($ty:ty),+) => {
        $(
            impl Scalar for $ty {
                fn parse_scalar(raw: &str) -> Result<Self, String> {
                    raw.trim().parse::<$ty>().map_err(|e| e.to_string())
                }

                fn to_value(&self) -> Value {
                    Value::from(*self as $via)
                }
            }
        )+
    };
}

scalar_number!(i64 => i8, i16, i32, i64, isize);
scalar_number!(u64 => u8, u16, u32, u64, usize);
scalar_number!(f64 => f32, f64);
