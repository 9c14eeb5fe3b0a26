//! Per-type dispatch tables.
//!
//! The browser addresses fields and handlers by name. Instead of runtime
//! reflection, every component type describes itself once with a [`Schema`]:
//! which names are reactive fields (with typed get/set accessors), which are
//! read-only template values, and which are event handlers and their arity.
//!
//! # Example
//!
//! ```rust,ignore
//! impl Component for Counter {
//!     fn template(&self) -> Cow<'static, str> {
//!         "Counter: {{ Number }} <button @click=\"AddOne\">+</button>".into()
//!     }
//!
//!     fn schema() -> &'static Schema<Self> {
//!         static SCHEMA: OnceLock<Schema<Counter>> = OnceLock::new();
//!         SCHEMA.get_or_init(|| {
//!             Schema::new()
//!                 .field("Number", |c: &Counter| c.number, |c, v| c.number = v)
//!                 .handler("AddOne", Handler::Nullary(|c| c.number += 1))
//!         })
//!     }
//! }
//! ```

use indexmap::IndexMap;
use minijinja::Value;

use super::scalar::Scalar;

type Getter<C> = Box<dyn Fn(&C) -> Value + Send + Sync>;
type Setter<C> = Box<dyn Fn(&mut C, &str) -> Result<(), String> + Send + Sync>;

/// An event handler, by arity.
///
/// The single argument is the `key` the client sent (usually a `data-key`
/// attribute), the second is the element's `value`.
pub enum Handler<C> {
    Nullary(fn(&mut C)),
    Unary(fn(&mut C, &str)),
    Binary(fn(&mut C, &str, &str)),
}

impl<C> Handler<C> {
    /// Number of string parameters the handler declares.
    pub fn arity(&self) -> usize {
        match self {
            Handler::Nullary(_) => 0,
            Handler::Unary(_) => 1,
            Handler::Binary(_) => 2,
        }
    }
}

struct Field<C> {
    get: Getter<C>,
    set: Setter<C>,
}

/// Why a dispatch through the table failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    UnknownField,
    UnknownMethod,
    Arity { expected: usize, given: usize },
    InvalidValue(String),
}

/// Dispatch table for one component type.
pub struct Schema<C> {
    fields: IndexMap<&'static str, Field<C>>,
    props: IndexMap<&'static str, Getter<C>>,
    handlers: IndexMap<&'static str, Handler<C>>,
}

impl<C: 'static> Schema<C> {
    /// Start an empty schema; chain `field`, `prop` and `handler` onto it.
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            props: IndexMap::new(),
            handlers: IndexMap::new(),
        }
    }

    /// Register a reactive scalar field.
    ///
    /// The field is readable from templates and settable from the client via
    /// `SetAttribute`, which coerces the raw text into `T`.
    pub fn field<T: Scalar>(mut self, name: &'static str, get: fn(&C) -> T, set: fn(&mut C, T)) -> Self {
        self.fields.insert(
            name,
            Field {
                get: Box::new(move |c| get(c).to_value()),
                set: Box::new(move |c, raw| {
                    let value = T::parse_scalar(raw)?;
                    set(c, value);
                    Ok(())
                }),
            },
        );
        self
    }

    /// Register a read-only template value: lists, computed values, children.
    pub fn prop(mut self, name: &'static str, get: fn(&C) -> Value) -> Self {
        self.props.insert(name, Box::new(get));
        self
    }

    /// Register an event handler.
    pub fn handler(mut self, name: &'static str, handler: Handler<C>) -> Self {
        self.handlers.insert(name, handler);
        self
    }

    /// Every field and prop with its current value, in declaration order.
    pub fn values(&self, component: &C) -> Vec<(&'static str, Value)> {
        self.fields
            .iter()
            .map(|(name, field)| (*name, (field.get)(component)))
            .chain(self.props.iter().map(|(name, get)| (*name, get(component))))
            .collect()
    }

    /// Names of the settable fields.
    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    /// Names of the handlers.
    pub fn handler_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    /// Set the field `name` from raw client text.
    pub fn set(&self, component: &mut C, name: &str, raw: &str) -> Result<(), DispatchError> {
        let field = self.fields.get(name).ok_or(DispatchError::UnknownField)?;
        (field.set)(component, raw).map_err(DispatchError::InvalidValue)
    }

    /// Invoke the handler `name`.
    ///
    /// Extra arguments are ignored; missing ones are an arity error.
    pub fn invoke(
        &self,
        component: &mut C,
        name: &str,
        key: Option<&str>,
        value: Option<&str>,
    ) -> Result<(), DispatchError> {
        let handler = self.handlers.get(name).ok_or(DispatchError::UnknownMethod)?;
        let given = usize::from(key.is_some()) + usize::from(value.is_some());

        match (handler, key, value) {
            (Handler::Nullary(f), _, _) => f(component),
            (Handler::Unary(f), Some(key), _) => f(component, key),
            (Handler::Binary(f), Some(key), Some(value)) => f(component, key, value),
            (handler, _, _) => {
                return Err(DispatchError::Arity {
                    expected: handler.arity(),
                    given,
                })
            }
        }
        Ok(())
    }
}

impl<C: 'static> Default for Schema<C> {
    fn default() -> Self {
        Self::new()
    }
}
