//! Built-in function dispatcher.
//!
//! CALL consults this table when the callee name is not a loaded code
//! block. The table is keyed by exact name and can be extended by the host
//! at any time without touching loaded bytecode.

use std::collections::HashMap;
use std::fmt;

use gml_common::Value;
use tracing::warn;

/// A native function: takes the call arguments, returns one value.
pub type BuiltinFn = Box<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Name-indexed table of native functions.
pub struct Builtins {
    table: HashMap<String, BuiltinFn>,
}

impl Builtins {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// A table with the numeric primitives registered: `print`, `abs`,
    /// `round`, `floor`, `ceil`, `sqrt`, `sin`, `cos`, `tan`.
    pub fn with_defaults() -> Self {
        let mut builtins = Self::new();
        builtins.register("print", |args| match args.first() {
            Some(value) => {
                println!("{value}");
                value.clone()
            }
            None => Value::Number(0.0),
        });
        builtins.register_unary("abs", f64::abs);
        builtins.register_unary("round", f64::round);
        builtins.register_unary("floor", f64::floor);
        builtins.register_unary("ceil", f64::ceil);
        builtins.register_unary("sqrt", f64::sqrt);
        builtins.register_unary("sin", f64::sin);
        builtins.register_unary("cos", f64::cos);
        builtins.register_unary("tan", f64::tan);
        builtins
    }

    /// Register (or replace) a built-in. Returns true if a previous entry
    /// was replaced.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> bool
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.table.insert(name.into(), Box::new(function)).is_some()
    }

    /// Register a numeric primitive applied to `args[0]`. With no
    /// arguments it returns `0`.
    pub fn register_unary(&mut self, name: impl Into<String>, op: fn(f64) -> f64) -> bool {
        self.register(name, move |args| match args.first() {
            Some(value) => Value::Number(op(value.as_number())),
            None => Value::Number(0.0),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Call a built-in by name. Unknown names yield Number `0`.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Value {
        match self.table.get(name) {
            Some(function) => function(args),
            None => {
                warn!(name, "unknown built-in");
                Value::Number(0.0)
            }
        }
    }

    /// Registered names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for Builtins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Builtins").field("names", &names).finish()
    }
}
