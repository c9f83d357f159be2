//! Built-in functions.
//!
//! The set is fixed and ordered: the compiler refers to a built-in by its
//! position in [`Builtin::ALL`], so new entries go at the end.

use crate::error::{OperationError, OperationResult};
use crate::object::Value;
use std::io::Write;

/// A built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `len(x)`: byte length of a string or element count of an array.
    Len,
    /// `puts(args...)`: print each argument on its own line.
    Puts,
    /// `first(array)`
    First,
    /// `last(array)`
    Last,
    /// `rest(array)`: all elements but the first.
    Rest,
    /// `push(array, value)`: a new array with `value` appended.
    Push,
}

impl Builtin {
    /// All built-ins in index order.
    pub const ALL: [Builtin; 6] = [
        Builtin::Len,
        Builtin::Puts,
        Builtin::First,
        Builtin::Last,
        Builtin::Rest,
        Builtin::Push,
    ];

    /// Source-level name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Puts => "puts",
            Builtin::First => "first",
            Builtin::Last => "last",
            Builtin::Rest => "rest",
            Builtin::Push => "push",
        }
    }

    /// Look up a built-in by name.
    #[must_use]
    pub fn lookup(name: &str) -> Option<Builtin> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    /// Look up a built-in by its index in [`Builtin::ALL`].
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Option<Builtin> {
        Self::ALL.get(index).copied()
    }

    /// Call the built-in. `puts` writes to `out`.
    pub fn call(self, args: &[Value], out: &mut dyn Write) -> OperationResult<Value> {
        match self {
            Builtin::Len => {
                let [arg] = self.arity::<1>(args)?;
                match arg {
                    Value::String(s) => Ok(Value::Integer(s.len() as i64)),
                    Value::Array(elements) => Ok(Value::Integer(elements.len() as i64)),
                    other => Err(self.bad_argument(other)),
                }
            }
            Builtin::Puts => {
                for arg in args {
                    writeln!(out, "{arg}").map_err(|e| OperationError::Output(e.to_string()))?;
                }
                Ok(Value::Null)
            }
            Builtin::First => {
                let [arg] = self.arity::<1>(args)?;
                let elements = self.array_arg(arg)?;
                Ok(elements.first().cloned().unwrap_or_default())
            }
            Builtin::Last => {
                let [arg] = self.arity::<1>(args)?;
                let elements = self.array_arg(arg)?;
                Ok(elements.last().cloned().unwrap_or_default())
            }
            Builtin::Rest => {
                let [arg] = self.arity::<1>(args)?;
                let elements = self.array_arg(arg)?;
                match elements.split_first() {
                    Some((_, rest)) => Ok(Value::array(rest.to_vec())),
                    None => Ok(Value::Null),
                }
            }
            Builtin::Push => {
                let [array, value] = self.arity::<2>(args)?;
                let elements = self.array_arg(array)?;
                let mut pushed = Vec::with_capacity(elements.len() + 1);
                pushed.extend_from_slice(elements);
                pushed.push(value.clone());
                Ok(Value::array(pushed))
            }
        }
    }

    fn arity<'a, const N: usize>(self, args: &'a [Value]) -> OperationResult<&'a [Value; N]> {
        args.try_into().map_err(|_| OperationError::BuiltinArity {
            name: self.name(),
            got: args.len(),
            want: N,
        })
    }

    fn array_arg(self, arg: &Value) -> OperationResult<&[Value]> {
        match arg {
            Value::Array(elements) => Ok(elements.as_slice()),
            other => Err(self.bad_argument(other)),
        }
    }

    fn bad_argument(self, got: &Value) -> OperationError {
        OperationError::BuiltinArgument {
            name: self.name(),
            got: got.type_name(),
        }
    }
}
