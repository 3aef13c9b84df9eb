//! Typed lambda-calculus logical forms: parsing, type inference and
//! beta reduction over the `e`/`t`/`i` type alphabet.

pub mod builtin;
pub mod error;
pub mod expr;
pub mod parser;
pub mod reduce;
pub mod type_system;
pub mod types;

pub use builtin::Builtin;
pub use error::{Error, Result};
pub use expr::Expr;
pub use parser::{Atom, Node, Var, parse};
pub use type_system::TypeEnv;
pub use types::{Type, format_type, parse_type};
