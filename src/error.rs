use thiserror::Error;

use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Type notation that is not a well-formed `<domain,codomain>` tree.
    #[error("malformed type `{text}`: {reason}")]
    MalformedType { text: String, reason: String },

    /// Unbalanced parentheses, trailing tokens or an ill-shaped binder form.
    #[error("malformed expression `{text}`: {reason}")]
    MalformedExpression { text: String, reason: String },

    #[error("atom `{0}` has neither a registered type nor an inline `symbol:type` annotation")]
    UntypedAtom(String),

    #[error("cannot resolve the type of `{0}` used as a function")]
    UnresolvableSymbol(String),

    /// The argument of an application does not match the domain of the abstraction.
    #[error("type mismatch: `{function}` expects `{expected}`, but `{argument}` has type `{found}`")]
    TypeMismatch {
        expected: Type,
        found: Type,
        function: String,
        argument: String,
    },

    /// A variable typed with the unknown placeholder used as a function or a function result.
    #[error("`{0}` has an unknown type and cannot be used as a function or a function result")]
    UnknownType(String),

    #[error("`{head}` of type `{typ}` is applied to an argument but is not a function")]
    NotAFunction { head: String, typ: Type },

    #[error("`{0}` is not a lambda abstraction")]
    NotALambda(String),

    #[error("`{0}` cannot be applied to an argument")]
    NotApplicable(String),

    /// Renumbering would move a variable past the largest representable index.
    #[error("variable `${index}` cannot be shifted by {offset}")]
    VariableOverflow { index: u32, offset: u32 },

    #[error("malformed signature line `{line}`: {reason}")]
    MalformedSignature { line: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
