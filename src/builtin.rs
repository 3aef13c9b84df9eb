use strum::{Display, EnumIter, EnumString};

use crate::types::Type;

/// The fixed vocabulary of built-in predicates and generalized quantifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    ArgMin,
    ArgMax,
    The,
    Exists,
    And,
    Not,
    Or,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = "<")]
    Less,
    Count,
    Sum,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        name.parse().ok()
    }

    pub fn result_type(self) -> Type {
        match self {
            Builtin::ArgMin | Builtin::ArgMax | Builtin::The => Type::Entity,
            Builtin::Exists
            | Builtin::And
            | Builtin::Not
            | Builtin::Or
            | Builtin::Greater
            | Builtin::Less => Type::Truth,
            Builtin::Count | Builtin::Sum => Type::Count,
        }
    }

    /// Special binders implicitly bind an entity variable in their first argument position.
    pub fn binds_entity(self) -> bool {
        match self {
            Builtin::ArgMin | Builtin::ArgMax | Builtin::The | Builtin::Exists | Builtin::Count => {
                true
            }
            Builtin::And
            | Builtin::Not
            | Builtin::Or
            | Builtin::Greater
            | Builtin::Less
            | Builtin::Sum => false,
        }
    }
}
