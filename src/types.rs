use core::fmt;

use nom::{
    IResult, Parser,
    branch::alt,
    character::complete::{char, multispace0},
    combinator::{all_consuming, value},
    sequence::{delimited, separated_pair},
};

use crate::error::{Error, Result};

/// Types of logical forms: the three atomic codes plus binary function types.
///
/// `Unknown` is never produced by [`parse_type`]. It marks variables whose
/// type could not be classified from their binder context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Entity,
    Truth,
    Count,
    Func { domain: Box<Type>, codomain: Box<Type> },
    Unknown,
}

impl Type {
    pub fn func(domain: Type, codomain: Type) -> Type {
        Type::Func {
            domain: Box::new(domain),
            codomain: Box::new(codomain),
        }
    }

    /// Looks up an atomic type by its one-letter code.
    pub fn from_code(code: &str) -> Option<Type> {
        match code {
            "e" => Some(Type::Entity),
            "t" => Some(Type::Truth),
            "i" => Some(Type::Count),
            _ => None,
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Type::Entity | Type::Truth | Type::Count)
    }

    pub fn codomain(&self) -> Option<&Type> {
        match self {
            Type::Func { codomain, .. } => Some(&**codomain),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Entity => write!(f, "e"),
            Type::Truth => write!(f, "t"),
            Type::Count => write!(f, "i"),
            Type::Unknown => write!(f, "?"),
            Type::Func { domain, codomain } => write!(f, "<{},{}>", domain, codomain),
        }
    }
}

fn atomic_type(input: &str) -> IResult<&str, Type> {
    alt((
        value(Type::Entity, char('e')),
        value(Type::Truth, char('t')),
        value(Type::Count, char('i')),
    ))
    .parse(input)
}

fn func_type(input: &str) -> IResult<&str, Type> {
    delimited(
        (char('<'), multispace0),
        separated_pair(
            type_expr,
            (multispace0, char(','), multispace0),
            type_expr,
        ),
        (multispace0, char('>')),
    )
    .map(|(domain, codomain)| Type::func(domain, codomain))
    .parse(input)
}

fn type_expr(input: &str) -> IResult<&str, Type> {
    alt((func_type, atomic_type)).parse(input)
}

/// Parses the `<domain,codomain>` notation, e.g. `<e,<e,t>>`.
pub fn parse_type(text: &str) -> Result<Type> {
    match all_consuming(delimited(multispace0, type_expr, multispace0)).parse(text) {
        Ok((_, typ)) => Ok(typ),
        Err(e) => Err(Error::MalformedType {
            text: text.to_string(),
            reason: e.to_string(),
        }),
    }
}

pub fn format_type(typ: &Type) -> String {
    typ.to_string()
}
