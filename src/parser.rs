use core::fmt;

use log::warn;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_till1,
    character::complete::{char, multispace0},
    combinator::all_consuming,
    multi::many0,
    sequence::{delimited, preceded},
};

use crate::builtin::Builtin;
use crate::error::{Error, Result};
use crate::types::{Type, parse_type};

pub const LAMBDA: &str = "lambda";
pub const UNICODE_LAMBDA: &str = "\u{03bb}";
const LAMBDA_SPELLINGS: [&str; 3] = [LAMBDA, UNICODE_LAMBDA, "\\"];

/// A variable `$N`, identified by its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(pub u32);

impl Var {
    pub fn index(self) -> u32 {
        self.0
    }

    pub fn shifted(self, offset: u32) -> Result<Var> {
        self.0
            .checked_add(offset)
            .map(Var)
            .ok_or(Error::VariableOverflow {
                index: self.0,
                offset,
            })
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    Var(Var),
    Builtin(Builtin),
    /// A constant or predicate symbol. `text` is the token as written,
    /// including any `:type` suffix, which is resolved into `annotation`.
    Const {
        text: String,
        annotation: Option<Type>,
    },
}

impl Atom {
    pub fn constant(text: &str) -> Result<Atom> {
        let annotation = match text.split_once(':') {
            Some((_, suffix)) if !suffix.contains(':') => Some(annotation_type(text, suffix)?),
            _ => None,
        };
        Ok(Atom::Const {
            text: text.to_string(),
            annotation,
        })
    }

    fn from_token(token: &str) -> Result<Atom> {
        if token.starts_with('$') {
            return variable(token).map(Atom::Var);
        }
        match Builtin::lookup(token) {
            Some(builtin) => Ok(Atom::Builtin(builtin)),
            None => Atom::constant(token),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Var(var) => write!(f, "{}", var),
            Atom::Builtin(builtin) => write!(f, "{}", builtin),
            Atom::Const { text, .. } => write!(f, "{}", text),
        }
    }
}

fn annotation_type(text: &str, suffix: &str) -> Result<Type> {
    if suffix.starts_with('<') {
        return parse_type(suffix);
    }
    match Type::from_code(suffix) {
        Some(typ) => Ok(typ),
        None => {
            warn!("unrecognized type suffix in `{}`, typing it as an entity", text);
            Ok(Type::Entity)
        }
    }
}

/// Expression tree. Binder shapes are fixed when the tree is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Atom(Atom),
    /// `(lambda $V T body)`
    Lambda {
        var: Var,
        typ: Type,
        body: Box<Node>,
    },
    /// `(F $V rest...)` where `F` implicitly binds an entity variable.
    Binder {
        op: Builtin,
        var: Var,
        args: Vec<Node>,
    },
    Apply {
        head: Box<Node>,
        args: Vec<Node>,
    },
}

impl Node {
    pub fn var(var: Var) -> Node {
        Node::Atom(Atom::Var(var))
    }

    /// Visits every variable occurrence in pre-order, binder positions included.
    pub fn visit_vars<F: FnMut(&Node, Var)>(&self, f: &mut F) {
        match self {
            Node::Atom(Atom::Var(var)) => f(self, *var),
            Node::Atom(_) => {}
            Node::Lambda { var, body, .. } => {
                f(self, *var);
                body.visit_vars(f);
            }
            Node::Binder { var, args, .. } => {
                f(self, *var);
                for arg in args {
                    arg.visit_vars(f);
                }
            }
            Node::Apply { head, args } => {
                head.visit_vars(f);
                for arg in args {
                    arg.visit_vars(f);
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if f.alternate() { UNICODE_LAMBDA } else { LAMBDA };
        match self {
            Node::Atom(atom) => write!(f, "{}", atom),
            Node::Lambda { var, typ, body } => {
                write!(f, "({} {} {} ", marker, var, typ)?;
                fmt::Display::fmt(body, f)?;
                write!(f, ")")
            }
            Node::Binder { op, var, args } => {
                write!(f, "({} {}", op, var)?;
                for arg in args {
                    write!(f, " ")?;
                    fmt::Display::fmt(arg, f)?;
                }
                write!(f, ")")
            }
            Node::Apply { head, args } => {
                write!(f, "(")?;
                fmt::Display::fmt(head, f)?;
                for arg in args {
                    write!(f, " ")?;
                    fmt::Display::fmt(arg, f)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum Sexp<'a> {
    Atom(&'a str),
    List(Vec<Sexp<'a>>),
}

fn sexp_atom(input: &str) -> IResult<&str, Sexp<'_>> {
    take_till1(|c: char| c.is_whitespace() || c == '(' || c == ')')
        .map(Sexp::Atom)
        .parse(input)
}

fn sexp_list(input: &str) -> IResult<&str, Sexp<'_>> {
    delimited(
        char('('),
        many0(preceded(multispace0, sexp)),
        (multispace0, char(')')),
    )
    .map(Sexp::List)
    .parse(input)
}

fn sexp(input: &str) -> IResult<&str, Sexp<'_>> {
    alt((sexp_list, sexp_atom)).parse(input)
}

fn malformed(text: &str, reason: &str) -> Error {
    Error::MalformedExpression {
        text: text.to_string(),
        reason: reason.to_string(),
    }
}

fn syntax_error(text: &str) -> Error {
    if text.trim().is_empty() {
        return malformed(text, "empty input");
    }
    let mut depth = 0i64;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            break;
        }
    }
    if depth != 0 {
        malformed(text, "unbalanced parentheses")
    } else {
        malformed(text, "trailing tokens after a complete expression")
    }
}

/// `$N`. The largest index is reserved so that `N + 1` stays representable.
fn variable(token: &str) -> Result<Var> {
    let digits = token
        .strip_prefix('$')
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| malformed(token, "expected a variable `$N`"))?;
    match digits.parse::<u32>() {
        Ok(index) if index < u32::MAX => Ok(Var(index)),
        _ => Err(malformed(token, "variable index out of range")),
    }
}

fn build(sexp: &Sexp, text: &str) -> Result<Node> {
    let items = match sexp {
        Sexp::Atom(token) => return Atom::from_token(token).map(Node::Atom),
        Sexp::List(items) => items,
    };
    let Some((head, rest)) = items.split_first() else {
        return Err(malformed(text, "empty list"));
    };

    if let Sexp::Atom(token) = head {
        if LAMBDA_SPELLINGS.contains(token) {
            let [Sexp::Atom(var), Sexp::Atom(typ), body] = rest else {
                return Err(malformed(text, "lambda expects a variable, a type and a body"));
            };
            return Ok(Node::Lambda {
                var: variable(var)?,
                typ: parse_type(typ)?,
                body: Box::new(build(body, text)?),
            });
        }
        if let Some(op) = Builtin::lookup(token).filter(|op| op.binds_entity()) {
            let Some((Sexp::Atom(var), args)) = rest.split_first() else {
                return Err(malformed(text, "binder expects a variable in first position"));
            };
            return Ok(Node::Binder {
                op,
                var: variable(var)?,
                args: args
                    .iter()
                    .map(|arg| build(arg, text))
                    .collect::<Result<_>>()?,
            });
        }
    }

    Ok(Node::Apply {
        head: Box::new(build(head, text)?),
        args: rest
            .iter()
            .map(|arg| build(arg, text))
            .collect::<Result<_>>()?,
    })
}

/// Parses one s-expression. A bare atom is accepted as a whole expression.
pub fn parse(text: &str) -> Result<Node> {
    match all_consuming(delimited(multispace0, sexp, multispace0)).parse(text) {
        Ok((_, tree)) => build(&tree, text),
        Err(_) => Err(syntax_error(text)),
    }
}
