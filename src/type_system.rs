use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::error::{Error, Result};
use crate::parser::{Atom, Node, Var};
use crate::types::{Type, parse_type};

/// Types of variables and of caller-registered symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeEnv {
    vars: BTreeMap<Var, Type>,
    symbols: BTreeMap<String, Type>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a signature table: one `symbol type` pair per line, `#` comments.
    pub fn from_signature(text: &str) -> Result<Self> {
        let mut env = TypeEnv::new();
        for line in text.lines() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next(), fields.next()) {
                (Some(symbol), Some(typ), None) => {
                    let typ = parse_type(typ)?;
                    match symbol.strip_prefix('$').and_then(|i| i.parse().ok()) {
                        Some(index) => env.insert_var(Var(index), typ),
                        None => env.insert_symbol(symbol, typ),
                    }
                }
                _ => {
                    return Err(Error::MalformedSignature {
                        line: line.to_string(),
                        reason: String::from("expected `symbol type`"),
                    });
                }
            }
        }
        Ok(env)
    }

    pub fn var(&self, var: Var) -> Option<&Type> {
        self.vars.get(&var)
    }

    pub fn symbol(&self, name: &str) -> Option<&Type> {
        self.symbols.get(name)
    }

    pub fn insert_var(&mut self, var: Var, typ: Type) {
        self.vars.insert(var, typ);
    }

    pub fn insert_symbol(&mut self, name: &str, typ: Type) {
        self.symbols.insert(name.to_string(), typ);
    }

    pub fn remove_var(&mut self, var: Var) -> Option<Type> {
        self.vars.remove(&var)
    }

    /// Adds the entries of `other` that are not already present.
    pub fn merge(&mut self, other: &TypeEnv) {
        for (var, typ) in &other.vars {
            self.vars.entry(*var).or_insert_with(|| typ.clone());
        }
        for (name, typ) in &other.symbols {
            self.symbols
                .entry(name.clone())
                .or_insert_with(|| typ.clone());
        }
    }

    /// Moves every entry of `vars` to its index shifted by `offset`.
    /// Nothing is moved if any shifted index would overflow.
    pub fn shift_vars(&mut self, vars: &BTreeSet<Var>, offset: u32) -> Result<()> {
        let mut moved = Vec::new();
        for var in vars {
            if let Some(typ) = self.vars.get(var) {
                moved.push((var.shifted(offset)?, typ.clone()));
            }
        }
        for var in vars {
            self.vars.remove(var);
        }
        self.vars.extend(moved);
        Ok(())
    }
}

/// Builds the environment of `node`, seeded with `overrides`.
///
/// The first occurrence of each variable decides its type: an override
/// wins, then a lambda's declared type, then entity for a special binder.
/// Anything else is marked `Type::Unknown`. Unknown overrides are ignored.
pub fn register_vars(node: &Node, overrides: &TypeEnv) -> TypeEnv {
    let mut env = TypeEnv {
        vars: BTreeMap::new(),
        symbols: overrides.symbols.clone(),
    };
    node.visit_vars(&mut |site, var| {
        if env.vars.contains_key(&var) {
            return;
        }
        let typ = match (overrides.var(var), site) {
            (Some(typ), _) if *typ != Type::Unknown => typ.clone(),
            (_, Node::Lambda { typ, .. }) => typ.clone(),
            (_, Node::Binder { .. }) => Type::Entity,
            _ => {
                warn!("cannot classify the type of {} in `{}`", var, node);
                Type::Unknown
            }
        };
        env.vars.insert(var, typ);
    });
    env
}

/// One more than the largest variable index in `node`.
pub fn next_var(node: &Node) -> Result<u32> {
    let mut largest: Option<Var> = None;
    node.visit_vars(&mut |_, var| largest = largest.max(Some(var)));
    match largest {
        Some(var) => var.shifted(1).map(Var::index),
        None => Ok(0),
    }
}

/// Computes the type of `node` under `env`.
///
/// Only the lambda spine is descended: built-in heads decide their own result
/// type without looking at their arguments.
pub fn infer(node: &Node, env: &TypeEnv) -> Result<Type> {
    match node {
        Node::Atom(atom) => infer_atom(atom, env),
        Node::Lambda { typ, body, .. } => match infer(body, env)? {
            Type::Unknown => Err(Error::UnknownType(body.to_string())),
            codomain => Ok(Type::func(typ.clone(), codomain)),
        },
        Node::Binder { op, .. } => Ok(op.result_type()),
        Node::Apply { head, args } => match head.as_ref() {
            Node::Atom(Atom::Builtin(builtin)) => Ok(builtin.result_type()),
            Node::Atom(Atom::Var(var)) => match env.var(*var) {
                Some(Type::Unknown) | None => Err(Error::UnknownType(var.to_string())),
                Some(typ) => peel(head, typ, args.len()),
            },
            Node::Atom(Atom::Const { text, annotation }) => {
                match (env.symbol(text), annotation) {
                    (Some(typ), _) => peel(head, typ, args.len()),
                    (None, Some(typ)) if typ.is_atomic() => Ok(typ.clone()),
                    (None, Some(typ)) => peel(head, typ, args.len()),
                    (None, None) => Err(Error::UnresolvableSymbol(text.clone())),
                }
            }
            _ => {
                let typ = infer(head, env)?;
                peel(head, &typ, args.len())
            }
        },
    }
}

fn infer_atom(atom: &Atom, env: &TypeEnv) -> Result<Type> {
    let typ = match atom {
        Atom::Var(var) => env.var(*var),
        Atom::Builtin(builtin) => env.symbol(&builtin.to_string()),
        Atom::Const { text, annotation } => env.symbol(text).or(annotation.as_ref()),
    };
    typ.cloned()
        .ok_or_else(|| Error::UntypedAtom(atom.to_string()))
}

/// Result type of applying a head of type `typ` to `arity` arguments.
fn peel(head: &Node, typ: &Type, arity: usize) -> Result<Type> {
    let mut typ = typ;
    for _ in 0..arity {
        typ = match (typ.codomain(), typ) {
            (Some(codomain), _) => codomain,
            (None, Type::Unknown) => return Err(Error::UnresolvableSymbol(head.to_string())),
            (None, _) => {
                return Err(Error::NotAFunction {
                    head: head.to_string(),
                    typ: typ.clone(),
                });
            }
        };
    }
    Ok(typ.clone())
}
