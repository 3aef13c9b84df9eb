use std::collections::BTreeSet;

use log::{debug, trace};

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::parser::{Atom, Node, Var};
use crate::type_system::TypeEnv;

impl Expr {
    /// Variables introduced by a lambda or by a special binder.
    pub fn bound_vars(&self) -> BTreeSet<Var> {
        let mut bound = BTreeSet::new();
        collect_bound(self.node(), &mut bound);
        bound
    }

    /// Shifts every bound variable by `offset`. Free variables keep their index.
    ///
    /// Fails with `Error::VariableOverflow` instead of wrapping around.
    pub fn renumber_from(&self, offset: u32) -> Result<Expr> {
        let bound = self.bound_vars();
        trace!("renumbering {:?} of `{}` by {}", bound, self, offset);
        let node = rename(self.node(), &bound, offset)?;
        let mut env = self.env().clone();
        env.shift_vars(&bound, offset)?;
        Expr::new(node, &env)
    }

    /// Offset that moves the bound variables of `arg` past every variable
    /// of both operands.
    fn fresh_offset(&self, arg: &Expr) -> u32 {
        self.next_var().max(arg.next_var())
    }

    /// Beta-reduces `self` applied to `arg`.
    ///
    /// Bound variables of `arg` are moved past the variables of both
    /// operands first, so substitution cannot capture them and they cannot
    /// collide with a free variable of `arg`. A non-abstraction function is
    /// wrapped into an application node instead.
    pub fn apply(&self, arg: &Expr) -> Result<Expr> {
        let renamed = arg.renumber_from(self.fresh_offset(arg))?;
        debug!("applying `{}` to `{}`", self, renamed);

        match self.node() {
            Node::Lambda { var, typ, body } => {
                if renamed.typ() != typ {
                    return Err(Error::TypeMismatch {
                        expected: typ.clone(),
                        found: renamed.typ().clone(),
                        function: self.to_string(),
                        argument: arg.to_string(),
                    });
                }
                let node = substitute(body, *var, &renamed, self.env())?;
                let mut env = self.env().clone();
                env.remove_var(*var);
                env.merge(renamed.env());
                Expr::new(node, &env)
            }
            Node::Atom(_) | Node::Apply { .. } => {
                let node = Node::Apply {
                    head: Box::new(self.node().clone()),
                    args: vec![renamed.node().clone()],
                };
                let mut env = self.env().clone();
                env.merge(renamed.env());
                Expr::new(node, &env)
            }
            Node::Binder { .. } => Err(Error::NotApplicable(self.to_string())),
        }
    }

    /// Threads `arg` one level inside this abstraction: `(lambda $V T (arg body))`.
    pub fn compose(&self, arg: &Expr) -> Result<Expr> {
        let Node::Lambda { var, typ, body } = self.node() else {
            return Err(Error::NotALambda(self.to_string()));
        };
        debug!("composing `{}` with `{}`", self, arg);

        let inner = Expr::new((**body).clone(), self.env())?;
        let applied = arg.renumber_from(self.fresh_offset(arg))?.apply(&inner)?;
        let (applied_body, applied_env) = applied.into_parts();

        let mut env = self.env().clone();
        env.merge(&applied_env);
        Expr::new(
            Node::Lambda {
                var: *var,
                typ: typ.clone(),
                body: Box::new(applied_body),
            },
            &env,
        )
    }
}

fn collect_bound(node: &Node, bound: &mut BTreeSet<Var>) {
    match node {
        Node::Atom(_) => {}
        Node::Lambda { var, body, .. } => {
            bound.insert(*var);
            collect_bound(body, bound);
        }
        Node::Binder { var, args, .. } => {
            bound.insert(*var);
            for arg in args {
                collect_bound(arg, bound);
            }
        }
        Node::Apply { head, args } => {
            collect_bound(head, bound);
            for arg in args {
                collect_bound(arg, bound);
            }
        }
    }
}

fn rename(node: &Node, bound: &BTreeSet<Var>, offset: u32) -> Result<Node> {
    let shift = |var: Var| {
        if bound.contains(&var) {
            var.shifted(offset)
        } else {
            Ok(var)
        }
    };
    let rename_all = |nodes: &[Node]| -> Result<Vec<Node>> {
        nodes.iter().map(|n| rename(n, bound, offset)).collect()
    };

    Ok(match node {
        Node::Atom(Atom::Var(var)) => Node::var(shift(*var)?),
        Node::Atom(_) => node.clone(),
        Node::Lambda { var, typ, body } => Node::Lambda {
            var: shift(*var)?,
            typ: typ.clone(),
            body: Box::new(rename(body, bound, offset)?),
        },
        Node::Binder { op, var, args } => Node::Binder {
            op: *op,
            var: shift(*var)?,
            args: rename_all(args)?,
        },
        Node::Apply { head, args } => Node::Apply {
            head: Box::new(rename(head, bound, offset)?),
            args: rename_all(args)?,
        },
    })
}

/// Replaces `var` by `arg` in `node`.
///
/// `($V a1 a2 ...)` applies `arg` to each substituted `ai` in turn, typing
/// the `ai` under `env`, the environment of the enclosing abstraction.
fn substitute(node: &Node, var: Var, arg: &Expr, env: &TypeEnv) -> Result<Node> {
    let substitute_all = |nodes: &[Node]| -> Result<Vec<Node>> {
        nodes
            .iter()
            .map(|n| substitute(n, var, arg, env))
            .collect()
    };

    match node {
        Node::Atom(Atom::Var(v)) if *v == var => Ok(arg.node().clone()),
        Node::Atom(_) => Ok(node.clone()),
        // shadowed
        Node::Lambda { var: bound, .. } if *bound == var => Ok(node.clone()),
        Node::Lambda {
            var: bound,
            typ,
            body,
        } => Ok(Node::Lambda {
            var: *bound,
            typ: typ.clone(),
            body: Box::new(substitute(body, var, arg, env)?),
        }),
        // the binder's own variable is never a substitution target
        Node::Binder {
            op,
            var: bound,
            args,
        } => Ok(Node::Binder {
            op: *op,
            var: *bound,
            args: substitute_all(args)?,
        }),
        Node::Apply { head, args } => {
            let args = substitute_all(args)?;
            if matches!(head.as_ref(), Node::Atom(Atom::Var(v)) if *v == var) {
                let mut reduced = arg.clone();
                for a in args {
                    reduced = reduced.apply(&Expr::new(a, env)?)?;
                }
                Ok(reduced.into_parts().0)
            } else {
                Ok(Node::Apply {
                    head: Box::new(substitute(head, var, arg, env)?),
                    args,
                })
            }
        }
    }
}
