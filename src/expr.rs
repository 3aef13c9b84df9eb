use core::fmt;

use crate::error::Result;
use crate::parser::{self, Node, Var};
use crate::type_system::{TypeEnv, infer, next_var, register_vars};
use crate::types::Type;

/// A fully typed expression.
///
/// Values are never mutated after construction; reductions build new ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    node: Node,
    env: TypeEnv,
    typ: Type,
    next_var: u32,
}

impl Expr {
    /// Types `node`, taking variable and symbol types from `overrides` first.
    pub fn new(node: Node, overrides: &TypeEnv) -> Result<Expr> {
        let env = register_vars(&node, overrides);
        let typ = infer(&node, &env)?;
        let next_var = next_var(&node)?;
        Ok(Expr {
            node,
            env,
            typ,
            next_var,
        })
    }

    pub fn parse(text: &str) -> Result<Expr> {
        Expr::parse_with(text, &TypeEnv::new())
    }

    pub fn parse_with(text: &str, overrides: &TypeEnv) -> Result<Expr> {
        Expr::new(parser::parse(text)?, overrides)
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn env(&self) -> &TypeEnv {
        &self.env
    }

    pub fn typ(&self) -> &Type {
        &self.typ
    }

    pub fn next_var(&self) -> u32 {
        self.next_var
    }

    /// A variable that does not occur anywhere in this expression.
    pub fn fresh_var(&self) -> Var {
        Var(self.next_var)
    }

    pub fn is_lambda(&self) -> bool {
        matches!(self.node, Node::Lambda { .. })
    }

    pub fn is_atom(&self) -> bool {
        matches!(self.node, Node::Atom(_))
    }

    pub(crate) fn into_parts(self) -> (Node, TypeEnv) {
        (self.node, self.env)
    }
}

/// `{:#}` prints the `λ` glyph instead of `lambda`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.node, f)
    }
}

#[cfg(test)]
mod tests_expr {
    use super::*;
    use crate::error::Error;

    #[test]
    fn construct() {
        let expr = Expr::parse("(lambda $0 e (exists $1 (and (dog $1) (owns $0 $1))))").unwrap();
        assert_eq!(expr.typ(), &Type::func(Type::Entity, Type::Truth));
        assert_eq!(expr.next_var(), 2);
        assert_eq!(expr.fresh_var(), Var(2));
        assert_eq!(expr.env().var(Var(0)), Some(&Type::Entity));
        assert_eq!(expr.env().var(Var(1)), Some(&Type::Entity));
        assert!(expr.is_lambda());
        assert!(!expr.is_atom());
    }

    #[test]
    fn construct_atom() {
        let expr = Expr::parse("john:e").unwrap();
        assert_eq!(expr.typ(), &Type::Entity);
        assert_eq!(expr.next_var(), 0);
        assert!(expr.is_atom());
        assert_eq!(expr.to_string(), "john:e");
    }

    #[test]
    fn construct_with_signature() {
        let env = TypeEnv::from_signature("P <e,t>").unwrap();
        let expr = Expr::parse_with("(lambda $0 e (P $0))", &env).unwrap();
        assert_eq!(expr.typ(), &Type::func(Type::Entity, Type::Truth));
        assert_eq!(expr.env().symbol("P"), Some(&Type::func(Type::Entity, Type::Truth)));
    }

    #[test]
    fn construct_errors() {
        assert!(matches!(
            Expr::parse("(lambda $0 e (P $0)"),
            Err(Error::MalformedExpression { .. })
        ));
        assert_eq!(
            Expr::parse("(lambda $0 e (P $0))"),
            Err(Error::UnresolvableSymbol(String::from("P")))
        );
        assert_eq!(
            Expr::parse("(lambda $0 e $1)"),
            Err(Error::UnknownType(String::from("$1")))
        );

        let mut env = TypeEnv::new();
        env.insert_var(Var(u32::MAX), Type::Entity);
        assert_eq!(
            Expr::new(Node::var(Var(u32::MAX)), &env),
            Err(Error::VariableOverflow {
                index: u32::MAX,
                offset: 1,
            })
        );
    }

    #[test]
    fn display_glyph() {
        let expr = Expr::parse("(\\ $0 e (not (dog:t $0)))").unwrap();
        assert_eq!(expr.to_string(), "(lambda $0 e (not (dog:t $0)))");
        assert_eq!(format!("{:#}", expr), "(\u{03bb} $0 e (not (dog:t $0)))");
    }
}
