use std::io::{self, BufRead};
use std::path::PathBuf;

use clap::Parser;
use lambda_forms::{Expr, Result, TypeEnv};
use log::{info, warn};
use tracing_subscriber::EnvFilter;

/// Reads one logical form per line from stdin and prints it back typed and
/// reduced. Lines that do not start with `(` are skipped.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Signature file with one `symbol type` pair per line
    #[arg(short, long)]
    signature: Option<PathBuf>,

    /// Print the ASCII `lambda` marker instead of `λ`
    #[arg(long, default_value_t = false)]
    ascii: bool,

    /// Read lines in pairs and print the function applied to the argument
    #[arg(short, long, default_value_t = false)]
    apply: bool,
}

fn render(expr: &Expr, ascii: bool) -> String {
    if ascii {
        expr.to_string()
    } else {
        format!("{:#}", expr)
    }
}

/// Pairs expression lines for `--apply`: function, argument, function, ...
///
/// A line that fails to parse still takes its position, so one bad line never
/// shifts the pairs after it.
#[derive(Default)]
struct Pairing {
    function: Option<Result<Expr>>,
}

impl Pairing {
    /// Takes the next expression line and returns the outcome to report for it.
    fn feed(&mut self, parsed: Result<Expr>) -> Option<Result<Expr>> {
        match self.function.take() {
            None => {
                let report = parsed.as_ref().err().cloned().map(Err);
                self.function = Some(parsed);
                report
            }
            Some(Ok(function)) => Some(parsed.and_then(|arg| function.apply(&arg))),
            Some(Err(_)) => {
                if parsed.is_ok() {
                    warn!("skipping an argument whose function failed");
                }
                parsed.err().map(Err)
            }
        }
    }

    fn unpaired(&self) -> bool {
        self.function.is_some()
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let signature = match &args.signature {
        Some(path) => TypeEnv::from_signature(&std::fs::read_to_string(path)?)?,
        None => TypeEnv::new(),
    };

    let mut pairing = Pairing::default();
    let (mut ok, mut failed) = (0usize, 0usize);
    for (n, line) in io::stdin().lock().lines().enumerate() {
        let line = line?;
        if !line.starts_with('(') {
            continue;
        }

        let parsed = Expr::parse_with(&line, &signature);
        let outcome = if args.apply {
            pairing.feed(parsed)
        } else {
            Some(parsed)
        };

        match outcome {
            Some(Ok(expr)) => {
                ok += 1;
                println!("{}", render(&expr, args.ascii));
            }
            Some(Err(e)) => {
                failed += 1;
                eprintln!("line {}: {}", n + 1, e);
            }
            None => {}
        }
    }
    if pairing.unpaired() {
        warn!("the last function line has no argument");
    }

    info!("{} expressions printed, {} failed", ok, failed);
    Ok(())
}

#[cfg(test)]
mod tests_main {
    use super::*;
    use lambda_forms::Error;

    fn feed(pairing: &mut Pairing, text: &str) -> Option<Result<String>> {
        pairing
            .feed(Expr::parse(text))
            .map(|outcome| outcome.map(|expr| expr.to_string()))
    }

    #[test]
    fn pairs_lines() {
        let mut pairing = Pairing::default();
        assert_eq!(feed(&mut pairing, "(lambda $0 e (dog:t $0))"), None);
        assert!(pairing.unpaired());
        assert_eq!(
            feed(&mut pairing, "(the $1 (cat:t $1))"),
            Some(Ok(String::from("(dog:t (the $3 (cat:t $3)))")))
        );
        assert!(!pairing.unpaired());
    }

    #[test]
    fn failed_function_keeps_positions() {
        let mut pairing = Pairing::default();
        assert!(matches!(
            feed(&mut pairing, "(lambda $0 e (dog:t $0)"),
            Some(Err(Error::MalformedExpression { .. }))
        ));
        // its argument is dropped rather than taken as the next function
        assert_eq!(feed(&mut pairing, "(the $1 (cat:t $1))"), None);
        assert_eq!(feed(&mut pairing, "(lambda $0 e (owl:t $0))"), None);
        assert_eq!(
            feed(&mut pairing, "(the $1 (cat:t $1))"),
            Some(Ok(String::from("(owl:t (the $3 (cat:t $3)))")))
        );
    }

    #[test]
    fn failed_argument_clears_function() {
        let mut pairing = Pairing::default();
        assert_eq!(feed(&mut pairing, "(lambda $0 e (dog:t $0))"), None);
        assert!(matches!(
            feed(&mut pairing, "(the $1 (cat:t $1)"),
            Some(Err(Error::MalformedExpression { .. }))
        ));
        assert!(!pairing.unpaired());
        assert_eq!(feed(&mut pairing, "(lambda $0 e (owl:t $0))"), None);
        assert!(matches!(
            feed(&mut pairing, "(lambda $0 e (cat:t $0))"),
            Some(Err(Error::TypeMismatch { .. }))
        ));
        assert!(!pairing.unpaired());
    }
}
