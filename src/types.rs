use crate::error::{Result, SymregError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Function vocabulary for expression trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionSymbol {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Exp,
    Log,
}

impl FunctionSymbol {
    /// Number of operands the symbol consumes.
    pub fn arity(&self) -> usize {
        match self {
            FunctionSymbol::Add
            | FunctionSymbol::Sub
            | FunctionSymbol::Mul
            | FunctionSymbol::Div
            | FunctionSymbol::Pow => 2,
            FunctionSymbol::Exp | FunctionSymbol::Log => 1,
        }
    }
}

impl fmt::Display for FunctionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionSymbol::Add => "ADD",
            FunctionSymbol::Sub => "SUB",
            FunctionSymbol::Mul => "MUL",
            FunctionSymbol::Div => "DIV",
            FunctionSymbol::Pow => "POW",
            FunctionSymbol::Exp => "EXP",
            FunctionSymbol::Log => "LOG",
        };
        write!(f, "{}", name)
    }
}

/// Function-set catalog entry.
///
/// The arity is stored alongside the symbol so externally supplied catalogs
/// can be validated before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub symbol: FunctionSymbol,
    pub arity: usize,
}

impl FunctionSpec {
    pub fn new(symbol: FunctionSymbol) -> Self {
        Self {
            symbol,
            arity: symbol.arity(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.arity != self.symbol.arity() {
            return Err(SymregError::InvalidArity {
                symbol: self.symbol.to_string(),
                arity: self.arity,
            });
        }
        Ok(())
    }

    /// The full seven-symbol function set.
    pub fn default_set() -> Vec<FunctionSpec> {
        [
            FunctionSymbol::Add,
            FunctionSymbol::Sub,
            FunctionSymbol::Mul,
            FunctionSymbol::Div,
            FunctionSymbol::Pow,
            FunctionSymbol::Exp,
            FunctionSymbol::Log,
        ]
        .into_iter()
        .map(FunctionSpec::new)
        .collect()
    }
}

/// Terminal-set catalog entry: either a literal constant or a named input
/// variable resolved against the dataset at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TerminalSpec {
    Constant(f64),
    Input(String),
}

impl TerminalSpec {
    /// Integer constants 0 through 10 plus the input variable `x`.
    pub fn default_set() -> Vec<TerminalSpec> {
        let mut set: Vec<TerminalSpec> = (0..=10).map(|v| TerminalSpec::Constant(v as f64)).collect();
        set.push(TerminalSpec::Input("x".to_string()));
        set
    }
}

/// Payload of a terminal node.
///
/// `Eval` is the materialized form a subtree takes during evaluation: a
/// length-N value vector. The generator and the operators never produce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Terminal {
    Constant(f64),
    Input(String),
    Eval(Vec<f64>),
}

impl From<&TerminalSpec> for Terminal {
    fn from(spec: &TerminalSpec) -> Self {
        match spec {
            TerminalSpec::Constant(v) => Terminal::Constant(*v),
            TerminalSpec::Input(name) => Terminal::Input(name.clone()),
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Constant(v) => write!(f, "{}", v),
            Terminal::Input(name) => write!(f, "{}", name),
            Terminal::Eval(values) => write!(f, "<eval:{}>", values.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_matches_symbol() {
        assert_eq!(FunctionSymbol::Add.arity(), 2);
        assert_eq!(FunctionSymbol::Exp.arity(), 1);
        assert_eq!(FunctionSymbol::Log.arity(), 1);
    }

    #[test]
    fn default_function_set_is_valid() {
        let set = FunctionSpec::default_set();
        assert_eq!(set.len(), 7);
        for spec in &set {
            spec.validate().unwrap();
        }
    }

    #[test]
    fn mismatched_arity_is_rejected() {
        let spec = FunctionSpec {
            symbol: FunctionSymbol::Exp,
            arity: 2,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn default_terminal_set_has_constants_and_input() {
        let set = TerminalSpec::default_set();
        assert_eq!(set.len(), 12);
        assert!(matches!(set[0], TerminalSpec::Constant(v) if v == 0.0));
        assert!(matches!(&set[11], TerminalSpec::Input(name) if name == "x"));
    }
}
