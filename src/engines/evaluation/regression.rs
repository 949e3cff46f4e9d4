use crate::data::Dataset;
use crate::engines::generation::tree::{NodeKind, Tree};
use crate::error::{Result, SymregError};
use crate::types::{FunctionSymbol, Terminal};

/// Computes a tree's predicted output vector for every dataset row.
///
/// Evaluation is iterative: the pre-order linearization is consumed back to
/// front with a value stack, so every function node sees its children's
/// vectors already computed. A consequence of that stack order is the binary
/// operand convention: the FIRST child (left-to-right) supplies the
/// right-hand operand and the SECOND child the left-hand one, so `SUB`
/// computes `child1 - child0` and `POW` computes `child1 ^ child0`. This is
/// load-bearing for every non-commutative tree and must not be normalized to
/// infix order.
///
/// Numeric degeneracies (division by zero, log of non-positive values) yield
/// `NaN`/`Infinity` entries, which propagate as data rather than errors.
pub fn predict(tree: &Tree, dataset: &Dataset) -> Result<Vec<f64>> {
    let order = tree.linearize();
    if order.is_empty() {
        return Err(SymregError::Precondition(
            "cannot evaluate an empty tree".to_string(),
        ));
    }

    let mut values: Vec<Vec<f64>> = Vec::with_capacity(order.len());
    for id in order.iter().rev() {
        match &tree.node(*id).kind {
            NodeKind::Term(term) => values.push(resolve(term, dataset)?),
            NodeKind::Func { symbol, .. } => {
                let result = match symbol.arity() {
                    1 => apply_unary(*symbol, &pop_operand(&mut values)?),
                    _ => {
                        let rhs = pop_operand(&mut values)?;
                        let lhs = pop_operand(&mut values)?;
                        apply_binary(*symbol, &lhs, &rhs)
                    }
                };
                values.push(result);
            }
        }
    }

    let predicted = values.pop().ok_or_else(|| {
        SymregError::Precondition("evaluation produced no result".to_string())
    })?;
    if !values.is_empty() {
        return Err(SymregError::Precondition(
            "malformed tree: leftover operands after evaluation".to_string(),
        ));
    }
    Ok(predicted)
}

/// Scores a tree against the dataset's response: RMSE over all rows, written
/// into `tree.error` and `tree.score` (lower is better).
pub fn evaluate(tree: &mut Tree, dataset: &Dataset) -> Result<f64> {
    let predicted = predict(tree, dataset)?;
    let score = rmse(&predicted, dataset.response());
    tree.error = score;
    tree.score = score;
    Ok(score)
}

/// Root-mean-square error between two row-aligned vectors. The vectors must
/// have equal length; misaligned inputs are a caller bug.
pub fn rmse(predicted: &[f64], expected: &[f64]) -> f64 {
    debug_assert_eq!(
        predicted.len(),
        expected.len(),
        "rmse over misaligned vectors"
    );
    let sum_sq: f64 = predicted
        .iter()
        .zip(expected)
        .map(|(p, e)| (p - e).powi(2))
        .sum();
    (sum_sq / predicted.len() as f64).sqrt()
}

fn resolve(term: &Terminal, dataset: &Dataset) -> Result<Vec<f64>> {
    match term {
        Terminal::Constant(v) => Ok(vec![*v; dataset.len()]),
        Terminal::Input(name) => Ok(dataset.input(name)?.to_vec()),
        Terminal::Eval(values) => Ok(values.clone()),
    }
}

fn pop_operand(values: &mut Vec<Vec<f64>>) -> Result<Vec<f64>> {
    values.pop().ok_or_else(|| {
        SymregError::Precondition("malformed tree: missing operand".to_string())
    })
}

fn apply_unary(symbol: FunctionSymbol, operand: &[f64]) -> Vec<f64> {
    match symbol {
        FunctionSymbol::Exp => operand.iter().map(|x| x.exp()).collect(),
        FunctionSymbol::Log => operand.iter().map(|x| x.ln()).collect(),
        // Binary symbols never reach here: arity dispatch happens above.
        _ => operand.to_vec(),
    }
}

fn apply_binary(symbol: FunctionSymbol, lhs: &[f64], rhs: &[f64]) -> Vec<f64> {
    lhs.iter()
        .zip(rhs)
        .map(|(l, r)| match symbol {
            FunctionSymbol::Add => l + r,
            FunctionSymbol::Sub => l - r,
            FunctionSymbol::Mul => l * r,
            FunctionSymbol::Div => l / r,
            FunctionSymbol::Pow => l.powf(*r),
            FunctionSymbol::Exp | FunctionSymbol::Log => f64::NAN,
        })
        .collect()
}
