use crate::engines::generation::tree::{Node, NodeId, Tree};
use crate::error::{Result, SymregError};
use crate::types::{FunctionSpec, Terminal, TerminalSpec};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tree-construction strategy.
///
/// `Full` expands every branch to the depth limit; `Grow` may stop a branch
/// early on a coin flip; `RampedHalfAndHalf` flips one coin per tree to pick
/// between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowMethod {
    Full,
    Grow,
    RampedHalfAndHalf,
}

impl FromStr for GrowMethod {
    type Err = SymregError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "FULL" => Ok(GrowMethod::Full),
            "GROW" => Ok(GrowMethod::Grow),
            "RAMPED_HALF_AND_HALF" => Ok(GrowMethod::RampedHalfAndHalf),
            other => Err(SymregError::InvalidMethod(other.to_string())),
        }
    }
}

/// Builds a random well-formed tree from the given catalogs.
///
/// The root is always a random function; branches then grow per `method`
/// until `max_depth`, where terminals are attached. Depth accounting is
/// 1-indexed at the root, and the terminal rank added at the limit is not
/// counted, so a `Full` tree of `max_depth` d reports `depth == d`.
pub fn generate<R: Rng>(
    method: GrowMethod,
    functions: &[FunctionSpec],
    terminals: &[TerminalSpec],
    max_depth: usize,
    rng: &mut R,
) -> Result<Tree> {
    if max_depth < 1 {
        return Err(SymregError::Precondition(
            "max_depth must be at least 1".to_string(),
        ));
    }
    if functions.is_empty() {
        return Err(SymregError::Precondition(
            "function set must not be empty".to_string(),
        ));
    }
    if terminals.is_empty() {
        return Err(SymregError::Precondition(
            "terminal set must not be empty".to_string(),
        ));
    }
    for spec in functions {
        spec.validate()?;
    }

    let method = match method {
        GrowMethod::Full | GrowMethod::Grow => method,
        GrowMethod::RampedHalfAndHalf => {
            if rng.gen::<f64>() > 0.5 {
                GrowMethod::Full
            } else {
                GrowMethod::Grow
            }
        }
    };

    let mut tree = Tree::new();
    let root = tree.set_root(random_function(functions, rng))?;
    build(method, &mut tree, root, functions, terminals, 1, max_depth, rng)?;
    Ok(tree)
}

#[allow(clippy::too_many_arguments)]
fn build<R: Rng>(
    method: GrowMethod,
    tree: &mut Tree,
    node: NodeId,
    functions: &[FunctionSpec],
    terminals: &[TerminalSpec],
    curr_depth: usize,
    max_depth: usize,
    rng: &mut R,
) -> Result<()> {
    if curr_depth > tree.depth {
        tree.depth += 1;
    }
    for i in 0..tree.node(node).arity() {
        let stop_early = method == GrowMethod::Grow && rng.gen::<f64>() > 0.5;
        if curr_depth == max_depth || stop_early {
            tree.attach(node, i, random_terminal(terminals, rng))?;
        } else {
            let child = tree.attach(node, i, random_function(functions, rng))?;
            build(
                method,
                tree,
                child,
                functions,
                terminals,
                curr_depth + 1,
                max_depth,
                rng,
            )?;
        }
    }
    Ok(())
}

pub(crate) fn random_function<R: Rng>(functions: &[FunctionSpec], rng: &mut R) -> Node {
    Node::func(functions[rng.gen_range(0..functions.len())].symbol)
}

pub(crate) fn random_terminal<R: Rng>(terminals: &[TerminalSpec], rng: &mut R) -> Node {
    Node::terminal(Terminal::from(&terminals[rng.gen_range(0..terminals.len())]))
}
