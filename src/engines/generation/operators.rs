use crate::engines::generation::generator::{random_function, random_terminal};
use crate::engines::generation::tree::{NodeKind, Tree};
use crate::error::{Result, SymregError};
use crate::types::{FunctionSpec, TerminalSpec};
use rand::Rng;

/// Resample budget before a mutation gives up on finding a distinct
/// replacement. Exhaustion is expected with degenerate catalogs (e.g. a
/// single symbol per arity) and is not an error.
const MUTATION_ATTEMPTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Mutated,
    Skipped,
}

/// Point mutation: pick a uniformly random node over the linearization and
/// overwrite its payload in place with a distinct resample from the matching
/// catalog. Tree shape, `size` and `depth` are untouched; on a `Skipped`
/// outcome the tree is untouched entirely.
pub fn point_mutation<R: Rng>(
    functions: &[FunctionSpec],
    terminals: &[TerminalSpec],
    tree: &mut Tree,
    rng: &mut R,
) -> Result<MutationOutcome> {
    let order = tree.linearize();
    if order.is_empty() {
        return Err(SymregError::Precondition(
            "cannot mutate an empty tree".to_string(),
        ));
    }
    if terminals.is_empty() || functions.is_empty() {
        return Err(SymregError::Precondition(
            "mutation requires non-empty catalogs".to_string(),
        ));
    }
    for spec in functions {
        spec.validate()?;
    }
    let id = order[rng.gen_range(0..order.len())];

    if tree.node(id).is_terminal() {
        for _ in 0..MUTATION_ATTEMPTS {
            let candidate = random_terminal(terminals, rng);
            let NodeKind::Term(replacement) = candidate.kind else {
                continue;
            };
            let NodeKind::Term(current) = &tree.node(id).kind else {
                continue;
            };
            if replacement != *current {
                tree.node_mut(id).kind = NodeKind::Term(replacement);
                return Ok(MutationOutcome::Mutated);
            }
        }
        log::warn!("point mutation exhausted: no distinct terminal in the catalog");
        Ok(MutationOutcome::Skipped)
    } else {
        let arity = tree.node(id).arity();
        let current = tree.node(id).symbol();
        for _ in 0..MUTATION_ATTEMPTS {
            let candidate = random_function(functions, rng);
            let symbol = candidate.symbol();
            if symbol != current && candidate.arity() == arity {
                if let (NodeKind::Func { symbol: slot, .. }, Some(new_symbol)) =
                    (&mut tree.node_mut(id).kind, symbol)
                {
                    *slot = new_symbol;
                    return Ok(MutationOutcome::Mutated);
                }
            }
        }
        log::warn!(
            "point mutation exhausted: no distinct function of arity {} in the catalog",
            arity
        );
        Ok(MutationOutcome::Skipped)
    }
}

/// Point crossover: swap one uniformly random non-root subtree between the
/// two trees, rewiring the parent slots and back-references in one step.
/// Both trees' `size`/`depth` are stale afterwards; callers refresh when
/// they need them.
pub fn point_crossover<R: Rng>(a: &mut Tree, b: &mut Tree, rng: &mut R) -> Result<()> {
    let order_a = a.linearize();
    let order_b = b.linearize();
    if order_a.len() < 2 || order_b.len() < 2 {
        return Err(SymregError::Precondition(
            "crossover requires both trees to have size >= 2".to_string(),
        ));
    }
    let picked_a = order_a[rng.gen_range(1..order_a.len())];
    let picked_b = order_b[rng.gen_range(1..order_b.len())];

    let (parent_a, slot_a) = {
        let node = a.node(picked_a);
        let parent = node.parent.ok_or_else(|| {
            SymregError::Precondition("crossover picked a parentless node".to_string())
        })?;
        (parent, node.nth_child)
    };
    let (parent_b, slot_b) = {
        let node = b.node(picked_b);
        let parent = node.parent.ok_or_else(|| {
            SymregError::Precondition("crossover picked a parentless node".to_string())
        })?;
        (parent, node.nth_child)
    };

    let fragment_a = a.extract_fragment(picked_a);
    let fragment_b = b.extract_fragment(picked_b);
    a.graft(parent_a, slot_a, fragment_b)?;
    b.graft(parent_b, slot_b, fragment_a)?;
    Ok(())
}

/// Tournament selection: best (lowest score) of `tournament_size` uniform
/// draws from an already-evaluated population.
pub fn tournament_selection<R: Rng>(
    population: &[Tree],
    tournament_size: usize,
    rng: &mut R,
) -> Result<Tree> {
    if population.is_empty() {
        return Err(SymregError::Precondition(
            "tournament selection over an empty population".to_string(),
        ));
    }
    if tournament_size < 1 {
        return Err(SymregError::Precondition(
            "tournament size must be at least 1".to_string(),
        ));
    }

    let mut best_idx = rng.gen_range(0..population.len());
    let mut best_score = population[best_idx].score;

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..population.len());
        if population[idx].score < best_score {
            best_idx = idx;
            best_score = population[idx].score;
        }
    }

    Ok(population[best_idx].clone())
}
