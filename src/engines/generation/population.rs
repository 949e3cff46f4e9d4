use crate::config::EvolutionConfig;
use crate::data::Dataset;
use crate::engines::evaluation::regression::evaluate;
use crate::engines::generation::generator::{generate, GrowMethod};
use crate::engines::generation::operators::{point_crossover, point_mutation, tournament_selection};
use crate::engines::generation::tree::Tree;
use crate::error::{Result, SymregError};
use crate::types::{FunctionSpec, TerminalSpec};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Per-generation progress hooks for whoever drives the run.
pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, generation: usize, best_score: f64, population: usize);
}

impl<C: ProgressCallback + ?Sized> ProgressCallback for &mut C {
    fn on_generation_start(&mut self, generation: usize) {
        (**self).on_generation_start(generation);
    }

    fn on_generation_complete(&mut self, generation: usize, best_score: f64, population: usize) {
        (**self).on_generation_complete(generation, best_score, population);
    }
}

/// A generation's worth of trees.
#[derive(Debug, Clone)]
pub struct Population {
    trees: Vec<Tree>,
}

impl Population {
    pub fn from_trees(trees: Vec<Tree>) -> Self {
        Self { trees }
    }

    /// Generates `size` random trees from the catalogs.
    pub fn spawn<R: Rng>(
        size: usize,
        method: GrowMethod,
        functions: &[FunctionSpec],
        terminals: &[TerminalSpec],
        max_depth: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let trees = (0..size)
            .map(|_| generate(method, functions, terminals, max_depth, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { trees })
    }

    /// Scores every tree against the shared read-only dataset. The pass is
    /// embarrassingly parallel, so it fans out across rayon's pool.
    pub fn evaluate(&mut self, dataset: &Dataset) -> Result<()> {
        self.trees
            .par_iter_mut()
            .map(|tree| evaluate(tree, dataset).map(|_| ()))
            .collect::<Result<Vec<()>>>()?;
        Ok(())
    }

    /// Lowest-scoring tree. NaN scores sort behind every finite score, so a
    /// numerically degraded tree never wins.
    pub fn best(&self) -> Option<&Tree> {
        self.trees.iter().min_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or_else(|| a.score.is_nan().cmp(&b.score.is_nan()))
        })
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

/// Drives the generation loop: spawn, score, select, cross over, mutate.
/// The core operators stay usable on their own; this is the collaborator
/// surface that wires them together.
#[derive(Debug)]
pub struct EvolutionEngine {
    config: EvolutionConfig,
    functions: Vec<FunctionSpec>,
    terminals: Vec<TerminalSpec>,
    rng: StdRng,
}

impl EvolutionEngine {
    pub fn new(
        config: EvolutionConfig,
        functions: Vec<FunctionSpec>,
        terminals: Vec<TerminalSpec>,
    ) -> Result<Self> {
        config.validate()?;
        for spec in &functions {
            spec.validate()?;
        }
        if functions.is_empty() || terminals.is_empty() {
            return Err(SymregError::Configuration(
                "function and terminal sets must not be empty".to_string(),
            ));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            functions,
            terminals,
            rng,
        })
    }

    /// Runs the configured number of generations and returns the best tree
    /// seen across the whole run (lowest RMSE).
    pub fn run<C: ProgressCallback>(
        &mut self,
        dataset: &Dataset,
        mut callback: C,
    ) -> Result<Tree> {
        let mut population = Population::spawn(
            self.config.population_size,
            self.config.method,
            &self.functions,
            &self.terminals,
            self.config.max_depth,
            &mut self.rng,
        )?;

        let mut best: Option<Tree> = None;
        for generation in 0..self.config.generations {
            callback.on_generation_start(generation);

            population.evaluate(dataset)?;

            if let Some(champion) = population.best() {
                let improved = best
                    .as_ref()
                    .map_or(true, |b| improves_on(champion.score, b.score));
                if improved {
                    log::debug!(
                        "generation {}: new best {:.6} [{}]",
                        generation,
                        champion.score,
                        champion.equation()
                    );
                    best = Some(champion.clone());
                }
            }

            let best_score = best.as_ref().map_or(f64::INFINITY, |b| b.score);
            callback.on_generation_complete(generation, best_score, population.len());

            if generation == self.config.generations - 1 {
                break;
            }
            population = self.next_generation(&population)?;
        }

        best.ok_or_else(|| {
            SymregError::Precondition("evolution produced no scored trees".to_string())
        })
    }

    fn next_generation(&mut self, current: &Population) -> Result<Population> {
        let mut next: Vec<Tree> = Vec::with_capacity(self.config.population_size);

        while next.len() < self.config.population_size {
            if self.rng.gen::<f64>() < self.config.crossover_rate {
                let mut first =
                    tournament_selection(current.trees(), self.config.tournament_size, &mut self.rng)?;
                let mut second =
                    tournament_selection(current.trees(), self.config.tournament_size, &mut self.rng)?;

                if first.size >= 2 && second.size >= 2 {
                    point_crossover(&mut first, &mut second, &mut self.rng)?;
                    first.refresh();
                    second.refresh();
                }

                self.maybe_mutate(&mut first)?;
                self.maybe_mutate(&mut second)?;

                next.push(first);
                if next.len() < self.config.population_size {
                    next.push(second);
                }
            } else {
                let mut child =
                    tournament_selection(current.trees(), self.config.tournament_size, &mut self.rng)?;
                self.maybe_mutate(&mut child)?;
                next.push(child);
            }
        }

        next.truncate(self.config.population_size);
        Ok(Population::from_trees(next))
    }

    fn maybe_mutate(&mut self, tree: &mut Tree) -> Result<()> {
        if self.rng.gen::<f64>() < self.config.mutation_rate {
            point_mutation(&self.functions, &self.terminals, tree, &mut self.rng)?;
        }
        Ok(())
    }
}

/// Whether `candidate` beats `incumbent` as the run's best score. A NaN
/// incumbent (a fully degenerate early generation) is displaced by any
/// non-NaN score; a NaN candidate never displaces anything.
fn improves_on(candidate: f64, incumbent: f64) -> bool {
    if incumbent.is_nan() {
        return !candidate.is_nan();
    }
    candidate < incumbent
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct NoopProgress;

    impl ProgressCallback for NoopProgress {
        fn on_generation_start(&mut self, _generation: usize) {}
        fn on_generation_complete(&mut self, _generation: usize, _best: f64, _population: usize) {}
    }

    fn constant_dataset() -> Dataset {
        let mut inputs = HashMap::new();
        inputs.insert("x".to_string(), vec![1.0; 10]);
        Dataset::new(inputs, vec![2.0; 10]).unwrap()
    }

    #[test]
    fn spawn_and_evaluate_scores_every_tree() {
        let mut rng = StdRng::seed_from_u64(43);
        let mut population = Population::spawn(
            20,
            GrowMethod::RampedHalfAndHalf,
            &FunctionSpec::default_set(),
            &TerminalSpec::default_set(),
            3,
            &mut rng,
        )
        .unwrap();
        population.evaluate(&constant_dataset()).unwrap();
        let best = population.best().unwrap();
        assert!(best.score.is_nan() || best.score >= 0.0);
        assert_eq!(population.len(), 20);
    }

    #[test]
    fn seeded_run_returns_a_scored_best_tree() {
        let config = EvolutionConfig {
            population_size: 30,
            generations: 5,
            seed: Some(42),
            ..EvolutionConfig::default()
        };
        let mut engine = EvolutionEngine::new(
            config,
            FunctionSpec::default_set(),
            TerminalSpec::default_set(),
        )
        .unwrap();
        let best = engine.run(&constant_dataset(), NoopProgress).unwrap();
        assert!(best.size >= 1);
        assert!(best.score.is_finite());
        best.validate().unwrap();
    }

    #[test]
    fn best_tracking_recovers_from_nan_scores() {
        // An all-degenerate first generation (e.g. nothing but DIV over a
        // zero constant) must not pin the run's best to NaN once finite
        // offspring appear.
        assert!(improves_on(1.0, f64::NAN));
        assert!(improves_on(f64::INFINITY, f64::NAN));
        assert!(!improves_on(f64::NAN, 1.0));
        assert!(!improves_on(f64::NAN, f64::NAN));
        assert!(improves_on(0.5, 1.0));
        assert!(!improves_on(1.0, 0.5));
        assert!(!improves_on(1.0, 1.0));
    }

    #[test]
    fn empty_catalogs_rejected_at_construction() {
        let err = EvolutionEngine::new(
            EvolutionConfig::default(),
            Vec::new(),
            TerminalSpec::default_set(),
        )
        .unwrap_err();
        assert!(matches!(err, SymregError::Configuration(_)));
    }
}
