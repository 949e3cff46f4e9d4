use crate::engines::generation::generator::GrowMethod;
use crate::error::{Result, SymregError};
use serde::{Deserialize, Serialize};

/// Knobs for the evolutionary run. Catalogs (function/terminal sets) are
/// passed separately so no configuration is process-global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: usize,
    pub method: GrowMethod,
    pub max_depth: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            generations: 100,
            method: GrowMethod::RampedHalfAndHalf,
            max_depth: 4,
            tournament_size: 5,
            crossover_rate: 0.85,
            mutation_rate: 0.15,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 10 {
            return Err(SymregError::Configuration(
                "population size must be at least 10".to_string(),
            ));
        }
        if self.generations == 0 {
            return Err(SymregError::Configuration(
                "generation count must be at least 1".to_string(),
            ));
        }
        if self.max_depth < 1 {
            return Err(SymregError::Configuration(
                "max tree depth must be at least 1".to_string(),
            ));
        }
        if self.tournament_size < 2 || self.tournament_size > self.population_size {
            return Err(SymregError::Configuration(
                "tournament size must be between 2 and the population size".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(SymregError::Configuration(
                "crossover rate must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(SymregError::Configuration(
                "mutation rate must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}
