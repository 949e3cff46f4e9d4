use super::population::ProgressCallback;

/// Prints per-generation progress to stdout.
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_generation_start(&mut self, generation: usize) {
        println!("Generation {} starting...", generation + 1);
    }

    fn on_generation_complete(&mut self, generation: usize, best_score: f64, population: usize) {
        println!(
            "Generation {} complete. Best RMSE: {:.4}, population: {}",
            generation + 1,
            best_score,
            population
        );
    }
}

/// No-op callback for embedding and tests.
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_generation_complete(&mut self, _generation: usize, _best_score: f64, _population: usize) {}
}
