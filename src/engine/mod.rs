pub mod diversity;
pub mod metrics;

pub use diversity::population_diversity;
pub use metrics::RunMetrics;

use crate::config::{Config, ConfigError, GaConfig};
use crate::crossover::{CrossoverError, CrossoverStrategy};
use crate::fitness::{FitnessError, FitnessStrategy};
use crate::model::{self, Individual, Population};
use crate::mutation::MutationStrategy;
use crate::selection::{SelectionError, SelectionStrategy};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Population must hold at least one candidate")]
    EmptyPopulation,
    #[error("Population size {actual} != expected {expected}")]
    PopulationSize { expected: usize, actual: usize },
    #[error("Parent selection returned {returned} indices, at least one is required")]
    NoParents { returned: usize },
    #[error("Selection failed: {0}")]
    Selection(#[from] SelectionError),
    #[error("Crossover failed: {0}")]
    Crossover(#[from] CrossoverError),
    #[error("Fitness evaluation failed: {0}")]
    Fitness(#[from] FitnessError),
    #[error("Could not start the fitness worker pool: {0}")]
    WorkerPool(#[from] ThreadPoolBuildError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every configured generation was executed.
    GenerationBudget,
    /// The best fitness reached `error_threshold`.
    ErrorThreshold,
    /// The best-so-far fitness did not improve for `early_stopping_patience` generations.
    Stagnation,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::GenerationBudget => "generation budget exhausted",
            StopReason::ErrorThreshold => "error threshold reached",
            StopReason::Stagnation => "no improvement within patience",
        };
        f.write_str(text)
    }
}

/// The strategy objects a run is assembled from.
pub struct Strategies {
    pub selection: Box<dyn SelectionStrategy>,
    /// Fills the slots left after elites and offspring. Next-best ranking when `None`.
    pub survivor_selection: Option<Box<dyn SelectionStrategy>>,
    pub crossover: Box<dyn CrossoverStrategy>,
    /// Children are used as produced when `None`.
    pub mutation: Option<Box<dyn MutationStrategy>>,
}

/// Result of `GaEngine::run`.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub best: Individual,
    pub best_fitness: f64,
    /// Final population, aligned with `fitness`.
    pub population: Population,
    pub fitness: Vec<f64>,
    pub metrics: RunMetrics,
    /// Number of reproduction steps actually executed.
    pub generations: usize,
    pub stop_reason: StopReason,
}

/// Generational genetic algorithm over triangle candidates.
///
/// The engine owns its strategies and a private random source. Only fitness
/// evaluation leaves the calling thread; it runs on a rayon pool that lives
/// exactly as long as one `run` call.
pub struct GaEngine {
    config: GaConfig,
    strategies: Strategies,
    fitness: Arc<dyn FitnessStrategy>,
    rng: Pcg32,
}

impl GaEngine {
    /// Creates a new engine from already built strategies.
    ///
    /// # Arguments
    /// * `config` - Generation loop parameters
    /// * `strategies` - Selection, crossover, and optional survivor selection and mutation
    /// * `fitness` - Shared fitness strategy, evaluated concurrently
    /// * `rng` - Random source for crossover and mutation gating
    ///
    /// # Returns
    /// * `Self` - An engine ready to `run`
    pub fn new(
        config: GaConfig,
        strategies: Strategies,
        fitness: Arc<dyn FitnessStrategy>,
        rng: Pcg32,
    ) -> Self {
        Self {
            config,
            strategies,
            fitness,
            rng,
        }
    }

    /// Builds every strategy named in `config`, each with its own random source.
    ///
    /// A master generator is seeded from `ga.seed` (or entropy when absent);
    /// every strategy is seeded from one draw of it, in a fixed order, so a
    /// seed reproduces the whole run.
    ///
    /// # Arguments
    /// * `config` - A validated configuration
    /// * `fitness` - The fitness strategy built for the target image
    ///
    /// # Returns
    /// * `Result<Self, EngineError>` - The engine, or the first invalid strategy parameter
    pub fn from_config(config: &Config, fitness: Arc<dyn FitnessStrategy>) -> Result<Self, EngineError> {
        let mut master = match config.ga.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::seed_from_u64(rand::random()),
        };
        let mut child = || Pcg32::seed_from_u64(master.random());

        let selection = config.selection.build(child())?;
        let survivor_selection = match &config.survivor_selection {
            Some(cfg) => Some(cfg.build(child())?),
            None => None,
        };
        let crossover = config.crossover.build(child())?;
        let mutation = match &config.mutation {
            Some(cfg) => Some(cfg.build(child())?),
            None => None,
        };
        let rng = child();

        Ok(Self::new(
            config.ga.clone(),
            Strategies {
                selection,
                survivor_selection,
                crossover,
                mutation,
            },
            fitness,
            rng,
        ))
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// Random starting population of `pop_size` candidates drawn from the engine's generator.
    pub fn random_population(&mut self, num_triangles: usize) -> Population {
        model::init_population(self.config.pop_size, num_triangles, &mut self.rng)
    }

    /// Runs the evolution process
    ///
    /// Evaluates the initial population, then produces one generation after
    /// another until the generation budget is spent or an early-stopping rule
    /// fires. Metrics are recorded for the initial population and for every
    /// generation produced.
    ///
    /// # Arguments
    /// * `population` - Exactly `pop_size` candidates sharing one gene count
    ///
    /// # Returns
    /// * `Result<RunOutcome, EngineError>` - The best candidate, final population and metrics,
    ///   or the first fatal error
    pub fn run(&mut self, population: Population) -> Result<RunOutcome, EngineError> {
        let pop_size = self.config.pop_size;
        if pop_size == 0 {
            return Err(EngineError::EmptyPopulation);
        }
        if population.len() != pop_size {
            return Err(EngineError::PopulationSize {
                expected: pop_size,
                actual: population.len(),
            });
        }

        let pool = build_worker_pool(self.config.max_workers)?;
        info!(
            "Starting run: pop_size={}, generations={}, workers={}",
            pop_size,
            self.config.generations,
            pool.current_num_threads()
        );

        let maximize = self.config.maximize;
        let mut population = population;
        let mut fitness = evaluate_pending(&pool, self.fitness.as_ref(), &population, vec![None; pop_size])?;
        let mut metrics = RunMetrics::default();
        self.record(&mut metrics, &population, &fitness, 0);

        let mut best_so_far = metrics.latest_best(maximize).unwrap_or(f64::NAN);
        let mut stale = 0;
        let mut stop_reason = self.threshold_reached(best_so_far).then_some(StopReason::ErrorThreshold);
        let mut executed = 0;

        while stop_reason.is_none() && executed < self.config.generations {
            if let Some(mutation) = self.strategies.mutation.as_deref_mut() {
                mutation.set_progress(executed as f64 / self.config.generations as f64);
            }

            let (next, cached) = self.next_generation(&population, &fitness)?;
            fitness = evaluate_pending(&pool, self.fitness.as_ref(), &next, cached)?;
            population = next;
            executed += 1;
            self.record(&mut metrics, &population, &fitness, executed);

            let best = metrics.latest_best(maximize).unwrap_or(f64::NAN);
            if improves(best, best_so_far, maximize) {
                best_so_far = best;
                stale = 0;
            } else {
                stale += 1;
            }

            if self.threshold_reached(best) {
                stop_reason = Some(StopReason::ErrorThreshold);
            } else if self.config.early_stopping_patience > 0
                && stale >= self.config.early_stopping_patience
            {
                stop_reason = Some(StopReason::Stagnation);
            }
        }

        let stop_reason = stop_reason.unwrap_or(StopReason::GenerationBudget);
        if stop_reason != StopReason::GenerationBudget {
            info!("Stopping early after {executed} generations: {stop_reason}");
        }

        let best_idx = rank(&fitness, maximize)[0];
        info!("Evolution complete. Best fitness={:.4}", fitness[best_idx]);

        Ok(RunOutcome {
            best: population[best_idx].clone(),
            best_fitness: fitness[best_idx],
            population,
            fitness,
            metrics,
            generations: executed,
            stop_reason,
        })
    }

    /// Assembles the next population from the current one.
    ///
    /// Layout: elites first, then offspring, then survivors, then any underfill
    /// padding. The second vector holds the known fitness of every carried-over
    /// candidate and `None` for offspring.
    ///
    /// # Arguments
    /// * `population` - The current generation
    /// * `fitness` - Fitness of `population`, same order
    ///
    /// # Returns
    /// * `Result<(Population, Vec<Option<f64>>), EngineError>` - Exactly `pop_size` candidates
    pub fn next_generation(
        &mut self,
        population: &[Individual],
        fitness: &[f64],
    ) -> Result<(Population, Vec<Option<f64>>), EngineError> {
        let pop_size = self.config.pop_size;
        let maximize = self.config.maximize;
        let order = rank(fitness, maximize);

        let elitism = self.config.elitism.min(pop_size);
        let offspring_count =
            (pop_size - elitism).min((self.config.rho * pop_size as f64).round() as usize);
        let survivor_count = pop_size - elitism - offspring_count;
        debug!("elites={elitism} offspring={offspring_count} survivors={survivor_count}");

        let mut next = Vec::with_capacity(pop_size);
        let mut cached = Vec::with_capacity(pop_size);
        for &i in &order[..elitism] {
            next.push(population[i].clone());
            cached.push(Some(fitness[i]));
        }

        if offspring_count > 0 {
            let scores = selection_scores(fitness, maximize);
            for child in self.breed(population, &scores, offspring_count)? {
                next.push(child);
                cached.push(None);
            }
        }

        if survivor_count > 0 {
            let pool = &order[elitism..];
            let picks: Vec<usize> = match self.strategies.survivor_selection.as_deref_mut() {
                None => pool.iter().take(survivor_count).copied().collect(),
                Some(selector) => {
                    let pool_fitness: Vec<f64> = pool.iter().map(|&i| fitness[i]).collect();
                    let scores = selection_scores(&pool_fitness, maximize);
                    selector
                        .select(&scores, survivor_count)?
                        .into_iter()
                        .map(|j| pool[j])
                        .collect()
                }
            };
            for i in picks {
                next.push(population[i].clone());
                cached.push(Some(fitness[i]));
            }
        }

        if next.len() < pop_size {
            warn!(
                "Next generation is short by {}, padding with the current best",
                pop_size - next.len()
            );
            if let Some(&best) = order.first() {
                while next.len() < pop_size {
                    next.push(population[best].clone());
                    cached.push(Some(fitness[best]));
                }
            }
        }
        next.truncate(pop_size);
        cached.truncate(pop_size);
        Ok((next, cached))
    }

    /// Produces exactly `count` children from selected parent pairs.
    ///
    /// Parents for the whole generation come from a single `select` call, so
    /// strategies with a per-call schedule (Boltzmann) advance once per generation.
    /// A strategy that returns fewer indices than asked has its pairs reused in order.
    fn breed(
        &mut self,
        population: &[Individual],
        scores: &[f64],
        count: usize,
    ) -> Result<Vec<Individual>, EngineError> {
        let pairs = count.div_ceil(2);
        let parents = self.strategies.selection.select(scores, 2 * pairs)?;
        if parents.is_empty() {
            return Err(EngineError::NoParents { returned: 0 });
        }

        let mut children = Vec::with_capacity(2 * pairs);
        for pair in parents.chunks(2).cycle() {
            if children.len() >= count {
                break;
            }
            let (first, second) = match *pair {
                [i, j] => (i, j),
                [i, ..] => (i, i),
                [] => return Err(EngineError::NoParents { returned: 0 }),
            };
            let (parent1, parent2) = (&population[first], &population[second]);

            let (child1, child2) = if self.rng.random::<f64>() < self.config.crossover_rate {
                self.strategies.crossover.crossover(parent1, parent2)?
            } else {
                (parent1.clone(), parent2.clone())
            };

            for child in [child1, child2] {
                let child = match self.strategies.mutation.as_deref_mut() {
                    Some(mutation) if self.rng.random::<f64>() < self.config.mutation_rate => {
                        mutation.mutate(&child)
                    }
                    _ => child,
                };
                children.push(child);
            }
        }
        // an odd count drops the surplus child of the last pair
        children.truncate(count);
        Ok(children)
    }

    fn threshold_reached(&self, best: f64) -> bool {
        match self.config.error_threshold {
            Some(threshold) if self.config.maximize => best >= threshold,
            Some(threshold) => best <= threshold,
            None => false,
        }
    }

    fn record(
        &self,
        metrics: &mut RunMetrics,
        population: &[Individual],
        fitness: &[f64],
        generation: usize,
    ) {
        let diversity = self
            .config
            .track_diversity
            .then(|| population_diversity(population));
        metrics.record(fitness, diversity);

        let best = metrics.latest_best(self.config.maximize).unwrap_or(f64::NAN);
        let mean = metrics.mean.last().copied().unwrap_or(f64::NAN);
        let std = metrics.std.last().copied().unwrap_or(f64::NAN);
        match diversity {
            Some(d) => info!(
                "Gen {}/{}: Best={:.4} | Mean={:.4} | Std={:.4} | Diversity={:.4}",
                generation, self.config.generations, best, mean, std, d
            ),
            None => info!(
                "Gen {}/{}: Best={:.4} | Mean={:.4} | Std={:.4}",
                generation, self.config.generations, best, mean, std
            ),
        }
    }
}

fn build_worker_pool(max_workers: Option<usize>) -> Result<ThreadPool, ThreadPoolBuildError> {
    let mut builder = ThreadPoolBuilder::new().thread_name(|i| format!("fitness-{i}"));
    if let Some(workers) = max_workers {
        builder = builder.num_threads(workers);
    }
    builder.build()
}

/// Fills in the fitness of every candidate whose entry in `known` is `None`.
///
/// Pending candidates are evaluated together on `pool`; the call returns
/// once all of them are done. The first failure aborts the whole batch.
fn evaluate_pending(
    pool: &ThreadPool,
    fitness: &dyn FitnessStrategy,
    population: &[Individual],
    known: Vec<Option<f64>>,
) -> Result<Vec<f64>, FitnessError> {
    let work_items: Vec<usize> = known
        .iter()
        .enumerate()
        .filter_map(|(i, f)| f.is_none().then_some(i))
        .collect();

    let results: Vec<(usize, f64)> = pool.install(|| {
        work_items
            .par_iter()
            .map(|&i| fitness.evaluate(&population[i]).map(|f| (i, f)))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let mut filled = known;
    for (i, f) in results {
        filled[i] = Some(f);
    }
    Ok(filled.into_iter().map(|f| f.unwrap_or(f64::NAN)).collect())
}

/// Indices ordered best first. Ties keep their original order.
pub fn rank(fitness: &[f64], maximize: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    if maximize {
        order.sort_by(|&a, &b| fitness[b].total_cmp(&fitness[a]));
    } else {
        order.sort_by(|&a, &b| fitness[a].total_cmp(&fitness[b]));
    }
    order
}

/// Turns raw fitness into non-negative, higher-is-better selection scores.
///
/// Maximizing keeps the values, with negatives floored at zero; minimizing
/// uses `max(fitness) - fitness`. When no score is positive every candidate
/// gets weight 1.0.
pub fn selection_scores(fitness: &[f64], maximize: bool) -> Vec<f64> {
    let scores: Vec<f64> = if maximize {
        fitness.iter().map(|f| f.max(0.0)).collect()
    } else {
        let worst = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        fitness.iter().map(|f| worst - f).collect()
    };
    if scores.iter().all(|&s| s <= 0.0) {
        vec![1.0; scores.len()]
    } else {
        scores
    }
}

fn improves(candidate: f64, incumbent: f64, maximize: bool) -> bool {
    if incumbent.is_nan() {
        return !candidate.is_nan();
    }
    if maximize {
        candidate > incumbent
    } else {
        candidate < incumbent
    }
}
