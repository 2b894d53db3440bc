use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;

use super::config::{OptimizerOptions, SeedingMode};
use super::distance::DistanceMatrix;
use super::permutation::Permutation;

/// One candidate ordering with its search velocity and personal best
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Permutation,
    pub velocity: Vec<f64>,
    pub fitness: f64,
    pub best_position: Permutation,
    pub best_fitness: f64,
    rng: StdRng,
}

/// Pull strengths applied during one iteration
#[derive(Debug, Clone, Copy)]
pub struct Coefficients {
    pub inertia: f64,
    pub cognitive: f64,
    pub social: f64,
}

impl Particle {
    pub fn new(position: Permutation, matrix: &DistanceMatrix, rng: StdRng) -> Self {
        let fitness = matrix.fitness(&position);
        Self {
            velocity: vec![0.0; position.len()],
            best_position: position.clone(),
            best_fitness: fitness,
            position,
            fitness,
            rng,
        }
    }

    /// Move the particle one step toward its personal best and the given
    /// global best, then project the result back onto a permutation
    pub fn advance(
        mut self,
        global_best: &Permutation,
        coefficients: Coefficients,
        matrix: &DistanceMatrix,
    ) -> Self {
        let r1: f64 = self.rng.gen_range(0.0..=1.0);
        let r2: f64 = self.rng.gen_range(0.0..=1.0);

        let position = self.position.as_slice();
        let personal = self.best_position.as_slice();
        let social = global_best.as_slice();

        let velocity: Vec<f64> = (0..position.len())
            .map(|i| {
                let x = position[i] as f64;
                coefficients.inertia * self.velocity[i]
                    + coefficients.cognitive * r1 * (personal[i] as f64 - x)
                    + coefficients.social * r2 * (social[i] as f64 - x)
            })
            .collect();

        let moved: Vec<f64> = position
            .iter()
            .zip(&velocity)
            .map(|(&x, v)| x as f64 + v.round())
            .collect();
        let position = Permutation::from_ranking(&moved);
        debug_assert!(position.is_valid());

        let fitness = matrix.fitness(&position);
        if fitness > self.best_fitness {
            self.best_fitness = fitness;
            self.best_position = position.clone();
        }

        Self {
            position,
            velocity,
            fitness,
            ..self
        }
    }
}

/// All particles plus the best ordering any of them has seen
#[derive(Debug, Clone)]
pub struct Swarm {
    pub particles: Vec<Particle>,
    pub global_best: Permutation,
    pub global_best_fitness: f64,
}

impl Swarm {
    fn new(particles: Vec<Particle>) -> Self {
        let mut swarm = Self {
            global_best: particles
                .first()
                .map(|p| p.best_position.clone())
                .unwrap_or_else(|| Permutation::identity(0)),
            global_best_fitness: f64::NEG_INFINITY,
            particles,
        };
        swarm.absorb_personal_bests();
        swarm
    }

    /// Raise the global best to the best personal best, if that is strictly
    /// better. Returns whether it changed.
    fn absorb_personal_bests(&mut self) -> bool {
        let mut best: Option<&Particle> = None;
        for particle in &self.particles {
            if best.is_none_or(|b| particle.best_fitness > b.best_fitness) {
                best = Some(particle);
            }
        }
        match best {
            Some(particle) if particle.best_fitness > self.global_best_fitness => {
                self.global_best = particle.best_position.clone();
                self.global_best_fitness = particle.best_fitness;
                true
            }
            _ => false,
        }
    }
}

/// Why the iteration loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Budget,
    Stalled,
    TimeLimit,
}

/// Final state of one optimization run
#[derive(Debug, Clone)]
pub struct SwarmOutcome {
    pub best: Permutation,
    pub best_fitness: f64,
    pub iterations_run: usize,
    /// Global best fitness after initialization and after every iteration
    pub fitness_history: Vec<f64>,
    pub stop_reason: StopReason,
}

/// Particle swarm search over permutations
pub struct SwarmOptimizer<'a> {
    matrix: &'a DistanceMatrix,
    options: &'a OptimizerOptions,
}

impl<'a> SwarmOptimizer<'a> {
    pub fn new(matrix: &'a DistanceMatrix, options: &'a OptimizerOptions) -> Self {
        Self { matrix, options }
    }

    /// Inertia for an iteration, annealed linearly from `w_start` toward `w_end`
    pub fn inertia_at(&self, iteration: usize) -> f64 {
        let progress = iteration as f64 / self.options.iterations.max(1) as f64;
        self.options.w_start - (self.options.w_start - self.options.w_end) * progress
    }

    /// Starting positions for every particle. The first particle takes the
    /// constructed tour when one is given.
    pub fn initial_positions(
        &self,
        proxy_order: Option<&Permutation>,
        tour: Option<&Permutation>,
        rng: &mut StdRng,
    ) -> Vec<Permutation> {
        let n = self.matrix.len();
        let count = self.options.num_particles;

        (0..count)
            .map(|k| match (k, tour, self.options.seeding, proxy_order) {
                (0, Some(tour), _, _) => tour.clone(),
                (_, _, SeedingMode::FeatureSum, Some(order)) => order.rotated(k * n / count),
                _ => Permutation::random(n, rng),
            })
            .collect()
    }

    pub fn run(&self, initial: Vec<Permutation>, rng: &mut StdRng) -> SwarmOutcome {
        let particles: Vec<Particle> = initial
            .into_iter()
            .map(|position| {
                let particle_rng = StdRng::seed_from_u64(rng.next_u64());
                Particle::new(position, self.matrix, particle_rng)
            })
            .collect();
        let mut swarm = Swarm::new(particles);

        let mut fitness_history = Vec::with_capacity(self.options.iterations + 1);
        fitness_history.push(swarm.global_best_fitness);

        let time_limit = self.options.time_limit();
        let started = Instant::now();
        let mut iterations_run = 0;
        let mut stalled_for = 0;
        let mut stop_reason = StopReason::Budget;

        for iteration in 0..self.options.iterations {
            if let Some(limit) = time_limit {
                if started.elapsed() >= limit {
                    info!("Time limit reached after {iteration} iterations");
                    stop_reason = StopReason::TimeLimit;
                    break;
                }
            }

            let coefficients = Coefficients {
                inertia: self.inertia_at(iteration),
                cognitive: self.options.c1,
                social: self.options.c2,
            };
            // Every particle sees the global best as it stood before this iteration
            let snapshot = swarm.global_best.clone();
            let matrix = self.matrix;
            let step = |particle: Particle| particle.advance(&snapshot, coefficients, matrix);

            let particles = std::mem::take(&mut swarm.particles);
            swarm.particles = if self.options.parallel {
                particles.into_par_iter().map(step).collect()
            } else {
                particles.into_iter().map(step).collect()
            };

            let improved = swarm.absorb_personal_bests();
            iterations_run += 1;
            fitness_history.push(swarm.global_best_fitness);
            debug!(
                "Iteration {}: inertia {:.3}, best cost {:.4}",
                iteration + 1,
                coefficients.inertia,
                -swarm.global_best_fitness
            );

            if improved {
                stalled_for = 0;
            } else {
                stalled_for += 1;
                if let Some(limit) = self.options.stall_iterations {
                    if stalled_for >= limit {
                        info!("No improvement for {limit} iterations, stopping early");
                        stop_reason = StopReason::Stalled;
                        break;
                    }
                }
            }
        }

        SwarmOutcome {
            best: swarm.global_best,
            best_fitness: swarm.global_best_fitness,
            iterations_run,
            fitness_history,
            stop_reason,
        }
    }
}
