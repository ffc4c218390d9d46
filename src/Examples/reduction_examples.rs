use crate::Reduction::optimization::{
    ReactionModel, ReductionError, ToleranceSearchConfig, optimize, optimize_with_config,
};
use nalgebra::DVector;

/// first-order channel consuming the target species
#[derive(Debug, Clone)]
pub struct Channel {
    pub equation: String,
    /// rate constant, 1/s
    pub k: f64,
}

/// parallel first-order consumption of one species: [A](t) = [A]0 exp(-sum(k) t)
#[derive(Debug, Clone)]
pub struct ParallelDecay {
    pub channels: Vec<Channel>,
}

impl ReactionModel for ParallelDecay {
    type Reaction = Channel;
    fn core_reactions(&self) -> &[Channel] {
        &self.channels
    }
}

impl ParallelDecay {
    pub fn example() -> Self {
        let channels = [
            ("A => B", 1.0),
            ("A => C", 0.3),
            ("A + M => D + M", 2e-2),
            ("A => E", 1e-3),
            ("A => F", 1e-6),
            ("A => G", 1e-9),
        ]
        .iter()
        .map(|(eq, k)| Channel {
            equation: eq.to_string(),
            k: *k,
        })
        .collect();
        Self { channels }
    }
}

/// concentration of A at the sampling times
pub fn observe(channels: &[Channel], times: &[f64]) -> DVector<f64> {
    let k_total: f64 = channels.iter().map(|c| c.k).sum();
    DVector::from_iterator(times.len(), times.iter().map(|t| (-k_total * t).exp()))
}

/// drops every channel whose share of the total rate is below the tolerance
pub fn reduce_by_rate_share(
    trial: f64,
    _target: &str,
    model: &ParallelDecay,
    times: &Vec<f64>,
    _reaction_system_index: usize,
) -> Result<(DVector<f64>, Vec<Channel>), ReductionError> {
    let k_total: f64 = model.channels.iter().map(|c| c.k).sum();
    if k_total <= 0.0 {
        return Err(ReductionError::ReduceModel {
            trial,
            message: "model has no active channels".to_string(),
        });
    }
    let kept: Vec<Channel> = model
        .channels
        .iter()
        .filter(|c| c.k / k_total >= trial)
        .cloned()
        .collect();
    Ok((observe(&kept, times), kept))
}

pub fn reduction_examples(redtask: usize) {
    //
    let model = ParallelDecay::example();
    let times = vec![0.5, 1.0, 2.0];
    let original = observe(&model.channels, &times);
    match redtask {
        0 => {
            // default sweep 1e-20, 1e-19, ... 1
            let mut reducer = reduce_by_rate_share;
            match optimize(&mut reducer, "A", &model, &times, 0, 0.01, &original) {
                Ok(result) => {
                    println!("tolerance: {:.2E}", result.tolerance);
                    for c in &result.important_reactions {
                        println!("  kept {} (k = {:e})", c.equation, c.k);
                    }
                    for t in &result.trials {
                        println!(
                            "  trial {:.2E}: max deviation {:.3}% {}",
                            t.tolerance,
                            t.max_deviation * 100.0,
                            if t.accepted { "accepted" } else { "rejected" }
                        );
                    }
                    assert!(result.important_reactions.len() < model.channels.len());
                }
                Err(e) => println!("{}", e),
            }
        }
        1 => {
            // finer sweep
            let config = ToleranceSearchConfig {
                start: 1e-6,
                growth_factor: 2.0,
                max_tolerance: 1.0,
            };
            let mut reducer = reduce_by_rate_share;
            match optimize_with_config(&mut reducer, "A", &model, &times, 0, 0.01, &original, &config)
            {
                Ok(result) => println!(
                    "tolerance {:.3E}, {} of {} reactions kept",
                    result.tolerance,
                    result.important_reactions.len(),
                    model.channels.len()
                ),
                Err(e) => println!("{}", e),
            }
        }
        _ => println!("No example with number {}", redtask),
    }
}
