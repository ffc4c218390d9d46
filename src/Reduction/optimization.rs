//! # Tolerance Search for Model Reduction
//!
//! ## Aim
//! A kinetic model is reduced by dropping reactions that a reduction routine judges
//! unimportant for a target species at a given tolerance: a higher tolerance drops more
//! reactions. This module finds the largest tolerance whose reduced model still reproduces
//! the observables of the full model within a relative error threshold.
//!
//! ## Logic
//! The reduction routine itself is a black box behind `ModelReducer`. Starting from a very
//! small trial tolerance the search calls it, compares the reduced observables against the
//! original ones with `compute_deviation()`, and multiplies the trial by a fixed factor
//! while every deviation stays within the threshold. The sweep is monotonic and stops at
//! the first failing trial or once the trial exceeds the upper bound; the last accepted
//! tolerance and its reaction set are returned.
//!
//! ## Tolerance
//! A value between 0 and 1. High values deem many reactions unimportant and give a much
//! smaller model; low values keep the reduced model close to the full one.
use log::{error, info};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReductionError {
    #[error("Observable length mismatch: original has {original} values, reduced has {reduced}")]
    ObservableLengthMismatch { original: usize, reduced: usize },
    #[error("Observable is empty")]
    EmptyObservable,
    #[error("Model reduction failed at trial tolerance {trial:.2E}: {message}")]
    ReduceModel { trial: f64, message: String },
    #[error("Invalid tolerance search parameters: {0}")]
    InvalidConfig(String),
}

/// kinetic model whose core reaction set can be reduced
pub trait ReactionModel {
    type Reaction: Clone;
    fn core_reactions(&self) -> &[Self::Reaction];
}

/// The external reduction routine: reduces `model` at `trial_tolerance` with respect to
/// `target_label`, simulates reaction system `reaction_system_index` and returns the
/// observables of the reduced model together with the reactions it kept.
pub trait ModelReducer<M: ReactionModel, C> {
    fn reduce_model(
        &mut self,
        trial_tolerance: f64,
        target_label: &str,
        model: &M,
        context: &C,
        reaction_system_index: usize,
    ) -> Result<(DVector<f64>, Vec<M::Reaction>), ReductionError>;
}

impl<M, C, F> ModelReducer<M, C> for F
where
    M: ReactionModel,
    F: FnMut(f64, &str, &M, &C, usize) -> Result<(DVector<f64>, Vec<M::Reaction>), ReductionError>,
{
    fn reduce_model(
        &mut self,
        trial_tolerance: f64,
        target_label: &str,
        model: &M,
        context: &C,
        reaction_system_index: usize,
    ) -> Result<(DVector<f64>, Vec<M::Reaction>), ReductionError> {
        self(
            trial_tolerance,
            target_label,
            model,
            context,
            reaction_system_index,
        )
    }
}

/// parameters of the tolerance sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToleranceSearchConfig {
    /// first trial tolerance
    pub start: f64,
    /// factor applied to the trial after every accepted step
    pub growth_factor: f64,
    /// trials above this value end the search
    pub max_tolerance: f64,
}

impl ToleranceSearchConfig {
    /// The sweep only terminates for a positive start, a growth factor above one and a
    /// finite upper bound.
    pub fn validate(&self) -> Result<(), ReductionError> {
        if !(self.start > 0.0 && self.start.is_finite()) {
            return Err(ReductionError::InvalidConfig(format!(
                "start must be positive and finite, got {}",
                self.start
            )));
        }
        if !(self.growth_factor > 1.0 && self.growth_factor.is_finite()) {
            return Err(ReductionError::InvalidConfig(format!(
                "growth_factor must be finite and greater than 1, got {}",
                self.growth_factor
            )));
        }
        if !self.max_tolerance.is_finite() {
            return Err(ReductionError::InvalidConfig(format!(
                "max_tolerance must be finite, got {}",
                self.max_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for ToleranceSearchConfig {
    fn default() -> Self {
        Self {
            start: 1e-20,
            growth_factor: 10.0,
            max_tolerance: 1.0,
        }
    }
}

/// one call of the reduction routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub tolerance: f64,
    pub max_deviation: f64,
    pub accepted: bool,
}

#[derive(Debug, Clone)]
pub struct ToleranceSearchResult<R> {
    /// last accepted tolerance, or the start value when no trial was accepted
    pub tolerance: f64,
    /// reaction set belonging to `tolerance`
    pub important_reactions: Vec<R>,
    pub trials: Vec<TrialRecord>,
}

/// Searches the most reduced model that keeps every observable within `error` (relative)
/// of `orig_observable`, using the default sweep parameters.
pub fn optimize<M, C, R>(
    reducer: &mut R,
    target_label: &str,
    model: &M,
    context: &C,
    reaction_system_index: usize,
    error: f64,
    orig_observable: &DVector<f64>,
) -> Result<ToleranceSearchResult<M::Reaction>, ReductionError>
where
    M: ReactionModel,
    R: ModelReducer<M, C> + ?Sized,
{
    optimize_with_config(
        reducer,
        target_label,
        model,
        context,
        reaction_system_index,
        error,
        orig_observable,
        &ToleranceSearchConfig::default(),
    )
}

#[allow(clippy::too_many_arguments)]
pub fn optimize_with_config<M, C, R>(
    reducer: &mut R,
    target_label: &str,
    model: &M,
    context: &C,
    reaction_system_index: usize,
    error: f64,
    orig_observable: &DVector<f64>,
    config: &ToleranceSearchConfig,
) -> Result<ToleranceSearchResult<M::Reaction>, ReductionError>
where
    M: ReactionModel,
    R: ModelReducer<M, C> + ?Sized,
{
    config.validate()?;
    let mut tol = config.start;
    let mut trial = config.start;
    let mut important_reactions = model.core_reactions().to_vec();
    let mut trials = Vec::new();

    loop {
        info!("Trial tolerance: {:.2E}", trial);
        let (reduced_observable, new_important_reactions) = reducer.reduce_model(
            trial,
            target_label,
            model,
            context,
            reaction_system_index,
        )?;

        let devs = compute_deviation(orig_observable, &reduced_observable)?;
        // NaN propagates
        let max_deviation = devs
            .iter()
            .fold(0.0_f64, |m, &d| if d.is_nan() || d > m { d } else { m });
        let exceeded = devs.iter().any(|&dev| dev > error || dev.is_nan());

        if exceeded || trial > config.max_tolerance {
            trials.push(TrialRecord {
                tolerance: trial,
                max_deviation,
                accepted: false,
            });
            break;
        }

        trials.push(TrialRecord {
            tolerance: trial,
            max_deviation,
            accepted: true,
        });
        tol = trial;
        trial *= config.growth_factor;
        important_reactions = new_important_reactions;
    }

    if !trials.iter().any(|t| t.accepted) {
        error!("Starting value for tolerance was too high...");
    } else {
        info!(
            "Accepted tolerance {:.2E} keeping {} of {} reactions",
            tol,
            important_reactions.len(),
            model.core_reactions().len()
        );
    }

    Ok(ToleranceSearchResult {
        tolerance: tol,
        important_reactions,
        trials,
    })
}

/// Relative deviation `|(reduced - original) / original|` of every observable.
///
/// An original value of zero gives a deviation of zero if the reduced value is zero too,
/// and infinity otherwise.
pub fn compute_deviation(
    original: &DVector<f64>,
    reduced: &DVector<f64>,
) -> Result<DVector<f64>, ReductionError> {
    if original.len() != reduced.len() {
        return Err(ReductionError::ObservableLengthMismatch {
            original: original.len(),
            reduced: reduced.len(),
        });
    }
    if original.is_empty() {
        return Err(ReductionError::EmptyObservable);
    }
    let devs = original.zip_map(reduced, |o, r| {
        if o == 0.0 {
            if r == 0.0 { 0.0 } else { f64::INFINITY }
        } else {
            ((r - o) / o).abs()
        }
    });

    info!("Deviations: ");
    for dev in devs.iter() {
        info!("{:.2}%", dev * 100.0);
    }
    Ok(devs)
}
