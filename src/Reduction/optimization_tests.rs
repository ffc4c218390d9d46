/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Reduction::optimization::{
        ModelReducer, ReactionModel, ReductionError, ToleranceSearchConfig, compute_deviation,
        optimize, optimize_with_config,
    };
    use approx::assert_relative_eq;
    use nalgebra::DVector;

    struct Mechanism {
        reactions: Vec<String>,
    }

    impl ReactionModel for Mechanism {
        type Reaction = String;
        fn core_reactions(&self) -> &[String] {
            &self.reactions
        }
    }

    fn mechanism() -> Mechanism {
        Mechanism {
            reactions: (1..=6).map(|i| format!("R{}", i)).collect(),
        }
    }

    /// keeps fewer reactions as the tolerance grows; the observable breaks once the
    /// tolerance passes `breaking_point`
    struct StepReducer {
        breaking_point: f64,
        calls: Vec<f64>,
    }

    impl ModelReducer<Mechanism, ()> for StepReducer {
        fn reduce_model(
            &mut self,
            trial_tolerance: f64,
            _target_label: &str,
            model: &Mechanism,
            _context: &(),
            _reaction_system_index: usize,
        ) -> Result<(DVector<f64>, Vec<String>), ReductionError> {
            self.calls.push(trial_tolerance);
            let keep = model.reactions.len() - self.calls.len().min(model.reactions.len() - 1);
            let kept = model.reactions[..keep].to_vec();
            if trial_tolerance > self.breaking_point {
                Ok((DVector::from_vec(vec![1.0, 2.2]), kept))
            } else {
                Ok((DVector::from_vec(vec![1.0, 2.0]), kept))
            }
        }
    }

    #[test]
    fn test_compute_deviation() {
        let devs = compute_deviation(
            &DVector::from_vec(vec![1.0]),
            &DVector::from_vec(vec![1.1]),
        )
        .unwrap();
        assert_eq!(devs.len(), 1);
        assert_relative_eq!(devs[0], 0.1, epsilon = 1e-12);

        let devs = compute_deviation(
            &DVector::from_vec(vec![2.0, -4.0]),
            &DVector::from_vec(vec![1.0, -5.0]),
        )
        .unwrap();
        assert_relative_eq!(devs[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(devs[1], 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_compute_deviation_zero_original() {
        let devs = compute_deviation(
            &DVector::from_vec(vec![0.0, 0.0]),
            &DVector::from_vec(vec![0.0, 1e-30]),
        )
        .unwrap();
        assert_eq!(devs[0], 0.0);
        assert!(devs[1].is_infinite());
    }

    #[test]
    fn test_compute_deviation_shape_errors() {
        assert!(matches!(
            compute_deviation(
                &DVector::from_vec(vec![1.0, 2.0]),
                &DVector::from_vec(vec![1.0])
            ),
            Err(ReductionError::ObservableLengthMismatch {
                original: 2,
                reduced: 1
            })
        ));
        assert!(matches!(
            compute_deviation(&DVector::from_vec(vec![]), &DVector::from_vec(vec![])),
            Err(ReductionError::EmptyObservable)
        ));
    }

    #[test]
    fn test_optimize_returns_last_passing_tolerance() {
        let model = mechanism();
        let original = DVector::from_vec(vec![1.0, 2.0]);
        let mut reducer = StepReducer {
            breaking_point: 5e-17,
            calls: Vec::new(),
        };
        let result = optimize(&mut reducer, "CO", &model, &(), 0, 0.05, &original).unwrap();

        // trials 1e-20, 1e-19, 1e-18, 1e-17 pass, 1e-16 breaks the observable
        assert_eq!(reducer.calls.len(), 5);
        assert_relative_eq!(result.tolerance, 1e-17, max_relative = 1e-9);
        // reaction set of the fourth call
        assert_eq!(result.important_reactions, model.reactions[..2].to_vec());
        assert_eq!(result.trials.len(), 5);
        assert!(result.trials[..4].iter().all(|t| t.accepted));
        assert!(!result.trials[4].accepted);
        assert_relative_eq!(result.trials[4].max_deviation, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_optimize_first_trial_fails() {
        let model = mechanism();
        let original = DVector::from_vec(vec![1.0, 2.0]);
        let mut reducer = StepReducer {
            breaking_point: 0.0,
            calls: Vec::new(),
        };
        let result = optimize(&mut reducer, "CO", &model, &(), 0, 0.05, &original).unwrap();
        assert_eq!(result.tolerance, 1e-20);
        assert_eq!(result.important_reactions, model.reactions);
        assert_eq!(result.trials.len(), 1);
        assert!(!result.trials[0].accepted);
    }

    #[test]
    fn test_optimize_stops_at_upper_bound() {
        let model = mechanism();
        let original = DVector::from_vec(vec![1.0, 2.0]);
        let mut reducer = StepReducer {
            breaking_point: f64::INFINITY,
            calls: Vec::new(),
        };
        let result = optimize(&mut reducer, "CO", &model, &(), 0, 0.05, &original).unwrap();
        let last = result.trials.last().unwrap();
        assert!(!last.accepted);
        assert!(last.tolerance > 1.0);
        assert!(result.tolerance <= 1.0);
        assert!(result.tolerance >= 0.1 * (1.0 - 1e-9));
        assert!(result.trials[..result.trials.len() - 1]
            .iter()
            .all(|t| t.accepted));
    }

    #[test]
    fn test_optimize_with_closure_and_context() {
        let model = mechanism();
        let original = DVector::from_vec(vec![10.0, 20.0, 30.0]);
        // context: the tolerance at which the model starts to drift
        let drift_from = 4e-3_f64;
        let mut seen_index = None;
        let mut reducer = |trial: f64,
                           target: &str,
                           m: &Mechanism,
                           ctx: &f64,
                           index: usize|
         -> Result<(DVector<f64>, Vec<String>), ReductionError> {
            assert_eq!(target, "OH");
            seen_index = Some(index);
            let scale = if trial >= *ctx { 1.2 } else { 1.0 };
            Ok((
                DVector::from_vec(vec![10.0, 20.0 * scale, 30.0]),
                m.reactions[..3].to_vec(),
            ))
        };
        let config = ToleranceSearchConfig {
            start: 1e-3,
            growth_factor: 2.0,
            max_tolerance: 1.0,
        };
        let result = optimize_with_config(
            &mut reducer,
            "OH",
            &model,
            &drift_from,
            2,
            0.05,
            &original,
            &config,
        )
        .unwrap();
        assert_eq!(seen_index, Some(2));
        // 1e-3 and 2e-3 pass, 4e-3 drifts
        assert_relative_eq!(result.tolerance, 2e-3, epsilon = 1e-15);
        assert_eq!(result.important_reactions.len(), 3);
        assert_eq!(result.trials.len(), 3);
    }

    #[test]
    fn test_optimize_propagates_reducer_errors() {
        let model = mechanism();
        let original = DVector::from_vec(vec![1.0]);
        let mut reducer = |trial: f64,
                           _target: &str,
                           _m: &Mechanism,
                           _ctx: &(),
                           _index: usize|
         -> Result<(DVector<f64>, Vec<String>), ReductionError> {
            Err(ReductionError::ReduceModel {
                trial,
                message: "simulation diverged".to_string(),
            })
        };
        let result = optimize(&mut reducer, "CO", &model, &(), 0, 0.05, &original);
        assert!(matches!(result, Err(ReductionError::ReduceModel { .. })));
    }

    #[test]
    fn test_optimize_rejects_nan_observables() {
        let model = mechanism();
        let original = DVector::from_vec(vec![1.0]);
        let mut reducer = |_trial: f64,
                           _target: &str,
                           m: &Mechanism,
                           _ctx: &(),
                           _index: usize|
         -> Result<(DVector<f64>, Vec<String>), ReductionError> {
            Ok((DVector::from_vec(vec![f64::NAN]), m.reactions.clone()))
        };
        let result = optimize(&mut reducer, "CO", &model, &(), 0, 0.05, &original).unwrap();
        assert_eq!(result.tolerance, 1e-20);
        assert!(!result.trials[0].accepted);
        assert!(result.trials[0].max_deviation.is_nan());
    }

    #[test]
    fn test_max_deviation_keeps_nan_among_finite_values() {
        let model = mechanism();
        let original = DVector::from_vec(vec![1.0, 1.0, 1.0]);
        let mut reducer = |_trial: f64,
                           _target: &str,
                           m: &Mechanism,
                           _ctx: &(),
                           _index: usize|
         -> Result<(DVector<f64>, Vec<String>), ReductionError> {
            Ok((DVector::from_vec(vec![1.01, f64::NAN, 1.02]), m.reactions.clone()))
        };
        let result = optimize(&mut reducer, "CO", &model, &(), 0, 0.05, &original).unwrap();
        assert_eq!(result.trials.len(), 1);
        assert!(result.trials[0].max_deviation.is_nan());
    }

    #[test]
    fn test_invalid_sweep_parameters_are_rejected() {
        let model = mechanism();
        let original = DVector::from_vec(vec![1.0, 2.0]);
        let defaults = ToleranceSearchConfig::default();
        let bad_configs = [
            ToleranceSearchConfig { growth_factor: 1.0, ..defaults },
            ToleranceSearchConfig { growth_factor: 0.5, ..defaults },
            ToleranceSearchConfig { growth_factor: f64::NAN, ..defaults },
            ToleranceSearchConfig { start: 0.0, ..defaults },
            ToleranceSearchConfig { start: -1e-3, ..defaults },
            ToleranceSearchConfig { max_tolerance: f64::NAN, ..defaults },
            ToleranceSearchConfig { max_tolerance: f64::INFINITY, ..defaults },
        ];
        for config in bad_configs {
            let mut calls = 0usize;
            // always accepts, so only validation can end the search
            let mut reducer = |_trial: f64,
                               _target: &str,
                               m: &Mechanism,
                               _ctx: &(),
                               _index: usize|
             -> Result<(DVector<f64>, Vec<String>), ReductionError> {
                calls += 1;
                if calls > 1000 {
                    return Err(ReductionError::ReduceModel {
                        trial: 0.0,
                        message: "sweep did not terminate".to_string(),
                    });
                }
                Ok((DVector::from_vec(vec![1.0, 2.0]), m.reactions.clone()))
            };
            let result = optimize_with_config(
                &mut reducer,
                "CO",
                &model,
                &(),
                0,
                0.05,
                &original,
                &config,
            );
            assert!(
                matches!(result, Err(ReductionError::InvalidConfig(_))),
                "{:?} was accepted",
                config
            );
            assert_eq!(calls, 0);
        }
        assert!(defaults.validate().is_ok());
    }
}
