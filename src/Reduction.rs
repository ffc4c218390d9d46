/// search for the largest reduction tolerance that keeps a reduced kinetic model
/// within an error threshold of the full model
/// # Examples
/// ```
/// use KiSurf::Reduction::optimization::{optimize, ReactionModel, ReductionError};
/// use nalgebra::DVector;
///
/// struct Mechanism {
///     reactions: Vec<String>,
/// }
/// impl ReactionModel for Mechanism {
///     type Reaction = String;
///     fn core_reactions(&self) -> &[String] {
///         &self.reactions
///     }
/// }
/// let model = Mechanism { reactions: vec!["A=>B".to_string(), "B=>C".to_string()] };
/// let original = DVector::from_vec(vec![1.0, 2.0]);
/// // drops the second reaction once the tolerance exceeds 1e-6, which spoils the observable
/// let mut reducer = |trial: f64, _target: &str, m: &Mechanism, _ctx: &(), _i: usize|
///     -> Result<(DVector<f64>, Vec<String>), ReductionError> {
///     if trial > 1e-6 {
///         Ok((DVector::from_vec(vec![1.0, 3.0]), m.reactions[..1].to_vec()))
///     } else {
///         Ok((DVector::from_vec(vec![1.0, 2.0]), m.reactions.clone()))
///     }
/// };
/// let result = optimize(&mut reducer, "C", &model, &(), 0, 0.05, &original).unwrap();
/// assert!(result.tolerance <= 1e-6);
/// assert_eq!(result.important_reactions.len(), 2);
/// ```
pub mod optimization;

mod optimization_tests;
