/// walkthroughs of the metal surface database
pub mod surface_examples;
/// tolerance search on a small analytic kinetic model
pub mod reduction_examples;
