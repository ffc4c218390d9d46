#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Reduction;
#[allow(non_snake_case)]
pub mod Surface;
pub mod cli;
pub mod library_manager;
