// Domain layer - Core business logic

pub mod catalog;
pub mod errors;
pub mod model;
pub mod rules;
pub mod silence;
pub mod usecases;
