// Domain layer - Core extraction rules and types

pub mod errors;
pub mod model;
pub mod rules;
pub mod usecases;
