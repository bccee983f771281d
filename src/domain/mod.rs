// Domain layer - Core business types and rules

pub mod model;
pub mod rules;
