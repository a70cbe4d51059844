// Domain layer - Core packaging types and rules

pub mod errors;
pub mod model;
pub mod rules;
