// Application layer - Use cases and the ports they depend on
pub mod collaborators;
pub mod hourly_service;
pub mod prediction_pipeline;
