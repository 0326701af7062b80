pub mod constraints;
pub mod energy_profile;
pub mod schedule_utils;
pub mod settings_service;
pub mod slot_finder;
pub mod slot_generator;
pub mod slot_scorer;
