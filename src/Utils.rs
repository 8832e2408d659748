//! different utility modules used throughout the project
/// logger initialisation and saving optimization trajectories into csv
pub mod logger;
