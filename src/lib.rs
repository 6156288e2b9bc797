pub mod config;
pub mod crossover;
pub mod data;
pub mod engine;
pub mod export;
pub mod fitness;
pub mod model;
pub mod mutation;
pub mod render;
pub mod selection;
