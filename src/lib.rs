pub mod chromosome;
pub mod dice;
pub mod genetic;
pub mod greedy;
pub mod grid;
pub mod input;
pub mod judge;
pub mod scoring;
pub mod types;
