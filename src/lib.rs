//! Counterfactual regret minimization for two-player imperfect-information
//! card games.

pub mod accumulator;
pub mod cards;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod evaluate;
pub mod game;
pub mod games;
pub mod history;
pub mod infoset;
pub mod policy;
pub mod regret;
pub mod store;
pub mod trainer;
