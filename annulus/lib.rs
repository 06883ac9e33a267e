#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod axis;
pub mod calculator;
pub mod config;
pub mod engine;
pub mod grid;
pub mod loader;
pub mod stats;
pub mod types;
pub mod validation;
