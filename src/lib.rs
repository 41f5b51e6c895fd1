pub mod app;
pub mod blast;
pub mod centroids;
pub mod config;
pub mod domain;
pub mod error;
pub mod hits;
pub mod join;
pub mod output;
pub mod partition;
pub mod plot;
pub mod workspace;
