pub mod batch;
pub mod cohort;
pub mod config;
pub mod output;
pub mod render;
pub mod scoring;
