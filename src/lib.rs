#![forbid(unsafe_code)]

pub mod app;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod collate;
pub mod config;
pub mod error;
pub mod formats;
pub mod gallery;
pub mod generate;
pub mod listing;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod tree;
