#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::cargo)]

pub mod backend;
pub mod change_set;
pub mod common;
pub mod config;
pub mod entity;
pub mod generator;
pub mod initializer;
pub mod report;
pub mod schema;
pub mod sqlite_backend;
pub mod strategies;
pub mod workload;
