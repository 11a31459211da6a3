#![deny(warnings, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod business;
pub mod classification;
pub mod cli;
pub mod clients;
pub mod config;
pub mod locations;
pub mod observability;
pub mod pipeline;
pub mod util;
