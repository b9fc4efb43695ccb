#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod io;
pub mod observability;
pub mod pipeline;
pub mod util;
