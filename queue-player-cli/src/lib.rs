pub mod cli;
mod commands;
