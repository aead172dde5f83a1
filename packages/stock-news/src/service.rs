pub mod rest;
pub mod persistence;
pub mod worker;
pub mod cli;
pub mod import;
