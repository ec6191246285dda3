pub mod classify;
pub mod config;
pub mod doctor;
pub mod reset;
pub mod stats;
pub mod status;
