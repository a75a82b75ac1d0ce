// src/handlers/mod.rs

pub mod results;
pub mod submission;
pub mod survey;
