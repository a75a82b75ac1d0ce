// src/models/mod.rs

pub mod element;
pub mod participant;
pub mod response;
pub mod survey;
