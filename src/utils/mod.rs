// src/utils/mod.rs

pub mod auth;
pub mod files;
pub mod html;
pub mod text;
