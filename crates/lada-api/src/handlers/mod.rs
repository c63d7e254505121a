//! API route handlers

pub mod generate;
pub mod health;
pub mod lifecycle;
pub mod tags;
