// src/quiz/mod.rs

pub mod bank;
pub mod flow;
pub mod scoring;
pub mod session;
pub mod view;
