// src/lib.rs

pub mod common;
pub mod config;
pub mod db;
pub mod events;
pub mod jobs;
pub mod models;
pub mod notifications;
pub mod services;
