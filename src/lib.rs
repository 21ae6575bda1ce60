//! Update Monitor - infer system update status from updater logs.

pub mod commands;
pub mod config;
pub mod display;
pub mod inference;
pub mod ipc;
pub mod service;
pub mod source;
pub mod store;
pub mod trigger;
