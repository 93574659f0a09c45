pub mod activity;
pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod runtime;
pub mod web;
