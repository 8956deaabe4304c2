//! Tech News - a Guardian technology-news client
//!
//! This crate fetches technology articles from the Guardian content-search
//! API and drives a presentation layer through a small list-controller
//! state machine (idle, loading, loaded, empty, failed).

pub mod config;
pub mod controller;
pub mod fetcher;
pub mod model;
pub mod parser;
pub mod view;
