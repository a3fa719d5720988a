pub mod config;
pub mod error;
pub mod keyterms;
pub mod models;
pub mod nlp;
pub mod sentiment;
pub mod summarize;
pub mod timestamps;
pub mod transcript;
