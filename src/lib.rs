pub mod config;
pub mod fetcher;
pub mod matcher;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod storage;
pub mod store;
