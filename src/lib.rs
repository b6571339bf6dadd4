pub mod api;
pub mod calc;
pub mod config;
pub mod dataset;
pub mod db;
pub mod risk;
