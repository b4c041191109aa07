pub mod api;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod controller;
pub mod error;
pub mod fare;
pub mod map;
pub mod modes;
pub mod navigator;
pub mod ride;
pub mod state;
pub mod ticker;
pub mod timer;
