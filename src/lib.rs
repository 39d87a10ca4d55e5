//! YaNews - a small news site with comments
//!
//! Anonymous visitors read news and comment threads; registered users post
//! comments and may edit or delete their own.

pub mod config;
pub mod db;
pub mod forms;
pub mod models;
pub mod services;
pub mod theme;
pub mod web;
