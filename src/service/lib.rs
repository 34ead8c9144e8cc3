pub mod acl;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod persistence;
pub mod runpod;
pub mod services;
pub mod supabase;
