//! Data models for the authentication service

pub mod user;

pub use user::{NewUser, User, UserProfile};
