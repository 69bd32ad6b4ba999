//! Data models for HydroGrow API payloads.
//!
//! - `UserProfile`, `AccountProfile`: the authenticated user
//! - `PlantItem`, `PlantStatus`, `ItemsResponse`: dashboard plant cards
//! - `RegisterConfirmation`: result of account creation

pub mod plant;
pub mod user;

pub use plant::{ItemsResponse, PlantItem, PlantStatus};
pub use user::{AccountProfile, RegisterConfirmation, UserProfile};
