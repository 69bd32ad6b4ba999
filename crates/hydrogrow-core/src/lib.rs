//! HydroGrow client core.
//!
//! Session lifecycle, authenticated API access and local persistence for the
//! HydroGrow hydroponics app. UI layers drive everything through
//! [`auth::SessionManager`].

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError, Gateway};
pub use auth::{AuthError, Session, SessionManager};
pub use config::Config;
pub use models::{AccountProfile, ItemsResponse, PlantItem, PlantStatus, RegisterConfirmation, UserProfile};
pub use storage::{FileStore, KeyringStore, MemoryStore, PersistenceError, SessionStorage};
