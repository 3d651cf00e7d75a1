//! # Data Models
//!
//! SeaORM entities for the back-office schema plus small shared API types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod company;
pub mod contract;
pub mod order;
pub mod pdv;
pub mod provider;
pub mod resource;
pub mod topic;
pub mod user;

pub use company::Entity as Company;
pub use contract::Entity as Contract;
pub use order::Entity as Order;
pub use pdv::Entity as Pdv;
pub use provider::Provider;
pub use resource::Entity as Resource;
pub use topic::Entity as Topic;
pub use user::Entity as User;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "backoffice".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
