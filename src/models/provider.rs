//! Payment providers a contract, pdv or order is bound to.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[sea_orm(string_value = "pagseguro")]
    PagSeguro,
    #[sea_orm(string_value = "mgpix")]
    MgPix,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::PagSeguro => "pagseguro",
            Provider::MgPix => "mgpix",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
