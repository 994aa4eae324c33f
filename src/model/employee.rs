use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Employee {
    pub id: u64,
    pub employee_code: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
    pub status: Option<String>,
}
