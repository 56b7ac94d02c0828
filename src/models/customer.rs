use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub contact_email: Option<String>,
    /// Disabled customers cannot activate; existing activations fail
    /// their next phone-home via the normal revalidation path.
    pub is_active: bool,
    pub created_at: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    pub name: String,
    #[serde(default)]
    pub contact_email: Option<String>,
}
