use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// An account owner. Authentication lives outside this crate; users exist
/// here so accounts and transfers have a real owner to reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub mail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub mail: String,
}
