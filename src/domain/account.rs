//! Directory entities for the three role tiers.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(AccountStatus::Active),
            "INACTIVE" => Ok(AccountStatus::Inactive),
            other => Err(AppError::InvalidArgument(format!(
                "unknown account status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "super_admin" => Ok(Role::SuperAdmin),
            other => Err(AppError::InvalidArgument(format!("unknown role '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub wallet_balance: BigDecimal,
    pub admin_id: Option<i64>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Admin {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub status: AccountStatus,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SuperAdmin {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields shared by every account insert.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub account: NewAccount,
    pub wallet_balance: BigDecimal,
    pub admin_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub account: NewAccount,
    pub created_by: Option<i64>,
}

/// Who is acting: the result of a login or of a token lookup.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", content = "account", rename_all = "snake_case")]
pub enum Principal {
    User(AppUser),
    Admin(Admin),
    SuperAdmin(SuperAdmin),
}

/// Role-agnostic projection of a [`Principal`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn identity(&self) -> Identity {
        let (id, username, role) = match self {
            Principal::User(user) => (user.id, &user.username, Role::User),
            Principal::Admin(admin) => (admin.id, &admin.username, Role::Admin),
            Principal::SuperAdmin(root) => (root.id, &root.username, Role::SuperAdmin),
        };

        Identity {
            id,
            username: username.clone(),
            role,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Principal::User(user) => &user.password_hash,
            Principal::Admin(admin) => &admin.password_hash,
            Principal::SuperAdmin(root) => &root.password_hash,
        }
    }

    pub fn status(&self) -> AccountStatus {
        match self {
            Principal::User(user) => user.status,
            Principal::Admin(admin) => admin.status,
            Principal::SuperAdmin(root) => root.status,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDetails {
    pub admin: Admin,
    pub user_count: i64,
}
