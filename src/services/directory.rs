use bigdecimal::BigDecimal;
use serde::Deserialize;
use std::sync::Arc;

use crate::domain::{Admin, AdminDetails, AppUser, NewAccount, NewAdmin, NewUser};
use crate::error::AppError;
use crate::ports::DirectoryRepository;
use crate::services::auth::hash_password;
use crate::validation::{
    sanitize_string, validate_non_negative_amount, validate_optional, validate_password,
    validate_username, MOBILE_MAX_LEN, NAME_MAX_LEN,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub username: String,
    pub password: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(flatten)]
    pub account: CreateAccountRequest,
    pub initial_wallet_balance: Option<BigDecimal>,
    /// Only honoured on the super-admin route.
    pub admin_id: Option<i64>,
}

#[derive(Clone)]
pub struct DirectoryService {
    directory: Arc<dyn DirectoryRepository>,
}

impl DirectoryService {
    pub fn new(directory: Arc<dyn DirectoryRepository>) -> Self {
        Self { directory }
    }

    pub async fn create_admin(
        &self,
        request: CreateAccountRequest,
        created_by: Option<i64>,
    ) -> Result<Admin, AppError> {
        let account = new_account(request)?;
        let admin = self
            .directory
            .insert_admin(NewAdmin {
                account,
                created_by,
            })
            .await?;

        tracing::info!(admin_id = admin.id, username = %admin.username, "Admin created");
        Ok(admin)
    }

    /// Creates a user owned by `admin_id`, or an unowned user when `None`.
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
        admin_id: Option<i64>,
    ) -> Result<AppUser, AppError> {
        if let Some(admin_id) = admin_id {
            self.directory.find_admin(admin_id).await?;
        }

        let wallet_balance = request
            .initial_wallet_balance
            .unwrap_or_else(|| BigDecimal::from(0));
        validate_non_negative_amount("initialWalletBalance", &wallet_balance)?;

        let account = new_account(request.account)?;
        let user = self
            .directory
            .insert_user(NewUser {
                account,
                wallet_balance,
                admin_id,
            })
            .await?;

        tracing::info!(user_id = user.id, admin_id = ?user.admin_id, "User created");
        Ok(user)
    }

    pub async fn list_admins(&self) -> Result<Vec<Admin>, AppError> {
        self.directory.list_admins().await
    }

    pub async fn list_users(&self) -> Result<Vec<AppUser>, AppError> {
        self.directory.list_users(None).await
    }

    pub async fn users_of_admin(&self, admin_id: i64) -> Result<Vec<AppUser>, AppError> {
        self.directory.list_users(Some(admin_id)).await
    }

    pub async fn admin_details(&self, admin_id: i64) -> Result<AdminDetails, AppError> {
        let admin = self.directory.find_admin(admin_id).await?;
        let user_count = self.directory.count_users_by_admin(admin_id).await?;

        Ok(AdminDetails { admin, user_count })
    }
}

fn new_account(request: CreateAccountRequest) -> Result<NewAccount, AppError> {
    let username = request.username.trim().to_string();
    validate_username(&username)?;
    validate_password(&request.password)?;

    let name = clean_optional(request.name);
    let email = clean_optional(request.email);
    let mobile = clean_optional(request.mobile);
    validate_optional("name", name.as_deref(), NAME_MAX_LEN)?;
    validate_optional("email", email.as_deref(), NAME_MAX_LEN)?;
    validate_optional("mobile", mobile.as_deref(), MOBILE_MAX_LEN)?;

    Ok(NewAccount {
        username,
        password_hash: hash_password(&request.password)?,
        name,
        email,
        mobile,
    })
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| sanitize_string(&v))
        .filter(|v| !v.is_empty())
}
