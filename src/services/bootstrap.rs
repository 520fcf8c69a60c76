//! Idempotent seeding of reference data and bootstrap accounts.

use bigdecimal::BigDecimal;

use crate::domain::{NewAccount, NewAdmin, NewCommodity, NewUser, Principal, SuperAdmin};
use crate::error::AppError;
use crate::ports::Store;
use crate::services::auth::hash_password;

pub const SUPERADMIN_USERNAME: &str = "superadmin";

const DEFAULT_COMMODITIES: &[(&str, &str, i64)] = &[
    ("Gold", "oz", 200_000),
    ("Silver", "oz", 2_550),
    ("Wheat", "bushel", 725),
    ("Rice", "cwt", 1_580),
    ("Crude Oil", "barrel", 7_530),
    ("Copper", "lb", 415),
    ("Cotton", "lb", 72),
];

const SAMPLE_ADMIN_PASSWORD: &str = "admin123";
const SAMPLE_USER_PASSWORD: &str = "user123";

#[derive(Debug, Clone, Default)]
pub struct SeedOptions {
    pub superadmin_password: Option<String>,
    pub sample_accounts: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub commodities: usize,
    pub superadmin: bool,
    pub sample_accounts: bool,
}

pub async fn seed(store: &dyn Store, options: &SeedOptions) -> Result<SeedReport, AppError> {
    let mut report = SeedReport::default();

    if store.list_commodities().await?.is_empty() {
        for (name, unit, cents) in DEFAULT_COMMODITIES {
            store
                .insert_commodity(NewCommodity {
                    name: name.to_string(),
                    unit: unit.to_string(),
                    current_price: BigDecimal::new((*cents).into(), 2),
                })
                .await?;
        }
        report.commodities = DEFAULT_COMMODITIES.len();
        tracing::info!("Commodities initialized: {} items", report.commodities);
    }

    let mut superadmin = find_superadmin(store).await?;
    if superadmin.is_none() {
        if let Some(password) = &options.superadmin_password {
            let created = store
                .insert_super_admin(NewAccount {
                    username: SUPERADMIN_USERNAME.to_string(),
                    password_hash: hash_password(password)?,
                    name: Some("Super Administrator".to_string()),
                    email: None,
                    mobile: None,
                })
                .await?;
            tracing::info!(id = created.id, "Super admin created");
            report.superadmin = true;
            superadmin = Some(created);
        }
    }

    if options.sample_accounts {
        match &superadmin {
            Some(root) => {
                if store.list_admins().await?.is_empty() {
                    seed_sample_accounts(store, root.id).await?;
                    report.sample_accounts = true;
                }
            }
            None => tracing::warn!("Sample accounts skipped: no super admin to own them"),
        }
    }

    Ok(report)
}

async fn find_superadmin(store: &dyn Store) -> Result<Option<SuperAdmin>, AppError> {
    let found = store
        .find_principals_by_username(SUPERADMIN_USERNAME)
        .await?
        .into_iter()
        .find_map(|principal| match principal {
            Principal::SuperAdmin(root) => Some(root),
            _ => None,
        });

    Ok(found)
}

async fn seed_sample_accounts(store: &dyn Store, superadmin_id: i64) -> Result<(), AppError> {
    let admin = store
        .insert_admin(NewAdmin {
            account: NewAccount {
                username: "admin1".to_string(),
                password_hash: hash_password(SAMPLE_ADMIN_PASSWORD)?,
                name: Some("Sample Admin".to_string()),
                email: None,
                mobile: None,
            },
            created_by: Some(superadmin_id),
        })
        .await?;

    store
        .insert_user(NewUser {
            account: NewAccount {
                username: "user1".to_string(),
                password_hash: hash_password(SAMPLE_USER_PASSWORD)?,
                name: Some("Sample User".to_string()),
                email: None,
                mobile: None,
            },
            wallet_balance: BigDecimal::new(1_000_000.into(), 2),
            admin_id: Some(admin.id),
        })
        .await?;

    tracing::info!("Sample admin and user created");
    Ok(())
}
