use bigdecimal::BigDecimal;
use std::sync::Arc;

use crate::domain::{Direction, WalletAdjustment, WalletLog};
use crate::error::AppError;
use crate::ports::LedgerRepository;
use crate::validation::validate_positive_amount;

/// Owner of every balance mutation outside order settlement.
#[derive(Clone)]
pub struct WalletLedger {
    ledger: Arc<dyn LedgerRepository>,
}

impl WalletLedger {
    pub fn new(ledger: Arc<dyn LedgerRepository>) -> Self {
        Self { ledger }
    }

    /// Moves `amount` in or out of a user's wallet and returns the new balance.
    pub async fn adjust(
        &self,
        user_id: i64,
        amount: BigDecimal,
        direction: Direction,
    ) -> Result<BigDecimal, AppError> {
        validate_positive_amount("amount", &amount)?;

        let adjustment = WalletAdjustment {
            user_id,
            amount,
            direction,
            order_id: None,
        };

        match self.ledger.adjust_wallet(adjustment.clone()).await {
            Ok(balance) => {
                tracing::info!(
                    user_id,
                    amount = %adjustment.amount,
                    direction = %direction,
                    balance = %balance,
                    "Wallet adjusted"
                );
                Ok(balance)
            }
            Err(e) => {
                tracing::warn!(user_id, direction = %direction, "Wallet adjustment refused: {}", e);
                Err(e)
            }
        }
    }

    pub async fn logs(&self, user_id: i64) -> Result<Vec<WalletLog>, AppError> {
        self.ledger.wallet_logs(user_id).await
    }
}
