use bigdecimal::BigDecimal;
use chrono::Utc;
use std::sync::Arc;

use crate::domain::commodity::{price_floor, PRICE_SCALE};
use crate::domain::Commodity;
use crate::error::AppError;
use crate::ports::CommodityRepository;

#[derive(Clone)]
pub struct CommodityService {
    commodities: Arc<dyn CommodityRepository>,
}

impl CommodityService {
    pub fn new(commodities: Arc<dyn CommodityRepository>) -> Self {
        Self { commodities }
    }

    pub async fn list(&self) -> Result<Vec<Commodity>, AppError> {
        self.commodities.list_commodities().await
    }

    /// Administrative override of the current price, rounded to cents.
    pub async fn set_price(&self, id: i64, price: BigDecimal) -> Result<Commodity, AppError> {
        let price = price.round(PRICE_SCALE);
        if price < price_floor() {
            return Err(AppError::InvalidArgument(format!(
                "price must be at least {}",
                price_floor()
            )));
        }

        let commodity = self.commodities.update_price(id, &price, Utc::now()).await?;
        tracing::info!(commodity_id = id, price = %commodity.current_price, "Price overridden");

        Ok(commodity)
    }
}
