//! Simulated market: every tick nudges each commodity price by a bounded
//! random walk.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::commodity::{walk_price, MAX_CHANGE_MICROS};
use crate::error::AppError;
use crate::ports::CommodityRepository;

#[derive(Clone)]
pub struct PriceFeed {
    commodities: Arc<dyn CommodityRepository>,
}

impl PriceFeed {
    pub fn new(commodities: Arc<dyn CommodityRepository>) -> Self {
        Self { commodities }
    }

    /// Runs one tick and returns how many commodities were updated.
    ///
    /// A commodity that fails to update is logged and skipped.
    pub async fn tick<R: Rng + Send>(&self, rng: &mut R) -> Result<usize, AppError> {
        let commodities = self.commodities.list_commodities().await?;

        let mut updated = 0;
        for commodity in commodities {
            let change = rng.gen_range(-MAX_CHANGE_MICROS..MAX_CHANGE_MICROS);
            let price = walk_price(&commodity.current_price, change);

            match self
                .commodities
                .update_price(commodity.id, &price, Utc::now())
                .await
            {
                Ok(_) => {
                    tracing::debug!(
                        commodity_id = commodity.id,
                        from = %commodity.current_price,
                        to = %price,
                        "Price moved"
                    );
                    updated += 1;
                }
                Err(e) => tracing::error!(
                    commodity_id = commodity.id,
                    "Failed to update price for {}: {}",
                    commodity.name,
                    e
                ),
            }
        }

        tracing::info!("Updated prices for {} commodities", updated);
        Ok(updated)
    }

    /// Ticks forever on `interval`. The first tick fires after one interval.
    pub async fn run(self, interval: Duration, seed: Option<u64>) {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        tracing::info!(interval_secs = interval.as_secs(), "Price feed started");

        loop {
            sleep(interval).await;
            if let Err(e) = self.tick(&mut rng).await {
                tracing::error!("Price tick could not list commodities: {}", e);
            }
        }
    }
}
