use crate::app::ports::RateSource;
use crate::types::{ConvertedPrices, ExchangeRate, Price, RateOrigin};
use chrono::Local;
use metrics::counter;
use tracing::{info, instrument, warn};

/// Converts prices with a rate resolved once per run
#[derive(Debug, Clone)]
pub struct CurrencyNormalizer {
    rate: ExchangeRate,
}

impl CurrencyNormalizer {
    /// Resolve `base -> quote` once. Any lookup failure falls back to the configured constant.
    #[instrument(skip(source))]
    pub async fn resolve(source: &dyn RateSource, base: &str, quote: &str, fallback_rate: f64) -> Self {
        let (rate, origin) = match source.get_rate(base, quote).await {
            Ok(rate) if rate.is_finite() && rate > 0.0 => {
                info!("Resolved exchange rate {}->{} = {}", base, quote, rate);
                (rate, RateOrigin::Live)
            }
            Ok(rate) => {
                warn!("Rejected exchange rate {} for {}->{}; using fallback {}", rate, base, quote, fallback_rate);
                (fallback_rate, RateOrigin::Fallback)
            }
            Err(e) => {
                warn!("Exchange rate lookup failed ({}); using fallback {}", e, fallback_rate);
                (fallback_rate, RateOrigin::Fallback)
            }
        };
        if origin == RateOrigin::Fallback {
            counter!("market_scraper_rate_fallbacks_total").increment(1);
        }

        Self {
            rate: ExchangeRate {
                base: base.to_string(),
                quote: quote.to_string(),
                rate,
                fetched_at: Local::now(),
                origin,
            },
        }
    }

    pub fn from_rate(rate: ExchangeRate) -> Self {
        Self { rate }
    }

    pub fn rate(&self) -> &ExchangeRate {
        &self.rate
    }

    pub fn convert_price(&self, price: Price) -> Price {
        price.map(|amount| convert(amount, self.rate.rate))
    }

    pub fn mirror(&self, price_initial: Price, price_promo: Price) -> ConvertedPrices {
        ConvertedPrices {
            currency: self.rate.quote.clone(),
            price_initial: self.convert_price(price_initial),
            price_promo: self.convert_price(price_promo),
        }
    }
}

/// `amount * rate` rounded half-up to two fractional digits
pub fn convert(amount: f64, rate: f64) -> f64 {
    round_half_up(amount * rate, 2)
}

pub fn round_half_up(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let scaled = value * factor;
    // Nudge values sitting a representation error below the midpoint.
    let nudged = scaled + scaled.signum() * f64::EPSILON * scaled.abs();
    nudged.round() / factor
}
