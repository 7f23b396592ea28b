//! Rate source trait and test double.

use async_trait::async_trait;
use fxdesk_common::Currency;

use crate::error::FxResult;
use crate::snapshot::SpotRates;

/// Trait for upstream spot rate sources.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Get the source name.
    fn name(&self) -> &str;

    /// Fetch units of each of `symbols` per one unit of `base`.
    async fn fetch(&self, base: Currency, symbols: &[Currency]) -> FxResult<SpotRates>;
}

/// Mock rate source for testing.
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockRateSource;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use super::*;
    use crate::error::FxError;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Serves whatever rates were last set, optionally slow or failing.
    pub struct MockRateSource {
        name: String,
        rates: Mutex<HashMap<Currency, f64>>,
        failure: Mutex<Option<FxError>>,
        delay: Mutex<Option<Duration>>,
        calls: AtomicUsize,
    }

    impl MockRateSource {
        /// Create a new mock source.
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                rates: Mutex::new(HashMap::new()),
                failure: Mutex::new(None),
                delay: Mutex::new(None),
                calls: AtomicUsize::new(0),
            }
        }

        /// Mock seeded with USD-based rates.
        pub fn with_rates(rates: impl IntoIterator<Item = (Currency, f64)>) -> Self {
            let source = Self::new("MOCK");
            for (currency, rate) in rates {
                source.set_rate(currency, rate);
            }
            source
        }

        /// Set a rate per base unit.
        pub fn set_rate(&self, currency: Currency, rate: f64) {
            self.rates.lock().insert(currency, rate);
        }

        /// Fail every fetch with `error` until cleared.
        pub fn fail_with(&self, error: FxError) {
            *self.failure.lock() = Some(error);
        }

        /// Stop failing.
        pub fn recover(&self) {
            self.failure.lock().take();
        }

        /// Delay every fetch.
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock() = Some(delay);
        }

        /// Number of fetches so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for MockRateSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch(&self, base: Currency, symbols: &[Currency]) -> FxResult<SpotRates> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(error) = self.failure.lock().clone() {
                return Err(error);
            }

            let rates = self.rates.lock();
            let selected = symbols
                .iter()
                .filter_map(|c| rates.get(c).map(|r| (*c, *r)));
            Ok(SpotRates::new(base, selected))
        }
    }
}
