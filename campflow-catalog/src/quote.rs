use campflow_core::quote::{Quote, QuoteRequest};
use campflow_core::services::PricingApi;
use std::sync::Arc;

/// Fetches live quotes keyed by their semantically relevant inputs, caching
/// the last authoritative result and degrading to a clearly flagged local
/// estimate when live pricing is unavailable or no specific site is
/// resolved yet.
pub struct QuoteService {
    pricing: Arc<dyn PricingApi>,
    fallback_tax_rate_bp: u32,
    cached: Option<(QuoteRequest, Quote)>,
}

impl QuoteService {
    pub fn new(pricing: Arc<dyn PricingApi>, fallback_tax_rate_bp: u32) -> Self {
        Self {
            pricing,
            fallback_tax_rate_bp,
            cached: None,
        }
    }

    /// Drop the cached quote; the next call re-fetches.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Resolve a quote for the request. `fallback_per_night_cents` is the
    /// site rate (else class rate) used when estimating. Estimates are never
    /// cached so a later call retries the live path.
    pub async fn quote(&mut self, request: QuoteRequest, fallback_per_night_cents: i64) -> Quote {
        if let Some((key, quote)) = &self.cached {
            if *key == request {
                return quote.clone();
            }
        }

        let nights = request.stay.nights();
        if request.site_id.is_none() {
            return Quote::fallback(fallback_per_night_cents, nights, self.fallback_tax_rate_bp);
        }

        match self.pricing.get_quote(&request).await {
            Ok(quote) => {
                let mut quote = quote.normalized();
                quote.is_estimate = false;
                self.cached = Some((request, quote.clone()));
                quote
            }
            Err(error) => {
                tracing::warn!(%error, "live quote unavailable, using fallback estimate");
                Quote::fallback(fallback_per_night_cents, nights, self.fallback_tax_rate_bp)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campflow_core::error::ApiError;
    use campflow_core::guest::AppliedPromo;
    use campflow_core::site::SiteType;
    use campflow_core::stay::StayRequest;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    struct CountingPricing {
        fail: bool,
        calls: AtomicU32,
    }

    #[async_trait]
    impl PricingApi for CountingPricing {
        async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ApiError::Network("pricing down".into()));
            }
            Ok(Quote {
                per_night_cents: 5000,
                nights: request.stay.nights(),
                base_subtotal_cents: 5000 * request.stay.nights(),
                rules_delta_cents: 0,
                discount_cents: 0,
                referral_discount_cents: 0,
                taxes_cents: 825,
                total_cents: 5000 * request.stay.nights(),
                total_after_discount_cents: 0,
                total_with_taxes_cents: 0,
                tax_waiver_required: false,
                policy_requirements: vec![],
                is_estimate: false,
            })
        }

        async fn validate_promo_code(
            &self,
            _campground_id: Uuid,
            _code: &str,
            _base_total_cents: i64,
        ) -> Result<AppliedPromo, ApiError> {
            Err(ApiError::Validation("unused".into()))
        }
    }

    fn request(site_id: Option<Uuid>) -> QuoteRequest {
        QuoteRequest {
            campground_id: Uuid::new_v4(),
            site_id,
            site_class_id: Uuid::new_v4(),
            stay: StayRequest {
                arrival: "2025-06-10".parse().unwrap(),
                departure: "2025-06-13".parse().unwrap(),
                site_type: SiteType::Rv,
                adults: 2,
                children: 0,
                pet_count: 0,
                pet_types: vec![],
                rig_type: None,
                rig_length_ft: None,
            },
            promo_code: None,
            referral_code: None,
            tax_waiver_signed: false,
        }
    }

    #[tokio::test]
    async fn test_live_quote_is_cached_by_key() {
        let pricing = Arc::new(CountingPricing {
            fail: false,
            calls: AtomicU32::new(0),
        });
        let mut service = QuoteService::new(pricing.clone(), 1000);
        let req = request(Some(Uuid::new_v4()));

        let first = service.quote(req.clone(), 5000).await;
        assert!(!first.is_estimate);
        assert_eq!(first.total_with_taxes_cents, 15_825);

        let second = service.quote(req.clone(), 5000).await;
        assert_eq!(first, second);
        assert_eq!(pricing.calls.load(Ordering::SeqCst), 1);

        // A key change (promo applied) invalidates the cache.
        let mut changed = req;
        changed.promo_code = Some("SAVE10".to_string());
        service.quote(changed, 5000).await;
        assert_eq!(pricing.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_site_resolved_yields_estimate_without_call() {
        let pricing = Arc::new(CountingPricing {
            fail: false,
            calls: AtomicU32::new(0),
        });
        let mut service = QuoteService::new(pricing.clone(), 1000);

        let quote = service.quote(request(None), 4000).await;
        assert!(quote.is_estimate);
        assert_eq!(quote.base_subtotal_cents, 12_000);
        assert_eq!(quote.taxes_cents, 1_200);
        assert_eq!(pricing.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pricing_failure_degrades_to_estimate_and_retries() {
        let pricing = Arc::new(CountingPricing {
            fail: true,
            calls: AtomicU32::new(0),
        });
        let mut service = QuoteService::new(pricing.clone(), 0);
        let req = request(Some(Uuid::new_v4()));

        let quote = service.quote(req.clone(), 5000).await;
        assert!(quote.is_estimate);
        assert_eq!(quote.taxes_cents, 0);

        // Estimates are not cached; the live path is retried.
        service.quote(req, 5000).await;
        assert_eq!(pricing.calls.load(Ordering::SeqCst), 2);
    }
}
