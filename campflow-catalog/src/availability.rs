use campflow_core::error::ApiError;
use campflow_core::services::CatalogApi;
use campflow_core::site::{SiteClass, SiteRecord, SiteStatus, SiteType};
use campflow_core::stay::StayRequest;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default)]
pub struct SiteFilterOptions {
    /// Keep booked/maintenance/locked sites in the result so the caller can
    /// render them with a badge instead of hiding them.
    pub include_unavailable: bool,
}

/// Per-class grouping of matched sites with capacity counts for messaging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassAvailability {
    pub class_id: Uuid,
    pub class_name: String,
    pub total: usize,
    pub available: usize,
    pub sites: Vec<SiteRecord>,
}

/// Count of open inventory for a site type other than the requested one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeCount {
    pub site_type: SiteType,
    pub available: usize,
}

/// Outcome of a matching pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteMatch {
    pub sites: Vec<SiteRecord>,
    pub by_class: Vec<ClassAvailability>,
    /// The catalog returned nothing at all, as opposed to filters reducing
    /// a non-empty result to zero.
    pub catalog_empty: bool,
    /// Earliest alternate arrival (same night count) with matching sites,
    /// probed only when filters reduced a non-empty catalog to zero.
    pub next_opening: Option<NaiveDate>,
    /// Other site types with open inventory for the requested dates.
    pub alternate_types: Vec<TypeCount>,
}

/// Apply the matching rules to a raw catalog result: status, requested type,
/// rig-length constraint, and accessibility.
pub fn filter_sites(
    sites: &[SiteRecord],
    classes: &HashMap<Uuid, SiteClass>,
    stay: &StayRequest,
    accessibility_required: bool,
    opts: SiteFilterOptions,
) -> Vec<SiteRecord> {
    sites
        .iter()
        .filter(|site| opts.include_unavailable || site.status == SiteStatus::Available)
        .filter(|site| site.site_type == stay.site_type)
        .filter(|site| {
            let class = classes.get(&site.site_class_id);
            if stay.rig_is_rv() {
                if let (Some(max), Some(requested)) =
                    (site.resolved_rig_max_length(class), stay.rig_length_ft)
                {
                    if max < requested {
                        return false;
                    }
                }
            }
            if accessibility_required && !site.is_accessible(class) {
                return false;
            }
            true
        })
        .cloned()
        .collect()
}

/// Group matched sites by class; counts come from the full catalog result so
/// "2 of 6 available" messaging stays truthful.
pub fn group_by_class(
    matched: &[SiteRecord],
    raw: &[SiteRecord],
    classes: &HashMap<Uuid, SiteClass>,
) -> Vec<ClassAvailability> {
    let mut order: Vec<Uuid> = Vec::new();
    let mut grouped: HashMap<Uuid, Vec<SiteRecord>> = HashMap::new();
    for site in matched {
        if !grouped.contains_key(&site.site_class_id) {
            order.push(site.site_class_id);
        }
        grouped
            .entry(site.site_class_id)
            .or_default()
            .push(site.clone());
    }

    order
        .into_iter()
        .map(|class_id| {
            let sites = grouped.remove(&class_id).unwrap_or_default();
            let total = raw.iter().filter(|s| s.site_class_id == class_id).count();
            let available = raw
                .iter()
                .filter(|s| s.site_class_id == class_id && s.status == SiteStatus::Available)
                .count();
            let class_name = classes
                .get(&class_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            ClassAvailability {
                class_id,
                class_name,
                total,
                available,
                sites,
            }
        })
        .collect()
}

/// Partition available sites by type, ignoring the requested type filter, to
/// suggest alternates with open inventory.
pub fn alternate_types(raw: &[SiteRecord], requested: SiteType) -> Vec<TypeCount> {
    let mut counts: HashMap<SiteType, usize> = HashMap::new();
    for site in raw {
        if site.status == SiteStatus::Available && site.site_type != requested {
            *counts.entry(site.site_type).or_default() += 1;
        }
    }
    let mut out: Vec<TypeCount> = counts
        .into_iter()
        .map(|(site_type, available)| TypeCount {
            site_type,
            available,
        })
        .collect();
    out.sort_by(|a, b| b.available.cmp(&a.available));
    out
}

/// Normalizes and filters catalog availability for a stay, probing forward
/// for the next opening when filters come up empty.
pub struct AvailabilityMatcher {
    catalog: Arc<dyn CatalogApi>,
    lookahead_days: u32,
}

impl AvailabilityMatcher {
    pub fn new(catalog: Arc<dyn CatalogApi>, lookahead_days: u32) -> Self {
        Self {
            catalog,
            lookahead_days,
        }
    }

    pub async fn search(
        &self,
        campground_id: Uuid,
        stay: &StayRequest,
        classes: &HashMap<Uuid, SiteClass>,
        accessibility_required: bool,
        opts: SiteFilterOptions,
    ) -> Result<SiteMatch, ApiError> {
        // Invalid dates never reach the probe loop.
        if stay.validate().is_err() {
            return Ok(SiteMatch {
                catalog_empty: true,
                ..SiteMatch::default()
            });
        }

        let raw = self.catalog.get_availability(campground_id, stay).await?;
        if raw.is_empty() {
            // Distinct from "filtered to zero": nothing to suggest from.
            return Ok(SiteMatch {
                catalog_empty: true,
                ..SiteMatch::default()
            });
        }

        let matched = filter_sites(&raw, classes, stay, accessibility_required, opts);
        let by_class = group_by_class(&matched, &raw, classes);

        let mut result = SiteMatch {
            sites: matched,
            by_class,
            catalog_empty: false,
            next_opening: None,
            alternate_types: Vec::new(),
        };

        if result.sites.is_empty() {
            result.next_opening = self
                .probe_next_opening(campground_id, stay, classes, accessibility_required)
                .await;
            result.alternate_types = alternate_types(&raw, stay.site_type);
        }

        Ok(result)
    }

    /// Probe subsequent days holding the night count constant, bounded by
    /// the configured lookahead. Probe failures end the scan quietly; the
    /// suggestion is an extra, not a requirement.
    async fn probe_next_opening(
        &self,
        campground_id: Uuid,
        stay: &StayRequest,
        classes: &HashMap<Uuid, SiteClass>,
        accessibility_required: bool,
    ) -> Option<NaiveDate> {
        for offset in 1..=i64::from(self.lookahead_days) {
            let shifted = stay.shifted(offset);
            let raw = match self.catalog.get_availability(campground_id, &shifted).await {
                Ok(raw) => raw,
                Err(error) => {
                    tracing::warn!(%error, offset, "next-opening probe failed");
                    return None;
                }
            };
            let matched = filter_sites(
                &raw,
                classes,
                &shifted,
                accessibility_required,
                SiteFilterOptions::default(),
            );
            if !matched.is_empty() {
                return Some(shifted.arrival);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use campflow_core::site::Hookups;
    use std::sync::Mutex;

    fn class(site_type: SiteType, accessible: bool) -> SiteClass {
        SiteClass {
            id: Uuid::new_v4(),
            name: "Standard".to_string(),
            site_type,
            default_rate_cents: 5000,
            max_occupancy: 6,
            hookups: Hookups::default(),
            pet_friendly: true,
            accessible,
            rig_max_length_ft: Some(35),
            photo_url: None,
        }
    }

    fn site(class: &SiteClass, status: SiteStatus) -> SiteRecord {
        SiteRecord {
            id: Uuid::new_v4(),
            name: "Site".to_string(),
            site_number: "1".to_string(),
            site_class_id: class.id,
            site_type: class.site_type,
            status,
            default_rate_cents: None,
            rig_max_length_ft: None,
            accessible: None,
        }
    }

    fn stay() -> StayRequest {
        StayRequest {
            arrival: "2025-06-10".parse().unwrap(),
            departure: "2025-06-13".parse().unwrap(),
            site_type: SiteType::Rv,
            adults: 2,
            children: 0,
            pet_count: 0,
            pet_types: vec![],
            rig_type: None,
            rig_length_ft: None,
        }
    }

    fn class_map(classes: &[&SiteClass]) -> HashMap<Uuid, SiteClass> {
        classes.iter().map(|c| (c.id, (*c).clone())).collect()
    }

    #[test]
    fn test_filters_by_status_and_type() {
        let rv = class(SiteType::Rv, false);
        let tent = class(SiteType::Tent, false);
        let sites = vec![
            site(&rv, SiteStatus::Available),
            site(&rv, SiteStatus::Booked),
            site(&tent, SiteStatus::Available),
        ];
        let classes = class_map(&[&rv, &tent]);

        let matched = filter_sites(&sites, &classes, &stay(), false, SiteFilterOptions::default());
        assert_eq!(matched.len(), 1);

        let with_badges = filter_sites(
            &sites,
            &classes,
            &stay(),
            false,
            SiteFilterOptions {
                include_unavailable: true,
            },
        );
        assert_eq!(with_badges.len(), 2);
    }

    #[test]
    fn test_rig_too_long_is_excluded() {
        let rv = class(SiteType::Rv, false);
        let mut short_site = site(&rv, SiteStatus::Available);
        short_site.rig_max_length_ft = Some(25);
        let long_site = site(&rv, SiteStatus::Available); // class default 35
        let classes = class_map(&[&rv]);

        let mut request = stay();
        request.rig_type = Some("motorhome".to_string());
        request.rig_length_ft = Some(30);

        let matched = filter_sites(
            &[short_site.clone(), long_site.clone()],
            &classes,
            &request,
            false,
            SiteFilterOptions::default(),
        );
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, long_site.id);

        // A car rig does not trigger the length constraint
        request.rig_type = Some("van".to_string());
        let matched = filter_sites(
            &[short_site, long_site],
            &classes,
            &request,
            false,
            SiteFilterOptions::default(),
        );
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_accessibility_filter_uses_both_levels() {
        let inaccessible = class(SiteType::Rv, false);
        let accessible_class = class(SiteType::Rv, true);
        let mut flagged_site = site(&inaccessible, SiteStatus::Available);
        flagged_site.accessible = Some(true);
        let plain_site = site(&inaccessible, SiteStatus::Available);
        let class_site = site(&accessible_class, SiteStatus::Available);
        let classes = class_map(&[&inaccessible, &accessible_class]);

        let matched = filter_sites(
            &[flagged_site, plain_site, class_site],
            &classes,
            &stay(),
            true,
            SiteFilterOptions::default(),
        );
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_group_counts_come_from_raw_result() {
        let rv = class(SiteType::Rv, false);
        let raw = vec![
            site(&rv, SiteStatus::Available),
            site(&rv, SiteStatus::Booked),
            site(&rv, SiteStatus::Maintenance),
        ];
        let classes = class_map(&[&rv]);
        let matched = filter_sites(&raw, &classes, &stay(), false, SiteFilterOptions::default());
        let grouped = group_by_class(&matched, &raw, &classes);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].total, 3);
        assert_eq!(grouped[0].available, 1);
        assert_eq!(grouped[0].sites.len(), 1);
    }

    struct ScriptedCatalog {
        // One response per call, in order.
        responses: Mutex<Vec<Vec<SiteRecord>>>,
        calls: Mutex<u32>,
    }

    #[async_trait]
    impl CatalogApi for ScriptedCatalog {
        async fn get_availability(
            &self,
            _campground_id: Uuid,
            _stay: &StayRequest,
        ) -> Result<Vec<SiteRecord>, ApiError> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(vec![])
            } else {
                Ok(responses.remove(0))
            }
        }
    }

    #[tokio::test]
    async fn test_probe_finds_next_opening() {
        let rv = class(SiteType::Rv, false);
        let classes = class_map(&[&rv]);
        // Day 0: only a booked site. Days +1, +2: nothing. Day +3: open.
        let catalog = Arc::new(ScriptedCatalog {
            responses: Mutex::new(vec![
                vec![site(&rv, SiteStatus::Booked)],
                vec![],
                vec![],
                vec![site(&rv, SiteStatus::Available)],
            ]),
            calls: Mutex::new(0),
        });
        let matcher = AvailabilityMatcher::new(catalog.clone(), 7);

        let result = matcher
            .search(
                Uuid::new_v4(),
                &stay(),
                &classes,
                false,
                SiteFilterOptions::default(),
            )
            .await
            .unwrap();
        assert!(result.sites.is_empty());
        assert!(!result.catalog_empty);
        assert_eq!(result.next_opening, Some("2025-06-13".parse().unwrap()));
    }

    #[tokio::test]
    async fn test_probe_is_bounded_by_lookahead() {
        let rv = class(SiteType::Rv, false);
        let classes = class_map(&[&rv]);
        let catalog = Arc::new(ScriptedCatalog {
            responses: Mutex::new(vec![vec![site(&rv, SiteStatus::Booked)]]),
            calls: Mutex::new(0),
        });
        let matcher = AvailabilityMatcher::new(catalog.clone(), 3);

        let result = matcher
            .search(
                Uuid::new_v4(),
                &stay(),
                &classes,
                false,
                SiteFilterOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(result.next_opening, None);
        // 1 initial fetch + 3 bounded probes
        assert_eq!(*catalog.calls.lock().unwrap(), 4);
    }

    #[tokio::test]
    async fn test_empty_catalog_skips_probe() {
        let catalog = Arc::new(ScriptedCatalog {
            responses: Mutex::new(vec![vec![]]),
            calls: Mutex::new(0),
        });
        let matcher = AvailabilityMatcher::new(catalog.clone(), 7);

        let result = matcher
            .search(
                Uuid::new_v4(),
                &stay(),
                &HashMap::new(),
                false,
                SiteFilterOptions::default(),
            )
            .await
            .unwrap();
        assert!(result.catalog_empty);
        assert_eq!(result.next_opening, None);
        assert_eq!(*catalog.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_alternate_types_ignore_requested_filter() {
        let rv = class(SiteType::Rv, false);
        let tent = class(SiteType::Tent, false);
        let classes = class_map(&[&rv, &tent]);
        let raw = vec![
            site(&rv, SiteStatus::Booked),
            site(&tent, SiteStatus::Available),
            site(&tent, SiteStatus::Available),
        ];
        let catalog = Arc::new(ScriptedCatalog {
            responses: Mutex::new(vec![raw]),
            calls: Mutex::new(0),
        });
        let matcher = AvailabilityMatcher::new(catalog, 0);

        let result = matcher
            .search(
                Uuid::new_v4(),
                &stay(),
                &classes,
                false,
                SiteFilterOptions::default(),
            )
            .await
            .unwrap();
        assert!(result.sites.is_empty());
        assert_eq!(
            result.alternate_types,
            vec![TypeCount {
                site_type: SiteType::Tent,
                available: 2
            }]
        );
    }
}
