//! Campaign aggregation - Read-side rollups of the attribution ledger for dashboards.
//!
//! Clicks, conversions and commissions for one shop are bucketed by campaign slug. Events
//! without a slug, or whose slug is no longer in the shop's registry, land in the general
//! bucket; nothing is dropped. Bucket earnings follow the requested [`EarningsView`],
//! while `totals.earnings_by_status` always breaks down every status so the two can be
//! reconciled.

use crate::{
    core::{campaign, shop},
    entities::{
        ClickEvent, CommissionEntry, CommissionStatus, ReferralApplication, click_event,
        commission_entry, referral_application,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Which commission statuses count toward bucket earnings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningsView {
    /// `pending` and `approved`: revenue not yet settled
    #[default]
    PendingRevenue,
    /// `paid` only
    PaidOnly,
    /// Every status, including `cancelled`
    AllStatuses,
}

impl EarningsView {
    /// Returns whether entries in `status` are summed under this view.
    #[must_use]
    pub const fn includes(self, status: CommissionStatus) -> bool {
        match self {
            Self::PendingRevenue => {
                matches!(status, CommissionStatus::Pending | CommissionStatus::Approved)
            }
            Self::PaidOnly => matches!(status, CommissionStatus::Paid),
            Self::AllStatuses => true,
        }
    }
}

/// Bounds on `created_at`: inclusive start, exclusive end. Open when `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Earliest instant included
    pub start: Option<DateTime<Utc>>,
    /// First instant excluded
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Builds a range, rejecting one that ends before it starts.
    ///
    /// # Errors
    /// Returns a `Validation` error if `end` precedes `start`.
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(Error::Validation {
                    message: format!("Date range ends ({end}) before it starts ({start})"),
                });
            }
        }
        Ok(Self { start, end })
    }

    /// Returns whether `instant` falls inside the range.
    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| instant >= start) && self.end.is_none_or(|end| instant < end)
    }

    fn condition<C: ColumnTrait>(&self, column: C) -> Condition {
        let mut condition = Condition::all();
        if let Some(start) = self.start {
            condition = condition.add(column.gte(start));
        }
        if let Some(end) = self.end {
            condition = condition.add(column.lt(end));
        }
        condition
    }
}

/// Counters for one bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct BucketStats {
    /// Referral link visits
    pub clicks: u64,
    /// Attributed signups
    pub conversions: u64,
    /// Commission amounts included by the view
    pub earnings_sum: f64,
}

impl BucketStats {
    /// Conversions per click, `0.0` when there were no clicks.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn conversion_rate(&self) -> f64 {
        if self.clicks == 0 {
            return 0.0;
        }
        self.conversions as f64 / self.clicks as f64
    }
}

/// Shop-wide totals, independent of bucketing.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Totals {
    /// All clicks in range
    pub clicks: u64,
    /// All attributed signups in range
    pub conversions: u64,
    /// Distinct shops that signed up through this shop
    pub referred_shops: u64,
    /// Commission sums for every status, zero-filled
    pub earnings_by_status: BTreeMap<CommissionStatus, f64>,
}

/// A shop's referral dashboard.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CampaignReport {
    /// Buckets keyed by registered campaign slug
    pub per_campaign: BTreeMap<String, BucketStats>,
    /// Untagged and stale-tagged activity
    pub general: BucketStats,
    /// Shop-wide totals
    pub totals: Totals,
    /// View used for `earnings_sum`
    pub view: EarningsView,
}

impl CampaignReport {
    /// Finds the bucket for a slug, or the general bucket for `None`.
    #[must_use]
    pub fn bucket(&self, slug: Option<&str>) -> Option<&BucketStats> {
        match slug {
            Some(slug) => self.per_campaign.get(slug),
            None => Some(&self.general),
        }
    }

    fn bucket_mut(&mut self, registry: &BTreeSet<String>, slug: Option<&str>) -> &mut BucketStats {
        match slug.filter(|slug| registry.contains(*slug)) {
            Some(slug) => self.per_campaign.entry(slug.to_string()).or_default(),
            None => &mut self.general,
        }
    }
}

/// Aggregates a shop's referral activity with the default pending-revenue view.
pub async fn aggregate(
    db: &DatabaseConnection,
    shop_id: i64,
    date_range: Option<DateRange>,
) -> Result<CampaignReport> {
    aggregate_with_view(db, shop_id, date_range, EarningsView::default()).await
}

/// Aggregates a shop's referral activity with an explicit earnings view.
///
/// Every registered campaign gets a bucket, even with no activity.
///
/// # Errors
/// Returns `ShopNotFound` for an unknown shop, or a database error.
#[tracing::instrument(skip(db))]
pub async fn aggregate_with_view(
    db: &DatabaseConnection,
    shop_id: i64,
    date_range: Option<DateRange>,
    view: EarningsView,
) -> Result<CampaignReport> {
    shop::get_shop(db, shop_id).await?;
    let range = date_range.unwrap_or_default();
    let registry: BTreeSet<String> = campaign::list_campaigns(db, shop_id)
        .await?
        .into_iter()
        .map(|campaign| campaign.slug)
        .collect();

    let mut report = CampaignReport {
        per_campaign: registry
            .iter()
            .map(|slug| (slug.clone(), BucketStats::default()))
            .collect(),
        view,
        ..CampaignReport::default()
    };
    report.totals.earnings_by_status = CommissionStatus::ALL
        .into_iter()
        .map(|status| (status, 0.0))
        .collect();

    let click_slugs: Vec<Option<String>> = ClickEvent::find()
        .select_only()
        .column(click_event::Column::CampaignSlug)
        .filter(click_event::Column::ReferrerShopId.eq(shop_id))
        .filter(range.condition(click_event::Column::CreatedAt))
        .into_tuple()
        .all(db)
        .await?;
    for slug in &click_slugs {
        report.bucket_mut(&registry, slug.as_deref()).clicks += 1;
        report.totals.clicks += 1;
    }

    let applications = ReferralApplication::find()
        .filter(referral_application::Column::ReferredByShopId.eq(shop_id))
        .filter(range.condition(referral_application::Column::CreatedAt))
        .all(db)
        .await?;
    let mut referred_shops = HashSet::new();
    for application in &applications {
        report
            .bucket_mut(&registry, application.campaign_slug.as_deref())
            .conversions += 1;
        report.totals.conversions += 1;
        referred_shops.insert(application.referred_shop_id);
    }
    report.totals.referred_shops = referred_shops.len() as u64;

    let commissions = CommissionEntry::find()
        .filter(commission_entry::Column::EarningShopId.eq(shop_id))
        .filter(range.condition(commission_entry::Column::CreatedAt))
        .order_by_asc(commission_entry::Column::Id)
        .all(db)
        .await?;
    for entry in &commissions {
        *report
            .totals
            .earnings_by_status
            .entry(entry.status)
            .or_insert(0.0) += entry.amount;
        if view.includes(entry.status) {
            report
                .bucket_mut(&registry, entry.campaign_slug.as_deref())
                .earnings_sum += entry.amount;
        }
    }

    tracing::debug!(
        shop_id,
        clicks = report.totals.clicks,
        conversions = report.totals.conversions,
        commissions = commissions.len(),
        "Aggregated referral activity"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{
            campaign::{delete_campaign, register_campaign},
            ledger::{create_commission, record_click, record_conversion, transition_commission},
            plan::STARTER,
        },
        test_utils::*,
    };
    use chrono::Duration;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_earnings_view_membership() {
        use CommissionStatus::{Approved, Cancelled, Paid, Pending};
        let pending = EarningsView::PendingRevenue;
        assert!(pending.includes(Pending) && pending.includes(Approved));
        assert!(!pending.includes(Paid) && !pending.includes(Cancelled));
        assert!(EarningsView::PaidOnly.includes(Paid));
        assert!(!EarningsView::PaidOnly.includes(Approved));
        assert!(CommissionStatus::ALL.into_iter().all(|s| EarningsView::AllStatuses.includes(s)));
    }

    #[test]
    fn test_date_range() {
        let now = Utc::now();
        let range = DateRange::new(Some(now), Some(now + Duration::hours(1))).unwrap();
        assert!(range.contains(now));
        assert!(range.contains(now + Duration::minutes(59)));
        assert!(!range.contains(now + Duration::hours(1)));
        assert!(!range.contains(now - Duration::seconds(1)));
        assert!(DateRange::default().contains(now));

        let backwards = DateRange::new(Some(now), Some(now - Duration::hours(1)));
        assert!(matches!(backwards.unwrap_err(), Error::Validation { message: _ }));
    }

    #[test]
    fn test_conversion_rate() {
        let stats = BucketStats {
            clicks: 4,
            conversions: 1,
            earnings_sum: 0.0,
        };
        assert_close(stats.conversion_rate(), 0.25);
        assert_close(BucketStats::default().conversion_rate(), 0.0);
    }

    #[tokio::test]
    async fn test_single_campaign_scenario() -> Result<()> {
        let (db, shop) = setup_with_shop(STARTER).await?;
        let referred = create_test_shop(&db, "Newcomer", STARTER).await?;
        register_campaign(&db, shop.id, "ig-bio", "Instagram bio").await?;

        record_click(&db, shop.id, Some("ig-bio")).await?;
        record_conversion(&db, referred.id, Some(shop.id), Some("ig-bio")).await?;
        create_commission(&db, shop.id, referred.id, Some("ig-bio"), 9.99).await?;

        let report = aggregate(&db, shop.id, None).await?;

        let bucket = report.per_campaign["ig-bio"];
        assert_eq!(bucket.clicks, 1);
        assert_eq!(bucket.conversions, 1);
        assert_eq!(bucket.earnings_sum, 9.99);
        assert_eq!(report.general, BucketStats::default());
        assert_eq!(report.totals.referred_shops, 1);
        assert_eq!(report.totals.earnings_by_status[&CommissionStatus::Pending], 9.99);

        Ok(())
    }

    #[tokio::test]
    async fn test_clicks_are_conserved_across_buckets() -> Result<()> {
        let (db, shop) = setup_with_shop(STARTER).await?;
        let slugs = ["ig-bio", "newsletter", "tiktok"];
        for slug in slugs {
            register_campaign(&db, shop.id, slug, slug).await?;
        }

        let mut recorded = 0_u64;
        for (i, slug) in slugs.iter().enumerate() {
            for _ in 0..=i {
                record_click(&db, shop.id, Some(slug)).await?;
                recorded += 1;
            }
        }
        for tag in [None, Some("gone"), None] {
            record_click(&db, shop.id, tag).await?;
            recorded += 1;
        }

        let report = aggregate(&db, shop.id, None).await?;

        let campaign_clicks: u64 = report.per_campaign.values().map(|b| b.clicks).sum();
        assert_eq!(campaign_clicks + report.general.clicks, recorded);
        assert_eq!(report.totals.clicks, recorded);
        assert_eq!(report.general.clicks, 3);
        assert_eq!(report.per_campaign["tiktok"].clicks, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_campaign_falls_into_general() -> Result<()> {
        let (db, shop) = setup_with_shop(STARTER).await?;
        let referred = create_test_shop(&db, "Newcomer", STARTER).await?;
        register_campaign(&db, shop.id, "spring", "Spring").await?;

        record_click(&db, shop.id, Some("spring")).await?;
        record_conversion(&db, referred.id, Some(shop.id), Some("spring")).await?;
        create_commission(&db, shop.id, referred.id, Some("spring"), 3.0).await?;
        delete_campaign(&db, shop.id, "spring").await?;

        let report = aggregate(&db, shop.id, None).await?;

        assert!(report.per_campaign.is_empty());
        assert_eq!(report.general.clicks, 1);
        assert_eq!(report.general.conversions, 1);
        assert_eq!(report.general.earnings_sum, 3.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_earnings_views_and_status_breakdown() -> Result<()> {
        let (db, shop) = setup_with_shop(STARTER).await?;
        let referred = create_test_shop(&db, "Newcomer", STARTER).await?;

        let pending = create_commission(&db, shop.id, referred.id, None, 1.0).await?;
        let approved = create_commission(&db, shop.id, referred.id, None, 2.0).await?;
        let paid = create_commission(&db, shop.id, referred.id, None, 4.0).await?;
        let cancelled = create_commission(&db, shop.id, referred.id, None, 8.0).await?;
        transition_commission(&db, approved.id, CommissionStatus::Approved).await?;
        transition_commission(&db, paid.id, CommissionStatus::Approved).await?;
        transition_commission(&db, paid.id, CommissionStatus::Paid).await?;
        transition_commission(&db, cancelled.id, CommissionStatus::Cancelled).await?;
        assert_eq!(pending.status, CommissionStatus::Pending);

        let default_view = aggregate(&db, shop.id, None).await?;
        assert_eq!(default_view.view, EarningsView::PendingRevenue);
        assert_close(default_view.general.earnings_sum, 3.0);

        let paid_view =
            aggregate_with_view(&db, shop.id, None, EarningsView::PaidOnly).await?;
        assert_close(paid_view.general.earnings_sum, 4.0);

        let all_view =
            aggregate_with_view(&db, shop.id, None, EarningsView::AllStatuses).await?;
        assert_close(all_view.general.earnings_sum, 15.0);

        // The breakdown is identical whatever the view
        for report in [&default_view, &paid_view, &all_view] {
            let by_status = &report.totals.earnings_by_status;
            assert_eq!(by_status.len(), 4);
            assert_close(by_status[&CommissionStatus::Pending], 1.0);
            assert_close(by_status[&CommissionStatus::Approved], 2.0);
            assert_close(by_status[&CommissionStatus::Paid], 4.0);
            assert_close(by_status[&CommissionStatus::Cancelled], 8.0);
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_shop_report() -> Result<()> {
        let (db, shop) = setup_with_shop(STARTER).await?;
        register_campaign(&db, shop.id, "quiet", "Quiet").await?;

        let report = aggregate(&db, shop.id, None).await?;

        assert_eq!(report.bucket(Some("quiet")), Some(&BucketStats::default()));
        assert_eq!(report.bucket(None), Some(&BucketStats::default()));
        assert!(report.bucket(Some("missing")).is_none());
        assert!(report.totals.earnings_by_status.values().all(|sum| *sum == 0.0));
        assert_eq!(report.totals.referred_shops, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_only_the_shops_own_activity_is_counted() -> Result<()> {
        let (db, shop) = setup_with_shop(STARTER).await?;
        let other = create_test_shop(&db, "Other", STARTER).await?;
        let referred = create_test_shop(&db, "Newcomer", STARTER).await?;

        record_click(&db, other.id, None).await?;
        record_conversion(&db, referred.id, Some(other.id), None).await?;
        record_conversion(&db, referred.id, None, None).await?;
        create_commission(&db, other.id, referred.id, None, 5.0).await?;

        let report = aggregate(&db, shop.id, None).await?;

        assert_eq!(report.totals.clicks, 0);
        assert_eq!(report.totals.conversions, 0);
        assert_close(report.totals.earnings_by_status[&CommissionStatus::Pending], 0.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_date_range_bounds_activity() -> Result<()> {
        let (db, shop) = setup_with_shop(STARTER).await?;
        let before = Utc::now() - Duration::seconds(1);
        record_click(&db, shop.id, None).await?;
        record_click(&db, shop.id, None).await?;

        let past = DateRange::new(None, Some(before))?;
        let report = aggregate(&db, shop.id, Some(past)).await?;
        assert_eq!(report.totals.clicks, 0);

        let current = DateRange::new(Some(before), None)?;
        let report = aggregate(&db, shop.id, Some(current)).await?;
        assert_eq!(report.totals.clicks, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_aggregate_unknown_shop() -> Result<()> {
        let db = setup_test_db().await?;
        let result = aggregate(&db, 9001, None).await;
        assert!(matches!(result.unwrap_err(), Error::ShopNotFound { id: 9001 }));
        Ok(())
    }
}
