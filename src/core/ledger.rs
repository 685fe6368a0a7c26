//! Attribution ledger - Referral clicks, conversions, and the commissions they earn.
//!
//! Clicks and applications are append-only and never updated, so concurrent writers need
//! no coordination. Commission entries are created `pending` and then only change status
//! through [`transition_commission`], which guards each write with a compare-and-set on
//! the status it observed.
//!
//! Click recording must never block a visitor's navigation: a stale or foreign campaign
//! slug downgrades the click to general instead of failing it.

use crate::{
    core::{campaign, shop},
    entities::{
        ClickEvent, CommissionEntry, CommissionStatus, ReferralApplication, click_event,
        commission_entry, referral_application,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use tracing::instrument;

/// Query parameter carrying the referral code in a referral link.
pub const REFERRAL_PARAM: &str = "ref";
/// Query parameter carrying the campaign slug in a referral link.
pub const CAMPAIGN_PARAM: &str = "campaign";

/// Treats blank slugs as absent.
fn normalize_slug(campaign_slug: Option<&str>) -> Option<String> {
    campaign_slug
        .map(str::trim)
        .filter(|slug| !slug.is_empty())
        .map(str::to_string)
}

/// Builds the public referral link for a shop, optionally tagged with a campaign.
#[must_use]
pub fn referral_link(base_url: &str, referral_code: &str, campaign_slug: Option<&str>) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    let mut link = format!("{base_url}{separator}{REFERRAL_PARAM}={referral_code}");
    if let Some(slug) = normalize_slug(campaign_slug) {
        link.push_str(&format!("&{CAMPAIGN_PARAM}={slug}"));
    }
    link
}

/// Records a visit to a shop's referral link.
///
/// The slug is kept only if it names a campaign in the shop's registry; anything else is
/// logged and recorded as a general click. Only store failures are returned as errors.
#[instrument(skip(db))]
pub async fn record_click(
    db: &DatabaseConnection,
    shop_id: i64,
    campaign_slug: Option<&str>,
) -> Result<click_event::Model> {
    let mut slug = normalize_slug(campaign_slug);
    if let Some(tag) = slug.as_deref() {
        if campaign::find_campaign(db, shop_id, tag).await?.is_none() {
            tracing::warn!(shop_id, slug = tag, "Unknown campaign slug, recording general click");
            slug = None;
        }
    }

    let click = click_event::ActiveModel {
        referrer_shop_id: Set(shop_id),
        campaign_slug: Set(slug),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    click.insert(db).await.map_err(Into::into)
}

/// Records a click arriving through the public redirect, identified by referral code.
///
/// Returns `Ok(None)` when the code matches no shop; the visitor is still redirected.
pub async fn record_click_by_code(
    db: &DatabaseConnection,
    referral_code: &str,
    campaign_slug: Option<&str>,
) -> Result<Option<click_event::Model>> {
    let Some(shop) = shop::find_shop_by_referral_code(db, referral_code).await? else {
        tracing::warn!(referral_code, "Click for unknown referral code ignored");
        return Ok(None);
    };
    record_click(db, shop.id, campaign_slug).await.map(Some)
}

/// Records a completed signup, attributed to `referrer_shop_id` when present.
///
/// The campaign slug is stored as given; aggregation decides whether it is still live.
///
/// # Errors
/// Returns a `Validation` error if a shop refers itself or a campaign slug arrives
/// without a referrer, `ShopNotFound` if either shop is unknown, or a database error.
#[instrument(skip(db))]
pub async fn record_conversion(
    db: &DatabaseConnection,
    referred_shop_id: i64,
    referrer_shop_id: Option<i64>,
    campaign_slug: Option<&str>,
) -> Result<referral_application::Model> {
    let slug = normalize_slug(campaign_slug);
    if referrer_shop_id == Some(referred_shop_id) {
        return Err(Error::Validation {
            message: format!("Shop {referred_shop_id} cannot refer itself"),
        });
    }
    if referrer_shop_id.is_none() && slug.is_some() {
        return Err(Error::Validation {
            message: "Campaign slug requires a referring shop".to_string(),
        });
    }
    shop::get_shop(db, referred_shop_id).await?;
    if let Some(referrer) = referrer_shop_id {
        shop::get_shop(db, referrer).await?;
    }

    let application = referral_application::ActiveModel {
        referred_shop_id: Set(referred_shop_id),
        referred_by_shop_id: Set(referrer_shop_id),
        campaign_slug: Set(slug),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let application = application.insert(db).await?;
    if let Some(referrer) = application.referred_by_shop_id {
        tracing::info!(
            referred_shop_id,
            referrer,
            campaign = ?application.campaign_slug,
            "Referral conversion attributed"
        );
    }
    Ok(application)
}

/// Retrieves a referral application by id.
pub async fn get_application(
    db: &DatabaseConnection,
    application_id: i64,
) -> Result<referral_application::Model> {
    ReferralApplication::find_by_id(application_id)
        .one(db)
        .await?
        .ok_or(Error::ApplicationNotFound { id: application_id })
}

/// Returns true when a recorded conversion or click carries `slug` for this referrer.
async fn slug_is_traceable(
    db: &DatabaseConnection,
    earning_shop_id: i64,
    referred_shop_id: i64,
    slug: &str,
) -> Result<bool> {
    let applications = ReferralApplication::find()
        .filter(referral_application::Column::ReferredShopId.eq(referred_shop_id))
        .filter(referral_application::Column::ReferredByShopId.eq(earning_shop_id))
        .filter(referral_application::Column::CampaignSlug.eq(slug))
        .count(db)
        .await?;
    if applications > 0 {
        return Ok(true);
    }

    let clicks = ClickEvent::find()
        .filter(click_event::Column::ReferrerShopId.eq(earning_shop_id))
        .filter(click_event::Column::CampaignSlug.eq(slug))
        .count(db)
        .await?;
    Ok(clicks > 0)
}

/// Creates a `pending` commission owed to `earning_shop_id` for `referred_shop_id`.
///
/// Calls are not de-duplicated: invoking this twice for the same pair creates two entries.
/// Callers that need idempotency check [`find_commission_for_pair`] first.
///
/// # Errors
/// Returns a `Validation` error if:
/// - The amount is not a finite positive number
/// - The earning and referred shop are the same
/// - The campaign slug matches no recorded conversion or click of the earning shop
///
/// Returns `ShopNotFound` if either shop is unknown.
#[instrument(skip(db))]
pub async fn create_commission(
    db: &DatabaseConnection,
    earning_shop_id: i64,
    referred_shop_id: i64,
    campaign_slug: Option<&str>,
    amount: f64,
) -> Result<commission_entry::Model> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::Validation {
            message: format!("Commission amount must be a positive number, got {amount}"),
        });
    }
    if earning_shop_id == referred_shop_id {
        return Err(Error::Validation {
            message: format!("Shop {earning_shop_id} cannot earn commission on itself"),
        });
    }
    shop::get_shop(db, earning_shop_id).await?;
    shop::get_shop(db, referred_shop_id).await?;

    let slug = normalize_slug(campaign_slug);
    if let Some(tag) = slug.as_deref() {
        if !slug_is_traceable(db, earning_shop_id, referred_shop_id, tag).await? {
            return Err(Error::Validation {
                message: format!(
                    "Campaign '{tag}' has no recorded referral activity for shop {earning_shop_id}"
                ),
            });
        }
    }

    let now = Utc::now();
    let entry = commission_entry::ActiveModel {
        earning_shop_id: Set(earning_shop_id),
        referred_shop_id: Set(referred_shop_id),
        campaign_slug: Set(slug),
        amount: Set(amount),
        status: Set(CommissionStatus::Pending),
        created_at: Set(now),
        status_changed_at: Set(now),
        ..Default::default()
    };
    let entry = entry.insert(db).await?;
    tracing::info!(entry_id = entry.id, earning_shop_id, amount, "Commission created");
    Ok(entry)
}

/// Creates the commission for a recorded, attributed application.
///
/// Referrer, referred shop and campaign slug are all taken from the application.
///
/// # Errors
/// Returns `ApplicationNotFound`, or a `Validation` error for an organic signup, plus
/// the errors of [`create_commission`].
pub async fn create_commission_for_application(
    db: &DatabaseConnection,
    application_id: i64,
    amount: f64,
) -> Result<commission_entry::Model> {
    let application = get_application(db, application_id).await?;
    let referrer = application
        .referred_by_shop_id
        .ok_or_else(|| Error::Validation {
            message: format!("Application {application_id} has no referring shop"),
        })?;

    create_commission(
        db,
        referrer,
        application.referred_shop_id,
        application.campaign_slug.as_deref(),
        amount,
    )
    .await
}

/// Finds the earliest commission for an earning/referred pair.
pub async fn find_commission_for_pair(
    db: &DatabaseConnection,
    earning_shop_id: i64,
    referred_shop_id: i64,
) -> Result<Option<commission_entry::Model>> {
    CommissionEntry::find()
        .filter(commission_entry::Column::EarningShopId.eq(earning_shop_id))
        .filter(commission_entry::Column::ReferredShopId.eq(referred_shop_id))
        .order_by_asc(commission_entry::Column::Id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a commission entry by id.
pub async fn get_commission<C>(db: &C, entry_id: i64) -> Result<commission_entry::Model>
where
    C: ConnectionTrait,
{
    CommissionEntry::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or(Error::CommissionNotFound { id: entry_id })
}

/// Lists a shop's earned commissions, newest first, optionally filtered by status.
pub async fn list_commissions(
    db: &DatabaseConnection,
    earning_shop_id: i64,
    status: Option<CommissionStatus>,
) -> Result<Vec<commission_entry::Model>> {
    let mut query = CommissionEntry::find()
        .filter(commission_entry::Column::EarningShopId.eq(earning_shop_id));
    if let Some(status) = status {
        query = query.filter(commission_entry::Column::Status.eq(status));
    }
    query
        .order_by_desc(commission_entry::Column::CreatedAt)
        .order_by_desc(commission_entry::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Moves a commission entry to `new_status`.
///
/// Legal transitions are `pending -> approved`, `pending -> cancelled`,
/// `approved -> paid` and `approved -> cancelled`. The write only lands if the entry is
/// still in the status that was checked, so of two racing requests from the same state
/// exactly one succeeds; the loser gets `InvalidStateTransition` from the status the
/// winner wrote.
///
/// # Errors
/// Returns `CommissionNotFound` for an unknown id, `InvalidStateTransition` for an
/// illegal or lost transition (the entry is left unchanged), or a database error.
#[instrument(skip(db))]
pub async fn transition_commission(
    db: &DatabaseConnection,
    entry_id: i64,
    new_status: CommissionStatus,
) -> Result<commission_entry::Model> {
    let current = get_commission(db, entry_id).await?;
    if !current.status.can_transition_to(new_status) {
        return Err(Error::InvalidStateTransition {
            from: current.status,
            to: new_status,
        });
    }

    // Compare-and-set on the observed status
    let result = CommissionEntry::update_many()
        .col_expr(commission_entry::Column::Status, Expr::value(new_status))
        .col_expr(
            commission_entry::Column::StatusChangedAt,
            Expr::value(Utc::now()),
        )
        .filter(commission_entry::Column::Id.eq(entry_id))
        .filter(commission_entry::Column::Status.eq(current.status))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        let latest = get_commission(db, entry_id).await?;
        tracing::warn!(
            entry_id,
            expected = %current.status,
            found = %latest.status,
            requested = %new_status,
            "Commission changed concurrently, transition rejected"
        );
        return Err(Error::InvalidStateTransition {
            from: latest.status,
            to: new_status,
        });
    }

    tracing::info!(entry_id, from = %current.status, to = %new_status, "Commission transitioned");
    get_commission(db, entry_id).await
}
