//! Campaign registry - Shop-owned tags for referral links.
//!
//! Slugs are generated from the human label plus a random suffix. That makes collisions
//! unlikely, not impossible, so a collision that survives the configured attempts is
//! reported as `DuplicateSlug` instead of retrying without bound.

use crate::{
    config::referrals::ReferralSettings,
    entities::{Campaign, campaign},
    errors::{Error, Result},
};
use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use tracing::instrument;

/// Longest slug body taken from a label, before the suffix.
const MAX_LABEL_SLUG_LEN: usize = 40;
/// Longest slug accepted by [`register_campaign`].
const MAX_SLUG_LEN: usize = 64;
/// Slug body used when a label has no usable characters.
const EMPTY_LABEL_SLUG: &str = "campaign";

/// Turns a free-text label into a URL-safe slug body.
///
/// Lowercases ASCII letters and digits, collapses every other run of characters into a
/// single `-`, and trims dashes from both ends.
#[must_use]
pub fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for c in label.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(MAX_LABEL_SLUG_LEN);
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        EMPTY_LABEL_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

fn random_suffix(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

fn validate_slug(slug: &str) -> Result<()> {
    let well_formed = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if well_formed {
        Ok(())
    } else {
        Err(Error::Validation {
            message: format!("Invalid campaign slug '{slug}'"),
        })
    }
}

/// Finds a campaign in the shop's registry, returning None if the slug is not registered.
pub async fn find_campaign<C>(db: &C, shop_id: i64, slug: &str) -> Result<Option<campaign::Model>>
where
    C: ConnectionTrait,
{
    Campaign::find()
        .filter(campaign::Column::ShopId.eq(shop_id))
        .filter(campaign::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists the shop's campaigns in creation order.
pub async fn list_campaigns<C>(db: &C, shop_id: i64) -> Result<Vec<campaign::Model>>
where
    C: ConnectionTrait,
{
    Campaign::find()
        .filter(campaign::Column::ShopId.eq(shop_id))
        .order_by_asc(campaign::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Registers a campaign under an explicit slug.
///
/// # Errors
/// Returns an error if:
/// - The slug is not lowercase letters, digits and inner dashes
/// - The label is empty or whitespace-only
/// - The slug is already registered for this shop (`DuplicateSlug`)
/// - The database insert fails
#[instrument(skip(db))]
pub async fn register_campaign(
    db: &DatabaseConnection,
    shop_id: i64,
    slug: &str,
    label: &str,
) -> Result<campaign::Model> {
    validate_slug(slug)?;
    if label.trim().is_empty() {
        return Err(Error::Validation {
            message: "Campaign label cannot be empty".to_string(),
        });
    }

    if find_campaign(db, shop_id, slug).await?.is_some() {
        return Err(Error::DuplicateSlug {
            shop_id,
            slug: slug.to_string(),
        });
    }

    let campaign = campaign::ActiveModel {
        shop_id: Set(shop_id),
        slug: Set(slug.to_string()),
        label: Set(label.trim().to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    match campaign.insert(db).await {
        Ok(campaign) => {
            tracing::info!(shop_id, slug = %campaign.slug, "Campaign registered");
            Ok(campaign)
        }
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Err(Error::DuplicateSlug {
                shop_id,
                slug: slug.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Creates a campaign with a slug generated from its label.
///
/// # Errors
/// Returns `DuplicateSlug` if every generated slug collided, plus the errors of
/// [`register_campaign`].
#[instrument(skip(db, settings))]
pub async fn create_campaign(
    db: &DatabaseConnection,
    settings: &ReferralSettings,
    shop_id: i64,
    label: &str,
) -> Result<campaign::Model> {
    if label.trim().is_empty() {
        return Err(Error::Validation {
            message: "Campaign label cannot be empty".to_string(),
        });
    }

    let suffix_len = settings.slug_suffix_length.min(MAX_SLUG_LEN / 2);
    let mut base = slugify(label);
    if suffix_len > 0 {
        // Leave room for the dash and suffix
        base.truncate(MAX_SLUG_LEN - suffix_len - 1);
        base = base.trim_end_matches('-').to_string();
    }
    let mut last_slug = base.clone();
    for attempt in 1..=settings.slug_attempts.max(1) {
        let slug = if suffix_len == 0 {
            base.clone()
        } else {
            format!("{base}-{}", random_suffix(suffix_len))
        };

        match register_campaign(db, shop_id, &slug, label).await {
            Err(Error::DuplicateSlug { .. }) => {
                tracing::debug!(attempt, %slug, "Campaign slug collision, regenerating");
                last_slug = slug;
            }
            other => return other,
        }
    }

    tracing::warn!(shop_id, slug = %last_slug, "Giving up on campaign slug generation");
    Err(Error::DuplicateSlug {
        shop_id,
        slug: last_slug,
    })
}

/// Removes a campaign from the shop's registry.
///
/// Recorded clicks and conversions keep their slug; they fall into the general bucket
/// of later aggregations.
///
/// # Errors
/// Returns `CampaignNotFound` if the slug is not registered for the shop.
#[instrument(skip(db))]
pub async fn delete_campaign(db: &DatabaseConnection, shop_id: i64, slug: &str) -> Result<()> {
    let campaign = find_campaign(db, shop_id, slug)
        .await?
        .ok_or_else(|| Error::CampaignNotFound {
            shop_id,
            slug: slug.to_string(),
        })?;
    campaign.delete(db).await?;
    tracing::info!(shop_id, slug, "Campaign deleted");
    Ok(())
}
