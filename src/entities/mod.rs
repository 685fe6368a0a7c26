//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the persisted shapes the engine reads and appends to:
//! two mutable records (shop accounts, products) and four append-mostly collections
//! (campaigns, click events, referral applications, commission entries).

pub mod campaign;
pub mod click_event;
pub mod commission_entry;
pub mod product;
pub mod referral_application;
pub mod shop_account;

// Re-export specific types to avoid conflicts
pub use campaign::{Column as CampaignColumn, Entity as Campaign, Model as CampaignModel};
pub use click_event::{Column as ClickEventColumn, Entity as ClickEvent, Model as ClickEventModel};
pub use commission_entry::{
    Column as CommissionEntryColumn, CommissionStatus, Entity as CommissionEntry,
    Model as CommissionEntryModel,
};
pub use product::{
    Column as ProductColumn, Entity as Product, Model as ProductModel, ProductStatus,
};
pub use referral_application::{
    Column as ReferralApplicationColumn, Entity as ReferralApplication,
    Model as ReferralApplicationModel,
};
pub use shop_account::{
    Column as ShopAccountColumn, Entity as ShopAccount, Model as ShopAccountModel, PlanReference,
};
