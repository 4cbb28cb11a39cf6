//! Connectors module
//!
//! - The `AdsConnector` trait the sync layer depends on
//! - The Meta Marketing Graph API implementation

pub mod meta;
pub mod trait_;

pub use meta::{MetaAdsClient, MetaClientConfig};
pub use trait_::{
    AdsConnector, ExchangedToken, GraphList, InsightWindow, MetaApiError, RawCampaign, RawInsight,
};
