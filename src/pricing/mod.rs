pub mod calculator;
pub mod models;
pub mod rate_table;
pub mod service;
pub mod summary;
pub mod tco;

pub use calculator::{commission_for, get_lease_rate_factor, item_costs, ItemCosts};
pub use models::{
    ActingUser, AssetType, CalculationItem, Condition, LeaseRateFactorsData, Quote, QuoteOption,
    QuoteStatus, TcoSettings, UserRole,
};
pub use service::PricingService;
pub use summary::{summarize_option, summarize_quote, NamedOptionSummary, OptionSummary};
pub use tco::{calculate_tco, TcoResult};
