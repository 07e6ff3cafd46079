use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Lease terms offered to customers, in months
pub const LEASE_TERMS: [u32; 5] = [12, 24, 36, 48, 60];

/// Rate key shared by every used asset regardless of classification
pub const USED_ASSET_KEY: &str = "Used";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Laptop,
    Desktop,
    Tablet,
    Mobile,
    #[serde(rename = "OtherIT")]
    OtherIt,
    Accessory,
}

impl AssetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Laptop => "Laptop",
            Self::Desktop => "Desktop",
            Self::Tablet => "Tablet",
            Self::Mobile => "Mobile",
            Self::OtherIt => "OtherIT",
            Self::Accessory => "Accessory",
        }
    }

    /// Device classes whose price includes the non-return uplift
    pub fn is_non_return_eligible(&self) -> bool {
        matches!(self, Self::Laptop | Self::Mobile | Self::Tablet)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Condition {
    #[default]
    New,
    Used,
}

/// One-time service attached to a line item (installation, imaging, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalService {
    pub cost: f64,
    #[serde(default)]
    pub description: Option<String>,
}

/// One leasable line of a quote option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationItem {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub asset_type: AssetType,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub condition: Condition,
    pub lease_term: u32,
    pub quantity: u32,
    pub hardware_cost: f64,
    #[serde(default)]
    pub additional_services: Vec<AdditionalService>,
    /// Share of devices not returned at end of term, in percent
    #[serde(default)]
    pub non_return_percentage: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
    /// Adds the global packing fee once per unit
    #[serde(default)]
    pub include_packing_service: bool,
}

impl CalculationItem {
    pub fn new(asset_type: AssetType, lease_term: u32, quantity: u32, hardware_cost: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset_type,
            brand: None,
            os: None,
            condition: Condition::New,
            lease_term,
            quantity,
            hardware_cost,
            additional_services: Vec::new(),
            non_return_percentage: None,
            country: None,
            include_packing_service: false,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_non_return_percentage(mut self, percentage: f64) -> Self {
        self.non_return_percentage = Some(percentage);
        self
    }

    pub fn with_service(mut self, cost: f64, description: Option<&str>) -> Self {
        self.additional_services.push(AdditionalService {
            cost,
            description: description.map(str::to_string),
        });
        self
    }

    /// Sum of the item's one-time service costs, per unit
    pub fn services_cost(&self) -> f64 {
        self.additional_services.iter().map(|s| s.cost).sum()
    }

    /// Copy of this item under a fresh id
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            ..self.clone()
        }
    }
}

pub type RateRow = BTreeMap<u32, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateUpdateLogEntry {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
}

/// The admin-maintained lease rate factor table and its global scalars
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseRateFactorsData {
    #[serde(default)]
    pub rates: BTreeMap<String, RateRow>,
    /// Extra fractional cost per percentage point of non-returned devices
    #[serde(default = "default_non_return_uplift_factor")]
    pub non_return_uplift_factor: f64,
    /// Flat packing fee per unit
    #[serde(default)]
    pub packing_service_cost: f64,
    #[serde(default)]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated_by: Option<String>,
    /// Recipient of rate-change notifications
    #[serde(default)]
    pub notification_email: Option<String>,
    #[serde(default)]
    pub update_log: Vec<RateUpdateLogEntry>,
}

impl Default for LeaseRateFactorsData {
    fn default() -> Self {
        Self {
            rates: BTreeMap::new(),
            non_return_uplift_factor: default_non_return_uplift_factor(),
            packing_service_cost: 0.0,
            last_updated_at: None,
            last_updated_by: None,
            notification_email: None,
            update_log: Vec::new(),
        }
    }
}

fn default_non_return_uplift_factor() -> f64 {
    0.008
}

/// Fields an administrator may change in the rate table
#[derive(Debug, Clone, Deserialize)]
pub struct RateTableUpdate {
    pub rates: BTreeMap<String, RateRow>,
    pub non_return_uplift_factor: f64,
    pub packing_service_cost: f64,
    /// Absent keeps the current recipient
    #[serde(default)]
    pub notification_email: Option<String>,
}

impl LeaseRateFactorsData {
    /// Apply an admin edit, stamping the audit fields and appending to the log
    pub fn apply_update(&mut self, update: RateTableUpdate, actor: &str, now: DateTime<Utc>) {
        self.rates = update.rates;
        self.non_return_uplift_factor = update.non_return_uplift_factor;
        self.packing_service_cost = update.packing_service_cost;
        if update.notification_email.is_some() {
            self.notification_email = update.notification_email;
        }
        self.last_updated_at = Some(now);
        self.last_updated_by = Some(actor.to_string());
        self.update_log.push(RateUpdateLogEntry {
            timestamp: now,
            actor: actor.to_string(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Industry {
    Technology,
    Healthcare,
    FinancialServices,
    Manufacturing,
    Retail,
    Education,
    PublicSector,
    ProfessionalServices,
    Energy,
    #[default]
    Other,
}

impl Industry {
    /// Typical weighted average cost of capital for the industry, in percent
    pub fn wacc(&self) -> f64 {
        match self {
            Self::Technology => 9.0,
            Self::Healthcare => 7.5,
            Self::FinancialServices => 8.0,
            Self::Manufacturing => 8.5,
            Self::Retail => 7.5,
            Self::Education => 6.0,
            Self::PublicSector => 5.0,
            Self::ProfessionalServices => 8.0,
            Self::Energy => 7.0,
            Self::Other => 8.0,
        }
    }
}

/// Per-device cost assumptions of the lease-vs-purchase comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcoSettings {
    pub industry: Industry,
    pub use_custom_wacc: bool,
    pub custom_wacc: f64,
    pub deployment_cost_per_device: f64,
    pub support_hours_per_device_year: f64,
    pub staff_hourly_rate: f64,
    pub failures_per_device_year: f64,
    pub downtime_hours_per_failure: f64,
    pub employee_cost_per_hour: f64,
    pub eold_cost_per_device: f64,
    pub residual_value_percentage: f64,
}

impl Default for TcoSettings {
    fn default() -> Self {
        Self {
            industry: Industry::Other,
            use_custom_wacc: false,
            custom_wacc: 8.0,
            deployment_cost_per_device: 75.0,
            support_hours_per_device_year: 4.0,
            staff_hourly_rate: 60.0,
            failures_per_device_year: 0.3,
            downtime_hours_per_failure: 8.0,
            employee_cost_per_hour: 45.0,
            eold_cost_per_device: 40.0,
            residual_value_percentage: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Admin,
    Partner,
}

/// The authenticated caller on whose behalf a quote is priced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActingUser {
    pub name: String,
    pub role: UserRole,
    pub commission_percentage: f64,
}

impl ActingUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuoteStatus {
    #[default]
    Draft,
    CreditPending,
    Sent,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::CreditPending => "CreditPending",
            Self::Sent => "Sent",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }
}

impl std::str::FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(Self::Draft),
            "CreditPending" => Ok(Self::CreditPending),
            "Sent" => Ok(Self::Sent),
            "Accepted" => Ok(Self::Accepted),
            "Rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown quote status: {}", other)),
        }
    }
}

/// Customer contact details, overridable per country
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerDetails {
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// A named proposal variant within a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteOption {
    pub name: String,
    #[serde(default)]
    pub items: Vec<CalculationItem>,
}

impl QuoteOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub customer_name: String,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub customer: CustomerDetails,
    #[serde(default)]
    pub status: QuoteStatus,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub country_overrides: BTreeMap<String, CustomerDetails>,
    /// Overrides the TCO settings industry for the WACC lookup
    #[serde(default)]
    pub industry: Option<Industry>,
    #[serde(default = "default_options")]
    pub options: Vec<QuoteOption>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "EUR".to_string()
}

fn default_options() -> Vec<QuoteOption> {
    vec![QuoteOption::new("Option A")]
}

impl Quote {
    /// A fresh draft holding one empty option
    pub fn new(customer_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_name: customer_name.into(),
            project_name: None,
            customer: CustomerDetails::default(),
            status: QuoteStatus::Draft,
            currency: default_currency(),
            country_overrides: BTreeMap::new(),
            industry: None,
            options: default_options(),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// All items across all options, in option order
    pub fn all_items(&self) -> impl Iterator<Item = &CalculationItem> {
        self.options.iter().flat_map(|o| o.items.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.options.iter().all(|o| o.items.is_empty())
    }

    /// Customer details for a country, falling back to the quote-level record
    pub fn customer_for_country(&self, country: Option<&str>) -> &CustomerDetails {
        country
            .and_then(|c| self.country_overrides.get(c))
            .unwrap_or(&self.customer)
    }

    /// Duplicate an item in place, inserting the copy right after the original.
    /// Returns the new item's id, or None when the item is unknown.
    pub fn duplicate_item(&mut self, item_id: Uuid) -> Option<Uuid> {
        for option in &mut self.options {
            if let Some(pos) = option.items.iter().position(|i| i.id == item_id) {
                let copy = option.items[pos].duplicate();
                let new_id = copy.id;
                option.items.insert(pos + 1, copy);
                return Some(new_id);
            }
        }
        None
    }

    pub fn remove_item(&mut self, item_id: Uuid) -> Option<CalculationItem> {
        for option in &mut self.options {
            if let Some(pos) = option.items.iter().position(|i| i.id == item_id) {
                return Some(option.items.remove(pos));
            }
        }
        None
    }
}
