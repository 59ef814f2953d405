//! Typed supplier records and the rules they must satisfy before batching.

mod convert;
mod field;
mod mapper;
mod validate;

use std::collections::BTreeMap;

use serde::Serialize;
use time::OffsetDateTime;

pub use convert::{ZERO_INSTANT, from_serial, to_date, to_decimal, to_int, to_json_map, to_optional_text};
pub use field::{Field, FieldKind, FieldSpec, SCHEMA};
pub use mapper::{build_record, map_row};
pub use validate::{FieldValue, Rule, ValidationError, check_field, is_email, is_fqdn};

/// Identifier and timestamps stamped on every record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditFields {
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deleted_at: Option<OffsetDateTime>,
}

impl Default for AuditFields {
    fn default() -> Self {
        Self {
            id: String::new(),
            created_at: ZERO_INSTANT,
            updated_at: ZERO_INSTANT,
            deleted_at: None,
        }
    }
}

impl AuditFields {
    /// Fresh audit fields: random id, created and updated now.
    #[must_use]
    pub fn new() -> Self {
        let mut audit = Self::default();
        audit.fill_defaults();
        audit
    }

    /// Synthesizes whatever the caller left unset.
    pub fn fill_defaults(&mut self) {
        let now = OffsetDateTime::now_utc();
        if self.id.is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
        if self.created_at == ZERO_INSTANT {
            self.created_at = now;
        }
        if self.updated_at == ZERO_INSTANT {
            self.updated_at = now;
        }
    }
}

/// One usage/billing line of the supplier sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplierRecord {
    #[serde(flatten)]
    pub audit: AuditFields,
    pub partner_id: String,
    pub partner_name: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_domain_name: String,
    #[serde(rename = "country")]
    pub customer_country: String,
    pub mpn_id: i64,
    pub tier2_mpn_id: i64,
    pub invoice_number: String,
    pub product_id: String,
    pub sku_id: String,
    pub availability_id: String,
    pub sku_name: String,
    pub product_name: String,
    pub publisher_name: String,
    pub publisher_id: Option<String>,
    pub subscription_description: Option<String>,
    pub subscription_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub charge_start_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub charge_end_date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub usage_date: OffsetDateTime,
    pub meter_type: String,
    pub meter_category: String,
    pub meter_id: String,
    pub meter_sub_category: String,
    pub meter_name: String,
    pub meter_region: Option<String>,
    pub unit: String,
    pub resource_location: String,
    pub consumed_service: String,
    pub resource_group: String,
    #[serde(rename = "resourceURI")]
    pub resource_uri: String,
    pub charge_type: String,
    pub unit_price: f64,
    pub quantity: f64,
    pub unit_type: String,
    pub billing_pre_tax_total: f64,
    pub billing_currency: String,
    pub pricing_pre_tax_total: f64,
    pub pricing_currency: String,
    pub service_info1: Option<String>,
    pub service_info2: Option<String>,
    pub tags: Option<BTreeMap<String, String>>,
    pub additional_info: Option<BTreeMap<String, String>>,
    pub effective_unit_price: f64,
    #[serde(rename = "pctoBCExchangeRate")]
    pub pc_to_bc_exchange_rate: i64,
    #[serde(rename = "pctoBCExchangeRateDate", with = "time::serde::rfc3339")]
    pub pc_to_bc_exchange_rate_date: OffsetDateTime,
    pub entitlement_id: String,
    pub entitlement_description: String,
    pub partner_earned_credit_percentage: i64,
    pub credit_percentage: i64,
    pub credit_type: String,
    pub benefit_order_id: Option<String>,
    pub benefit_id: Option<String>,
    pub benefit_type: Option<String>,
}

impl SupplierRecord {
    /// Borrowed view of one field, in the shape the rules inspect.
    #[must_use]
    pub fn value(&self, field: Field) -> FieldValue<'_> {
        use FieldValue::{Date, Decimal, Integer, JsonMap, OptionalText, Text};
        match field {
            Field::PartnerId => Text(&self.partner_id),
            Field::PartnerName => Text(&self.partner_name),
            Field::CustomerId => Text(&self.customer_id),
            Field::CustomerName => Text(&self.customer_name),
            Field::CustomerDomainName => Text(&self.customer_domain_name),
            Field::CustomerCountry => Text(&self.customer_country),
            Field::MpnId => Integer(self.mpn_id),
            Field::Tier2MpnId => Integer(self.tier2_mpn_id),
            Field::InvoiceNumber => Text(&self.invoice_number),
            Field::ProductId => Text(&self.product_id),
            Field::SkuId => Text(&self.sku_id),
            Field::AvailabilityId => Text(&self.availability_id),
            Field::SkuName => Text(&self.sku_name),
            Field::ProductName => Text(&self.product_name),
            Field::PublisherName => Text(&self.publisher_name),
            Field::PublisherId => OptionalText(self.publisher_id.as_deref()),
            Field::SubscriptionDescription => OptionalText(self.subscription_description.as_deref()),
            Field::SubscriptionId => Text(&self.subscription_id),
            Field::ChargeStartDate => Date(self.charge_start_date),
            Field::ChargeEndDate => Date(self.charge_end_date),
            Field::UsageDate => Date(self.usage_date),
            Field::MeterType => Text(&self.meter_type),
            Field::MeterCategory => Text(&self.meter_category),
            Field::MeterId => Text(&self.meter_id),
            Field::MeterSubCategory => Text(&self.meter_sub_category),
            Field::MeterName => Text(&self.meter_name),
            Field::MeterRegion => OptionalText(self.meter_region.as_deref()),
            Field::Unit => Text(&self.unit),
            Field::ResourceLocation => Text(&self.resource_location),
            Field::ConsumedService => Text(&self.consumed_service),
            Field::ResourceGroup => Text(&self.resource_group),
            Field::ResourceUri => Text(&self.resource_uri),
            Field::ChargeType => Text(&self.charge_type),
            Field::UnitPrice => Decimal(self.unit_price),
            Field::Quantity => Decimal(self.quantity),
            Field::UnitType => Text(&self.unit_type),
            Field::BillingPreTaxTotal => Decimal(self.billing_pre_tax_total),
            Field::BillingCurrency => Text(&self.billing_currency),
            Field::PricingPreTaxTotal => Decimal(self.pricing_pre_tax_total),
            Field::PricingCurrency => Text(&self.pricing_currency),
            Field::ServiceInfo1 => OptionalText(self.service_info1.as_deref()),
            Field::ServiceInfo2 => OptionalText(self.service_info2.as_deref()),
            Field::Tags => JsonMap(self.tags.as_ref()),
            Field::AdditionalInfo => JsonMap(self.additional_info.as_ref()),
            Field::EffectiveUnitPrice => Decimal(self.effective_unit_price),
            Field::PcToBcExchangeRate => Integer(self.pc_to_bc_exchange_rate),
            Field::PcToBcExchangeRateDate => Date(self.pc_to_bc_exchange_rate_date),
            Field::EntitlementId => Text(&self.entitlement_id),
            Field::EntitlementDescription => Text(&self.entitlement_description),
            Field::PartnerEarnedCreditPercentage => Integer(self.partner_earned_credit_percentage),
            Field::CreditPercentage => Integer(self.credit_percentage),
            Field::CreditType => Text(&self.credit_type),
            Field::BenefitOrderId => OptionalText(self.benefit_order_id.as_deref()),
            Field::BenefitId => OptionalText(self.benefit_id.as_deref()),
            Field::BenefitType => OptionalText(self.benefit_type.as_deref()),
        }
    }

    /// Checks every field in column order against its schema rules.
    ///
    /// # Errors
    ///
    /// Returns the first violated field and rule.
    pub fn validate(&self) -> Result<(), ValidationError> {
        Field::all().try_for_each(|field| check_field(field, &self.value(field)))
    }
}
