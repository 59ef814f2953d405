use std::fmt;

use crate::parser::COLUMN_COUNT;

use super::validate::Rule;

const MAX_TEXT: usize = 255;

const REQUIRED: &[Rule] = &[Rule::Required];
const REQUIRED_BOUNDED: &[Rule] = &[Rule::Required, Rule::MaxLen(MAX_TEXT)];
const REQUIRED_DOMAIN: &[Rule] = &[Rule::Required, Rule::Fqdn];
const BOUNDED: &[Rule] = &[Rule::MaxLen(MAX_TEXT)];
const NUMERIC: &[Rule] = &[Rule::Numeric];
const NONE: &[Rule] = &[];

/// Storage kind of a sheet column once converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    OptionalText,
    Integer,
    Decimal,
    Date,
    JsonMap,
}

/// Static description of one column: identifier, label, kind and rules.
#[derive(Debug)]
pub struct FieldSpec {
    pub field: Field,
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub rules: &'static [Rule],
}

/// Supplier sheet columns, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    PartnerId,
    PartnerName,
    CustomerId,
    CustomerName,
    CustomerDomainName,
    CustomerCountry,
    MpnId,
    Tier2MpnId,
    InvoiceNumber,
    ProductId,
    SkuId,
    AvailabilityId,
    SkuName,
    ProductName,
    PublisherName,
    PublisherId,
    SubscriptionDescription,
    SubscriptionId,
    ChargeStartDate,
    ChargeEndDate,
    UsageDate,
    MeterType,
    MeterCategory,
    MeterId,
    MeterSubCategory,
    MeterName,
    MeterRegion,
    Unit,
    ResourceLocation,
    ConsumedService,
    ResourceGroup,
    ResourceUri,
    ChargeType,
    UnitPrice,
    Quantity,
    UnitType,
    BillingPreTaxTotal,
    BillingCurrency,
    PricingPreTaxTotal,
    PricingCurrency,
    ServiceInfo1,
    ServiceInfo2,
    Tags,
    AdditionalInfo,
    EffectiveUnitPrice,
    PcToBcExchangeRate,
    PcToBcExchangeRateDate,
    EntitlementId,
    EntitlementDescription,
    PartnerEarnedCreditPercentage,
    CreditPercentage,
    CreditType,
    BenefitOrderId,
    BenefitId,
    BenefitType,
}

macro_rules! field {
    ($field:ident, $name:literal, $label:literal, $kind:ident, $rules:expr) => {
        FieldSpec {
            field: Field::$field,
            name: $name,
            label: $label,
            kind: FieldKind::$kind,
            rules: $rules,
        }
    };
}

/// Column layout of the supplier sheet, indexed by column.
pub static SCHEMA: [FieldSpec; COLUMN_COUNT] = [
    field!(PartnerId, "partnerId", "Partner ID", Text, REQUIRED),
    field!(PartnerName, "partnerName", "Partner name", Text, REQUIRED_BOUNDED),
    field!(CustomerId, "customerId", "Customer ID", Text, REQUIRED),
    field!(CustomerName, "customerName", "Customer name", Text, REQUIRED_BOUNDED),
    field!(CustomerDomainName, "customerDomainName", "Customer domain name", Text, REQUIRED_DOMAIN),
    field!(CustomerCountry, "country", "Customer country", Text, REQUIRED_BOUNDED),
    field!(MpnId, "mpnId", "MPN ID", Integer, NUMERIC),
    field!(Tier2MpnId, "tier2MpnId", "Tier 2 MPN ID", Integer, NUMERIC),
    field!(InvoiceNumber, "invoiceNumber", "Invoice number", Text, REQUIRED),
    field!(ProductId, "productId", "Product ID", Text, REQUIRED),
    field!(SkuId, "skuId", "SKU ID", Text, REQUIRED),
    field!(AvailabilityId, "availabilityId", "Availability ID", Text, REQUIRED),
    field!(SkuName, "skuName", "SKU name", Text, REQUIRED_BOUNDED),
    field!(ProductName, "productName", "Product name", Text, REQUIRED_BOUNDED),
    field!(PublisherName, "publisherName", "Publisher name", Text, REQUIRED_BOUNDED),
    field!(PublisherId, "publisherId", "Publisher ID", OptionalText, BOUNDED),
    field!(SubscriptionDescription, "subscriptionDescription", "Subscription description", OptionalText, BOUNDED),
    field!(SubscriptionId, "subscriptionId", "Subscription ID", Text, REQUIRED),
    field!(ChargeStartDate, "chargeStartDate", "Charge start date", Date, REQUIRED),
    field!(ChargeEndDate, "chargeEndDate", "Charge end date", Date, REQUIRED),
    field!(UsageDate, "usageDate", "Usage date", Date, REQUIRED),
    field!(MeterType, "meterType", "Meter type", Text, REQUIRED_BOUNDED),
    field!(MeterCategory, "meterCategory", "Meter category", Text, REQUIRED_BOUNDED),
    field!(MeterId, "meterId", "Meter ID", Text, REQUIRED),
    field!(MeterSubCategory, "meterSubCategory", "Meter sub-category", Text, REQUIRED_BOUNDED),
    field!(MeterName, "meterName", "Meter name", Text, REQUIRED_BOUNDED),
    field!(MeterRegion, "meterRegion", "Meter region", OptionalText, BOUNDED),
    field!(Unit, "unit", "Unit", Text, REQUIRED_BOUNDED),
    field!(ResourceLocation, "resourceLocation", "Resource location", Text, REQUIRED_BOUNDED),
    field!(ConsumedService, "consumedService", "Consumed service", Text, REQUIRED_BOUNDED),
    field!(ResourceGroup, "resourceGroup", "Resource group", Text, REQUIRED_BOUNDED),
    field!(ResourceUri, "resourceURI", "Resource URI", Text, REQUIRED),
    field!(ChargeType, "chargeType", "Charge type", Text, REQUIRED_BOUNDED),
    field!(UnitPrice, "unitPrice", "Unit price", Decimal, NUMERIC),
    field!(Quantity, "quantity", "Quantity", Decimal, NUMERIC),
    field!(UnitType, "unitType", "Unit type", Text, REQUIRED_BOUNDED),
    field!(BillingPreTaxTotal, "billingPreTaxTotal", "Billing pre-tax total", Decimal, NUMERIC),
    field!(BillingCurrency, "billingCurrency", "Billing currency", Text, REQUIRED_BOUNDED),
    field!(PricingPreTaxTotal, "pricingPreTaxTotal", "Pricing pre-tax total", Decimal, NUMERIC),
    field!(PricingCurrency, "pricingCurrency", "Pricing currency", Text, REQUIRED_BOUNDED),
    field!(ServiceInfo1, "serviceInfo1", "Service info 1", OptionalText, BOUNDED),
    field!(ServiceInfo2, "serviceInfo2", "Service info 2", OptionalText, BOUNDED),
    field!(Tags, "tags", "Tags", JsonMap, NONE),
    field!(AdditionalInfo, "additionalInfo", "Additional info", JsonMap, NONE),
    field!(EffectiveUnitPrice, "effectiveUnitPrice", "Effective unit price", Decimal, NUMERIC),
    field!(PcToBcExchangeRate, "pctoBCExchangeRate", "PC to BC exchange rate", Integer, NUMERIC),
    field!(PcToBcExchangeRateDate, "pctoBCExchangeRateDate", "PC to BC exchange rate date", Date, REQUIRED),
    field!(EntitlementId, "entitlementId", "Entitlement ID", Text, REQUIRED),
    field!(EntitlementDescription, "entitlementDescription", "Entitlement description", Text, REQUIRED_BOUNDED),
    field!(PartnerEarnedCreditPercentage, "partnerEarnedCreditPercentage", "Partner earned credit percentage", Integer, NUMERIC),
    field!(CreditPercentage, "creditPercentage", "Credit percentage", Integer, NUMERIC),
    field!(CreditType, "creditType", "Credit type", Text, REQUIRED_BOUNDED),
    field!(BenefitOrderId, "benefitOrderId", "Benefit order ID", OptionalText, BOUNDED),
    field!(BenefitId, "benefitId", "Benefit ID", OptionalText, BOUNDED),
    field!(BenefitType, "benefitType", "Benefit type", OptionalText, BOUNDED),
];

impl Field {
    /// 0-based sheet column holding this field.
    #[must_use]
    pub const fn column(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn spec(self) -> &'static FieldSpec {
        &SCHEMA[self.column()]
    }

    /// Serialized identifier, as used in JSON output and error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        self.spec().label
    }

    #[must_use]
    pub fn kind(self) -> FieldKind {
        self.spec().kind
    }

    #[must_use]
    pub fn rules(self) -> &'static [Rule] {
        self.spec().rules
    }

    /// Every field in column order.
    pub fn all() -> impl Iterator<Item = Self> {
        SCHEMA.iter().map(|spec| spec.field)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
