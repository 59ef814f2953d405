use crate::parser::RawRow;

use super::convert::{to_date, to_decimal, to_int, to_json_map, to_optional_text};
use super::{AuditFields, Field, SupplierRecord, ValidationError};

/// Converts a raw row and validates the result.
///
/// # Errors
///
/// Returns the first field that violates its schema rules.
#[cfg_attr(feature = "hotpath", hotpath::measure)]
pub fn map_row(row: &RawRow) -> Result<SupplierRecord, ValidationError> {
    let record = build_record(row);
    record.validate()?;
    Ok(record)
}

/// Converts a raw row into a record without validating it.
///
/// Unparseable numbers become zero, unrecognised dates become the zero
/// instant and malformed JSON maps become `None`.
#[must_use]
pub fn build_record(row: &RawRow) -> SupplierRecord {
    let cell = |field: Field| row.get(field.column());
    let text = |field: Field| cell(field).to_owned();
    let optional = |field: Field| to_optional_text(cell(field));
    let int = |field: Field| to_int(cell(field));
    let decimal = |field: Field| to_decimal(cell(field));
    let date = |field: Field| to_date(cell(field));
    let map = |field: Field| to_json_map(cell(field));

    SupplierRecord {
        audit: AuditFields::new(),
        partner_id: text(Field::PartnerId),
        partner_name: text(Field::PartnerName),
        customer_id: text(Field::CustomerId),
        customer_name: text(Field::CustomerName),
        customer_domain_name: text(Field::CustomerDomainName),
        customer_country: text(Field::CustomerCountry),
        mpn_id: int(Field::MpnId),
        tier2_mpn_id: int(Field::Tier2MpnId),
        invoice_number: text(Field::InvoiceNumber),
        product_id: text(Field::ProductId),
        sku_id: text(Field::SkuId),
        availability_id: text(Field::AvailabilityId),
        sku_name: text(Field::SkuName),
        product_name: text(Field::ProductName),
        publisher_name: text(Field::PublisherName),
        publisher_id: optional(Field::PublisherId),
        subscription_description: optional(Field::SubscriptionDescription),
        subscription_id: text(Field::SubscriptionId),
        charge_start_date: date(Field::ChargeStartDate),
        charge_end_date: date(Field::ChargeEndDate),
        usage_date: date(Field::UsageDate),
        meter_type: text(Field::MeterType),
        meter_category: text(Field::MeterCategory),
        meter_id: text(Field::MeterId),
        meter_sub_category: text(Field::MeterSubCategory),
        meter_name: text(Field::MeterName),
        meter_region: optional(Field::MeterRegion),
        unit: text(Field::Unit),
        resource_location: text(Field::ResourceLocation),
        consumed_service: text(Field::ConsumedService),
        resource_group: text(Field::ResourceGroup),
        resource_uri: text(Field::ResourceUri),
        charge_type: text(Field::ChargeType),
        unit_price: decimal(Field::UnitPrice),
        quantity: decimal(Field::Quantity),
        unit_type: text(Field::UnitType),
        billing_pre_tax_total: decimal(Field::BillingPreTaxTotal),
        billing_currency: text(Field::BillingCurrency),
        pricing_pre_tax_total: decimal(Field::PricingPreTaxTotal),
        pricing_currency: text(Field::PricingCurrency),
        service_info1: optional(Field::ServiceInfo1),
        service_info2: optional(Field::ServiceInfo2),
        tags: map(Field::Tags),
        additional_info: map(Field::AdditionalInfo),
        effective_unit_price: decimal(Field::EffectiveUnitPrice),
        pc_to_bc_exchange_rate: int(Field::PcToBcExchangeRate),
        pc_to_bc_exchange_rate_date: date(Field::PcToBcExchangeRateDate),
        entitlement_id: text(Field::EntitlementId),
        entitlement_description: text(Field::EntitlementDescription),
        partner_earned_credit_percentage: int(Field::PartnerEarnedCreditPercentage),
        credit_percentage: int(Field::CreditPercentage),
        credit_type: text(Field::CreditType),
        benefit_order_id: optional(Field::BenefitOrderId),
        benefit_id: optional(Field::BenefitId),
        benefit_type: optional(Field::BenefitType),
    }
}
