use std::collections::BTreeMap;
use std::fmt;

use time::OffsetDateTime;

use super::convert::ZERO_INSTANT;
use super::field::Field;

const MAX_LABEL_LEN: usize = 63;
const MAX_LOCAL_PART_LEN: usize = 64;

/// Declarative constraint attached to a field in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Text is non-empty, numbers are non-zero, dates differ from the zero instant.
    Required,
    /// Text holds at most this many characters.
    MaxLen(usize),
    /// Text is a fully qualified domain name.
    Fqdn,
    /// Text is an e-mail address whose domain is a fully qualified domain name.
    Email,
    /// Numbers are finite; text is a plain decimal literal.
    Numeric,
}

impl Rule {
    /// Short identifier used in messages and machine-readable output.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MaxLen(_) => "max",
            Self::Fqdn => "fqdn",
            Self::Email => "email",
            Self::Numeric => "numeric",
        }
    }

    /// Whether `value` satisfies this rule.
    #[must_use]
    pub fn check(self, value: &FieldValue<'_>) -> bool {
        match (self, value) {
            (Self::Required, value) => value.is_present(),
            (Self::MaxLen(max), value) => value.text().is_none_or(|text| text.chars().count() <= max),
            (Self::Fqdn, value) => value.text().is_none_or(is_fqdn),
            (Self::Email, value) => value.text().is_none_or(is_email),
            (Self::Numeric, FieldValue::Decimal(number)) => number.is_finite(),
            (Self::Numeric, FieldValue::Integer(_)) => true,
            (Self::Numeric, value) => value.text().is_none_or(is_numeric_literal),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("is required"),
            Self::MaxLen(max) => write!(f, "must be at most {max} characters"),
            Self::Fqdn => f.write_str("must be a valid domain name"),
            Self::Email => f.write_str("must be a valid e-mail address"),
            Self::Numeric => f.write_str("must be numeric"),
        }
    }
}

/// Borrowed view of a converted field, as seen by the rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    OptionalText(Option<&'a str>),
    Integer(i64),
    Decimal(f64),
    Date(OffsetDateTime),
    JsonMap(Option<&'a BTreeMap<String, String>>),
}

impl<'a> FieldValue<'a> {
    fn text(&self) -> Option<&'a str> {
        match *self {
            Self::Text(text) => Some(text),
            Self::OptionalText(text) => text,
            _ => None,
        }
    }

    fn is_present(&self) -> bool {
        match *self {
            Self::Text(text) => !text.is_empty(),
            Self::OptionalText(text) => text.is_some(),
            Self::Integer(number) => number != 0,
            Self::Decimal(number) => number != 0.0,
            Self::Date(instant) => instant != ZERO_INSTANT,
            Self::JsonMap(map) => map.is_some(),
        }
    }
}

/// A record failed a declarative rule. Names the first offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error(
    "validation failed on field '{field}' (rule: {tag}): {label} {rule}",
    tag = .rule.tag(),
    label = .field.label()
)]
pub struct ValidationError {
    field: Field,
    rule: Rule,
}

impl ValidationError {
    #[must_use]
    pub const fn new(field: Field, rule: Rule) -> Self {
        Self { field, rule }
    }

    #[must_use]
    pub const fn field(&self) -> Field {
        self.field
    }

    #[must_use]
    pub const fn rule(&self) -> Rule {
        self.rule
    }
}

/// Applies the schema rules of `field` in order, reporting the first violation.
///
/// # Errors
///
/// Returns the first rule `value` does not satisfy.
pub fn check_field(field: Field, value: &FieldValue<'_>) -> Result<(), ValidationError> {
    match field.rules().iter().find(|rule| !rule.check(value)) {
        Some(rule) => Err(ValidationError::new(field, *rule)),
        None => Ok(()),
    }
}

/// Fully qualified domain name: at least two dot-separated labels, an optional
/// trailing dot, and a top-level label starting with a letter.
#[must_use]
pub fn is_fqdn(text: &str) -> bool {
    let name = text.strip_suffix('.').unwrap_or(text);
    let Some((hosts, tld)) = name.rsplit_once('.') else {
        return false;
    };
    if !valid_tld(tld) {
        return false;
    }
    hosts.split('.').all(valid_host_label)
}

fn valid_host_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) => {
            bytes.len() <= MAX_LABEL_LEN
                && first.is_ascii_alphanumeric()
                && rest.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        }
        None => false,
    }
}

fn valid_tld(label: &str) -> bool {
    let bytes = label.as_bytes();
    match bytes.split_first() {
        Some((first, rest)) => {
            bytes.len() <= MAX_LABEL_LEN
                && first.is_ascii_alphabetic()
                && rest.iter().all(u8::is_ascii_alphanumeric)
        }
        None => false,
    }
}

/// E-mail address with a dot-atom local part and a fully qualified domain.
#[must_use]
pub fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.rsplit_once('@') else {
        return false;
    };
    if local.is_empty()
        || local.len() > MAX_LOCAL_PART_LEN
        || local.starts_with('.')
        || local.ends_with('.')
        || local.contains("..")
    {
        return false;
    }
    let local_ok = local
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+/=?^_`{|}~.-".contains(&b));
    local_ok && !domain.ends_with('.') && is_fqdn(domain)
}

// `[-+]?[0-9]+(\.[0-9]+)?`
fn is_numeric_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.is_none_or(digits)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn required_depends_on_kind() {
        assert!(!Rule::Required.check(&FieldValue::Text("")));
        assert!(Rule::Required.check(&FieldValue::Text("x")));
        assert!(!Rule::Required.check(&FieldValue::OptionalText(None)));
        assert!(!Rule::Required.check(&FieldValue::Integer(0)));
        assert!(Rule::Required.check(&FieldValue::Decimal(0.5)));
        assert!(!Rule::Required.check(&FieldValue::Date(ZERO_INSTANT)));
        assert!(Rule::Required.check(&FieldValue::Date(datetime!(2021-01-01 0:00 UTC))));
        assert!(!Rule::Required.check(&FieldValue::JsonMap(None)));
    }

    #[test]
    fn max_len_counts_characters() {
        let rule = Rule::MaxLen(3);
        assert!(rule.check(&FieldValue::Text("äöü")));
        assert!(!rule.check(&FieldValue::Text("abcd")));
        assert!(rule.check(&FieldValue::OptionalText(None)));
        assert!(!rule.check(&FieldValue::OptionalText(Some("abcd"))));
        assert!(rule.check(&FieldValue::Integer(123_456)));
    }

    #[test]
    fn domain_names() {
        for good in ["contoso.com", "mail.contoso.co.uk", "a-b.example.org.", "x1.io"] {
            assert!(is_fqdn(good), "{good}");
        }
        for bad in ["", "localhost", "-bad.com", "contoso..com", "contoso.1com", "con toso.com", ".com"] {
            assert!(!is_fqdn(bad), "{bad}");
        }
        let long = format!("{}.com", "a".repeat(64));
        assert!(!is_fqdn(&long));
    }

    #[test]
    fn email_addresses() {
        assert!(is_email("billing@contoso.com"));
        assert!(is_email("first.last+tag@mail.contoso.com"));
        assert!(!is_email("contoso.com"));
        assert!(!is_email("@contoso.com"));
        assert!(!is_email("a..b@contoso.com"));
        assert!(!is_email("user@localhost"));
        assert!(Rule::Email.check(&FieldValue::OptionalText(None)));
    }

    #[test]
    fn numeric_rejects_only_non_finite_numbers() {
        assert!(Rule::Numeric.check(&FieldValue::Integer(0)));
        assert!(Rule::Numeric.check(&FieldValue::Decimal(0.0)));
        assert!(!Rule::Numeric.check(&FieldValue::Decimal(f64::NAN)));
        assert!(!Rule::Numeric.check(&FieldValue::Decimal(f64::INFINITY)));
        assert!(Rule::Numeric.check(&FieldValue::Text("-12.50")));
        assert!(!Rule::Numeric.check(&FieldValue::Text("12.")));
        assert!(!Rule::Numeric.check(&FieldValue::Text("1e3")));
    }

    #[test]
    fn first_rule_of_field_wins() {
        let err = check_field(Field::CustomerDomainName, &FieldValue::Text("")).expect_err("empty");
        assert_eq!(err.rule(), Rule::Required);
        let err = check_field(Field::CustomerDomainName, &FieldValue::Text("intranet"))
            .expect_err("not a domain");
        assert_eq!(err.rule(), Rule::Fqdn);
        assert!(check_field(Field::CustomerDomainName, &FieldValue::Text("contoso.com")).is_ok());
    }

    #[test]
    fn message_names_field_and_rule() {
        let err = ValidationError::new(Field::PartnerName, Rule::MaxLen(255));
        assert_eq!(
            err.to_string(),
            "validation failed on field 'partnerName' (rule: max): Partner name must be at most 255 characters"
        );
    }
}
