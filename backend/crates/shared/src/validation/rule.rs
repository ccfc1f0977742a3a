//! Typed validation rules
//!
//! A [`Rule`] is an enumerated [`RuleKind`] plus typed [`RuleArg`]s. The
//! `name:arg1,arg2` text form exists only at the boundary ([`Rule::to_wire`]).

use std::fmt;

/// Every rule identifier the composer can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RuleKind {
    Accepted,
    AcceptedIf,
    ActiveUrl,
    After,
    AfterOrEqual,
    Alpha,
    AlphaDash,
    AlphaNum,
    Array,
    Before,
    BeforeOrEqual,
    Between,
    Confirmed,
    CurrentPassword,
    Date,
    DateEquals,
    DateFormat,
    Declined,
    DeclinedIf,
    Different,
    Digits,
    DigitsBetween,
    Distinct,
    Email,
    EndsWith,
    Exclude,
    ExcludeIf,
    ExcludeUnless,
    ExcludeWithout,
    Exists,
    Gt,
    Gte,
    In,
    InArray,
    Integer,
    Ip,
    Ipv4,
    Ipv6,
    Json,
    Lt,
    Lte,
    MacAddress,
    Max,
    Min,
    MultipleOf,
    NotIn,
    NotRegex,
    Null,
    NullWith,
    NullWithAll,
    NullWithout,
    NullWithoutAll,
    Numeric,
    Password,
    Present,
    Prohibited,
    ProhibitedIf,
    ProhibitedUnless,
    ProhibitedWith,
    ProhibitedWithAll,
    ProhibitedWithout,
    ProhibitedWithoutAll,
    Prohibits,
    Regex,
    /// Emitted by a satisfied `required_if_rule`; the plain modifier is
    /// a sticky flag, not an entry
    Required,
    RequiredArrayKeys,
    RequiredIf,
    RequiredUnless,
    RequiredWith,
    RequiredWithAll,
    RequiredWithout,
    RequiredWithoutAll,
    Same,
    Size,
    StartsWith,
    String,
    Strlen,
    StrlenMax,
    StrlenMin,
    Timezone,
    Unique,
    Url,
    Uuid,
}

impl RuleKind {
    /// Identifier as the validator expects it
    pub const fn as_str(self) -> &'static str {
        match self {
            RuleKind::Accepted => "accepted",
            RuleKind::AcceptedIf => "accepted_if",
            RuleKind::ActiveUrl => "active_url",
            RuleKind::After => "after",
            RuleKind::AfterOrEqual => "after_or_equal",
            RuleKind::Alpha => "alpha",
            RuleKind::AlphaDash => "alpha_dash",
            RuleKind::AlphaNum => "alpha_num",
            RuleKind::Array => "array",
            RuleKind::Before => "before",
            RuleKind::BeforeOrEqual => "before_or_equal",
            RuleKind::Between => "between",
            RuleKind::Confirmed => "confirmed",
            RuleKind::CurrentPassword => "current_password",
            RuleKind::Date => "date",
            RuleKind::DateEquals => "date_equals",
            RuleKind::DateFormat => "date_format",
            RuleKind::Declined => "declined",
            RuleKind::DeclinedIf => "declined_if",
            RuleKind::Different => "different",
            RuleKind::Digits => "digits",
            RuleKind::DigitsBetween => "digits_between",
            RuleKind::Distinct => "distinct",
            RuleKind::Email => "email",
            RuleKind::EndsWith => "ends_with",
            RuleKind::Exclude => "exclude",
            RuleKind::ExcludeIf => "exclude_if",
            RuleKind::ExcludeUnless => "exclude_unless",
            RuleKind::ExcludeWithout => "exclude_without",
            RuleKind::Exists => "exists",
            RuleKind::Gt => "gt",
            RuleKind::Gte => "gte",
            RuleKind::In => "in",
            RuleKind::InArray => "in_array",
            RuleKind::Integer => "integer",
            RuleKind::Ip => "ip",
            RuleKind::Ipv4 => "ipv4",
            RuleKind::Ipv6 => "ipv6",
            RuleKind::Json => "json",
            RuleKind::Lt => "lt",
            RuleKind::Lte => "lte",
            RuleKind::MacAddress => "mac_address",
            RuleKind::Max => "max",
            RuleKind::Min => "min",
            RuleKind::MultipleOf => "multiple_of",
            RuleKind::NotIn => "not_in",
            RuleKind::NotRegex => "not_regex",
            RuleKind::Null => "null",
            RuleKind::NullWith => "null_with",
            RuleKind::NullWithAll => "null_with_all",
            RuleKind::NullWithout => "null_without",
            RuleKind::NullWithoutAll => "null_without_all",
            RuleKind::Numeric => "numeric",
            RuleKind::Password => "password",
            RuleKind::Present => "present",
            RuleKind::Prohibited => "prohibited",
            RuleKind::ProhibitedIf => "prohibited_if",
            RuleKind::ProhibitedUnless => "prohibited_unless",
            RuleKind::ProhibitedWith => "prohibited_with",
            RuleKind::ProhibitedWithAll => "prohibited_with_all",
            RuleKind::ProhibitedWithout => "prohibited_without",
            RuleKind::ProhibitedWithoutAll => "prohibited_without_all",
            RuleKind::Prohibits => "prohibits",
            RuleKind::Regex => "regex",
            RuleKind::Required => "required",
            RuleKind::RequiredArrayKeys => "required_array_keys",
            RuleKind::RequiredIf => "required_if",
            RuleKind::RequiredUnless => "required_unless",
            RuleKind::RequiredWith => "required_with",
            RuleKind::RequiredWithAll => "required_with_all",
            RuleKind::RequiredWithout => "required_without",
            RuleKind::RequiredWithoutAll => "required_without_all",
            RuleKind::Same => "same",
            RuleKind::Size => "size",
            RuleKind::StartsWith => "starts_with",
            RuleKind::String => "string",
            RuleKind::Strlen => "strlen",
            RuleKind::StrlenMax => "strlen_max",
            RuleKind::StrlenMin => "strlen_min",
            RuleKind::Timezone => "timezone",
            RuleKind::Unique => "unique",
            RuleKind::Url => "url",
            RuleKind::Uuid => "uuid",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One rule argument
///
/// `Null` renders as `NULL`, which validators read as "no value" (for
/// example the ignored id of a `unique` rule).
#[derive(Debug, Clone, PartialEq)]
pub enum RuleArg {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl fmt::Display for RuleArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleArg::Int(v) => write!(f, "{}", v),
            RuleArg::Float(v) => write!(f, "{}", v),
            RuleArg::Text(v) => f.write_str(v),
            RuleArg::Null => f.write_str("NULL"),
        }
    }
}

impl From<i32> for RuleArg {
    fn from(v: i32) -> Self {
        RuleArg::Int(i64::from(v))
    }
}

impl From<i64> for RuleArg {
    fn from(v: i64) -> Self {
        RuleArg::Int(v)
    }
}

impl From<u32> for RuleArg {
    fn from(v: u32) -> Self {
        RuleArg::Int(i64::from(v))
    }
}

impl From<f64> for RuleArg {
    fn from(v: f64) -> Self {
        RuleArg::Float(v)
    }
}

impl From<&str> for RuleArg {
    fn from(v: &str) -> Self {
        RuleArg::Text(v.to_string())
    }
}

impl From<String> for RuleArg {
    fn from(v: String) -> Self {
        RuleArg::Text(v)
    }
}

impl<T: Into<RuleArg>> From<Option<T>> for RuleArg {
    fn from(v: Option<T>) -> Self {
        v.map_or(RuleArg::Null, Into::into)
    }
}

impl RuleArg {
    /// Numeric view used by bound assertions
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            RuleArg::Int(v) => Some(*v as f64),
            RuleArg::Float(v) => Some(*v),
            _ => None,
        }
    }
}

/// A rule identifier with its ordered arguments
///
/// Two rules are the same entry when kind and arguments are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    kind: RuleKind,
    args: Vec<RuleArg>,
}

impl Rule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            args: Vec::new(),
        }
    }

    pub fn with_args<I, A>(kind: RuleKind, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<RuleArg>,
    {
        Self {
            kind,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn args(&self) -> &[RuleArg] {
        &self.args
    }

    /// `name` or `name:arg1,arg2`
    pub fn to_wire(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        for (i, arg) in self.args.iter().enumerate() {
            f.write_str(if i == 0 { ":" } else { "," })?;
            write!(f, "{}", arg)?;
        }
        Ok(())
    }
}

/// Checks requested from an `email` rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmailOptions {
    pub filter: bool,
    pub strict: bool,
    pub dns: bool,
    pub rfc: bool,
    pub spoof: bool,
}

impl Default for EmailOptions {
    fn default() -> Self {
        Self {
            filter: true,
            strict: true,
            dns: true,
            rfc: false,
            spoof: false,
        }
    }
}

impl EmailOptions {
    /// Plain `email` rule without extra checks; used where DNS lookups are
    /// unwanted (local and testing environments).
    pub const fn lenient() -> Self {
        Self {
            filter: false,
            strict: false,
            dns: false,
            rfc: false,
            spoof: false,
        }
    }

    pub(crate) fn names(self) -> Vec<&'static str> {
        [
            (self.filter, "filter"),
            (self.strict, "strict"),
            (self.dns, "dns"),
            (self.rfc, "rfc"),
            (self.spoof, "spoof"),
        ]
        .into_iter()
        .filter_map(|(on, name)| on.then_some(name))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_without_args() {
        assert_eq!(Rule::new(RuleKind::Confirmed).to_wire(), "confirmed");
    }

    #[test]
    fn test_wire_with_args() {
        let rule = Rule::with_args(RuleKind::Between, [RuleArg::Int(1), RuleArg::Float(2.5)]);
        assert_eq!(rule.to_wire(), "between:1,2.5");

        let rule = Rule::with_args(
            RuleKind::Unique,
            [
                RuleArg::from("users"),
                RuleArg::from("email"),
                RuleArg::Null,
                RuleArg::Null,
            ],
        );
        assert_eq!(rule.to_wire(), "unique:users,email,NULL,NULL");
    }

    #[test]
    fn test_rule_equality_uses_args() {
        let a = Rule::with_args(RuleKind::Max, [255]);
        let b = Rule::with_args(RuleKind::Max, [255]);
        let c = Rule::with_args(RuleKind::Max, [256]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_email_option_names() {
        assert_eq!(EmailOptions::default().names(), vec!["filter", "strict", "dns"]);
        assert!(EmailOptions::lenient().names().is_empty());
    }
}
