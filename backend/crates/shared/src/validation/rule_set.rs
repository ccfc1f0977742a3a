//! RuleSet - fluent composer for one field's validation rules
//!
//! Entries are deduplicated (kind + arguments, callables by identity) and
//! kept in insertion order; validators that stop at the first failing rule
//! depend on that order. Modifiers are sticky flags rendered ahead of the
//! entries in the fixed order `bail, sometimes, nullable, filled, required`.
//! Conditional entries (`required_if_rule` and friends) keep their
//! insertion slot and render only while their condition holds.
//!
//! ## Examples
//! ```rust
//! use kernel::validation::RuleSet;
//!
//! let rules = RuleSet::new()
//!     .required()
//!     .nullable()
//!     .string(255)
//!     .string(255);
//!
//! assert_eq!(
//!     rules.to_wire_strings(),
//!     vec!["nullable", "required", "string", "max:255"]
//! );
//! ```
//!
//! Bound helpers check their arguments against the column constants in
//! [`super::bounds`] and panic on violation: a wrong bound is a bug in the
//! code declaring the rules, never a runtime input problem.

use std::borrow::Cow;

use serde_json::Value;

use super::bounds::{self, IntColumn, TextColumn};
use super::callback::{
    CallbackRule, Condition, DEFAULT_CALLBACK_MESSAGE, DEFAULT_QUERY_MESSAGE, ExistenceQuery,
    query_rule,
};
use super::rule::{EmailOptions, Rule, RuleArg, RuleKind};

// ============================================================================
// Entries
// ============================================================================

/// Sticky presence modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Bail,
    Sometimes,
    Nullable,
    Filled,
    Required,
}

impl Modifier {
    /// Serialization order
    pub const ORDER: [Modifier; 5] = [
        Modifier::Bail,
        Modifier::Sometimes,
        Modifier::Nullable,
        Modifier::Filled,
        Modifier::Required,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Modifier::Bail => "bail",
            Modifier::Sometimes => "sometimes",
            Modifier::Nullable => "nullable",
            Modifier::Filled => "filled",
            Modifier::Required => "required",
        }
    }
}

/// A rule stored in a [`RuleSet`]
#[derive(Debug, Clone)]
pub enum RuleEntry {
    Rule(Rule),
    Callback(CallbackRule),
    /// `kind` applies while `condition` holds
    Conditional { kind: RuleKind, condition: Condition },
}

impl RuleEntry {
    /// The rule this entry renders as right now
    fn active_rule(&self) -> Option<Rule> {
        match self {
            RuleEntry::Rule(rule) => Some(rule.clone()),
            RuleEntry::Conditional { kind, condition } => condition.holds().then(|| Rule::new(*kind)),
            RuleEntry::Callback(_) => None,
        }
    }
}

impl PartialEq for RuleEntry {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RuleEntry::Rule(a), RuleEntry::Rule(b)) => a == b,
            (RuleEntry::Callback(a), RuleEntry::Callback(b)) => a.same_as(b),
            (
                RuleEntry::Conditional { kind: a, condition: ca },
                RuleEntry::Conditional { kind: b, condition: cb },
            ) => a == b && ca.same_as(cb),
            _ => false,
        }
    }
}

/// Output of [`RuleSet::to_ordered_rules`]
#[derive(Debug, Clone, PartialEq)]
pub enum OrderedRule {
    Modifier(Modifier),
    Rule(Rule),
    Callback(CallbackRule),
}

impl PartialEq for CallbackRule {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

/// Boundary form handed to a validator
#[derive(Debug, Clone)]
pub enum WireRule {
    Text(String),
    Callback(CallbackRule),
}

impl WireRule {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WireRule::Text(text) => Some(text),
            WireRule::Callback(_) => None,
        }
    }
}

// ============================================================================
// RuleSet
// ============================================================================

/// Ordered, deduplicated rules for one input field
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    bail: bool,
    sometimes: bool,
    nullable: bool,
    filled: bool,
    required: bool,
    entries: Vec<RuleEntry>,
}

/// Generates argument-less rule methods
macro_rules! plain_rules {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $name(self) -> Self {
                self.add_rule(Rule::new(RuleKind::$kind))
            }
        )*
    };
}

/// Generates rules taking one field name or literal
macro_rules! single_arg_rules {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $name(self, value: &str) -> Self {
                self.add_rule(Rule::with_args(RuleKind::$kind, [value]))
            }
        )*
    };
}

/// Generates rules taking a list of fields or values
macro_rules! list_rules {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $name(self, values: impl IntoIterator<Item = impl Into<RuleArg>>) -> Self {
                self.add_rule(Rule::with_args(RuleKind::$kind, values))
            }
        )*
    };
}

/// Generates `rule(field, values)` conditional rules
macro_rules! field_values_rules {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $name(self, field: &str, values: impl IntoIterator<Item = impl Into<RuleArg>>) -> Self {
                let args = std::iter::once(RuleArg::from(field))
                    .chain(values.into_iter().map(Into::into));
                self.add_rule(Rule::with_args(RuleKind::$kind, args))
            }
        )*
    };
}

/// Generates `rule(condition)` entries rendered only while the condition holds
macro_rules! conditional_rules {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $name(self, condition: impl Into<Condition>) -> Self {
                self.push(RuleEntry::Conditional {
                    kind: RuleKind::$kind,
                    condition: condition.into(),
                })
            }
        )*
    };
}

/// Generates column-bounded integer helpers
macro_rules! int_column_rules {
    ($($name:ident => $column:ident),* $(,)?) => {
        $(
            pub fn $name(self, min: Option<i64>, max: Option<i64>) -> Self {
                self.int_column(IntColumn::$column, min, max)
            }
        )*
    };
}

/// Generates column-bounded text helpers
macro_rules! text_column_rules {
    ($($name:ident => $column:ident),* $(,)?) => {
        $(
            pub fn $name(self, max: Option<i64>) -> Self {
                self.text_column(TextColumn::$column, max)
            }
        )*
    };
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Core
    // ========================================================================

    /// Append a rule unless an equal one is already present
    pub fn add_rule(self, rule: Rule) -> Self {
        self.push(RuleEntry::Rule(rule))
    }

    /// Append a predicate rule unless the same predicate is present
    pub fn add_callback(self, rule: CallbackRule) -> Self {
        self.push(RuleEntry::Callback(rule))
    }

    fn push(mut self, entry: RuleEntry) -> Self {
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
        self
    }

    /// Apply `f` only when `condition` holds
    ///
    /// ```rust
    /// use kernel::validation::RuleSet;
    ///
    /// let is_update = true;
    /// let rules = RuleSet::new()
    ///     .string(255)
    ///     .when(is_update, |r| r.sometimes())
    ///     .when(!is_update, |r| r.required());
    /// assert!(rules.is_sometimes());
    /// assert!(!rules.is_required());
    /// ```
    pub fn when(self, condition: bool, f: impl FnOnce(Self) -> Self) -> Self {
        if condition { f(self) } else { self }
    }

    /// Apply `f` unconditionally; handy for shared rule fragments
    pub fn tap(self, f: impl FnOnce(Self) -> Self) -> Self {
        f(self)
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    pub fn bail(mut self) -> Self {
        self.bail = true;
        self
    }

    pub fn sometimes(mut self) -> Self {
        self.sometimes = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn filled(mut self) -> Self {
        self.filled = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_bail(&self) -> bool {
        self.bail
    }

    pub fn is_sometimes(&self) -> bool {
        self.sometimes
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_filled(&self) -> bool {
        self.filled
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Active modifiers in serialization order
    pub fn modifiers(&self) -> Vec<Modifier> {
        Modifier::ORDER
            .into_iter()
            .filter(|m| match m {
                Modifier::Bail => self.bail,
                Modifier::Sometimes => self.sometimes,
                Modifier::Nullable => self.nullable,
                Modifier::Filled => self.filled,
                Modifier::Required => self.required,
            })
            .collect()
    }

    // ========================================================================
    // Plain rules
    // ========================================================================

    plain_rules! {
        accepted => Accepted,
        active_url => ActiveUrl,
        alpha => Alpha,
        alpha_dash => AlphaDash,
        alpha_num => AlphaNum,
        array => Array,
        confirmed => Confirmed,
        date => Date,
        declined => Declined,
        exclude => Exclude,
        ip => Ip,
        ipv4 => Ipv4,
        ipv6 => Ipv6,
        json => Json,
        mac_address => MacAddress,
        null => Null,
        numeric => Numeric,
        present => Present,
        prohibited => Prohibited,
        raw => String,
        timezone => Timezone,
        url => Url,
        uuid => Uuid,
    }

    single_arg_rules! {
        after => After,
        after_or_equal => AfterOrEqual,
        before => Before,
        before_or_equal => BeforeOrEqual,
        date_equals => DateEquals,
        date_format => DateFormat,
        different => Different,
        exclude_without => ExcludeWithout,
        gt => Gt,
        gte => Gte,
        in_array => InArray,
        lt => Lt,
        lte => Lte,
        not_regex => NotRegex,
        regex => Regex,
        same => Same,
    }

    list_rules! {
        ends_with => EndsWith,
        in_list => In,
        not_in => NotIn,
        null_with => NullWith,
        null_with_all => NullWithAll,
        null_without => NullWithout,
        null_without_all => NullWithoutAll,
        object => Array,
        prohibited_with => ProhibitedWith,
        prohibited_with_all => ProhibitedWithAll,
        prohibited_without => ProhibitedWithout,
        prohibited_without_all => ProhibitedWithoutAll,
        prohibits => Prohibits,
        required_array_keys => RequiredArrayKeys,
        required_with => RequiredWith,
        required_with_all => RequiredWithAll,
        required_without => RequiredWithout,
        required_without_all => RequiredWithoutAll,
        starts_with => StartsWith,
    }

    field_values_rules! {
        accepted_if => AcceptedIf,
        declined_if => DeclinedIf,
        exclude_if => ExcludeIf,
        exclude_unless => ExcludeUnless,
        prohibited_if => ProhibitedIf,
        prohibited_unless => ProhibitedUnless,
        required_if => RequiredIf,
        required_unless => RequiredUnless,
    }

    conditional_rules! {
        exclude_if_rule => Exclude,
        prohibited_if_rule => Prohibited,
        required_if_rule => Required,
    }

    // ========================================================================
    // Rules with typed arguments
    // ========================================================================

    pub fn min(self, min: impl Into<RuleArg>) -> Self {
        self.add_rule(Rule::with_args(RuleKind::Min, [min.into()]))
    }

    pub fn max(self, max: impl Into<RuleArg>) -> Self {
        self.add_rule(Rule::with_args(RuleKind::Max, [max.into()]))
    }

    pub fn size(self, size: impl Into<RuleArg>) -> Self {
        self.add_rule(Rule::with_args(RuleKind::Size, [size.into()]))
    }

    pub fn multiple_of(self, factor: impl Into<RuleArg>) -> Self {
        self.add_rule(Rule::with_args(RuleKind::MultipleOf, [factor.into()]))
    }

    pub fn between(self, min: impl Into<RuleArg>, max: impl Into<RuleArg>) -> Self {
        let (min, max) = (min.into(), max.into());
        if let (Some(lo), Some(hi)) = (min.as_f64(), max.as_f64()) {
            assert!(hi >= lo, "between: max ({hi}) must be >= min ({lo})");
        }
        self.add_rule(Rule::with_args(RuleKind::Between, [min, max]))
    }

    pub fn digits(self, length: u32) -> Self {
        assert!(length > 0, "digits: length must be positive");
        self.add_rule(Rule::with_args(RuleKind::Digits, [length]))
    }

    pub fn digits_between(self, min: u32, max: u32) -> Self {
        assert!(max >= min, "digits_between: max ({max}) must be >= min ({min})");
        self.add_rule(Rule::with_args(RuleKind::DigitsBetween, [min, max]))
    }

    pub fn distinct(self, strict: bool, ignore_case: bool) -> Self {
        let mut args = Vec::new();
        if strict {
            args.push("strict");
        }
        if ignore_case {
            args.push("ignore_case");
        }
        self.add_rule(Rule::with_args(RuleKind::Distinct, args))
    }

    /// `email` with the requested checks
    pub fn email(self, options: EmailOptions) -> Self {
        self.add_rule(Rule::with_args(RuleKind::Email, options.names()))
    }

    /// Password of the authenticated principal, optionally in another guard
    pub fn current_password(self, guard: Option<&str>) -> Self {
        self.add_rule(Rule::with_args(RuleKind::CurrentPassword, guard))
    }

    pub fn exists(self, table: &str, column: &str, wheres: &[&str]) -> Self {
        let args = [table, column].into_iter().chain(wheres.iter().copied());
        self.add_rule(Rule::with_args(RuleKind::Exists, args))
    }

    /// `unique:table,column,ignore,id_column,wheres...`
    pub fn unique(
        self,
        table: &str,
        column: &str,
        ignore: impl Into<RuleArg>,
        id_column: Option<&str>,
        wheres: &[&str],
    ) -> Self {
        let args = [
            RuleArg::from(table),
            RuleArg::from(column),
            ignore.into(),
            RuleArg::from(id_column),
        ]
        .into_iter()
        .chain(wheres.iter().map(|w| RuleArg::from(*w)));
        self.add_rule(Rule::with_args(RuleKind::Unique, args))
    }

    /// `integer` restricted to `0` or `1`
    pub fn boolean(self) -> Self {
        self.add_rule(Rule::new(RuleKind::Integer)).in_list(["0", "1"])
    }

    /// [`RuleSet::boolean`] that only accepts `1`
    pub fn r#true(self) -> Self {
        self.boolean().in_list(["1"])
    }

    /// [`RuleSet::boolean`] that only accepts `0`
    pub fn r#false(self) -> Self {
        self.boolean().in_list(["0"])
    }

    /// Password strength rule with [`bounds::DEFAULT_PASSWORD_MIN`]
    pub fn password(self) -> Self {
        self.password_rule(bounds::DEFAULT_PASSWORD_MIN)
    }

    /// Password strength rule with a custom minimum length
    pub fn password_rule(self, min: i64) -> Self {
        assert!(min > 0, "password: min must be positive");
        self.add_rule(Rule::with_args(RuleKind::Password, [min]))
    }

    // ========================================================================
    // Length helpers
    // ========================================================================

    /// Exact byte length
    pub fn strlen(self, length: i64) -> Self {
        assert!(length > 0, "strlen: length must be positive");
        self.add_rule(Rule::with_args(RuleKind::Strlen, [length]))
    }

    pub fn strlen_max(self, max: i64) -> Self {
        assert!(max > 0, "strlen_max: max must be positive");
        self.add_rule(Rule::with_args(RuleKind::StrlenMax, [max]))
    }

    pub fn strlen_min(self, min: i64) -> Self {
        assert!(min > 0, "strlen_min: min must be positive");
        self.add_rule(Rule::with_args(RuleKind::StrlenMin, [min]))
    }

    /// `string` + `max`
    pub fn string(self, max: i64) -> Self {
        assert!(max > 0, "string: max must be positive");
        self.raw().max(max)
    }

    /// `string` + `max`, capped at [`bounds::VARCHAR_MAX`]
    pub fn varchar(self, max: Option<i64>) -> Self {
        let max = max.unwrap_or(bounds::VARCHAR_MAX);
        assert!(
            max > 0 && max <= bounds::VARCHAR_MAX,
            "varchar: max ({max}) outside 1..={}",
            bounds::VARCHAR_MAX
        );
        self.raw().max(max)
    }

    /// Fixed-length string
    pub fn char(self, length: i64) -> Self {
        self.raw().strlen(length)
    }

    text_column_rules! {
        tiny_text => Tiny,
        text => Text,
        medium_text => Medium,
        long_text => Long,
    }

    fn text_column(self, column: TextColumn, max: Option<i64>) -> Self {
        let limit = column.max_len();
        let max = max.unwrap_or(limit);
        assert!(max <= limit, "{column:?} text: max ({max}) exceeds {limit}");
        self.raw().strlen_max(max)
    }

    // ========================================================================
    // Integer helpers
    // ========================================================================

    /// `integer` + `min` + `max`
    pub fn integer(self, min: i64, max: i64) -> Self {
        assert!(max >= min, "integer: max ({max}) must be >= min ({min})");
        self.add_rule(Rule::new(RuleKind::Integer)).min(min).max(max)
    }

    int_column_rules! {
        tiny_int => Tiny,
        unsigned_tiny_int => UnsignedTiny,
        small_int => Small,
        unsigned_small_int => UnsignedSmall,
        medium_int => Medium,
        unsigned_medium_int => UnsignedMedium,
        int => Int,
        unsigned_int => UnsignedInt,
        big_int => Big,
        unsigned_big_int => UnsignedBig,
    }

    /// Alias of [`RuleSet::unsigned_big_int`]
    pub fn unsigned(self, min: Option<i64>, max: Option<i64>) -> Self {
        self.unsigned_big_int(min, max)
    }

    /// Alias of [`RuleSet::big_int`]
    pub fn signed(self, min: Option<i64>, max: Option<i64>) -> Self {
        self.big_int(min, max)
    }

    fn int_column(self, column: IntColumn, min: Option<i64>, max: Option<i64>) -> Self {
        let (lo, hi) = column.range();
        let min = min.unwrap_or(lo);
        let max = max.unwrap_or(hi);
        assert!(min >= lo, "{column:?} int: min ({min}) below {lo}");
        assert!(max <= hi, "{column:?} int: max ({max}) above {hi}");
        self.integer(min, max)
    }

    /// `array` + `min` + `max` item counts
    pub fn collection(self, min_items: i64, max_items: i64) -> Self {
        assert!(min_items >= 0, "collection: min_items must be >= 0");
        assert!(max_items > 0, "collection: max_items must be positive");
        assert!(max_items >= min_items, "collection: max_items must be >= min_items");
        self.array().min(min_items).max(max_items)
    }

    // ========================================================================
    // Opaque rules
    // ========================================================================

    /// Predicate rule reported as `validation.regex` on failure
    pub fn callback<F>(self, predicate: F) -> Self
    where
        F: Fn(&Value, &str) -> bool + Send + Sync + 'static,
    {
        self.callback_with_message(predicate, DEFAULT_CALLBACK_MESSAGE)
    }

    pub fn callback_with_message<F>(self, predicate: F, message: impl Into<Cow<'static, str>>) -> Self
    where
        F: Fn(&Value, &str) -> bool + Send + Sync + 'static,
    {
        self.add_callback(CallbackRule::new(predicate, message))
    }

    /// Closure rule; `Err` carries the message key to report
    ///
    /// ```rust
    /// use kernel::validation::RuleSet;
    ///
    /// let rules = RuleSet::new().closure(|value, _| match value.as_str() {
    ///     Some("root") => Err("validation.reserved".into()),
    ///     _ => Ok(()),
    /// });
    /// assert_eq!(
    ///     rules.failing_callbacks(&"root".into(), "name"),
    ///     vec!["validation.reserved".to_string()]
    /// );
    /// ```
    pub fn closure<F>(self, check: F) -> Self
    where
        F: Fn(&Value, &str) -> Result<(), Cow<'static, str>> + Send + Sync + 'static,
    {
        self.add_callback(CallbackRule::closure(check))
    }

    /// Passes when the constrained clone of `template` finds a record
    pub fn query<Q, F>(self, template: Q, constrain: F) -> Self
    where
        Q: ExistenceQuery,
        F: Fn(&mut Q, &Value, &str) + Send + Sync + 'static,
    {
        self.query_with_message(template, constrain, DEFAULT_QUERY_MESSAGE)
    }

    pub fn query_with_message<Q, F>(
        self,
        template: Q,
        constrain: F,
        message: impl Into<Cow<'static, str>>,
    ) -> Self
    where
        Q: ExistenceQuery,
        F: Fn(&mut Q, &Value, &str) + Send + Sync + 'static,
    {
        self.add_callback(query_rule(template, constrain, false, message))
    }

    /// Like [`RuleSet::query`], keyed by the field value
    pub fn query_key<Q, F>(self, template: Q, constrain: F) -> Self
    where
        Q: ExistenceQuery,
        F: Fn(&mut Q, &Value, &str) + Send + Sync + 'static,
    {
        self.query_key_with_message(template, constrain, DEFAULT_QUERY_MESSAGE)
    }

    pub fn query_key_with_message<Q, F>(
        self,
        template: Q,
        constrain: F,
        message: impl Into<Cow<'static, str>>,
    ) -> Self
    where
        Q: ExistenceQuery,
        F: Fn(&mut Q, &Value, &str) + Send + Sync + 'static,
    {
        self.add_callback(query_rule(template, constrain, true, message))
    }

    // ========================================================================
    // Output
    // ========================================================================

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Whether a rule of `kind` is present, counting conditional entries
    /// whose condition currently holds
    pub fn has_rule(&self, kind: RuleKind) -> bool {
        self.entries
            .iter()
            .filter_map(RuleEntry::active_rule)
            .any(|rule| rule.kind() == kind)
    }

    /// Modifiers in fixed order, then entries in insertion order; unmet
    /// conditional entries are left out
    pub fn to_ordered_rules(&self) -> Vec<OrderedRule> {
        self.modifiers()
            .into_iter()
            .map(OrderedRule::Modifier)
            .chain(self.entries.iter().filter_map(|entry| match entry {
                RuleEntry::Callback(cb) => Some(OrderedRule::Callback(cb.clone())),
                _ => entry.active_rule().map(OrderedRule::Rule),
            }))
            .collect()
    }

    /// Validator boundary form; callables stay opaque
    pub fn to_wire(&self) -> Vec<WireRule> {
        self.to_ordered_rules()
            .into_iter()
            .map(|rule| match rule {
                OrderedRule::Modifier(m) => WireRule::Text(m.as_str().to_string()),
                OrderedRule::Rule(r) => WireRule::Text(r.to_wire()),
                OrderedRule::Callback(cb) => WireRule::Callback(cb),
            })
            .collect()
    }

    /// Text entries of [`RuleSet::to_wire`]
    pub fn to_wire_strings(&self) -> Vec<String> {
        self.to_wire()
            .iter()
            .filter_map(|w| w.as_text().map(str::to_string))
            .collect()
    }

    /// Evaluate the predicate entries against one value, returning the
    /// message keys of the failing ones in declaration order
    pub fn failing_callbacks(&self, value: &Value, attribute: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| match entry {
                RuleEntry::Callback(cb) => cb.check(value, attribute).err().map(Cow::into_owned),
                _ => None,
            })
            .collect()
    }
}

// ============================================================================
// FieldRules
// ============================================================================

/// Rule sets for a whole request, in field declaration order
#[derive(Debug, Clone, Default)]
pub struct FieldRules(Vec<(String, RuleSet)>);

impl FieldRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or replace) the rules of a field; a replaced field keeps
    /// its original position
    pub fn field(mut self, name: impl Into<String>, rules: RuleSet) -> Self {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = rules,
            None => self.0.push((name, rules)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&RuleSet> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, r)| r)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleSet)> {
        self.0.iter().map(|(n, r)| (n.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
