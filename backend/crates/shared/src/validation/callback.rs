//! Opaque rule entries: custom predicates, closures, deferred existence
//! queries and the conditions of `*_if_rule` entries

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Message key of a predicate rule when none is given
pub const DEFAULT_CALLBACK_MESSAGE: &str = "validation.regex";

/// Message key of an existence rule when none is given
pub const DEFAULT_QUERY_MESSAGE: &str = "validation.exists";

/// Nominal message key of a closure rule; the closure reports its own
pub const DEFAULT_CLOSURE_MESSAGE: &str = "validation.closure";

type Check = dyn Fn(&Value, &str) -> Result<(), Cow<'static, str>> + Send + Sync;

/// Opaque check with the message key reported when it fails
///
/// The check receives the field value and the attribute name.
/// Clones share the same check, so a cloned entry is still "the same
/// rule" for deduplication.
#[derive(Clone)]
pub struct CallbackRule {
    check: Arc<Check>,
    message: Cow<'static, str>,
}

impl CallbackRule {
    /// Boolean predicate failing with `message`
    pub fn new<F>(predicate: F, message: impl Into<Cow<'static, str>>) -> Self
    where
        F: Fn(&Value, &str) -> bool + Send + Sync + 'static,
    {
        let message = message.into();
        let reported = message.clone();
        Self {
            check: Arc::new(move |value: &Value, attribute: &str| {
                if predicate(value, attribute) {
                    Ok(())
                } else {
                    Err(reported.clone())
                }
            }),
            message,
        }
    }

    /// Closure that fails with a message key of its own choosing
    pub fn closure<F>(check: F) -> Self
    where
        F: Fn(&Value, &str) -> Result<(), Cow<'static, str>> + Send + Sync + 'static,
    {
        Self {
            check: Arc::new(check),
            message: Cow::Borrowed(DEFAULT_CLOSURE_MESSAGE),
        }
    }

    /// `Err` carries the message key to report
    pub fn check(&self, value: &Value, attribute: &str) -> Result<(), Cow<'static, str>> {
        (self.check)(value, attribute)
    }

    pub fn passes(&self, value: &Value, attribute: &str) -> bool {
        self.check(value, attribute).is_ok()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Reference identity
    pub fn same_as(&self, other: &CallbackRule) -> bool {
        Arc::ptr_eq(&self.check, &other.check)
    }
}

impl fmt::Debug for CallbackRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRule")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Condition of a `required_if_rule`, `prohibited_if_rule` or
/// `exclude_if_rule` entry
///
/// A deferred condition is evaluated each time the rules are rendered.
#[derive(Clone)]
pub enum Condition {
    Fixed(bool),
    Deferred(Arc<dyn Fn() -> bool + Send + Sync>),
}

impl Condition {
    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Condition::Deferred(Arc::new(f))
    }

    pub fn holds(&self) -> bool {
        match self {
            Condition::Fixed(value) => *value,
            Condition::Deferred(f) => f(),
        }
    }

    /// Fixed conditions compare by value, deferred ones by identity
    pub fn same_as(&self, other: &Condition) -> bool {
        match (self, other) {
            (Condition::Fixed(a), Condition::Fixed(b)) => a == b,
            (Condition::Deferred(a), Condition::Deferred(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for Condition {
    fn from(value: bool) -> Self {
        Condition::Fixed(value)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Condition::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// A query template that can answer "does a matching record exist?"
///
/// Rules never run the template directly: every evaluation works on a
/// fresh clone so constraints added for one value cannot leak into the
/// next evaluation.
pub trait ExistenceQuery: Clone + Send + Sync + 'static {
    /// Constrain the query to the record whose key equals `key`
    fn where_key(&mut self, key: &Value);

    fn exists(&self) -> bool;
}

pub(crate) fn query_rule<Q, F>(
    template: Q,
    constrain: F,
    by_key: bool,
    message: impl Into<Cow<'static, str>>,
) -> CallbackRule
where
    Q: ExistenceQuery,
    F: Fn(&mut Q, &Value, &str) + Send + Sync + 'static,
{
    CallbackRule::new(
        move |value, attribute| {
            let mut query = template.clone();
            if by_key {
                query.where_key(value);
            }
            constrain(&mut query, value, attribute);
            query.exists()
        },
        message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_passes() {
        let rule = CallbackRule::new(|v, _| v.as_str() == Some("ok"), "validation.custom");
        assert!(rule.passes(&Value::from("ok"), "field"));
        assert!(!rule.passes(&Value::from("nope"), "field"));
        assert_eq!(rule.message(), "validation.custom");
    }

    #[test]
    fn test_clone_keeps_identity() {
        let rule = CallbackRule::new(|_, _| true, DEFAULT_CALLBACK_MESSAGE);
        let clone = rule.clone();
        let other = CallbackRule::new(|_, _| true, DEFAULT_CALLBACK_MESSAGE);
        assert!(rule.same_as(&clone));
        assert!(!rule.same_as(&other));
    }

    #[test]
    fn test_closure_reports_its_own_message() {
        let rule = CallbackRule::closure(|value, attribute| match value.as_i64() {
            Some(n) if n % 2 == 0 => Ok(()),
            Some(_) => Err(format!("validation.{attribute}.even").into()),
            None => Err("validation.integer".into()),
        });

        assert!(rule.passes(&Value::from(4), "seats"));
        assert_eq!(
            rule.check(&Value::from(3), "seats").unwrap_err(),
            "validation.seats.even"
        );
        assert_eq!(
            rule.check(&Value::from("x"), "seats").unwrap_err(),
            "validation.integer"
        );
        assert_eq!(rule.message(), DEFAULT_CLOSURE_MESSAGE);
    }

    #[test]
    fn test_condition_identity_and_evaluation() {
        let flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let seen = flag.clone();
        let deferred = Condition::deferred(move || seen.load(std::sync::atomic::Ordering::SeqCst));

        assert!(!deferred.holds());
        flag.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(deferred.holds());

        assert!(deferred.same_as(&deferred.clone()));
        assert!(!deferred.same_as(&Condition::deferred(|| true)));
        assert!(Condition::from(true).same_as(&Condition::Fixed(true)));
        assert!(!Condition::from(true).same_as(&Condition::Fixed(false)));
    }

    #[test]
    fn test_debug_hides_predicate() {
        let rule = CallbackRule::new(|_, _| true, "validation.custom");
        let debug = format!("{:?}", rule);
        assert!(debug.contains("validation.custom"));
    }
}
