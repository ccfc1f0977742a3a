//! Validation rule composition
//!
//! Builds ordered, deduplicated rule lists per input field. Rule evaluation
//! itself belongs to the validator consuming [`RuleSet::to_wire`].

pub mod bounds;
pub mod callback;
pub mod rule;
pub mod rule_set;

pub use callback::{CallbackRule, Condition, ExistenceQuery};
pub use rule::{EmailOptions, Rule, RuleArg, RuleKind};
pub use rule_set::{FieldRules, Modifier, OrderedRule, RuleEntry, RuleSet, WireRule};
