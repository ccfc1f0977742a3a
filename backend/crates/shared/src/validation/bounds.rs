//! Column-size bounds used by the numeric and text helpers
//!
//! Mirrors the ranges of the usual SQL integer and text column types so a
//! field rule can never accept a value its column cannot hold.

pub const TINY_INT_MAX: i64 = 127;
pub const TINY_INT_MIN: i64 = -128;
pub const UNSIGNED_TINY_INT_MAX: i64 = 255;
pub const UNSIGNED_TINY_INT_MIN: i64 = 0;

pub const SMALL_INT_MAX: i64 = 32_767;
pub const SMALL_INT_MIN: i64 = -32_768;
pub const UNSIGNED_SMALL_INT_MAX: i64 = 65_535;
pub const UNSIGNED_SMALL_INT_MIN: i64 = 0;

pub const MEDIUM_INT_MAX: i64 = 8_388_607;
pub const MEDIUM_INT_MIN: i64 = -8_388_608;
pub const UNSIGNED_MEDIUM_INT_MAX: i64 = 16_777_215;
pub const UNSIGNED_MEDIUM_INT_MIN: i64 = 0;

pub const INT_MAX: i64 = 2_147_483_647;
pub const INT_MIN: i64 = -2_147_483_648;
pub const UNSIGNED_INT_MAX: i64 = 4_294_967_295;
pub const UNSIGNED_INT_MIN: i64 = 0;

pub const BIG_INT_MAX: i64 = i64::MAX;
pub const BIG_INT_MIN: i64 = i64::MIN;
/// Validators compare against a signed 64-bit integer, so the unsigned
/// range stops at `i64::MAX`.
pub const UNSIGNED_BIG_INT_MAX: i64 = i64::MAX;
pub const UNSIGNED_BIG_INT_MIN: i64 = 0;

pub const TINY_TEXT_MAX: i64 = 256;
pub const TEXT_MAX: i64 = 65_535;
pub const MEDIUM_TEXT_MAX: i64 = 16_777_215;
pub const LONG_TEXT_MAX: i64 = 4_294_967_295;

pub const VARCHAR_MAX: i64 = 65_535;

/// Minimum length of [`super::RuleSet::password`]
pub const DEFAULT_PASSWORD_MIN: i64 = 8;

/// Default `max` for [`super::RuleSet::string`]
pub const DEFAULT_STRING_MAX: i64 = 255;

/// Integer column families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntColumn {
    Tiny,
    UnsignedTiny,
    Small,
    UnsignedSmall,
    Medium,
    UnsignedMedium,
    Int,
    UnsignedInt,
    Big,
    UnsignedBig,
}

impl IntColumn {
    /// Inclusive `(min, max)` range of the column
    pub const fn range(self) -> (i64, i64) {
        match self {
            IntColumn::Tiny => (TINY_INT_MIN, TINY_INT_MAX),
            IntColumn::UnsignedTiny => (UNSIGNED_TINY_INT_MIN, UNSIGNED_TINY_INT_MAX),
            IntColumn::Small => (SMALL_INT_MIN, SMALL_INT_MAX),
            IntColumn::UnsignedSmall => (UNSIGNED_SMALL_INT_MIN, UNSIGNED_SMALL_INT_MAX),
            IntColumn::Medium => (MEDIUM_INT_MIN, MEDIUM_INT_MAX),
            IntColumn::UnsignedMedium => (UNSIGNED_MEDIUM_INT_MIN, UNSIGNED_MEDIUM_INT_MAX),
            IntColumn::Int => (INT_MIN, INT_MAX),
            IntColumn::UnsignedInt => (UNSIGNED_INT_MIN, UNSIGNED_INT_MAX),
            IntColumn::Big => (BIG_INT_MIN, BIG_INT_MAX),
            IntColumn::UnsignedBig => (UNSIGNED_BIG_INT_MIN, UNSIGNED_BIG_INT_MAX),
        }
    }
}

/// Text column families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextColumn {
    Tiny,
    Text,
    Medium,
    Long,
}

impl TextColumn {
    /// Maximum length in bytes
    pub const fn max_len(self) -> i64 {
        match self {
            TextColumn::Tiny => TINY_TEXT_MAX,
            TextColumn::Text => TEXT_MAX,
            TextColumn::Medium => MEDIUM_TEXT_MAX,
            TextColumn::Long => LONG_TEXT_MAX,
        }
    }
}
