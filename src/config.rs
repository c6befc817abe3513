use crate::core::Cents;

pub const DEFAULT_PORT: u16 = 8080;
/// $10,000.
///
/// The optimizer allocates one take-bit per item per total (`items x (target + 1)`
/// bits) plus an 8-byte count per total for every request. At the defaults that is
/// about 62.5 MB of bitset and 8 MB of counts, held for the life of the request.
/// Raise either cap only with that budget in mind.
pub const DEFAULT_MAX_TARGET_CENTS: Cents = 1_000_000;
pub const DEFAULT_MAX_ITEMS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max target must be > 0 cents, got {0}")]
    NonPositiveMaxTarget(Cents),
    #[error("max items must be > 0")]
    ZeroMaxItems,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LimitError {
    #[error("target of {target_cents} cents exceeds the configured maximum of {max} cents")]
    TargetTooLarge { target_cents: Cents, max: Cents },
    #[error("{count} outstanding expenses exceed the configured maximum of {max}")]
    TooManyItems { count: usize, max: usize },
}

/// Bounds on optimizer requests accepted from outside the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    max_target_cents: Cents,
    max_items: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_target_cents: DEFAULT_MAX_TARGET_CENTS,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl Limits {
    pub fn new(max_target_cents: Cents, max_items: usize) -> Result<Self, ConfigError> {
        if max_target_cents <= 0 {
            return Err(ConfigError::NonPositiveMaxTarget(max_target_cents));
        }
        if max_items == 0 {
            return Err(ConfigError::ZeroMaxItems);
        }
        Ok(Self {
            max_target_cents,
            max_items,
        })
    }

    pub fn max_target_cents(&self) -> Cents {
        self.max_target_cents
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Upper bound on the optimizer table for a request at both caps.
    pub fn worst_case_table_bytes(&self) -> u64 {
        let width = self.max_target_cents.unsigned_abs().saturating_add(1);
        let bitset = (self.max_items as u64).saturating_mul(width.div_ceil(64).saturating_mul(8));
        bitset.saturating_add(width.saturating_mul(8))
    }

    pub fn check(&self, target_cents: Cents, item_count: usize) -> Result<(), LimitError> {
        if target_cents > self.max_target_cents {
            return Err(LimitError::TargetTooLarge {
                target_cents,
                max: self.max_target_cents,
            });
        }
        if item_count > self.max_items {
            return Err(LimitError::TooManyItems {
                count: item_count,
                max: self.max_items,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub limits: Limits,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            limits: Limits::default(),
        }
    }
}
