//! Target name resolution
//!
//! Maps caller volume/snapshot identifiers onto appliance target names and
//! LUN indexes. The strategy is fixed at construction and applied uniformly
//! to every operation, so no two code paths can disagree on where a volume
//! lives.

use san_volume_core::{NamingStrategy, ProviderLocation, Result, ValidationError};

/// LUN index used by the prefixed strategy, which keeps one LUN per target
pub const FIXED_LUN_INDEX: u32 = 1;

/// A resolved appliance address: target name plus LUN index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunRef {
    pub target: String,
    pub lun: u32,
}

impl LunRef {
    /// Appliance-side LUN name, `<target>:<lun>`
    pub fn lun_name(&self) -> String {
        format!("{}:{}", self.target, self.lun)
    }
}

/// Derives appliance names from caller identifiers, and back from
/// persisted provider locations
#[derive(Debug, Clone)]
pub struct TargetNameResolver {
    strategy: NamingStrategy,
    prefix: String,
}

impl TargetNameResolver {
    pub fn new(strategy: NamingStrategy, prefix: impl Into<String>) -> Self {
        Self {
            strategy,
            prefix: prefix.into(),
        }
    }

    /// Resolve a volume or snapshot identifier to its target and LUN.
    ///
    /// Prefixed: target is `<prefix><identifier>`, LUN fixed at 1. The map
    /// is injective as long as caller identifiers are unique.
    /// Composite: the identifier is `<target>:<lun>` supplied by the
    /// caller; identifiers without the delimiter are rejected.
    pub fn resolve(&self, identifier: &str) -> Result<LunRef> {
        match self.strategy {
            NamingStrategy::Prefixed => Ok(LunRef {
                target: format!("{}{}", self.prefix, identifier),
                lun: FIXED_LUN_INDEX,
            }),
            NamingStrategy::Composite => {
                let (target, lun) = identifier.split_once(':').ok_or_else(|| {
                    ValidationError::MissingDelimiter {
                        identifier: identifier.to_string(),
                    }
                })?;
                if target.is_empty() {
                    return Err(ValidationError::MissingDelimiter {
                        identifier: identifier.to_string(),
                    }
                    .into());
                }
                let lun = lun.parse::<u32>().map_err(|_| ValidationError::InvalidLunIndex {
                    identifier: identifier.to_string(),
                })?;
                Ok(LunRef {
                    target: format!("{}{}", self.prefix, target),
                    lun,
                })
            }
        }
    }

    /// Recover the target and LUN from a persisted provider location.
    ///
    /// The location is the source of truth once a volume has been exported;
    /// callers may have renamed nothing, but the stored record always wins.
    pub fn from_location(&self, location: &ProviderLocation) -> LunRef {
        LunRef {
            target: location.target.clone(),
            lun: location.lun,
        }
    }
}
