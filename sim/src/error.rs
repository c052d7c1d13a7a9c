//! Errors returned by the command and configuration surface.
//!
//! The tick itself is infallible: degenerate states resolve to "no action".

use crate::components::Faction;
use crate::units::UnitKind;
use thiserror::Error;

/// Result alias using [`SimError`].
pub type SimResult<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// The faction cannot afford the request, counting requests already queued.
    #[error("{faction:?} cannot afford {kind:?}: need {required}, have {available:.1}")]
    InsufficientFunds {
        faction: Faction,
        kind: UnitKind,
        required: u32,
        available: f64,
    },

    /// A targeted kind was requested without a ground coordinate.
    #[error("{0:?} needs a target coordinate")]
    MissingTarget(UnitKind),

    /// Target outside the field, or a nuke aimed at friendly territory.
    #[error("invalid target ({x:.1}, {y:.1}) for {kind:?}")]
    InvalidTarget { kind: UnitKind, x: f32, y: f32 },

    /// Kind only the simulation itself may create.
    #[error("{0:?} cannot be purchased")]
    NotPurchasable(UnitKind),

    #[error("match already won by {0:?}")]
    MatchOver(Faction),

    /// Malformed configuration or snapshot JSON.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
