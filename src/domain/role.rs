//! Connection roles.
//!
//! Every relay connection is tagged with exactly one [`Role`] at accept
//! time. The role decides which payload kind the connection sends and
//! which role receives what it sends.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The side of the relay a connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The embedded controller. Sends text notifications, receives
    /// binary commands.
    Actuator,
    /// A remote control client. Sends binary commands, receives text
    /// notifications.
    Operator,
}

/// Frame kind a role is expected to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundKind {
    /// UTF-8 text frame.
    Text,
    /// Binary frame.
    Binary,
}

impl Role {
    /// All roles, in a fixed order.
    pub const ALL: [Self; 2] = [Self::Actuator, Self::Operator];

    /// Returns the role that receives whatever this role sends.
    #[must_use]
    pub const fn peer(self) -> Self {
        match self {
            Self::Actuator => Self::Operator,
            Self::Operator => Self::Actuator,
        }
    }

    /// Returns the frame kind this role sends to the relay.
    #[must_use]
    pub const fn inbound_kind(self) -> InboundKind {
        match self {
            Self::Actuator => InboundKind::Text,
            Self::Operator => InboundKind::Binary,
        }
    }

    /// Lower-case name used in logs and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Actuator => "actuator",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
