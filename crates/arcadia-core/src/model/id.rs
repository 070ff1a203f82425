// ── Core identity types ──
//
// One uuid-backed newtype per owned entity, plus an opaque `UserId` for
// identities the core does not own (reporters and technicians are managed
// by the surrounding account layer; the core only threads their ids).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

entity_id! {
    /// Identifier of a registered arcade machine.
    MachineId
}

entity_id! {
    /// Identifier of a fault record.
    FaultId
}

entity_id! {
    /// Identifier of a maintenance record.
    MaintenanceId
}

// ── UserId ──────────────────────────────────────────────────────────

/// Opaque identity of a user or technician.
///
/// The account layer owns these; the core performs no validation beyond
/// carrying them on records. Accepts whatever shape the embedding layer
/// uses (uuid, username, LDAP DN).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn machine_id_round_trips_through_display() {
        let id = MachineId::new();
        let parsed: MachineId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(FaultId::new(), FaultId::new());
    }

    #[test]
    fn user_id_is_opaque() {
        let id = UserId::from("tech.garcia");
        assert_eq!(id.as_str(), "tech.garcia");
        assert_eq!(id.to_string(), "tech.garcia");
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = MaintenanceId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
