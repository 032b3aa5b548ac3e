// ── Core identity types ──
//
// EntityId, EntryId and RestoreKey are the handles every other type
// refers to. Structural ids are derived from a path so that two peers
// ingesting or duplicating the same structure agree on them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Namespace for every derived id in a landscape.
const LANDSCAPE_NAMESPACE: Uuid = Uuid::from_u128(0x6c61_6e64_7363_6170_655f_6964_735f_7631);

// ── EntityId ────────────────────────────────────────────────────────

/// Opaque identifier of a node, application, package, class, or
/// communication.
///
/// Ids coming off the wire are kept verbatim; ids minted locally are
/// either random ([`EntityId::fresh`]) or derived from a structural path
/// ([`EntityId::derive`]).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Random id for an entity created by a user.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Deterministic id for the structural path `segments`.
    ///
    /// Segments are joined with a separator that cannot appear in a
    /// UUID, so `["a", "bc"]` and `["ab", "c"]` never collide.
    pub fn derive<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let path = segments
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join("\u{1f}");
        Self(Uuid::new_v5(&LANDSCAPE_NAMESPACE, path.as_bytes()).to_string())
    }

    /// Canonical id of the edge between two classes, independent of
    /// which endpoint is given first.
    pub fn communication(a: &EntityId, b: &EntityId) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self::derive(["communication", lo.as_str(), hi.as_str()])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── EntryId ─────────────────────────────────────────────────────────

/// Identifier of a changelog entry.
///
/// The peer that authors a mutation mints the id and ships it with the
/// outbound message, so every replica's log carries the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }

    /// Id of an entry recorded as a side effect of `parent`
    /// (e.g. a communication removed because its class was deleted).
    pub fn cascaded(parent: EntryId, entity: &EntityId) -> Self {
        Self(Uuid::new_v5(
            &parent.0,
            format!("cascade\u{1f}{entity}").as_bytes(),
        ))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for EntryId {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}

// ── RestoreKey ──────────────────────────────────────────────────────

/// Key under which undone changelog entries are stashed for redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestoreKey(Uuid);

impl RestoreKey {
    pub fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RestoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RestoreKey {
    fn from(u: Uuid) -> Self {
        Self(u)
    }
}
