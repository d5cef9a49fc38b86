use serde::{Deserialize, Serialize};
use std::fmt;

/// 單一 actor 實例的識別碼，由 Runtime 分配且不重複使用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// Isolation domain: 一個序列化的執行上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainId {
    Main,
    Actor(ActorId),
    Nonisolated,
}

impl DomainId {
    /// Only the main domain is unique across the whole runtime.
    pub fn is_globally_unique(&self) -> bool {
        matches!(self, DomainId::Main)
    }

    pub fn actor_id(&self) -> Option<ActorId> {
        match self {
            DomainId::Actor(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainId::Main => write!(f, "main"),
            DomainId::Actor(id) => write!(f, "{}", id),
            DomainId::Nonisolated => write!(f, "nonisolated"),
        }
    }
}

pub(crate) mod sealed {
    /// Only the crate's own tokens implement this.
    pub trait Sealed {
        /// Which incarnation of the domain the token was issued by, or `None`
        /// once that incarnation has ended. Actors and the nonisolated domain
        /// have a single incarnation.
        fn incarnation(&self) -> Option<u64> {
            Some(0)
        }
    }
}

/// Proof of executing inside a domain.
///
/// Implemented by [`MainToken`](crate::core::main_actor::MainToken),
/// [`Context`](crate::core::actor::Context) and [`Nonisolated`]. None of these
/// can be built outside the crate, so holding one means the caller is running
/// in that domain. The trait is sealed:
///
/// ```compile_fail
/// use isolation_lab::core::domain::{DomainId, ExecutionDomain};
/// struct Forged;
/// impl ExecutionDomain for Forged {
///     fn domain_id(&self) -> DomainId {
///         DomainId::Main
///     }
/// }
/// ```
pub trait ExecutionDomain: sealed::Sealed {
    fn domain_id(&self) -> DomainId;
}

/// Token for work that runs outside every isolation domain.
#[derive(Debug)]
pub struct Nonisolated {
    _private: (),
}

impl Nonisolated {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl sealed::Sealed for Nonisolated {}

impl ExecutionDomain for Nonisolated {
    fn domain_id(&self) -> DomainId {
        DomainId::Nonisolated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_main_is_globally_unique() {
        assert!(DomainId::Main.is_globally_unique());
        assert!(!DomainId::Actor(ActorId(1)).is_globally_unique());
        assert!(!DomainId::Nonisolated.is_globally_unique());
    }

    #[test]
    fn test_domain_display() {
        assert_eq!(DomainId::Main.to_string(), "main");
        assert_eq!(DomainId::Actor(ActorId(7)).to_string(), "actor-7");
        assert_eq!(DomainId::Nonisolated.to_string(), "nonisolated");
        assert_eq!(DomainId::Actor(ActorId(7)).actor_id(), Some(ActorId(7)));
    }

    #[test]
    fn test_domain_serializes_as_snake_case() {
        let json = serde_json::to_string(&DomainId::Actor(ActorId(3))).unwrap();
        assert_eq!(json, r#"{"actor":3}"#);
        let back: DomainId = serde_json::from_str(r#""main""#).unwrap();
        assert_eq!(back, DomainId::Main);
    }
}
