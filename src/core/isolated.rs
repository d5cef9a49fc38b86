use crate::core::domain::{DomainId, ExecutionDomain};
use crate::core::transfer::{RejectReason, Rejected, Transfer, TransferLog, TransferState};
use crate::utils::error::{LabError, Result};
use std::fmt;
use std::sync::{Arc, Mutex};

/// A mutable value bound to the domain that created it.
///
/// Every read or write names the domain it runs in and is refused unless that
/// is the owner. Aliases made with [`Isolated::share`] stay in the owner's
/// domain and block [`Isolated::transfer`] until they are dropped.
///
/// A value that is not `Send` can never be handed to another domain:
///
/// ```compile_fail
/// # use isolation_lab::core::{isolated::Isolated, transfer::TransferLog, domain::ExecutionDomain};
/// fn hand_off<D: ExecutionDomain>(value: Isolated<std::rc::Rc<u8>>, owner: &D) {
///     let _ = value.transfer(owner, &TransferLog::new());
/// }
/// ```
pub struct Isolated<T> {
    owner: DomainId,
    // `None` when created from a token whose domain had already exited.
    incarnation: Option<u64>,
    cell: Arc<Mutex<T>>,
}

impl<T> Isolated<T> {
    pub fn new<D: ExecutionDomain>(value: T, owner: &D) -> Self {
        Self {
            owner: owner.domain_id(),
            incarnation: owner.incarnation(),
            cell: Arc::new(Mutex::new(value)),
        }
    }

    pub fn owner(&self) -> DomainId {
        self.owner
    }

    /// Number of other live aliases of this value.
    pub fn alias_count(&self) -> usize {
        Arc::strong_count(&self.cell) - 1
    }

    fn is_owned_by<D: ExecutionDomain>(&self, accessor: &D) -> bool {
        accessor.domain_id() == self.owner
            && accessor.incarnation().is_some()
            && accessor.incarnation() == self.incarnation
    }

    fn check<D: ExecutionDomain>(&self, accessor: &D) -> Result<()> {
        if accessor.incarnation().is_none() {
            return Err(LabError::DomainExited {
                domain: accessor.domain_id(),
            });
        }
        let owned = self.is_owned_by(accessor);
        let accessor = accessor.domain_id();
        if !owned {
            tracing::debug!("🚫 {} tried to reach a value owned by {}", accessor, self.owner);
            return Err(LabError::IsolationViolation {
                owner: self.owner,
                accessor,
            });
        }
        Ok(())
    }

    pub fn with<D, R, F>(&self, accessor: &D, f: F) -> Result<R>
    where
        D: ExecutionDomain,
        F: FnOnce(&T) -> R,
    {
        self.check(accessor)?;
        let guard = self
            .cell
            .lock()
            .map_err(|_| LabError::PoisonedState { domain: self.owner })?;
        Ok(f(&*guard))
    }

    pub fn with_mut<D, R, F>(&self, accessor: &D, f: F) -> Result<R>
    where
        D: ExecutionDomain,
        F: FnOnce(&mut T) -> R,
    {
        self.check(accessor)?;
        let mut guard = self
            .cell
            .lock()
            .map_err(|_| LabError::PoisonedState { domain: self.owner })?;
        Ok(f(&mut *guard))
    }

    /// Same-domain alias of the value.
    pub fn share<D: ExecutionDomain>(&self, accessor: &D) -> Result<Self> {
        self.check(accessor)?;
        Ok(Self {
            owner: self.owner,
            incarnation: self.incarnation,
            cell: Arc::clone(&self.cell),
        })
    }

    /// Explicit handoff to another domain.
    ///
    /// Refused when `sender` is not the owner or when any alias is still
    /// live. Both outcomes are written to `log`.
    pub fn transfer<D: ExecutionDomain>(
        self,
        sender: &D,
        log: &TransferLog,
    ) -> std::result::Result<Transfer<T>, Rejected<T>>
    where
        T: Send,
    {
        let id = log.next_id();
        let sender_owns = self.is_owned_by(sender);
        let sender = sender.domain_id();
        let Isolated {
            owner,
            incarnation,
            cell,
        } = self;

        if !sender_owns {
            let reason = RejectReason::NotOwner { owner, sender };
            log.record(id, owner, None, TransferState::Rejected, Some(reason.to_string()));
            return Err(Rejected {
                value: Isolated {
                    owner,
                    incarnation,
                    cell,
                },
                reason,
            });
        }

        match Arc::try_unwrap(cell) {
            Ok(mutex) => {
                let value = mutex.into_inner().unwrap_or_else(|p| p.into_inner());
                log.record(id, owner, None, TransferState::Transferred, None);
                Ok(Transfer::new(id, owner, value, log.clone()))
            }
            Err(cell) => {
                let reason = RejectReason::StillReferenced {
                    aliases: Arc::strong_count(&cell) - 1,
                };
                log.record(id, owner, None, TransferState::Rejected, Some(reason.to_string()));
                Err(Rejected {
                    value: Isolated {
                        owner,
                        incarnation,
                        cell,
                    },
                    reason,
                })
            }
        }
    }
}

impl<T> fmt::Debug for Isolated<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Isolated")
            .field("owner", &self.owner)
            .field("aliases", &self.alias_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actor::Actor;
    use crate::core::domain::Nonisolated;
    use crate::core::runtime::{Runtime, RuntimeConfig};

    struct Holder;

    impl Actor for Holder {}

    #[tokio::test]
    async fn test_owner_can_read_and_write() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let values = runtime
            .run_main(|main| async move {
                let value = Isolated::new(vec![1], &main);
                value.with_mut(&main, |v| v.push(2))?;
                value.with(&main, |v| v.clone())
            })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_foreign_domain_is_rejected() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let holder = runtime.spawn_actor(Holder);
        let holder_domain = holder.domain();

        let (err, untouched) = runtime
            .run_main(|main| async move {
                let value = Isolated::new(0u32, &main);
                let alias = value.share(&main).unwrap();
                let err = holder
                    .run(move |_, cx| alias.with_mut(&*cx, |v| *v += 1))
                    .await
                    .unwrap()
                    .unwrap_err();
                assert!(value.share(&Nonisolated::new()).is_err());
                (err, value.with(&main, |v| *v).unwrap())
            })
            .await
            .unwrap();

        match err {
            LabError::IsolationViolation { owner, accessor } => {
                assert_eq!(owner, DomainId::Main);
                assert_eq!(accessor, holder_domain);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(untouched, 0);
    }

    #[tokio::test]
    async fn test_same_actor_id_in_another_runtime_is_rejected() {
        let first = Runtime::new(RuntimeConfig::default()).spawn_actor(Holder);
        let second = Runtime::new(RuntimeConfig::default()).spawn_actor(Holder);

        let value = first
            .run(|_, cx| Isolated::new(0u32, &*cx))
            .await
            .unwrap();
        let err = second
            .run(move |_, cx| value.with_mut(&*cx, |v| *v = 7))
            .await
            .unwrap()
            .unwrap_err();

        assert!(matches!(err, LabError::IsolationViolation { .. }));
    }

    #[test]
    fn test_transfer_blocked_while_aliased() {
        let token = Nonisolated::new();
        let log = TransferLog::new();
        let value = Isolated::new(String::from("draft"), &token);
        let alias = value.share(&token).unwrap();
        assert_eq!(value.alias_count(), 1);

        let rejected = value.transfer(&token, &log).unwrap_err();
        assert_eq!(rejected.reason, RejectReason::StillReferenced { aliases: 1 });

        drop(alias);
        let transfer = rejected.value.transfer(&token, &log).unwrap();
        assert_eq!(log.count(TransferState::Rejected), 1);
        assert_eq!(log.state_of(transfer.id()), Some(TransferState::Transferred));
    }

    #[tokio::test]
    async fn test_non_owner_cannot_transfer() {
        let runtime = Runtime::new(RuntimeConfig::default());
        let log = TransferLog::new();
        let value = runtime
            .run_main(|main| async move { Isolated::new(3u8, &main) })
            .await
            .unwrap();

        let rejected = value.transfer(&Nonisolated::new(), &log).unwrap_err();
        assert!(matches!(rejected.reason, RejectReason::NotOwner { .. }));
        assert_eq!(rejected.value.owner(), DomainId::Main);
    }
}
