//! Role registry and pause switch
//!
//! `AccessControl` records which accounts hold the global roles
//! (`Administrator`, `BackendService`) and whether the ledger is paused.
//! Per-invoice roles (freelancer, employer) come from the invoice record and
//! are checked by the ledger itself.
//!
//! # Thread Safety
//!
//! Role grants live in a `DashSet`; the paused flag is an `AtomicBool` read by
//! every mutating ledger operation.
//!
//! Mutating operations run under a shared read guard on `gate` (see
//! [`AccessControl::enter`]) while pause and unpause flip the flag under the
//! write guard. Once `pause` returns, every operation admitted before it has
//! finished and no later one is admitted.

use crate::types::{AccountId, LedgerError, Operation, Role};
use dashmap::DashSet;
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::atomic::{AtomicBool, Ordering};

/// Held by a mutating operation for its whole duration
pub type RunningGuard<'a> = RwLockReadGuard<'a, ()>;

/// Global role grants plus the paused flag
#[derive(Debug, Default)]
pub struct AccessControl {
    grants: DashSet<(Role, AccountId)>,
    paused: AtomicBool,
    gate: RwLock<()>,
}

impl AccessControl {
    /// Create a registry with no grants, unpaused
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with administrators and backend services
    pub fn with_members(
        administrators: impl IntoIterator<Item = AccountId>,
        backend_services: impl IntoIterator<Item = AccountId>,
    ) -> Self {
        let registry = Self::new();
        for account in administrators {
            registry.grants.insert((Role::Administrator, account));
        }
        for account in backend_services {
            registry.grants.insert((Role::BackendService, account));
        }
        registry
    }

    /// Returns true if `account` holds `role`
    pub fn has_role(&self, role: Role, account: AccountId) -> bool {
        self.grants.contains(&(role, account))
    }

    /// Fail with `UnauthorizedAccess` unless `caller` holds `role`
    pub fn require_role(
        &self,
        role: Role,
        caller: AccountId,
        operation: Operation,
    ) -> Result<(), LedgerError> {
        if self.has_role(role, caller) {
            Ok(())
        } else {
            Err(LedgerError::unauthorized(caller, operation))
        }
    }

    /// Grant `role` to `account`; only administrators may grant
    ///
    /// Returns `Ok(true)` if the grant is new, `Ok(false)` if the account
    /// already held the role.
    pub fn grant_role(
        &self,
        caller: AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<bool, LedgerError> {
        self.require_role(Role::Administrator, caller, Operation::GrantRole)?;
        if account.is_zero() {
            return Err(LedgerError::invalid_address(
                Operation::GrantRole,
                "account",
                account,
            ));
        }
        Ok(self.grants.insert((role, account)))
    }

    /// Revoke `role` from `account`; only administrators may revoke
    ///
    /// Returns `Ok(true)` if a grant was removed.
    pub fn revoke_role(
        &self,
        caller: AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<bool, LedgerError> {
        self.require_role(Role::Administrator, caller, Operation::RevokeRole)?;
        Ok(self.grants.remove(&(role, account)).is_some())
    }

    /// Suspend mutating ledger operations
    ///
    /// Returns `Ok(true)` if the ledger was running and is now paused.
    pub fn pause(&self, caller: AccountId) -> Result<bool, LedgerError> {
        self.require_role(Role::Administrator, caller, Operation::Pause)?;
        let _drained = self.gate.write();
        Ok(!self.paused.swap(true, Ordering::SeqCst))
    }

    /// Resume mutating ledger operations
    ///
    /// Returns `Ok(true)` if the ledger was paused and is now running.
    pub fn unpause(&self, caller: AccountId) -> Result<bool, LedgerError> {
        self.require_role(Role::Administrator, caller, Operation::Unpause)?;
        let _drained = self.gate.write();
        Ok(self.paused.swap(false, Ordering::SeqCst))
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Admit a mutating operation, or fail with `SystemPaused`
    ///
    /// The ledger cannot be paused while the returned guard is alive.
    pub fn enter(&self, operation: Operation) -> Result<RunningGuard<'_>, LedgerError> {
        let running = self.gate.read();
        if self.is_paused() {
            Err(LedgerError::paused(operation))
        } else {
            Ok(running)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn admin() -> AccountId {
        AccountId::from_low_u64(0xa1)
    }

    fn backend() -> AccountId {
        AccountId::from_low_u64(0xb1)
    }

    fn outsider() -> AccountId {
        AccountId::from_low_u64(0x99)
    }

    fn registry() -> AccessControl {
        AccessControl::with_members([admin()], [backend()])
    }

    #[test]
    fn test_seeded_members_hold_roles() {
        let registry = registry();

        assert!(registry.has_role(Role::Administrator, admin()));
        assert!(registry.has_role(Role::BackendService, backend()));
        assert!(!registry.has_role(Role::BackendService, admin()));
        assert!(!registry.has_role(Role::Administrator, outsider()));
    }

    #[test]
    fn test_admin_grants_and_revokes() {
        let registry = registry();

        assert_eq!(
            registry.grant_role(admin(), Role::BackendService, outsider()),
            Ok(true)
        );
        assert!(registry.has_role(Role::BackendService, outsider()));
        assert_eq!(
            registry.grant_role(admin(), Role::BackendService, outsider()),
            Ok(false)
        );

        assert_eq!(
            registry.revoke_role(admin(), Role::BackendService, outsider()),
            Ok(true)
        );
        assert!(!registry.has_role(Role::BackendService, outsider()));
        assert_eq!(
            registry.revoke_role(admin(), Role::BackendService, outsider()),
            Ok(false)
        );
    }

    #[test]
    fn test_non_admin_cannot_manage_roles() {
        let registry = registry();

        assert_eq!(
            registry.grant_role(backend(), Role::Administrator, outsider()),
            Err(LedgerError::unauthorized(backend(), Operation::GrantRole))
        );
        assert_eq!(
            registry.revoke_role(outsider(), Role::BackendService, backend()),
            Err(LedgerError::unauthorized(outsider(), Operation::RevokeRole))
        );
        assert!(!registry.has_role(Role::Administrator, outsider()));
        assert!(registry.has_role(Role::BackendService, backend()));
    }

    #[test]
    fn test_grant_to_zero_account_fails() {
        let registry = registry();

        let result = registry.grant_role(admin(), Role::BackendService, AccountId::ZERO);

        assert!(matches!(result, Err(LedgerError::InvalidAddress { .. })));
    }

    #[test]
    fn test_pause_and_unpause() {
        let registry = registry();
        assert!(registry.enter(Operation::Register).is_ok());

        assert_eq!(registry.pause(admin()), Ok(true));
        assert!(registry.is_paused());
        assert!(matches!(
            registry.enter(Operation::Register),
            Err(LedgerError::SystemPaused { .. })
        ));
        assert_eq!(registry.pause(admin()), Ok(false));

        assert_eq!(registry.unpause(admin()), Ok(true));
        assert!(!registry.is_paused());
        assert_eq!(registry.unpause(admin()), Ok(false));
    }

    #[test]
    fn test_only_admin_can_pause() {
        let registry = registry();

        assert_eq!(
            registry.pause(backend()),
            Err(LedgerError::unauthorized(backend(), Operation::Pause))
        );
        assert!(!registry.is_paused());

        registry.pause(admin()).unwrap();
        assert_eq!(
            registry.unpause(outsider()),
            Err(LedgerError::unauthorized(outsider(), Operation::Unpause))
        );
        assert!(registry.is_paused());
    }

    #[test]
    fn test_pause_waits_for_admitted_operations() {
        let registry = Arc::new(registry());
        let running = registry.enter(Operation::Deposit).unwrap();

        let pauser = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.pause(admin()))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!registry.is_paused());

        drop(running);
        assert_eq!(pauser.join().unwrap(), Ok(true));
        assert!(registry.is_paused());
        assert!(registry.enter(Operation::Deposit).is_err());
    }
}
