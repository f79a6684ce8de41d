//! Order access control
//!
//! Callers are resolved to a single [`Role`] from their group memberships.
//! Every decision is a plain function built from the predicates
//! [`has_role`], [`is_owner`] and [`is_finished`]; it either permits the
//! operation or names the reason it was denied.

use axum::{extract::FromRequestParts, http::request::Parts};
use orderdesk_db::entities::{order, user_group::Group};
use thiserror::Error;
use tracing::warn;

use crate::error::ApiError;
use crate::middleware::AuthUser;

/// Effective role of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Employee,
    Customer,
}

impl Role {
    /// Employee membership takes precedence over customer membership.
    pub fn resolve(groups: &[Group]) -> Option<Role> {
        if groups.contains(&Group::Employee) {
            Some(Role::Employee)
        } else if groups.contains(&Group::Customer) {
            Some(Role::Customer)
        } else {
            None
        }
    }
}

/// Authenticated caller with a resolved role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: i32,
    pub role: Role,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<AuthUser>().ok_or_else(|| {
            ApiError::unauthorized("Missing authentication context", "MISSING_AUTH")
        })?;

        match Role::resolve(&user.groups) {
            Some(role) => Ok(Caller {
                user_id: user.user_id,
                role,
            }),
            None => {
                warn!("User {} has no employee or customer group", user.username);
                Err(Denial::MissingRole.into())
            }
        }
    }
}

/// Caller that must be an employee; rejects everyone else with 403
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Employee(pub Caller);

impl<S> FromRequestParts<S> for Employee
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let caller = Caller::from_request_parts(parts, state).await?;
        require_role(&caller, Role::Employee)?;
        Ok(Employee(caller))
    }
}

/// Reason an operation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("You do not have permission to perform this action.")]
    MissingRole,

    #[error("You cannot access an order which isn't yours.")]
    NotOwner,

    #[error("Your order is already marked as finished. You cannot make any changes.")]
    OrderFinished,
}

pub type Decision = Result<(), Denial>;

/// Which orders a caller may list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    All,
    OwnedBy(i32),
}

pub fn has_role(caller: &Caller, role: Role) -> bool {
    caller.role == role
}

pub fn is_owner(caller: &Caller, order: &order::Model) -> bool {
    order.owner_id == caller.user_id
}

pub fn is_finished(order: &order::Model) -> bool {
    order.is_finished
}

pub fn require_role(caller: &Caller, role: Role) -> Decision {
    if has_role(caller, role) {
        Ok(())
    } else {
        Err(Denial::MissingRole)
    }
}

/// Retrieve, update and delete: employees see everything, customers only
/// their own orders.
pub fn can_access_order(caller: &Caller, order: &order::Model) -> Decision {
    if has_role(caller, Role::Employee) || is_owner(caller, order) {
        Ok(())
    } else {
        Err(Denial::NotOwner)
    }
}

/// A customer may finish an open order of their own exactly once.
pub fn can_finish_order(caller: &Caller, order: &order::Model) -> Decision {
    can_access_order(caller, order)?;
    if is_finished(order) {
        return Err(Denial::OrderFinished);
    }
    Ok(())
}

/// Line items are frozen once the order is finished, for every role.
pub fn can_change_items(caller: &Caller, order: &order::Model) -> Decision {
    can_access_order(caller, order)?;
    if is_finished(order) {
        return Err(Denial::OrderFinished);
    }
    Ok(())
}

/// Owner of a new order: customers always own what they create, employees
/// name the owner explicitly.
pub fn owner_for_new_order(caller: &Caller, requested: Option<i32>) -> Option<i32> {
    match caller.role {
        Role::Customer => Some(caller.user_id),
        Role::Employee => requested,
    }
}

pub fn order_scope(caller: &Caller) -> OrderScope {
    match caller.role {
        Role::Employee => OrderScope::All,
        Role::Customer => OrderScope::OwnedBy(caller.user_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn order(owner_id: i32, is_finished: bool) -> order::Model {
        order::Model {
            id: 1,
            owner_id,
            created_at: Utc::now(),
            is_finished,
            finish_date: None,
            is_sent: false,
            sent_date: None,
        }
    }

    const CUSTOMER: Caller = Caller {
        user_id: 10,
        role: Role::Customer,
    };

    const EMPLOYEE: Caller = Caller {
        user_id: 20,
        role: Role::Employee,
    };

    #[test]
    fn test_role_resolution() {
        assert_eq!(Role::resolve(&[Group::Customer]), Some(Role::Customer));
        assert_eq!(Role::resolve(&[Group::Employee]), Some(Role::Employee));
        assert_eq!(
            Role::resolve(&[Group::Customer, Group::Employee]),
            Some(Role::Employee)
        );
        assert_eq!(Role::resolve(&[]), None);
    }

    #[test]
    fn test_customer_access_requires_ownership() {
        assert_eq!(can_access_order(&CUSTOMER, &order(10, false)), Ok(()));
        assert_eq!(
            can_access_order(&CUSTOMER, &order(11, false)),
            Err(Denial::NotOwner)
        );
    }

    #[test]
    fn test_employee_access_unrestricted() {
        assert_eq!(can_access_order(&EMPLOYEE, &order(10, false)), Ok(()));
        assert_eq!(can_access_order(&EMPLOYEE, &order(10, true)), Ok(()));
    }

    #[test]
    fn test_finish_only_once() {
        assert_eq!(can_finish_order(&CUSTOMER, &order(10, false)), Ok(()));
        assert_eq!(
            can_finish_order(&CUSTOMER, &order(10, true)),
            Err(Denial::OrderFinished)
        );
        // Ownership is checked before state
        assert_eq!(
            can_finish_order(&CUSTOMER, &order(11, true)),
            Err(Denial::NotOwner)
        );
    }

    #[test]
    fn test_finished_orders_freeze_items_for_everyone() {
        assert_eq!(
            can_change_items(&CUSTOMER, &order(10, true)),
            Err(Denial::OrderFinished)
        );
        assert_eq!(
            can_change_items(&EMPLOYEE, &order(10, true)),
            Err(Denial::OrderFinished)
        );
        assert_eq!(can_change_items(&EMPLOYEE, &order(10, false)), Ok(()));
    }

    #[test]
    fn test_new_order_owner() {
        assert_eq!(owner_for_new_order(&CUSTOMER, Some(99)), Some(10));
        assert_eq!(owner_for_new_order(&CUSTOMER, None), Some(10));
        assert_eq!(owner_for_new_order(&EMPLOYEE, Some(99)), Some(99));
        assert_eq!(owner_for_new_order(&EMPLOYEE, None), None);
    }

    #[test]
    fn test_order_scope() {
        assert_eq!(order_scope(&CUSTOMER), OrderScope::OwnedBy(10));
        assert_eq!(order_scope(&EMPLOYEE), OrderScope::All);
    }

    #[test]
    fn test_require_role() {
        assert_eq!(require_role(&EMPLOYEE, Role::Employee), Ok(()));
        assert_eq!(
            require_role(&CUSTOMER, Role::Employee),
            Err(Denial::MissingRole)
        );
    }
}
