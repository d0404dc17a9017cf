//! Explicit per-call context.
//!
//! Every service entry point takes a [`CallContext`] instead of reading the
//! current user or tenant from ambient state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::{TenantId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub tenant_id: TenantId,
    /// The user on whose behalf the call is made.
    pub operator: UserId,
    /// Propagated into logs so one request can be followed end to end.
    pub correlation_id: Uuid,
    pub received_at: DateTime<Utc>,
}

impl CallContext {
    pub fn new(tenant_id: TenantId, operator: UserId) -> Self {
        Self {
            tenant_id,
            operator,
            correlation_id: Uuid::now_v7(),
            received_at: Utc::now(),
        }
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Same tenant and correlation, different operator.
    pub fn acting_as(&self, operator: UserId) -> Self {
        Self {
            operator,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acting_as_keeps_tenant_and_correlation() {
        let ctx = CallContext::new(TenantId::new(), UserId::new());
        let other = UserId::new();
        let switched = ctx.acting_as(other);
        assert_eq!(switched.tenant_id, ctx.tenant_id);
        assert_eq!(switched.correlation_id, ctx.correlation_id);
        assert_eq!(switched.operator, other);
    }
}
