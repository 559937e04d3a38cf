//! Plan catalog: read-through access to gateway subscription plans.
//!
//! A pure pass-through. Availability gating (`is_deleted`/`is_archived`)
//! is enforced at purchase time by the subscription manager, not here.

use serde::Deserialize;

use crate::error::Result;

/// A subscription plan as defined at the gateway.
///
/// Plans are not persisted locally; this is the gateway's view at read time.
#[derive(Debug, Clone, Deserialize)]
pub struct Plan {
    pub plan_code: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Price in currency subunits.
    pub amount: i64,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    #[serde(default)]
    pub is_archived: bool,
}

impl Plan {
    /// Whether the plan may still be purchased.
    #[must_use]
    pub fn is_available(&self) -> bool {
        !self.is_deleted && !self.is_archived
    }
}

/// Gateway plan operations.
#[allow(async_fn_in_trait)]
pub trait PaystackPlanClient: Send + Sync {
    /// Fetch one plan by its code.
    async fn fetch_plan(&self, plan_code: &str) -> Result<Plan>;

    /// List all plans.
    async fn list_plans(&self) -> Result<Vec<Plan>>;
}

/// Read path for available subscription plans.
pub struct PlanCatalog<C: PaystackPlanClient> {
    client: C,
}

impl<C: PaystackPlanClient> PlanCatalog<C> {
    /// Create a new catalog over a gateway client.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// All plans known to the gateway.
    pub async fn plans(&self) -> Result<Vec<Plan>> {
        self.client.list_plans().await
    }

    /// One plan by code.
    pub async fn plan(&self, plan_code: &str) -> Result<Plan> {
        self.client.fetch_plan(plan_code).await
    }
}

/// Mock plan client for testing.
#[cfg(any(test, feature = "test-gateway"))]
pub mod test {
    use super::*;
    use crate::error::PayrailError;
    use std::collections::HashMap;
    use std::sync::{Arc, RwLock};

    /// Mock plan client backed by a seeded plan map.
    #[derive(Default, Clone)]
    pub struct MockPlanClient {
        plans: Arc<RwLock<HashMap<String, Plan>>>,
    }

    impl MockPlanClient {
        /// Create an empty mock client.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed a plan.
        pub fn add_plan(&self, plan: Plan) {
            self.plans
                .write()
                .unwrap()
                .insert(plan.plan_code.clone(), plan);
        }

        /// Seed a plan, returning self for chaining.
        #[must_use]
        pub fn with_plan(self, plan: Plan) -> Self {
            self.add_plan(plan);
            self
        }
    }

    /// Build a plan for tests.
    #[must_use]
    pub fn plan(code: &str, amount: i64) -> Plan {
        Plan {
            plan_code: code.to_string(),
            name: Some(format!("{code} plan")),
            amount,
            interval: Some("monthly".to_string()),
            is_deleted: false,
            is_archived: false,
        }
    }

    impl PaystackPlanClient for MockPlanClient {
        async fn fetch_plan(&self, plan_code: &str) -> Result<Plan> {
            self.plans
                .read()
                .unwrap()
                .get(plan_code)
                .cloned()
                .ok_or_else(|| PayrailError::provider("fetch_plan", "plan not found"))
        }

        async fn list_plans(&self) -> Result<Vec<Plan>> {
            Ok(self.plans.read().unwrap().values().cloned().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test::{plan, MockPlanClient};
    use super::*;
    use crate::error::PayrailError;

    #[tokio::test]
    async fn test_fetch_plan_passes_through() {
        let client = MockPlanClient::new().with_plan(plan("PLN_basic", 250_000));
        let catalog = PlanCatalog::new(client);

        let fetched = catalog.plan("PLN_basic").await.unwrap();
        assert_eq!(fetched.amount, 250_000);
        assert!(fetched.is_available());
    }

    #[tokio::test]
    async fn test_unknown_plan_is_provider_error() {
        let catalog = PlanCatalog::new(MockPlanClient::new());
        let err = catalog.plan("PLN_missing").await.unwrap_err();
        assert!(matches!(err, PayrailError::Provider { .. }));
    }

    #[tokio::test]
    async fn test_list_plans() {
        let client = MockPlanClient::new()
            .with_plan(plan("PLN_basic", 250_000))
            .with_plan(plan("PLN_pro", 500_000));
        let catalog = PlanCatalog::new(client);

        let plans = catalog.plans().await.unwrap();
        assert_eq!(plans.len(), 2);
    }

    #[test]
    fn test_availability() {
        let mut p = plan("PLN_old", 100);
        assert!(p.is_available());
        p.is_archived = true;
        assert!(!p.is_available());
        p.is_archived = false;
        p.is_deleted = true;
        assert!(!p.is_available());
    }
}
