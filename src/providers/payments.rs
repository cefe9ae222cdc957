use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex};

use super::{ProviderError, ensure_success};
use crate::models::{Plan, Product, SubscriptionLink};

const PROVIDER: &str = "paypal";

/// PaymentProvider
///
/// The recurring-billing provider. Products and plans are created once by an admin;
/// readers then subscribe to the configured plan.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_product(&self, name: &str, description: &str) -> Result<Product, ProviderError>;
    async fn create_plan(&self, product_id: &str) -> Result<Plan, ProviderError>;
    /// Starts a subscription and returns the URL where the reader approves it.
    async fn create_subscription(&self, return_url: &str, cancel_url: &str) -> Result<SubscriptionLink, ProviderError>;
    async fn cancel_subscription(&self, subscription_id: &str, reason: &str) -> Result<(), ProviderError>;
}

pub type PaymentState = Arc<dyn PaymentProvider>;

#[derive(Deserialize)]
struct AccessToken {
    access_token: String,
}

#[derive(Deserialize)]
struct Link {
    href: String,
    rel: String,
}

#[derive(Deserialize)]
struct SubscriptionResponse {
    id: String,
    #[serde(default)]
    links: Vec<Link>,
}

/// PayPalClient
///
/// `PaymentProvider` over the PayPal REST API. Fetches a client-credentials token
/// per call; subscription traffic is low enough not to need token caching.
#[derive(Clone)]
pub struct PayPalClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    secret: String,
    plan_id: String,
    brand_name: String,
}

impl PayPalClient {
    pub fn new(base_url: &str, client_id: &str, secret: &str, plan_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            secret: secret.to_string(),
            plan_id: plan_id.to_string(),
            brand_name: "Newsroom".to_string(),
        }
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;
        let token: AccessToken = ensure_success(PROVIDER, response).await?.json().await?;
        Ok(token.access_token)
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response, ProviderError> {
        let token = self.access_token().await?;
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        ensure_success(PROVIDER, response).await
    }
}

#[async_trait]
impl PaymentProvider for PayPalClient {
    async fn create_product(&self, name: &str, description: &str) -> Result<Product, ProviderError> {
        let body = json!({
            "name": name,
            "description": description,
            "type": "SERVICE",
            "category": "SOFTWARE",
        });
        Ok(self.post_json("/v1/catalogs/products", body).await?.json().await?)
    }

    /// create_plan
    ///
    /// A monthly plan with no end date. Three failed payments suspend the subscription.
    async fn create_plan(&self, product_id: &str) -> Result<Plan, ProviderError> {
        let body = json!({
            "product_id": product_id,
            "name": "Monthly subscription",
            "status": "ACTIVE",
            "billing_cycles": [{
                "frequency": { "interval_unit": "MONTH", "interval_count": 1 },
                "tenure_type": "REGULAR",
                "sequence": 1,
                "total_cycles": 0,
                "pricing_scheme": { "fixed_price": { "value": "5", "currency_code": "USD" } }
            }],
            "payment_preferences": {
                "auto_bill_outstanding": true,
                "payment_failure_threshold": 3
            }
        });
        Ok(self.post_json("/v1/billing/plans", body).await?.json().await?)
    }

    async fn create_subscription(&self, return_url: &str, cancel_url: &str) -> Result<SubscriptionLink, ProviderError> {
        let body = json!({
            "plan_id": self.plan_id,
            "application_context": {
                "brand_name": self.brand_name,
                "user_action": "SUBSCRIBE_NOW",
                "return_url": return_url,
                "cancel_url": cancel_url,
            }
        });
        let created: SubscriptionResponse = self.post_json("/v1/billing/subscriptions", body).await?.json().await?;
        let approval_url = created
            .links
            .into_iter()
            .find(|link| link.rel == "approve")
            .map(|link| link.href)
            .ok_or_else(|| ProviderError::Malformed {
                provider: PROVIDER,
                detail: "subscription has no approve link".to_string(),
            })?;
        Ok(SubscriptionLink {
            subscription_id: created.id,
            approval_url,
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str, reason: &str) -> Result<(), ProviderError> {
        let path = format!("/v1/billing/subscriptions/{subscription_id}/cancel");
        self.post_json(&path, json!({ "reason": reason })).await?;
        Ok(())
    }
}

/// MockPaymentProvider
///
/// Deterministic provider for tests. Records every cancelled subscription id.
#[derive(Default)]
pub struct MockPaymentProvider {
    pub should_fail: bool,
    cancelled: Mutex<Vec<String>>,
}

impl MockPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn check(&self) -> Result<(), ProviderError> {
        if self.should_fail {
            return Err(ProviderError::Simulated(PROVIDER));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_product(&self, name: &str, _description: &str) -> Result<Product, ProviderError> {
        self.check()?;
        Ok(Product {
            id: "PROD-MOCK".to_string(),
            name: name.to_string(),
        })
    }

    async fn create_plan(&self, _product_id: &str) -> Result<Plan, ProviderError> {
        self.check()?;
        Ok(Plan {
            id: "P-MOCK".to_string(),
            status: "ACTIVE".to_string(),
        })
    }

    async fn create_subscription(&self, return_url: &str, _cancel_url: &str) -> Result<SubscriptionLink, ProviderError> {
        self.check()?;
        Ok(SubscriptionLink {
            subscription_id: "I-MOCK".to_string(),
            approval_url: format!("https://paypal.test/approve?return={return_url}"),
        })
    }

    async fn cancel_subscription(&self, subscription_id: &str, _reason: &str) -> Result<(), ProviderError> {
        self.check()?;
        self.cancelled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(subscription_id.to_string());
        Ok(())
    }
}
