use chrono::Utc;
use serde_json::Value;

use super::QueryResult;
use crate::error::Error;
use crate::model::{Subscription, Table};
use crate::push::{SubscriptionFilter, SubscriptionStore};
use crate::types::Platform;

impl Table<Subscription> {
    pub async fn insert(
        &self,
        subscription: &Subscription,
    ) -> Result<QueryResult, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO push_subscription
                (endpoint, subscription, platform, owner, last_called_at, last_call_failed, last_failure_reason, created_at)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (endpoint) DO UPDATE SET
                subscription = EXCLUDED.subscription,
                platform = EXCLUDED.platform,
                owner = EXCLUDED.owner
            "#,
        )
        .bind(&subscription.endpoint)
        .bind(&subscription.subscription)
        .bind(&subscription.platform)
        .bind(&subscription.owner)
        .bind(subscription.last_called_at)
        .bind(subscription.last_call_failed)
        .bind(&subscription.last_failure_reason)
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await
    }

    pub async fn get_by_endpoint(
        &self,
        endpoint: &str,
    ) -> Result<Option<Subscription>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM push_subscription WHERE endpoint=$1
            "#,
        )
        .bind(endpoint)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn get_all(&self) -> Result<Vec<Subscription>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM push_subscription
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_by_owner(
        &self,
        owner: &str,
    ) -> Result<Vec<Subscription>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM push_subscription WHERE owner=$1
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn delete_by_endpoint(
        &self,
        endpoint: &str,
    ) -> Result<QueryResult, sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM push_subscription WHERE endpoint=$1
            "#,
        )
        .bind(endpoint)
        .execute(&self.pool)
        .await
    }

    pub async fn delete_by_owner(
        &self,
        owner: &str,
    ) -> Result<QueryResult, sqlx::Error> {
        sqlx::query(
            r#"
            DELETE FROM push_subscription WHERE owner=$1
            "#,
        )
        .bind(owner)
        .execute(&self.pool)
        .await
    }

    pub async fn update_call_result(
        &self,
        subscription: &Subscription,
    ) -> Result<QueryResult, sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE push_subscription
            SET last_called_at=$2, last_call_failed=$3, last_failure_reason=$4
            WHERE endpoint=$1
            "#,
        )
        .bind(&subscription.endpoint)
        .bind(subscription.last_called_at)
        .bind(subscription.last_call_failed)
        .bind(&subscription.last_failure_reason)
        .execute(&self.pool)
        .await
    }
}

impl SubscriptionStore for Table<Subscription> {
    async fn find_by_endpoint(
        &self,
        endpoint: &str,
    ) -> Result<Option<Subscription>, Error> {
        Ok(self.get_by_endpoint(endpoint).await?)
    }

    async fn find_matching(
        &self,
        filter: &SubscriptionFilter,
    ) -> Result<Vec<Subscription>, Error> {
        let items = match filter {
            SubscriptionFilter::All => self.get_all().await?,
            SubscriptionFilter::Owner(owner) => {
                self.get_by_owner(owner).await?
            },
        };
        Ok(items)
    }

    async fn create(
        &self,
        data: &Value,
        owner: Option<&str>,
        platform: Platform,
    ) -> Result<Subscription, Error> {
        let endpoint = data
            .get("endpoint")
            .and_then(Value::as_str)
            .unwrap_or_default();

        if endpoint.is_empty() {
            return Err(Error::ValidationError(String::from(
                "subscription descriptor has no endpoint",
            )));
        }

        let subscription = Subscription {
            endpoint: endpoint.to_owned(),
            subscription: data.to_string(),
            platform: String::from(platform),
            owner: owner.map(str::to_owned),
            last_called_at: None,
            last_call_failed: false,
            last_failure_reason: None,
            created_at: Utc::now(),
        };

        self.insert(&subscription).await?;

        Ok(subscription)
    }

    async fn delete(&self, endpoint: &str) -> Result<bool, Error> {
        let result = self.delete_by_endpoint(endpoint).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_owner(&self, owner: &str) -> Result<bool, Error> {
        let result = self.delete_by_owner(owner).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn save(&self, subscription: &Subscription) -> Result<(), Error> {
        self.update_call_result(subscription).await?;
        Ok(())
    }
}
