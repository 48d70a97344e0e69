use http::Method;
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::claims::AccountTier;

use super::{Error, ServicesApiClient};

#[allow(async_fn_in_trait)]
pub trait PermissionsDal {
    /// Low-level function to create a new user. Should almost always use [Self::new_user()] instead
    async fn create_user(&self, user_id: &str) -> Result<User, Error>;

    /// Get a user with the given ID
    async fn get_user(&self, user_id: &str) -> Result<User, Error>;

    /// Delete a user with the given ID
    async fn delete_user(&self, user_id: &str) -> Result<(), Error>;

    /// Low-level function to assign a specific role to a user. Should almost always use [Self::make_pro()] or [Self::make_free()] instead
    async fn assign_role(&self, user_id: &str, role: &AccountTier) -> Result<(), Error>;

    /// Low-level function to remove a specific role from a user. Should almost always use [Self::make_pro()] or [Self::make_free()] instead
    async fn unassign_role(&self, user_id: &str, role: &AccountTier) -> Result<(), Error>;

    /// Create a new user and set their tier correctly
    async fn new_user(&self, user_id: &str) -> Result<User, Error> {
        let user = self.create_user(user_id).await?;
        self.make_free(&user.id).await?;

        self.get_user(&user.id).await
    }

    /// Set a user to be a Pro user
    async fn make_pro(&self, user_id: &str) -> Result<(), Error> {
        let user = self.get_user(user_id).await?;

        if user.roles.contains(&AccountTier::Basic) {
            self.unassign_role(user_id, &AccountTier::Basic).await?;
        }

        self.assign_role(user_id, &AccountTier::Pro).await
    }

    /// Set a user to be a Free user
    async fn make_free(&self, user_id: &str) -> Result<(), Error> {
        let user = self.get_user(user_id).await?;

        if user.roles.contains(&AccountTier::Pro) {
            self.unassign_role(user_id, &AccountTier::Pro).await?;
        }

        self.assign_role(user_id, &AccountTier::Basic).await
    }
}

/// Simple user
#[derive(Deserialize, Debug)]
pub struct User {
    pub id: String,
    pub key: String,
    #[serde(deserialize_with = "deserialize_role")]
    pub roles: Vec<AccountTier>,
}

#[derive(Deserialize)]
struct RoleObject {
    role: AccountTier,
}

// Used to convert a Permit role into our internal `AccountTier` enum
fn deserialize_role<'de, D>(deserializer: D) -> Result<Vec<AccountTier>, D::Error>
where
    D: Deserializer<'de>,
{
    let roles = Vec::<RoleObject>::deserialize(deserializer)?;

    let mut role_vec: Vec<AccountTier> = roles.into_iter().map(|r| r.role).collect();

    role_vec.sort();

    Ok(role_vec)
}

#[derive(Clone)]
pub struct Client {
    client: ServicesApiClient,
    environment: String,
}

impl Client {
    /// Create a new client with the given API key and targeting the given environment
    pub fn new(api_key: &str, environment: &str) -> Self {
        Self {
            client: ServicesApiClient::new_with_bearer(
                "https://api.eu-central-1.permit.io".parse().unwrap(),
                api_key,
            ),
            environment: environment.to_string(),
        }
    }
}

impl PermissionsDal for Client {
    async fn create_user(&self, user_id: &str) -> Result<User, Error> {
        let Self { environment, .. } = self;

        self.client
            .post(
                &format!("v2/facts/default/{environment}/users"),
                json!({"key": user_id}),
                None,
            )
            .await
    }

    async fn get_user(&self, user_id: &str) -> Result<User, Error> {
        let Self { environment, .. } = self;

        self.client
            .get(
                &format!("v2/facts/default/{environment}/users/{user_id}"),
                None,
            )
            .await
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), Error> {
        let Self { environment, .. } = self;

        self.client
            .request_raw(
                Method::DELETE,
                &format!("v2/facts/default/{environment}/users/{user_id}"),
                None::<()>,
                None,
            )
            .await?;

        Ok(())
    }

    async fn assign_role(&self, user_id: &str, role: &AccountTier) -> Result<(), Error> {
        let Self { environment, .. } = self;

        self.client
            .request_raw(
                Method::POST,
                &format!("v2/facts/default/{environment}/users/{user_id}/roles"),
                Some(json!({
                    "role": role,
                    "tenant": "default",
                })),
                None,
            )
            .await?;

        Ok(())
    }

    async fn unassign_role(&self, user_id: &str, role: &AccountTier) -> Result<(), Error> {
        let Self { environment, .. } = self;

        self.client
            .request_raw(
                Method::DELETE,
                &format!("v2/facts/default/{environment}/users/{user_id}/roles"),
                Some(json!({
                    "role": role,
                    "tenant": "default",
                })),
                None,
            )
            .await?;

        Ok(())
    }
}
