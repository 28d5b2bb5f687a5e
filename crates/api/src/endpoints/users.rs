use crate::wire::UserWire;
use crate::{ApiClient, ApiError, User};

impl ApiClient {
    /// List users visible to the logged-in trainer
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        let users: Vec<UserWire> = self.get("/users").execute().await?;
        Ok(users.into_iter().map(User::from).collect())
    }
}
