//! Repository for the `users` auth collection.

use crate::collections::USERS;
use crate::models::user::User;
use crate::store::{BaasError, RecordStore};

use super::decode_opt;

pub struct UserRepo;

impl UserRepo {
    pub async fn find(store: &dyn RecordStore, id: &str) -> Result<Option<User>, BaasError> {
        decode_opt(store.get(USERS, id).await?)
    }
}
