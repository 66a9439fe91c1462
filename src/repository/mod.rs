use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CueError, CueResult};
use crate::store::{Document, Fields};

mod auth;
mod show;
mod user;

pub use auth::{AuthRepository, IdentityAuthRepository};
pub use show::{ShowRepository, TmdbShowRepository};
pub use user::{next_position, StoreUserRepository, UserRepository};

pub(crate) fn to_fields<T: Serialize>(value: &T) -> CueResult<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(CueError::Decode(format!(
            "expected a document object, got {other}"
        ))),
    }
}

pub(crate) fn from_document<T: DeserializeOwned>(doc: &Document) -> CueResult<T> {
    serde_json::from_value(Value::Object(doc.fields.clone())).map_err(|e| {
        CueError::Decode(format!("document {} has an unexpected shape: {e}", doc.id))
    })
}

pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
