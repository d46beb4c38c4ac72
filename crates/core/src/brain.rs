use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

pub const DEFAULT_LIST_LIMIT: usize = 10;
/// Upper bound of one `GetParametersByPath` page.
pub const MAX_LIST_LIMIT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterType {
    String,
    SecureString,
}

impl ParameterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::SecureString => "SecureString",
        }
    }
}

impl std::str::FromStr for ParameterType {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "String" => Ok(Self::String),
            "SecureString" => Ok(Self::SecureString),
            other => Err(StoreError::Decode(format!("unsupported parameter type `{other}`"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub parameter_type: ParameterType,
}

/// Key/value service the bot keeps its credentials and app state in.
///
/// A missing parameter is `Ok(None)`, never an error.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<Parameter>, StoreError>;

    /// Creates or overwrites `name`.
    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        parameter_type: ParameterType,
    ) -> Result<(), StoreError>;

    /// Recursive listing below `path`, at most `max_results` entries.
    async fn get_parameters_by_path(
        &self,
        path: &str,
        max_results: usize,
    ) -> Result<Vec<Parameter>, StoreError>;
}

/// Plaintext key/value facade handed to command apps.
#[derive(Clone)]
pub struct Brain {
    store: Arc<dyn ParameterStore>,
}

impl Brain {
    pub fn new(store: Arc<dyn ParameterStore>) -> Self {
        Self { store }
    }

    pub async fn store(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.store.put_parameter(key, value, ParameterType::String).await
    }

    pub async fn get(&self, key: &str) -> Result<String, StoreError> {
        Ok(self
            .store
            .get_parameter(key, false)
            .await?
            .map(|parameter| parameter.value)
            .unwrap_or_default())
    }

    pub async fn get_list(&self, path: &str) -> Result<Vec<Parameter>, StoreError> {
        self.get_list_with_limit(path, DEFAULT_LIST_LIMIT).await
    }

    pub async fn get_list_with_limit(
        &self,
        path: &str,
        max_results: usize,
    ) -> Result<Vec<Parameter>, StoreError> {
        let max_results = max_results.clamp(1, MAX_LIST_LIMIT);
        self.store.get_parameters_by_path(path, max_results).await
    }
}

/// True when `name` sits below `path` in the `/`-separated hierarchy.
pub fn is_under_path(name: &str, path: &str) -> bool {
    let prefix = path.trim_end_matches('/');
    name.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}
