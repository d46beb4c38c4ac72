use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::{Parameter as SsmParameter, ParameterType as SsmParameterType};
use aws_sdk_ssm::Client;
use queuebot_core::brain::{Parameter, ParameterStore, ParameterType};
use queuebot_core::errors::StoreError;

pub struct SsmParameterStore {
    client: Client,
}

impl SsmParameterStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

fn backend_error(error: impl std::error::Error) -> StoreError {
    StoreError::Backend(DisplayErrorContext(&error).to_string())
}

fn to_sdk_type(parameter_type: ParameterType) -> SsmParameterType {
    match parameter_type {
        ParameterType::String => SsmParameterType::String,
        ParameterType::SecureString => SsmParameterType::SecureString,
    }
}

fn from_sdk_type(parameter_type: Option<&SsmParameterType>) -> Result<ParameterType, StoreError> {
    match parameter_type {
        Some(SsmParameterType::String) | None => Ok(ParameterType::String),
        Some(SsmParameterType::SecureString) => Ok(ParameterType::SecureString),
        Some(other) => {
            Err(StoreError::Decode(format!("unsupported parameter type `{}`", other.as_str())))
        }
    }
}

fn from_sdk_parameter(parameter: &SsmParameter) -> Result<Parameter, StoreError> {
    let name = parameter
        .name()
        .ok_or_else(|| StoreError::Decode("parameter without a name".to_owned()))?;
    Ok(Parameter {
        name: name.to_owned(),
        value: parameter.value().unwrap_or_default().to_owned(),
        parameter_type: from_sdk_type(parameter.r#type())?,
    })
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameter(
        &self,
        name: &str,
        with_decryption: bool,
    ) -> Result<Option<Parameter>, StoreError> {
        let result = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await;

        let output = match result {
            Ok(output) => output,
            Err(error)
                if error
                    .as_service_error()
                    .is_some_and(|service| service.is_parameter_not_found()) =>
            {
                return Ok(None);
            }
            Err(error) => return Err(backend_error(error)),
        };

        output.parameter().map(from_sdk_parameter).transpose()
    }

    async fn put_parameter(
        &self,
        name: &str,
        value: &str,
        parameter_type: ParameterType,
    ) -> Result<(), StoreError> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(to_sdk_type(parameter_type))
            .overwrite(true)
            .send()
            .await
            .map_err(backend_error)?;
        Ok(())
    }

    async fn get_parameters_by_path(
        &self,
        path: &str,
        max_results: usize,
    ) -> Result<Vec<Parameter>, StoreError> {
        let max_results = i32::try_from(max_results).unwrap_or(i32::MAX);
        let output = self
            .client
            .get_parameters_by_path()
            .path(path)
            .recursive(true)
            .with_decryption(false)
            .max_results(max_results)
            .send()
            .await
            .map_err(backend_error)?;

        output.parameters().iter().map(from_sdk_parameter).collect()
    }
}
