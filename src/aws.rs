use aws_config::BehaviorVersion;
use aws_config::environment::{
    credentials::EnvironmentVariableCredentialsProvider, region::EnvironmentVariableRegionProvider,
};
use aws_config::meta::region::ProvideRegion;
use aws_sdk_dynamodb::config::ProvideCredentials;
use color_eyre::eyre::{Result, eyre};

/// Build a DynamoDB client from `AWS_REGION`/`AWS_DEFAULT_REGION` and the
/// `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY` variables. `endpoint_url`
/// points the client at another endpoint such as DynamoDB Local.
pub async fn new_client(endpoint_url: Option<&str>) -> Result<aws_sdk_dynamodb::Client> {
    let region = EnvironmentVariableRegionProvider::new()
        .region()
        .await
        .ok_or_else(|| eyre!("AWS region not set. Use AWS_REGION or AWS_DEFAULT_REGION."))?;

    let credentials_provider = EnvironmentVariableCredentialsProvider::new();
    credentials_provider
        .provide_credentials()
        .await
        .map_err(|err| eyre!("AWS credentials not found in environment: {err}"))?;

    tracing::debug!(region = %region, endpoint_url = ?endpoint_url, "Creating DynamoDB client");
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .credentials_provider(credentials_provider);

    if let Some(url) = endpoint_url {
        loader = loader.endpoint_url(url);
    }

    let config = loader.load().await;
    Ok(aws_sdk_dynamodb::Client::new(&config))
}
