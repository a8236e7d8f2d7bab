//! S3 cache backend with lifecycle-managed expiration.
//!
//! Entries are stored under the same sharded key layout as the local store
//! (naming consistency only; bucket namespaces are flat). Expiration is
//! delegated to a bucket lifecycle rule installed at startup, so `get`
//! performs no client-side staleness check and `run_cleanup` is a no-op.

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLifecycleConfiguration, BucketLocationConstraint, CreateBucketConfiguration, ExpirationStatus,
    LifecycleExpiration, LifecycleRule, LifecycleRuleFilter,
};

use super::{CacheStore, sharded_path};
use crate::Error;
use crate::config::S3CacheConfig;

/// Lifecycle rule id owned by this service.
const LIFECYCLE_RULE_ID: &str = "webshot-expire";

/// Content type for stored entries.
const CONTENT_TYPE: &str = "image/png";

/// S3-backed cache store.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

fn sdk_err(err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::S3(DisplayErrorContext(err).to_string())
}

/// Lifecycle expiration takes an `i32` day count; reject retentions beyond it.
fn lifecycle_days(retention_days: u64) -> Result<i32, Error> {
    i32::try_from(retention_days)
        .map_err(|_| Error::S3(format!("retention of {retention_days} days exceeds the lifecycle rule range")))
}

impl S3Store {
    /// Connect to the bucket and prepare it for serving.
    ///
    /// Verifies the bucket exists (creating it when `create_bucket` is set),
    /// then installs an expire-after-`retention_days` lifecycle rule. A zero
    /// retention means "do not manage lifecycle": any rule already on the
    /// bucket is left untouched. Every failure here is fatal to startup.
    pub async fn open(config: &S3CacheConfig, retention_days: u64) -> Result<Self, Error> {
        let base = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&base).force_path_style(true);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(region) = &config.region {
            builder = builder.region(Region::new(region.clone()));
        }
        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            builder =
                builder.credentials_provider(Credentials::new(access_key, secret_key, None, None, "webshot-config"));
        }

        let client = Client::from_conf(builder.build());
        let store = Self { client, bucket: config.bucket.clone() };

        store.ensure_bucket(config).await?;
        store.configure_lifecycle(retention_days).await?;

        Ok(store)
    }

    async fn ensure_bucket(&self, config: &S3CacheConfig) -> Result<(), Error> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => return Ok(()),
            Err(e) => {
                let service = e.into_service_error();
                if !service.is_not_found() {
                    return Err(sdk_err(service));
                }
            }
        }

        if !config.create_bucket {
            return Err(Error::BucketUnavailable(self.bucket.clone()));
        }

        let mut create = self.client.create_bucket().bucket(&self.bucket);
        if let Some(region) = config.region.as_deref()
            && region != "us-east-1"
        {
            create = create.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        create
            .send()
            .await
            .map_err(|_| Error::BucketUnavailable(self.bucket.clone()))?;

        tracing::info!(bucket = %self.bucket, "created cache bucket");
        Ok(())
    }

    async fn configure_lifecycle(&self, retention_days: u64) -> Result<(), Error> {
        if retention_days == 0 {
            tracing::debug!(bucket = %self.bucket, "retention disabled, leaving bucket lifecycle untouched");
            return Ok(());
        }

        let rule = LifecycleRule::builder()
            .id(LIFECYCLE_RULE_ID)
            .status(ExpirationStatus::Enabled)
            .filter(LifecycleRuleFilter::builder().prefix("").build())
            .expiration(LifecycleExpiration::builder().days(lifecycle_days(retention_days)?).build())
            .build()
            .map_err(sdk_err)?;

        self.client
            .put_bucket_lifecycle_configuration()
            .bucket(&self.bucket)
            .lifecycle_configuration(BucketLifecycleConfiguration::builder().rules(rule).build().map_err(sdk_err)?)
            .send()
            .await
            .map_err(sdk_err)?;

        tracing::info!(bucket = %self.bucket, retention_days, "bucket lifecycle expiration configured");
        Ok(())
    }
}

#[async_trait::async_trait]
impl CacheStore for S3Store {
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), Error> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(sharded_path(key))
            .content_type(CONTENT_TYPE)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(sdk_err)?;

        tracing::debug!(key, bucket = %self.bucket, bytes = data.len(), "cache entry uploaded");
        Ok(())
    }

    async fn get(&self, key: &str, _max_age_secs: u64) -> Result<Option<Vec<u8>>, Error> {
        let object = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(sharded_path(key))
            .send()
            .await
        {
            Ok(object) => object,
            Err(e) => {
                let service = e.into_service_error();
                if service.is_no_such_key() {
                    return Ok(None);
                }
                return Err(sdk_err(service));
            }
        };

        let data = object.body.collect().await.map_err(sdk_err)?.into_bytes();
        tracing::debug!(key, bucket = %self.bucket, bytes = data.len(), "cache hit");
        Ok(Some(data.to_vec()))
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        // S3 deletes of absent keys already succeed, matching the contract.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(sharded_path(key))
            .send()
            .await
            .map_err(sdk_err)?;
        Ok(())
    }

    async fn run_cleanup(&self, _max_age_secs: u64) {
        tracing::debug!(bucket = %self.bucket, "cleanup skipped, bucket lifecycle manages expiration");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_days_accepts_realistic_retentions() {
        assert_eq!(lifecycle_days(1).unwrap(), 1);
        assert_eq!(lifecycle_days(30).unwrap(), 30);
        assert_eq!(lifecycle_days(i32::MAX as u64).unwrap(), i32::MAX);
    }

    #[test]
    fn test_lifecycle_days_rejects_out_of_range_retention() {
        assert!(matches!(lifecycle_days(i32::MAX as u64 + 1), Err(Error::S3(_))));
        assert!(matches!(lifecycle_days(u64::MAX), Err(Error::S3(_))));
    }

    /// Round trip against a live S3-compatible endpoint, e.g. MinIO:
    /// WEBSHOT_TEST_S3_ENDPOINT, _BUCKET, _ACCESS_KEY, _SECRET_KEY.
    #[tokio::test]
    #[ignore = "requires an S3-compatible endpoint"]
    async fn test_s3_round_trip() {
        let env = |name: &str| std::env::var(name).unwrap();
        let config = S3CacheConfig {
            endpoint: Some(env("WEBSHOT_TEST_S3_ENDPOINT")),
            region: Some("us-east-1".into()),
            bucket: env("WEBSHOT_TEST_S3_BUCKET"),
            access_key: Some(env("WEBSHOT_TEST_S3_ACCESS_KEY")),
            secret_key: Some(env("WEBSHOT_TEST_S3_SECRET_KEY")),
            create_bucket: true,
        };

        let store = S3Store::open(&config, 0).await.unwrap();
        let key = "abcdef0123456789abcdef0123456789abcdef0123456789abcdef0123456789";

        store.save(key, b"png bytes").await.unwrap();
        assert_eq!(store.get(key, 0).await.unwrap().as_deref(), Some(b"png bytes".as_slice()));

        store.delete(key).await.unwrap();
        assert!(store.get(key, 0).await.unwrap().is_none());
        store.delete(key).await.unwrap();
    }
}
