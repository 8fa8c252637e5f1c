use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use time::OffsetDateTime;

use crate::error::Error;
use crate::pipeline::{SignedUrl, StoreArtifact};

const CONTENT_TYPE: &str = "image/jpeg";
const URL_EXPIRY: Duration = Duration::from_secs(3600);

/// S3-backed artifact storage with SigV4 presigned download URLs.
///
/// The bucket name is optional at construction so a missing
/// `S3_BUCKET_NAME` surfaces as a per-request configuration error instead
/// of preventing startup.
pub struct S3Bucket {
    client: aws_sdk_s3::Client,
    bucket: Option<String>,
}

impl S3Bucket {
    pub const fn new(client: aws_sdk_s3::Client, bucket: Option<String>) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StoreArtifact for S3Bucket {
    async fn store(&self, image: Vec<u8>, key: &str) -> Result<SignedUrl, Error> {
        let bucket = self.bucket.as_deref().ok_or(Error::Configuration("S3_BUCKET_NAME"))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(CONTENT_TYPE)
            .body(ByteStream::from(image))
            .send()
            .await
            .map_err(|err| Error::Storage(format!("couldn't upload {key}: {err}")))?;

        let presigning = PresigningConfig::expires_in(URL_EXPIRY)
            .map_err(|err| Error::Storage(err.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|err| Error::Storage(format!("couldn't presign {key}: {err}")))?;

        Ok(SignedUrl {
            url: request.uri().to_string(),
            expires_at: OffsetDateTime::now_utc() + URL_EXPIRY,
        })
    }
}
