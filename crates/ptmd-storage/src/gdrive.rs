//! Google Drive v3 backend
//!
//! Talks to the REST API with a pre-issued OAuth access token. Uploads are a
//! media upload followed by a metadata update that names the file and moves it
//! into the target folder.

use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DrivePermission {
    id: String,
    role: String,
}

#[derive(Debug, Deserialize)]
struct PermissionList {
    #[serde(default)]
    permissions: Vec<DrivePermission>,
}

/// Google Drive storage implementation
#[derive(Clone)]
pub struct GoogleDriveStorage {
    http_client: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl GoogleDriveStorage {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> StorageResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to create HTTP client for Drive: {}", e))
            })?;

        Ok(Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    fn files_url(&self, storage_key: &str) -> String {
        format!("{}/drive/v3/files/{}", self.api_base, storage_key)
    }

    /// Map a non-success response onto a storage error.
    async fn check(
        response: Response,
        storage_key: &str,
        fallback: fn(String) -> StorageError,
    ) -> StorageResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(match status {
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                StorageError::PermissionDenied(storage_key.to_string())
            }
            StatusCode::NOT_FOUND => StorageError::NotFound(storage_key.to_string()),
            _ => fallback(format!("Drive API request failed: {} - {}", status, error_text)),
        })
    }

    fn transport(err: reqwest::Error) -> StorageError {
        StorageError::BackendError(format!("Failed to reach Drive API: {}", err))
    }
}

#[async_trait]
impl Storage for GoogleDriveStorage {
    async fn upload(
        &self,
        folder: Option<&str>,
        filename: &str,
        data: Vec<u8>,
    ) -> StorageResult<String> {
        let start = std::time::Instant::now();
        let size = data.len();

        let response = self
            .http_client
            .post(format!("{}/upload/drive/v3/files", self.api_base))
            .query(&[("uploadType", "media")])
            .bearer_auth(&self.access_token)
            .header("Content-Type", XLSX_CONTENT_TYPE)
            .body(data)
            .send()
            .await
            .map_err(Self::transport)?;
        let created: DriveFile = Self::check(response, filename, StorageError::UploadFailed)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Invalid Drive response: {}", e)))?;

        let mut request = self
            .http_client
            .patch(self.files_url(&created.id))
            .bearer_auth(&self.access_token)
            .json(&json!({ "name": filename }));
        if let Some(folder) = folder {
            request = request.query(&[("addParents", folder)]);
        }
        let response = request.send().await.map_err(Self::transport)?;
        Self::check(response, &created.id, StorageError::UploadFailed).await?;

        tracing::info!(
            key = %created.id,
            folder = ?folder,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Drive upload successful"
        );

        Ok(created.id)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .get(self.files_url(storage_key))
            .query(&[("alt", "media")])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(Self::transport)?;
        let data = Self::check(response, storage_key, StorageError::DownloadFailed)
            .await?
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .to_vec();

        tracing::info!(
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Drive download successful"
        );

        Ok(data)
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let response = self
            .http_client
            .delete(self.files_url(storage_key))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(Self::transport)?;
        Self::check(response, storage_key, StorageError::DeleteFailed).await?;

        tracing::info!(key = %storage_key, "Drive delete successful");
        Ok(())
    }

    async fn lock(&self, storage_key: &str) -> StorageResult<()> {
        let url = format!("{}/permissions", self.files_url(storage_key));
        let response = self
            .http_client
            .get(&url)
            .query(&[("fields", "permissions(id,role)")])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(Self::transport)?;
        let list: PermissionList = Self::check(response, storage_key, StorageError::BackendError)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::BackendError(format!("Invalid Drive response: {}", e)))?;

        let mut downgraded = 0;
        for permission in list
            .permissions
            .iter()
            .filter(|p| p.role != "owner" && p.role != "reader")
        {
            let response = self
                .http_client
                .patch(format!("{}/{}", url, permission.id))
                .bearer_auth(&self.access_token)
                .json(&json!({ "role": "reader" }))
                .send()
                .await
                .map_err(Self::transport)?;
            Self::check(response, storage_key, StorageError::BackendError).await?;
            downgraded += 1;
        }

        tracing::info!(key = %storage_key, downgraded, "Drive file locked");
        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let response = self
            .http_client
            .get(self.files_url(storage_key))
            .query(&[("fields", "id")])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(Self::transport)?;
        match Self::check(response, storage_key, StorageError::BackendError).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::GoogleDrive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn drive(server: &mockito::ServerGuard) -> GoogleDriveStorage {
        GoogleDriveStorage::new(server.url(), "test-token").unwrap()
    }

    #[tokio::test]
    async fn upload_creates_then_names_file() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/upload/drive/v3/files")
            .match_query(Matcher::UrlEncoded("uploadType".into(), "media".into()))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_body(r#"{"id": "abc123"}"#)
            .create_async()
            .await;
        let rename = server
            .mock("PATCH", "/drive/v3/files/abc123")
            .match_query(Matcher::UrlEncoded("addParents".into(), "folder-1".into()))
            .match_body(Matcher::Json(json!({ "name": "batch.xlsx" })))
            .with_status(200)
            .with_body(r#"{"id": "abc123"}"#)
            .create_async()
            .await;

        let key = drive(&server)
            .upload(Some("folder-1"), "batch.xlsx", vec![1, 2, 3])
            .await
            .unwrap();

        assert_eq!(key, "abc123");
        create.assert_async().await;
        rename.assert_async().await;
    }

    #[tokio::test]
    async fn download_reads_media() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/files/abc123")
            .match_query(Matcher::UrlEncoded("alt".into(), "media".into()))
            .with_status(200)
            .with_body("xlsx-bytes")
            .create_async()
            .await;

        let data = drive(&server).download("abc123").await.unwrap();
        assert_eq!(data, b"xlsx-bytes");
    }

    #[tokio::test]
    async fn delete_forbidden_is_permission_denied() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/drive/v3/files/abc123")
            .with_status(403)
            .with_body(r#"{"error": {"message": "insufficientFilePermissions"}}"#)
            .create_async()
            .await;

        let result = drive(&server).delete("abc123").await;
        assert!(matches!(result, Err(StorageError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn lock_downgrades_writers_only() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/files/abc123/permissions")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"permissions": [
                    {"id": "p-owner", "role": "owner"},
                    {"id": "p-writer", "role": "writer"},
                    {"id": "p-reader", "role": "reader"}
                ]}"#,
            )
            .create_async()
            .await;
        let writer = server
            .mock("PATCH", "/drive/v3/files/abc123/permissions/p-writer")
            .match_body(Matcher::Json(json!({ "role": "reader" })))
            .with_status(200)
            .with_body("{}")
            .expect(1)
            .create_async()
            .await;

        drive(&server).lock("abc123").await.unwrap();
        writer.assert_async().await;
    }

    #[tokio::test]
    async fn exists_maps_not_found_to_false() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/drive/v3/files/missing")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        assert!(!drive(&server).exists("missing").await.unwrap());
    }
}
