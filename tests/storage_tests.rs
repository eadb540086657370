use inkpress::{
    error::ApiError,
    storage::{AssetStore, MockAssetStore, S3AssetStore},
};

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_upload_success() {
        let mock = MockAssetStore::new();
        let result = mock
            .upload(vec![1, 2, 3], "image/png", "blog-posts")
            .await;
        assert!(result.is_ok());

        let url = result.unwrap();
        assert!(url.contains("signature=fake"));
        // The folder prefix and inferred extension both end up in the key.
        assert!(url.contains("/blog-posts/"));
        assert!(url.contains(".png"));
    }

    #[tokio::test]
    async fn test_mock_upload_failure() {
        let mock = MockAssetStore::new_failing();
        let result = mock
            .upload(vec![1, 2, 3], "image/png", "blog-posts")
            .await;
        assert_eq!(result.unwrap_err(), ApiError::AssetUpload);
    }

    #[tokio::test]
    async fn test_mock_folder_sanitization() {
        let mock = MockAssetStore::new();
        let result = mock
            .upload(vec![1, 2, 3], "image/png", "../../etc/passwd")
            .await;
        assert!(result.is_ok());

        // Path traversal characters must never survive into the object key.
        let url = result.unwrap();
        assert!(!url.contains(".."));
        assert!(!url.contains("/etc/"));
    }

    #[tokio::test]
    async fn test_mock_extension_fallback() {
        let mock = MockAssetStore::new();
        let url = mock
            .upload(vec![1, 2, 3], "application/octet-stream", "blog-posts")
            .await
            .unwrap();
        assert!(url.contains(".bin"));
    }

    #[tokio::test]
    async fn test_mock_empty_folder_has_no_double_slash() {
        let mock = MockAssetStore::new();
        let url = mock.upload(vec![1, 2, 3], "image/jpeg", "").await.unwrap();
        assert!(!url.contains("mock-bucket//"));
        assert!(url.contains(".jpg"));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    #[tokio::test]
    async fn test_s3_client_creation() {
        let _client = S3AssetStore::new(
            "http://localhost:9000",
            "us-east-1",
            "admin",
            "password",
            "test-bucket",
            "http://localhost:9000",
        );
        // Just testing that construction doesn't panic.
    }
}
