//! App Store Connect access.
//!
//! The sync pipeline talks to the remote platform only through the
//! [`MetadataStore`] trait. [`AppStoreClient`] implements it against the
//! App Store Connect REST API, whose responses are JSON:API documents.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::AttributeSet;
use crate::config::Config;
use crate::error::{Result, SyncError};

const LOCALIZATION_TYPE: &str = "appStoreVersionLocalizations";

/// An app as found by its bundle id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    pub id: String,
    /// First entry of the app's version relationship, if any
    pub latest_version_id: Option<String>,
}

/// One App Store version localization, identified by id and locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizationRecord {
    pub id: String,
    pub locale: String,
}

/// The remote operations the sync pipeline needs.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Look up the app with the given bundle id. Fails with
    /// [`SyncError::AppNotFound`] when nothing matches.
    async fn find_app(&self, bundle_id: &str) -> Result<App>;

    /// Ids of the localizations attached to a version.
    async fn localization_ids(&self, version_id: &str) -> Result<Vec<String>>;

    async fn localization(&self, id: &str) -> Result<LocalizationRecord>;

    /// Partially update a localization. Fields absent from `attributes` keep
    /// their remote value.
    async fn update_localization(
        &self,
        id: &str,
        attributes: &AttributeSet,
    ) -> Result<LocalizationRecord>;
}

// ==================== JSON:API documents ====================

#[derive(Debug, Deserialize)]
struct Document<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ResourceIdentifier {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ToMany {
    data: Option<Vec<ResourceIdentifier>>,
}

#[derive(Debug, Deserialize)]
struct AppResource {
    id: String,
    relationships: Option<AppRelationships>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppRelationships {
    app_store_versions: Option<ToMany>,
}

#[derive(Debug, Deserialize)]
struct VersionResource {
    relationships: Option<VersionRelationships>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionRelationships {
    app_store_version_localizations: Option<ToMany>,
}

#[derive(Debug, Deserialize)]
struct LocalizationResource {
    id: String,
    attributes: Option<LocalizationAttributes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalizationAttributes {
    locale: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    data: UpdateData<'a>,
}

#[derive(Debug, Serialize)]
struct UpdateData<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
    attributes: &'a AttributeSet,
}

impl ToMany {
    fn ids(self, what: &'static str) -> Result<Vec<String>> {
        let data = self.data.ok_or(SyncError::UnexpectedShape(what))?;
        Ok(data.into_iter().map(|r| r.id).collect())
    }
}

impl AppResource {
    fn into_app(self) -> Result<App> {
        let versions = self
            .relationships
            .and_then(|r| r.app_store_versions)
            .ok_or(SyncError::UnexpectedShape("app relationships.appStoreVersions"))?
            .ids("app relationships.appStoreVersions.data")?;

        Ok(App {
            id: self.id,
            latest_version_id: versions.into_iter().next(),
        })
    }
}

impl LocalizationResource {
    fn into_record(self) -> Result<LocalizationRecord> {
        let attributes = self
            .attributes
            .ok_or(SyncError::UnexpectedShape("localization attributes"))?;
        let locale = attributes
            .locale
            .ok_or(SyncError::UnexpectedShape("localization attributes.locale"))?;

        Ok(LocalizationRecord { id: self.id, locale })
    }
}

// ==================== HTTP client ====================

/// App Store Connect API client
pub struct AppStoreClient {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
    localizations_limit: u32,
}

impl AppStoreClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
            localizations_limit: config.localizations_limit,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.api_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(&self.api_token).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MetadataStore for AppStoreClient {
    async fn find_app(&self, bundle_id: &str) -> Result<App> {
        debug!("Looking up app {}", bundle_id);

        let request = self.client.get(self.url("apps")).query(&[
            ("filter[bundleId]", bundle_id),
            ("include", "appStoreVersions"),
        ]);
        let document: Document<Vec<AppResource>> = self.send(request).await?;

        document
            .data
            .into_iter()
            .next()
            .ok_or_else(|| SyncError::AppNotFound(bundle_id.to_string()))?
            .into_app()
    }

    async fn localization_ids(&self, version_id: &str) -> Result<Vec<String>> {
        debug!("Fetching localizations of version {}", version_id);

        let limit = self.localizations_limit.to_string();
        let request = self
            .client
            .get(self.url(&format!("appStoreVersions/{}", version_id)))
            .query(&[
                ("include", "appStoreVersionLocalizations"),
                ("limit[appStoreVersionLocalizations]", limit.as_str()),
            ]);
        let document: Document<VersionResource> = self.send(request).await?;

        document
            .data
            .relationships
            .and_then(|r| r.app_store_version_localizations)
            .ok_or(SyncError::UnexpectedShape(
                "version relationships.appStoreVersionLocalizations",
            ))?
            .ids("version relationships.appStoreVersionLocalizations.data")
    }

    async fn localization(&self, id: &str) -> Result<LocalizationRecord> {
        let request = self
            .client
            .get(self.url(&format!("{}/{}", LOCALIZATION_TYPE, id)));
        let document: Document<LocalizationResource> = self.send(request).await?;

        document.data.into_record()
    }

    async fn update_localization(
        &self,
        id: &str,
        attributes: &AttributeSet,
    ) -> Result<LocalizationRecord> {
        let body = UpdateRequest {
            data: UpdateData {
                kind: LOCALIZATION_TYPE,
                id,
                attributes,
            },
        };
        let request = self
            .client
            .patch(self.url(&format!("{}/{}", LOCALIZATION_TYPE, id)))
            .json(&body);
        let document: Document<LocalizationResource> = self.send(request).await?;

        document.data.into_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn create_test_config(api_url: &str) -> Config {
        Config {
            api_token: "test-token".to_string(),
            api_url: api_url.to_string(),
            localizations_limit: 50,
        }
    }

    fn localization_document(id: &str, locale: &str) -> serde_json::Value {
        serde_json::json!({
            "data": {
                "type": "appStoreVersionLocalizations",
                "id": id,
                "attributes": {
                    "locale": locale,
                    "description": "Remote description",
                    "keywords": null,
                    "promotionalText": "Remote promo",
                    "whatsNew": null
                }
            }
        })
    }

    // ==================== Document Conversion Tests ====================

    #[test]
    fn test_app_without_versions_has_no_latest() {
        let json = r#"{"id": "1", "relationships": {"appStoreVersions": {"data": []}}}"#;
        let resource: AppResource = serde_json::from_str(json).expect("Should deserialize");

        let app = resource.into_app().expect("Should convert");
        assert_eq!(app.latest_version_id, None);
    }

    #[test]
    fn test_app_without_relationships_is_unexpected() {
        let resource: AppResource =
            serde_json::from_str(r#"{"id": "1"}"#).expect("Should deserialize");

        let err = resource.into_app().unwrap_err();
        assert!(matches!(err, SyncError::UnexpectedShape(_)));
    }

    #[test]
    fn test_localization_without_locale_is_unexpected() {
        let json = r#"{"id": "loc-1", "attributes": {"description": "text"}}"#;
        let resource: LocalizationResource =
            serde_json::from_str(json).expect("Should deserialize");

        let err = resource.into_record().unwrap_err();
        assert!(matches!(
            err,
            SyncError::UnexpectedShape("localization attributes.locale")
        ));
    }

    #[test]
    fn test_update_request_serialization() {
        let attributes = AttributeSet {
            keywords: Some("one,two".to_string()),
            ..Default::default()
        };
        let body = UpdateRequest {
            data: UpdateData {
                kind: LOCALIZATION_TYPE,
                id: "loc-1",
                attributes: &attributes,
            },
        };

        let json = serde_json::to_value(&body).expect("Should serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "data": {
                    "type": "appStoreVersionLocalizations",
                    "id": "loc-1",
                    "attributes": { "keywords": "one,two" }
                }
            })
        );
    }

    // ==================== find_app Tests ====================

    #[tokio::test]
    async fn test_find_app_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/apps"))
            .and(query_param("filter[bundleId]", "com.example.app"))
            .and(query_param("include", "appStoreVersions"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "type": "apps",
                    "id": "app-1",
                    "relationships": {
                        "appStoreVersions": {
                            "data": [
                                {"type": "appStoreVersions", "id": "version-2"},
                                {"type": "appStoreVersions", "id": "version-1"}
                            ]
                        }
                    }
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = AppStoreClient::new(&create_test_config(&mock_server.uri()));
        let app = client.find_app("com.example.app").await.expect("Should find app");

        assert_eq!(app.id, "app-1");
        assert_eq!(app.latest_version_id.as_deref(), Some("version-2"));
    }

    #[tokio::test]
    async fn test_find_app_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/apps"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": []
            })))
            .mount(&mock_server)
            .await;

        let client = AppStoreClient::new(&create_test_config(&mock_server.uri()));
        let err = client.find_app("com.example.missing").await.unwrap_err();

        assert!(matches!(err, SyncError::AppNotFound(ref id) if id == "com.example.missing"));
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/apps"))
            .respond_with(ResponseTemplate::new(401).set_body_string("NOT_AUTHORIZED"))
            .mount(&mock_server)
            .await;

        let client = AppStoreClient::new(&create_test_config(&mock_server.uri()));
        let err = client.find_app("com.example.app").await.unwrap_err();

        match err {
            SyncError::Api { status, body } => {
                assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
                assert_eq!(body, "NOT_AUTHORIZED");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_request_error() {
        let client = AppStoreClient::new(&create_test_config("http://127.0.0.1:1"));
        let err = client.find_app("com.example.app").await.unwrap_err();

        assert!(matches!(err, SyncError::Request(_)));
    }

    // ==================== localization_ids Tests ====================

    #[tokio::test]
    async fn test_localization_ids() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/appStoreVersions/version-1"))
            .and(query_param("include", "appStoreVersionLocalizations"))
            .and(query_param("limit[appStoreVersionLocalizations]", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "type": "appStoreVersions",
                    "id": "version-1",
                    "relationships": {
                        "appStoreVersionLocalizations": {
                            "data": [
                                {"type": "appStoreVersionLocalizations", "id": "loc-en"},
                                {"type": "appStoreVersionLocalizations", "id": "loc-de"}
                            ]
                        }
                    }
                }
            })))
            .mount(&mock_server)
            .await;

        let client = AppStoreClient::new(&create_test_config(&mock_server.uri()));
        let ids = client
            .localization_ids("version-1")
            .await
            .expect("Should list localizations");

        assert_eq!(ids, vec!["loc-en".to_string(), "loc-de".to_string()]);
    }

    #[tokio::test]
    async fn test_localization_ids_missing_relationship() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/appStoreVersions/version-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {"type": "appStoreVersions", "id": "version-1"}
            })))
            .mount(&mock_server)
            .await;

        let client = AppStoreClient::new(&create_test_config(&mock_server.uri()));
        let err = client.localization_ids("version-1").await.unwrap_err();

        assert!(matches!(err, SyncError::UnexpectedShape(_)));
    }

    // ==================== localization Tests ====================

    #[tokio::test]
    async fn test_localization() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/appStoreVersionLocalizations/loc-en"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(localization_document("loc-en", "en-US")),
            )
            .mount(&mock_server)
            .await;

        let client = AppStoreClient::new(&create_test_config(&mock_server.uri()));
        let record = client.localization("loc-en").await.expect("Should fetch");

        assert_eq!(record.id, "loc-en");
        assert_eq!(record.locale, "en-US");
    }

    // ==================== update_localization Tests ====================

    #[tokio::test]
    async fn test_update_localization_sends_partial_document() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/v1/appStoreVersionLocalizations/loc-en"))
            .and(header("Authorization", "Bearer test-token"))
            .and(body_json(serde_json::json!({
                "data": {
                    "type": "appStoreVersionLocalizations",
                    "id": "loc-en",
                    "attributes": {
                        "description": "New description",
                        "whatsNew": "Bug fixes"
                    }
                }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(localization_document("loc-en", "en-US")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let attributes = AttributeSet {
            description: Some("New description".to_string()),
            whats_new: Some("Bug fixes".to_string()),
            ..Default::default()
        };

        let client = AppStoreClient::new(&create_test_config(&mock_server.uri()));
        let record = client
            .update_localization("loc-en", &attributes)
            .await
            .expect("Should update");

        assert_eq!(record.locale, "en-US");
    }

    #[tokio::test]
    async fn test_update_localization_conflict() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PATCH"))
            .and(path("/v1/appStoreVersionLocalizations/loc-en"))
            .respond_with(ResponseTemplate::new(409).set_body_string("STATE_ERROR"))
            .mount(&mock_server)
            .await;

        let client = AppStoreClient::new(&create_test_config(&mock_server.uri()));
        let err = client
            .update_localization("loc-en", &AttributeSet::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Api { status, .. } if status == reqwest::StatusCode::CONFLICT));
    }
}
