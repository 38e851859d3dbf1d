use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use tracing::debug;

use larder_core::api::{self, NewRecipeBody, RecipeTarget};
use larder_core::error::SyncError;
use larder_core::models::{Favorite, NewRecipe, Recipe, RecipeId, User};
use larder_core::remote::{FavoriteService, RecipeService};
use larder_core::session::Credential;

/// HTTP binding of the recipe and favorites services.
pub struct RecipeServiceClient {
    client: reqwest::Client,
    base_url: String,
}

impl RecipeServiceClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("larder-cli/{}", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .connect_timeout(std::time::Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        credential: Option<&Credential>,
    ) -> RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let builder = self.client.request(method, url);
        match credential {
            Some(c) => builder.bearer_auth(c.bearer()),
            None => builder,
        }
    }

    /// Sends the request and returns the body of a successful response.
    async fn send(&self, builder: RequestBuilder) -> Result<String, SyncError> {
        let resp = builder
            .send()
            .await
            .map_err(|e| SyncError::TransportFailure(describe(&e)))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SyncError::TransportFailure(describe(&e)))?;
        debug!(status = status.as_u16(), bytes = body.len(), "service response");

        if !status.is_success() {
            return Err(SyncError::RemoteRejected {
                status: status.as_u16(),
                message: api::error_message(&body),
            });
        }
        Ok(body)
    }

    pub async fn fetch_profile(&self, credential: &Credential) -> Result<User, SyncError> {
        let body = self
            .send(self.request(Method::GET, "/users/profile", Some(credential)))
            .await?;
        api::decode_user(&body)
            .map_err(invalid_body)?
            .ok_or_else(|| {
                SyncError::TransportFailure("profile response has no user id".to_string())
            })
    }

    async fn fetch_recipes(
        &self,
        path: &str,
        credential: Option<&Credential>,
    ) -> Result<Vec<Recipe>, SyncError> {
        let body = self.send(self.request(Method::GET, path, credential)).await?;
        api::decode_recipes(&body).map_err(invalid_body)
    }

    async fn post_target(
        &self,
        method: Method,
        path: &str,
        id: &RecipeId,
        credential: &Credential,
    ) -> Result<(), SyncError> {
        let builder = self
            .request(method, path, Some(credential))
            .json(&RecipeTarget {
                recipe_id: id.as_str(),
            });
        self.send(builder).await.map(|_| ())
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "could not connect to the recipe service".to_string()
    } else {
        err.to_string()
    }
}

fn invalid_body(err: serde_json::Error) -> SyncError {
    SyncError::TransportFailure(format!("invalid response body: {err}"))
}

#[async_trait]
impl RecipeService for RecipeServiceClient {
    async fn list_all(&self, credential: Option<&Credential>) -> Result<Vec<Recipe>, SyncError> {
        self.fetch_recipes("/recipes/all", credential).await
    }

    async fn create(
        &self,
        recipe: &NewRecipe,
        credential: &Credential,
    ) -> Result<Recipe, SyncError> {
        let builder = self
            .request(Method::POST, "/recipes/generate", Some(credential))
            .json(&NewRecipeBody::from(recipe));
        let body = self.send(builder).await?;
        api::decode_recipe(&body)
            .map_err(invalid_body)?
            .ok_or_else(|| SyncError::TransportFailure("created recipe has no id".to_string()))
    }

    async fn delete(&self, id: &RecipeId, credential: &Credential) -> Result<(), SyncError> {
        self.post_target(Method::DELETE, "/recipes/delete", id, credential)
            .await
    }

    async fn list_for_user(&self, credential: &Credential) -> Result<Vec<Recipe>, SyncError> {
        self.fetch_recipes("/recipes/user", Some(credential)).await
    }
}

#[async_trait]
impl FavoriteService for RecipeServiceClient {
    async fn add(&self, id: &RecipeId, credential: &Credential) -> Result<(), SyncError> {
        self.post_target(Method::POST, "/fav/favorite", id, credential)
            .await
    }

    async fn remove(&self, id: &RecipeId, credential: &Credential) -> Result<(), SyncError> {
        self.post_target(Method::POST, "/fav/removeFav", id, credential)
            .await
    }

    async fn list_for_user(&self, credential: &Credential) -> Result<Vec<Favorite>, SyncError> {
        let body = self
            .send(self.request(Method::GET, "/fav/userFav", Some(credential)))
            .await?;
        api::decode_favorites(&body).map_err(invalid_body)
    }
}

/// True when the service rejected the token itself.
pub fn is_auth_rejection(err: &SyncError) -> bool {
    matches!(
        err,
        SyncError::RemoteRejected { status, .. }
            if *status == StatusCode::UNAUTHORIZED.as_u16()
                || *status == StatusCode::FORBIDDEN.as_u16()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::{delete, get, post};
    use serde_json::{Value, json};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn bearer(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string)
    }

    fn token() -> Credential {
        Credential::new("tok").unwrap()
    }

    #[tokio::test]
    async fn test_list_all_decodes_and_sends_optional_token() {
        let router = Router::new().route(
            "/api/recipes/all",
            get(|headers: HeaderMap| async move {
                let owner = bearer(&headers).map_or("anon".to_string(), |t| format!("owner-{t}"));
                axum::Json(json!([
                    {"_id": "r1", "title": "Soup", "createdBy": owner},
                    {"_id": "r2", "createdBy": {"_id": "u2"}}
                ]))
            }),
        );
        let client = RecipeServiceClient::new(&spawn(router).await).unwrap();

        let anon = client.list_all(None).await.unwrap();
        assert_eq!(anon.len(), 2);
        assert_eq!(anon[0].owner.as_ref().unwrap().as_str(), "anon");
        assert_eq!(anon[1].title, "Untitled Recipe");

        let authed = client.list_all(Some(&token())).await.unwrap();
        assert_eq!(authed[0].owner.as_ref().unwrap().as_str(), "owner-tok");
    }

    #[tokio::test]
    async fn test_delete_sends_recipe_id_body() {
        let router = Router::new().route(
            "/api/recipes/delete",
            delete(|headers: HeaderMap, axum::Json(body): axum::Json<Value>| async move {
                if bearer(&headers).as_deref() != Some("tok") {
                    return (AxumStatus::UNAUTHORIZED, axum::Json(json!({"message": "No token"})));
                }
                if body["recipeId"] == "r1" {
                    (AxumStatus::OK, axum::Json(json!({"message": "Deleted"})))
                } else {
                    (AxumStatus::NOT_FOUND, axum::Json(json!({"message": "Recipe not found"})))
                }
            }),
        );
        let client = RecipeServiceClient::new(&spawn(router).await).unwrap();

        client.delete(&RecipeId::from("r1"), &token()).await.unwrap();
        let err = client
            .delete(&RecipeId::from("r9"), &token())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SyncError::RemoteRejected {
                status: 404,
                message: Some("Recipe not found".to_string()),
            }
        );

        let err = client
            .delete(&RecipeId::from("r1"), &Credential::new("bad").unwrap())
            .await
            .unwrap_err();
        assert!(is_auth_rejection(&err));
    }

    #[tokio::test]
    async fn test_favorite_endpoints() {
        let router = Router::new()
            .route(
                "/api/fav/favorite",
                post(|axum::Json(body): axum::Json<Value>| async move {
                    assert_eq!(body, json!({"recipeId": "r1"}));
                    axum::Json(json!({"message": "Added"}))
                }),
            )
            .route(
                "/api/fav/removeFav",
                post(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "oops") }),
            )
            .route(
                "/api/fav/userFav",
                get(|| async {
                    axum::Json(json!([
                        {"_id": "r1", "title": "Soup", "addedAt": "2024-06-15T10:00:00Z"}
                    ]))
                }),
            );
        let client = RecipeServiceClient::new(&spawn(router).await).unwrap();
        let id = RecipeId::from("r1");

        client.add(&id, &token()).await.unwrap();
        let err = client.remove(&id, &token()).await.unwrap_err();
        assert_eq!(
            err,
            SyncError::RemoteRejected {
                status: 500,
                message: None,
            }
        );
        let favs = FavoriteService::list_for_user(&client, &token()).await.unwrap();
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0].title.as_deref(), Some("Soup"));
    }

    #[tokio::test]
    async fn test_create_and_profile() {
        let router = Router::new()
            .route(
                "/api/recipes/generate",
                post(|axum::Json(body): axum::Json<Value>| async move {
                    axum::Json(json!({
                        "_id": "new1",
                        "title": body["title"],
                        "ingredients": body["ingredients"],
                        "createdBy": "u1"
                    }))
                }),
            )
            .route(
                "/api/users/profile",
                get(|| async {
                    axum::Json(json!({"_id": "u1", "name": "Ada Lovelace", "username": "ada"}))
                }),
            );
        let client = RecipeServiceClient::new(&spawn(router).await).unwrap();

        let created = client
            .create(
                &NewRecipe {
                    title: "Soup".to_string(),
                    cuisine: None,
                    ingredients: vec![larder_core::models::Ingredient::new("leek", "2")],
                },
                &token(),
            )
            .await
            .unwrap();
        assert_eq!(created.id, RecipeId::from("new1"));
        assert_eq!(created.ingredients[0].name, "leek");

        let user = client.fetch_profile(&token()).await.unwrap();
        assert_eq!(user.username, "ada");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = RecipeServiceClient::new(&format!("http://{addr}/api")).unwrap();
        let err = client.list_all(None).await.unwrap_err();
        assert!(matches!(err, SyncError::TransportFailure(_)));
    }

    #[tokio::test]
    async fn test_malformed_body_is_transport_failure() {
        let router = Router::new().route("/api/recipes/user", get(|| async { "<html>" }));
        let client = RecipeServiceClient::new(&spawn(router).await).unwrap();
        let err = RecipeService::list_for_user(&client, &token())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::TransportFailure(m) if m.starts_with("invalid response body")
        ));
    }
}
