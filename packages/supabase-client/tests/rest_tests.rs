//! Client requests against a local listener imitating the Supabase REST surface.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query as QueryParams},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use supabase_client::{BucketOptions, FileOptions, Query, SupabaseClient};

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn select_sends_filters_and_api_key() {
    let router = Router::new().route(
        "/rest/v1/posts",
        get(
            |headers: HeaderMap, QueryParams(params): QueryParams<HashMap<String, String>>| async move {
                assert_eq!(headers["apikey"], "anon");
                assert_eq!(headers["authorization"], "Bearer anon");
                assert_eq!(params["select"], "*,profile:profiles(*)");
                assert_eq!(params["user_id"], "eq.u1");
                assert_eq!(params["order"], "created_at.desc");
                assert_eq!(params["limit"], "6");
                Json(json!([{"id": "p1"}, {"id": "p2"}]))
            },
        ),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let rows: Vec<Value> = client
        .select(
            &Query::from("posts")
                .select("*, profile:profiles(*)")
                .eq("user_id", "u1")
                .order("created_at", false)
                .limit(6),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn single_row_miss_is_not_found() {
    let router = Router::new().route(
        "/rest/v1/profiles",
        get(|headers: HeaderMap| async move {
            assert_eq!(headers["accept"], "application/vnd.pgrst.object+json");
            (
                StatusCode::NOT_ACCEPTABLE,
                Json(json!({
                    "code": "PGRST116",
                    "details": "The result contains 0 rows",
                    "hint": null,
                    "message": "JSON object requested, multiple (or no) rows returned"
                })),
            )
        }),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let err = client
        .select_single::<Value>(&Query::from("profiles").eq("id", "u1"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn signed_in_token_is_used_as_bearer() {
    let router = Router::new()
        .route(
            "/auth/v1/token",
            post(|| async {
                Json(json!({
                    "access_token": "user-jwt",
                    "refresh_token": "r",
                    "expires_in": 3600,
                    "token_type": "bearer",
                    "user": {"id": "5b7c1f1e-0a2b-4d3c-9e8f-1a2b3c4d5e6f", "email": "ada@example.com"}
                }))
            }),
        )
        .route(
            "/rest/v1/likes",
            get(|headers: HeaderMap| async move {
                assert_eq!(headers["authorization"], "Bearer user-jwt");
                Json(json!([]))
            }),
        );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let session = client
        .sign_in_with_password("ada@example.com", "secret")
        .await
        .unwrap();
    let rows: Vec<Value> = client.select(&Query::from("likes")).await.unwrap();

    assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
    assert!(rows.is_empty());
}

#[tokio::test]
async fn upload_sends_content_type_and_upsert() {
    let router = Router::new().route(
        "/storage/v1/object/:bucket/*path",
        post(
            |Path((bucket, path)): Path<(String, String)>, headers: HeaderMap, body: axum::body::Bytes| async move {
                assert_eq!(headers["content-type"], "image/png");
                assert_eq!(headers["x-upsert"], "true");
                assert_eq!(headers["cache-control"], "max-age=3600");
                assert_eq!(body.len(), 4);
                Json(json!({"Key": format!("{}/{}", bucket, path)}))
            },
        ),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let key = client
        .upload(
            "images",
            "u1/1700000000000-abc.png",
            vec![1u8, 2, 3, 4],
            &FileOptions {
                content_type: "image/png".into(),
                cache_control: 3600,
                upsert: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(key, "images/u1/1700000000000-abc.png");
}

// ============================================================================
// Row mutations
// ============================================================================

#[tokio::test]
async fn insert_asks_for_the_created_row_as_one_object() {
    let router = Router::new().route(
        "/rest/v1/comments",
        post(
            |headers: HeaderMap,
             QueryParams(params): QueryParams<HashMap<String, String>>,
             Json(body): Json<Value>| async move {
                assert_eq!(headers["prefer"], "return=representation");
                assert_eq!(headers["accept"], "application/vnd.pgrst.object+json");
                assert_eq!(params["select"], "*,profile:profiles(*)");
                assert_eq!(body, json!({"post_id": "p1", "content": "lovely"}));
                (
                    StatusCode::CREATED,
                    Json(json!({"id": "c1", "content": "lovely", "profile": {"username": "ada"}})),
                )
            },
        ),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let row: Value = client
        .insert(
            "comments",
            &json!({"post_id": "p1", "content": "lovely"}),
            "*, profile:profiles(*)",
        )
        .await
        .unwrap();

    assert_eq!(row["id"], "c1");
    assert_eq!(row["profile"]["username"], "ada");
}

#[tokio::test]
async fn update_patches_filtered_rows_and_returns_them() {
    let router = Router::new().route(
        "/rest/v1/comments",
        patch(
            |headers: HeaderMap,
             QueryParams(params): QueryParams<HashMap<String, String>>,
             Json(body): Json<Value>| async move {
                assert_eq!(headers["prefer"], "return=representation");
                assert_eq!(params["id"], "eq.c1");
                assert_eq!(params["user_id"], "eq.u1");
                assert_eq!(body, json!({"content": "edited"}));
                Json(json!([{"id": "c1", "content": "edited"}]))
            },
        ),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let rows: Vec<Value> = client
        .update(
            &Query::from("comments").eq("id", "c1").eq("user_id", "u1"),
            &json!({"content": "edited"}),
        )
        .await
        .unwrap();

    assert_eq!(rows, vec![json!({"id": "c1", "content": "edited"})]);
}

#[tokio::test]
async fn delete_returns_removed_rows_so_callers_can_count_them() {
    let router = Router::new().route(
        "/rest/v1/likes",
        delete(
            |headers: HeaderMap, QueryParams(params): QueryParams<HashMap<String, String>>| async move {
                assert_eq!(headers["prefer"], "return=representation");
                assert_eq!(params["user_id"], "eq.u1");
                assert_eq!(params["post_id"], "eq.p1");
                Json(json!([{"id": "l1"}]))
            },
        ),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let rows: Vec<Value> = client
        .delete(&Query::from("likes").eq("user_id", "u1").eq("post_id", "p1"))
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn mutation_without_representation_is_a_parse_error() {
    // PostgREST answers 204 with no body when the preference is missing.
    let router = Router::new().route("/rest/v1/likes", delete(|| async { StatusCode::NO_CONTENT }));
    let client = SupabaseClient::new(serve(router).await, "anon");

    let err = client
        .delete::<Value>(&Query::from("likes").eq("id", "l1"))
        .await
        .unwrap_err();

    assert!(matches!(err, supabase_client::SupabaseError::Parse(_)));
}

// ============================================================================
// Storage requests
// ============================================================================

#[tokio::test]
async fn create_bucket_posts_id_name_and_limits() {
    let router = Router::new().route(
        "/storage/v1/bucket",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(
                body,
                json!({
                    "id": "images",
                    "name": "images",
                    "public": true,
                    "allowed_mime_types": ["image/png", "image/jpeg"],
                    "file_size_limit": 5242880
                })
            );
            Json(json!({"name": "images"}))
        }),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    client
        .create_bucket(
            "images",
            &BucketOptions {
                public: true,
                allowed_mime_types: Some(vec!["image/png".into(), "image/jpeg".into()]),
                file_size_limit: Some(5 * 1024 * 1024),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn list_posts_prefix_paging_and_sort() {
    let router = Router::new().route(
        "/storage/v1/object/list/:bucket",
        post(|Path(bucket): Path<String>, Json(body): Json<Value>| async move {
            assert_eq!(bucket, "images");
            assert_eq!(
                body,
                json!({
                    "prefix": "u1",
                    "limit": 100,
                    "offset": 0,
                    "sortBy": {"column": "name", "order": "asc"}
                })
            );
            Json(json!([{"name": "1700000000000-abc.png", "id": "o1"}]))
        }),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let files = client.list("images", "u1").await.unwrap();

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].name, "1700000000000-abc.png");
}

#[tokio::test]
async fn remove_sends_paths_as_prefixes() {
    let router = Router::new().route(
        "/storage/v1/object/:bucket",
        delete(|Path(bucket): Path<String>, Json(body): Json<Value>| async move {
            assert_eq!(bucket, "images");
            assert_eq!(body, json!({"prefixes": ["u1/test.png"]}));
            Json(json!([{"name": "u1/test.png"}]))
        }),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let removed = client
        .remove("images", &["u1/test.png".to_string()])
        .await
        .unwrap();

    assert_eq!(removed[0].name, "u1/test.png");
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn refresh_exchanges_refresh_token_and_adopts_new_access_token() {
    let router = Router::new()
        .route(
            "/auth/v1/token",
            post(
                |QueryParams(params): QueryParams<HashMap<String, String>>,
                 Json(body): Json<Value>| async move {
                    assert_eq!(params["grant_type"], "refresh_token");
                    assert_eq!(body, json!({"refresh_token": "r1"}));
                    Json(json!({
                        "access_token": "fresh-jwt",
                        "refresh_token": "r2",
                        "expires_in": 3600,
                        "token_type": "bearer",
                        "user": {"id": "5b7c1f1e-0a2b-4d3c-9e8f-1a2b3c4d5e6f"}
                    }))
                },
            ),
        )
        .route(
            "/rest/v1/posts",
            get(|headers: HeaderMap| async move {
                assert_eq!(headers["authorization"], "Bearer fresh-jwt");
                Json(json!([]))
            }),
        );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let session = client.refresh_session("r1").await.unwrap();
    let _: Vec<Value> = client.select(&Query::from("posts")).await.unwrap();

    assert_eq!(session.refresh_token, "r2");
    assert_eq!(client.access_token().as_deref(), Some("fresh-jwt"));
}

#[tokio::test]
async fn expired_access_token_is_an_auth_rejection() {
    let router = Router::new().route(
        "/auth/v1/user",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"code": 401, "error_code": "bad_jwt", "msg": "invalid JWT: token is expired"})),
            )
        }),
    );
    let client = SupabaseClient::new(serve(router).await, "anon");

    let err = client.get_user("stale").await.unwrap_err();

    assert!(err.is_auth_rejection());
    assert_eq!(err.status(), Some(401));
}
