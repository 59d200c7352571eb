//! Content routes through the full pipeline against a mocked content API.

use mockito::{Matcher, Server};
use serde_json::json;

use content_gateway::config::FilterList;

mod common;

const LICENSES: &str = r#"{
    "responseCode": "OK",
    "result": {
        "count": 2,
        "license": [
            {"name": "CC BY 4.0", "url": "https://creativecommons.org/licenses/by/4.0", "description": "Attribution"},
            {"name": "CC BY-SA 4.0", "url": "https://creativecommons.org/licenses/by-sa/4.0"}
        ]
    }
}"#;

const SEARCH_RESULT: &str = r#"{
    "responseCode": "OK",
    "result": {
        "count": 3,
        "content": [
            {"identifier": "do_1", "license": "CC BY 4.0"},
            {"identifier": "do_2"},
            {"identifier": "do_3", "license": "Proprietary"}
        ]
    }
}"#;

#[tokio::test]
async fn test_search_attaches_license_details_and_caches_catalog() {
    let mut server = Server::new_async().await;
    let catalog = server
        .mock("POST", "/search/v3/search")
        .match_body(Matcher::PartialJson(json!({"request": {"filters": {"objectType": "License"}}})))
        .with_status(200)
        .with_body(LICENSES)
        .expect(1)
        .create_async()
        .await;
    let search = server
        .mock("POST", "/search/v3/search")
        .match_body(Matcher::PartialJson(json!({"request": {"query": "fractions"}})))
        .with_status(200)
        .with_body(SEARCH_RESULT)
        .expect(2)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let body = json!({"request": {"query": "fractions"}});

    for _ in 0..2 {
        let res = common::send(
            &gw.router,
            common::json("POST", "/v1/content/search?licenseDetails=name,url", &body),
        )
        .await;
        assert_eq!(res.status, 200);
        let content = &res.body["result"]["content"];
        assert_eq!(
            content[0]["licenseDetails"],
            json!({"name": "CC BY 4.0", "url": "https://creativecommons.org/licenses/by/4.0"})
        );
        assert!(content[1].get("licenseDetails").is_none());
        assert_eq!(content[2]["licenseDetails"], json!({}));
    }

    catalog.assert_async().await;
    search.assert_async().await;
    assert_eq!(gw.cache.len(), 2);
}

#[tokio::test]
async fn test_search_without_license_param_is_not_enriched() {
    let mut server = Server::new_async().await;
    let _search = server
        .mock("POST", "/search/v3/search")
        .with_status(200)
        .with_body(SEARCH_RESULT)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(
        &gw.router,
        common::json("POST", "/v1/content/search", &json!({"request": {"query": "x"}})),
    )
    .await;

    assert_eq!(res.status, 200);
    assert!(res.body["result"]["content"][0].get("licenseDetails").is_none());
    assert!(gw.cache.is_empty());
}

#[tokio::test]
async fn test_read_enriches_single_record() {
    let mut server = Server::new_async().await;
    let _catalog = server
        .mock("POST", "/search/v3/search")
        .with_status(200)
        .with_body(LICENSES)
        .create_async()
        .await;
    let _read = server
        .mock("GET", "/content/v3/read/do_1")
        .match_query(Matcher::UrlEncoded("fields".into(), "name,license".into()))
        .with_status(200)
        .with_body(r#"{"responseCode":"OK","result":{"content":{"identifier":"do_1","license":"CC BY-SA 4.0"}}}"#)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(
        &gw.router,
        common::get("/v1/content/read/do_1?fields=name,license&licenseDetails=url"),
    )
    .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "api.content.read");
    assert_eq!(
        res.body["result"]["content"]["licenseDetails"],
        json!({"url": "https://creativecommons.org/licenses/by-sa/4.0"})
    );
}

#[tokio::test]
async fn test_catalog_outage_returns_content_unenriched() {
    let mut server = Server::new_async().await;
    let _catalog = server
        .mock("POST", "/search/v3/search")
        .match_body(Matcher::PartialJson(json!({"request": {"filters": {"objectType": "License"}}})))
        .with_status(503)
        .with_body(r#"{"responseCode":"SERVER_ERROR","params":{"err":"ERR_DOWN"}}"#)
        .create_async()
        .await;
    let _search = server
        .mock("POST", "/search/v3/search")
        .match_body(Matcher::PartialJson(json!({"request": {"query": "fractions"}})))
        .with_status(200)
        .with_body(SEARCH_RESULT)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(
        &gw.router,
        common::json(
            "POST",
            "/v1/content/search?licenseDetails=name",
            &json!({"request": {"query": "fractions"}}),
        ),
    )
    .await;

    assert_eq!(res.status, 200);
    let content = &res.body["result"]["content"];
    assert_eq!(content[0], json!({"identifier": "do_1", "license": "CC BY 4.0"}));
}

#[tokio::test]
async fn test_search_applies_configured_filter_defaults() {
    let mut server = Server::new_async().await;
    let search = server
        .mock("POST", "/search/v3/search")
        .match_body(Matcher::PartialJson(json!({
            "request": {
                "filters": {
                    "channel": ["in.ekstep"],
                    "mimeType": {"ne": ["video/x-youtube"]},
                    "contentType": ["Story"]
                }
            }
        })))
        .with_status(200)
        .with_body(SEARCH_RESULT)
        .create_async()
        .await;

    let mut config = common::config_for(&server.url());
    config.filters.channel = FilterList {
        whitelist: vec!["in.ekstep".into()],
        blacklist: vec![],
    };
    config.filters.mime_type = FilterList {
        whitelist: vec![],
        blacklist: vec!["video/x-youtube".into()],
    };
    config.filters.content_type = FilterList {
        whitelist: vec!["Resource".into()],
        blacklist: vec![],
    };
    let gw = common::gateway(config).await;

    let res = common::send(
        &gw.router,
        common::json(
            "POST",
            "/v1/content/search",
            &json!({"request": {"filters": {"contentType": ["Story"]}}}),
        ),
    )
    .await;

    assert_eq!(res.status, 200);
    search.assert_async().await;
}

#[tokio::test]
async fn test_search_without_request_object_is_rejected() {
    let gw = common::gateway(common::config_for(common::UNUSED_BACKEND)).await;
    let res = common::send(
        &gw.router,
        common::json("POST", "/v1/content/search", &json!({"params": {"msgid": "m-9"}})),
    )
    .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["responseCode"], "CLIENT_ERROR");
    assert_eq!(res.body["params"]["err"], "ERR_CONTENT_SEARCH_FIELDS_MISSING");
    assert_eq!(res.body["params"]["msgid"], "m-9");
    assert_eq!(res.headers["msgid"], "m-9");
}

#[tokio::test]
async fn test_upstream_not_found_is_relayed() {
    let mut server = Server::new_async().await;
    let _read = server
        .mock("GET", "/content/v3/read/do_gone")
        .with_status(404)
        .with_body(r#"{"responseCode":"RESOURCE_NOT_FOUND","params":{"err":"NOT_FOUND","errmsg":"Content not found"}}"#)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(&gw.router, common::get("/v1/content/read/do_gone")).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["responseCode"], "RESOURCE_NOT_FOUND");
    assert_eq!(res.body["params"]["err"], "NOT_FOUND");
    assert_eq!(res.body["params"]["errmsg"], "Content not found");
}

#[tokio::test]
async fn test_create_requires_mandatory_fields() {
    let gw = common::gateway(common::config_for(common::UNUSED_BACKEND)).await;
    let res = common::send(
        &gw.router,
        common::json(
            "POST",
            "/v1/content/create",
            &json!({"request": {"content": {"name": "Fractions", "mimeType": "application/pdf"}}}),
        ),
    )
    .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["params"]["err"], "ERR_CONTENT_CREATE_FIELDS_MISSING");
}

#[tokio::test]
async fn test_create_forwards_to_content_api() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/content/v3/create")
        .match_header("msgid", "m-create")
        .with_status(200)
        .with_body(r#"{"responseCode":"OK","result":{"node_id":"do_42","versionKey":"1"}}"#)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(
        &gw.router,
        common::json(
            "POST",
            "/v1/content/create",
            &json!({
                "params": {"msgid": "m-create"},
                "request": {"content": {"name": "Fractions", "mimeType": "application/pdf", "contentType": "Resource"}}
            }),
        ),
    )
    .await;

    create.assert_async().await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "api.content.create");
    assert_eq!(res.body["result"]["node_id"], "do_42");
}

#[tokio::test]
async fn test_health_reports_store_state() {
    let gw = common::gateway(common::config_for(common::UNUSED_BACKEND)).await;
    let res = common::send(&gw.router, common::get("/health")).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "api.health");
    assert_eq!(res.body["result"]["healthy"], true);
    assert!(res.headers.contains_key("msgid"));
}

#[tokio::test]
async fn test_encoded_traversal_id_never_reaches_upstream() {
    let mut server = Server::new_async().await;
    let other_endpoint = server
        .mock("GET", "/search/v3/search")
        .with_status(200)
        .with_body(r#"{"responseCode":"OK","result":{"reached":true}}"#)
        .expect(0)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(
        &gw.router,
        common::get("/v1/content/read/..%2F..%2F..%2Fsearch%2Fv3%2Fsearch"),
    )
    .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["params"]["err"], "ERR_INVALID_CONTENT_ID");
    other_endpoint.assert_async().await;
}

#[tokio::test]
async fn test_read_fields_cannot_add_upstream_parameters() {
    let mut server = Server::new_async().await;
    let read = server
        .mock("GET", "/content/v3/read/do_1")
        .match_query(Matcher::Exact("fields=name%26mode%3Dedit".into()))
        .with_status(200)
        .with_body(r#"{"responseCode":"OK","result":{"content":{"identifier":"do_1"}}}"#)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(&gw.router, common::get("/v1/content/read/do_1?fields=name%26mode%3Dedit")).await;

    assert_eq!(res.status, 200);
    read.assert_async().await;
}

#[tokio::test]
async fn test_update_requires_content_object() {
    let gw = common::gateway(common::config_for(common::UNUSED_BACKEND)).await;
    let res = common::send(
        &gw.router,
        common::json("PATCH", "/v1/content/update/do_1", &json!({"request": {}})),
    )
    .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["params"]["err"], "ERR_CONTENT_UPDATE_FIELDS_MISSING");
}

#[tokio::test]
async fn test_update_forwards_to_content_api() {
    let mut server = Server::new_async().await;
    let update = server
        .mock("PATCH", "/content/v3/update/do_1")
        .match_body(Matcher::PartialJson(json!({"request": {"content": {"name": "Decimals"}}})))
        .with_status(200)
        .with_body(r#"{"responseCode":"OK","result":{"node_id":"do_1","versionKey":"2"}}"#)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(
        &gw.router,
        common::json(
            "PATCH",
            "/v1/content/update/do_1",
            &json!({"request": {"content": {"name": "Decimals", "versionKey": "1"}}}),
        ),
    )
    .await;

    update.assert_async().await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "api.content.update");
    assert_eq!(res.body["result"]["versionKey"], "2");
}

#[tokio::test]
async fn test_publish_requires_last_published_by() {
    let gw = common::gateway(common::config_for(common::UNUSED_BACKEND)).await;
    let res = common::send(
        &gw.router,
        common::json(
            "POST",
            "/v1/content/publish/do_1",
            &json!({"request": {"content": {"publishChecklist": ["ok"]}}}),
        ),
    )
    .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["params"]["err"], "ERR_CONTENT_PUBLISH_FIELDS_MISSING");
}

#[tokio::test]
async fn test_publish_forwards_to_content_api() {
    let mut server = Server::new_async().await;
    let publish = server
        .mock("POST", "/content/v3/publish/do_1")
        .match_body(Matcher::PartialJson(json!({"request": {"content": {"lastPublishedBy": "user-7"}}})))
        .with_status(200)
        .with_body(r#"{"responseCode":"OK","result":{"node_id":"do_1","publishStatus":"Publish Operation for Content Id 'do_1' Started Successfully!"}}"#)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(
        &gw.router,
        common::json(
            "POST",
            "/v1/content/publish/do_1",
            &json!({"request": {"content": {"lastPublishedBy": "user-7"}}}),
        ),
    )
    .await;

    publish.assert_async().await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "api.content.publish");
    assert_eq!(res.body["result"]["node_id"], "do_1");
}

#[tokio::test]
async fn test_retire_forwards_to_content_api() {
    let mut server = Server::new_async().await;
    let retire = server
        .mock("DELETE", "/content/v3/retire/do_1")
        .match_header("msgid", "m-retire")
        .with_status(200)
        .with_body(r#"{"responseCode":"OK","result":{"node_id":"do_1"}}"#)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let mut req = common::delete("/v1/content/retire/do_1");
    req.headers_mut().insert("msgid", "m-retire".parse().unwrap());
    let res = common::send(&gw.router, req).await;

    retire.assert_async().await;
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "api.content.retire");
    assert_eq!(res.body["result"]["node_id"], "do_1");
}

#[tokio::test]
async fn test_retire_relays_upstream_failure() {
    let mut server = Server::new_async().await;
    let _retire = server
        .mock("DELETE", "/content/v3/retire/do_live")
        .with_status(400)
        .with_body(r#"{"responseCode":"CLIENT_ERROR","params":{"err":"ERR_CONTENT_RETIRE","errmsg":"Content is already retired"}}"#)
        .create_async()
        .await;

    let gw = common::gateway(common::config_for(&server.url())).await;
    let res = common::send(&gw.router, common::delete("/v1/content/retire/do_live")).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["params"]["err"], "ERR_CONTENT_RETIRE");
}

#[tokio::test]
async fn test_oversized_body_is_rejected_with_413() {
    let mut config = common::config_for(common::UNUSED_BACKEND);
    config.listener.max_body_bytes = 16;
    let gw = common::gateway(config).await;

    let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![Ok(vec![b' '; 25]), Ok(vec![b' '; 25])];
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/content/create")
        .body(axum::body::Body::from_stream(futures_util::stream::iter(chunks)))
        .unwrap();
    let res = common::send(&gw.router, req).await;

    assert_eq!(res.status, 413);
    assert_eq!(res.body["params"]["err"], "ERR_PAYLOAD_TOO_LARGE");
}
