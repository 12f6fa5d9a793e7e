mod common;

use datagouv_api::TabularClient;
use datagouv_api::models::{FilterOperator, RowQuery, SortDirection};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn rows_are_queried_with_filters_and_sort() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tabular/api/resources/r1/data/"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "5"))
        .and(query_param("dep__exact", "29"))
        .and(query_param("population__sort", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"__id": 6, "commune": "Brest", "dep": "29", "population": 139000},
                {"__id": 7, "commune": "Quimper", "dep": "29", "population": 63000}
            ],
            "meta": {"page": 2, "page_size": 5, "total": 7},
            "links": {
                "next": null,
                "prev": "https://tabular-api.data.gouv.fr/api/resources/r1/data/?page=1&page_size=5",
                "profile": "https://tabular-api.data.gouv.fr/api/resources/r1/profile/"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tabular = TabularClient::new(common::stub_config(&server));
    let query = RowQuery::new(2, 5)
        .with_filter("dep", FilterOperator::Exact, Some("29".to_string()))
        .with_sort("population", SortDirection::Desc);

    let page = tabular.query_resource_rows("r1", &query, None).await.unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.meta.total, Some(7));
    assert!(page.links.next.is_none());
    assert!(page.links.prev.is_some());
    assert_eq!(page.columns(), vec!["__id", "commune", "dep", "population"]);
    assert_eq!(page.data[0]["commune"], "Brest");
}

#[tokio::test]
async fn ineligible_resource_reports_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tabular/api/resources/r-pdf/data/"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"errors": [], "message": "Resource not found"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let tabular = TabularClient::new(common::stub_config(&server));
    let err = tabular
        .query_resource_rows("r-pdf", &RowQuery::default(), None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "upstream returned 404: Resource not found");
}

#[tokio::test]
async fn profile_exposes_header_and_columns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tabular/api/resources/r1/profile/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profile": {
                "header": ["commune", "population"],
                "columns": {
                    "commune": {"python_type": "string", "format": "string"},
                    "population": {"python_type": "int", "format": "int"}
                }
            },
            "deleted_at": null
        })))
        .mount(&server)
        .await;

    let tabular = TabularClient::new(common::stub_config(&server));
    let profile = tabular.get_resource_profile("r1", None).await.unwrap();

    assert_eq!(profile.header, vec!["commune", "population"]);
    assert_eq!(profile.columns["population"]["python_type"], "int");
}
