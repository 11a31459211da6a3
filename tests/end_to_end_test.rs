// 環境変数からの設定読み込みからJSON出力までをモックサーバー相手に通すテスト。
use recycler_finder::classification::{MaterialCategory, Taxonomies};
use recycler_finder::config::Config;
use recycler_finder::pipeline::{FinderPipeline, JsonExporter, LocationOutcome};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, output_dir: &str) -> Config {
    let base_url = format!("{}/", server.uri());
    temp_env::with_vars(
        [
            ("PLACES_API_KEY", Some("e2e-key")),
            ("PLACES_API_BASE_URL", Some(base_url.as_str())),
            ("SEARCH_KEYWORD", Some("recycling")),
            ("SEARCH_PLACE_TYPE", None),
            ("SEARCH_RADIUS_METERS", Some("3000")),
            ("SEARCH_MAX_PAGES", Some("1")),
            ("SEARCH_PAGE_TOKEN_DELAY_MS", Some("0")),
            ("WEBSITE_SCAN_ENABLED", Some("true")),
            ("WEBSITE_FETCH_DELAY_MS", Some("0")),
            ("WEBSITE_FETCH_TIMEOUT_MS", Some("5000")),
            ("OUTPUT_DIR", Some(output_dir)),
            ("TAXONOMY_PATH", None),
        ],
        Config::from_env,
    )
    .expect("config should load")
}

async fn mount_places(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("address", "Sheffield, UK"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [{"geometry": {"location": {"lat": 53.38, "lng": -1.47}}}]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/api/geocode/json"))
        .and(query_param("address", "Nowhere, UK"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ZERO_RESULTS",
            "results": []
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .and(query_param("radius", "3000"))
        .and(query_param("keyword", "recycling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [
                {
                    "place_id": "sheff-1",
                    "name": "Steel City Scrap Metal",
                    "geometry": {"location": {"lat": 53.39, "lng": -1.46}},
                    "rating": 4.6,
                    "vicinity": "Attercliffe"
                },
                {
                    "place_id": "sheff-1",
                    "name": "Steel City Scrap Metal",
                    "geometry": {"location": {"lat": 53.39, "lng": -1.46}}
                }
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/details/json"))
        .and(query_param("place_id", "sheff-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "result": {
                "formatted_address": "1 Effingham Rd, Sheffield S4 7YR, UK",
                "formatted_phone_number": "0114 000 0000",
                "website": format!("{}/steel-city", server.uri()),
                "opening_hours": {"weekday_text": ["Monday: 7:30 AM – 4:30 PM"]},
                "address_components": [
                    {"long_name": "Sheffield", "short_name": "Sheffield", "types": ["postal_town"]},
                    {"long_name": "S4 7YR", "short_name": "S4 7YR", "types": ["postal_code"]}
                ]
            }
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/steel-city"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><h1>Copper &amp; brass</h1><p>Car batteries accepted</p></body></html>",
            "text/html",
        ))
        .mount(server)
        .await;
}

#[tokio::test]
async fn run_from_config_exports_enriched_records() {
    let server = MockServer::start().await;
    mount_places(&server).await;
    let dir = tempfile::tempdir().expect("temp dir");
    let output_dir = dir.path().join("recyclers");
    let config = config_for(&server, output_dir.to_str().expect("utf-8 path"));

    let pipeline =
        FinderPipeline::from_config(&config, Taxonomies::builtin()).expect("pipeline builds");
    let locations = vec!["Sheffield, UK".to_string(), "Nowhere, UK".to_string()];
    let summary = pipeline.run(&locations).await;

    assert_eq!(
        summary.locations[0].outcome,
        LocationOutcome::Searched { found: 2, added: 1 }
    );
    assert_eq!(summary.locations[1].outcome, LocationOutcome::NotFound);
    assert_eq!(summary.records.len(), 1);

    let record = &summary.records[0];
    assert_eq!(record.address.as_deref(), Some("1 Effingham Rd, Sheffield S4 7YR, UK"));
    assert_eq!(record.rating, Some(4.6));
    assert_eq!(record.address_components["postal_code"], "S4 7YR");
    assert_eq!(record.content_materials()[&MaterialCategory::Metal], vec!["copper"]);
    assert_eq!(
        record.content_materials()[&MaterialCategory::Batteries],
        vec!["batteries"]
    );
    assert!(record.materials().contains(&MaterialCategory::Metal));

    let timestamp = chrono::NaiveDate::from_ymd_opt(2024, 12, 31)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .expect("timestamp");
    let path = JsonExporter::new(config.output_dir().clone())
        .export(&summary.records, &locations, timestamp)
        .await
        .expect("export");

    assert_eq!(
        path.file_name().and_then(|name| name.to_str()),
        Some("sheffield_uk_plus_1_20241231_235959.json")
    );
    let exported: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(exported[0]["place_id"], "sheff-1");
    assert_eq!(exported[0]["phone"], "0114 000 0000");
    assert_eq!(exported[0]["website_materials"]["metal"], serde_json::json!(["copper"]));
}
