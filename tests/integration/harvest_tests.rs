//! End-to-end harvest tests
//!
//! These tests use wiremock to stand in for the travel-data provider, the
//! embedding API and the vector index, and run the full pipeline against a
//! checkpoint and output directories in a temporary folder.

use attraction_harvester::cache::{CityTask, WorkCache};
use attraction_harvester::config::{load_config, Config};
use attraction_harvester::pipeline::{Pipeline, PipelineSettings};
use attraction_harvester::sink::{FailureLog, LocalBlobStore, OpenAiEmbedder, PineconeIndex};
use attraction_harvester::{RetryPolicy, Scraper};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes templates, headers, checkpoint and config into `dir`
fn write_workspace(dir: &Path, provider: &MockServer, sinks: &MockServer, cities: &[CityTask]) -> Config {
    let write_json = |name: &str, value: Value| {
        std::fs::write(dir.join(name), serde_json::to_string_pretty(&value).unwrap()).unwrap();
    };

    write_json(
        "city_lookup.json",
        json!([{"variables": {"request": {"query": "", "limit": 10}}}]),
    );
    write_json(
        "attraction_listing.json",
        json!([{"variables": {
            "request": {"routeParameters": {"geoId": 0, "pagee": "0"}},
            "route": {"page": "Attractions", "params": {"geoId": 0, "pagee": "0"}}
        }}]),
    );
    write_json(
        "attraction_detail.json",
        json!([{"variables": {"request": {"routeParameters": {"contentId": 0}}}}]),
    );
    write_json("headers.json", json!({"x-test-client": "harvester"}));
    write_json("cities.json", serde_json::to_value(cities).unwrap());

    let config = format!(
        r#"
[provider]
api-url = "{provider}/data/graphql/ids"
city-lookup-template = "{dir}/city_lookup.json"
listing-template = "{dir}/attraction_listing.json"
detail-template = "{dir}/attraction_detail.json"
headers-file = "{dir}/headers.json"
max-concurrent-requests = 4

[harvest]
cities-per-run = 2

[cache]
path = "{dir}/cities.json"

[output]
backup-dir = "{dir}"
error-log-dir = "{dir}/error_log"

[embedding]
api-url = "{sinks}/v1/embeddings"
model = "text-embedding-ada-002"

[vector-index]
api-url = "{sinks}"
"#,
        provider = provider.uri(),
        sinks = sinks.uri(),
        dir = dir.display()
    );
    std::fs::write(dir.join("harvester.toml"), config).unwrap();
    load_config(&dir.join("harvester.toml")).unwrap()
}

fn build_pipeline(config: &Config) -> Pipeline {
    let cache = WorkCache::open(
        Path::new(&config.cache.path),
        config.harvest.cities_per_run as usize,
    )
    .unwrap();
    let scraper = Scraper::from_config(config).unwrap();
    let embedder = OpenAiEmbedder::new(&config.embedding.api_url, "embed-key", &config.embedding.model)
        .unwrap()
        .with_retry(RetryPolicy::new(1, Duration::ZERO));
    let index = PineconeIndex::new(&config.vector_index.api_url, "index-key")
        .unwrap()
        .with_retry(RetryPolicy::new(1, Duration::ZERO));

    Pipeline::new(
        cache,
        scraper,
        Box::new(embedder),
        Box::new(LocalBlobStore::new(&config.output.backup_dir)),
        Box::new(index),
        FailureLog::new(&config.output.error_log_dir),
    )
    .with_settings(PipelineSettings {
        embedding_batch_size: config.embedding.batch_size,
        upsert_batch_size: config.vector_index.batch_size,
        overwrite_backups: config.output.overwrite_backups,
    })
}

fn wrap(text: &str) -> String {
    STANDARD.encode(format!("<br>{}<br>", text))
}

fn lookup_response(candidates: Vec<Value>) -> Value {
    json!([{"data": {"Typeahead_autocomplete": {"results": candidates}}}])
}

fn location(id: i64, lat: f64, lng: f64) -> Value {
    json!({
        "__typename": "Typeahead_LocationItem",
        "locationId": id,
        "details": {"latitude": lat, "longitude": lng}
    })
}

fn card(id: i64, name: &str) -> Value {
    json!({
        "__typename": "WebPresentation_SingleFlexCardSection",
        "singleFlexCardContent": {"saveId": {"id": id}, "cardTitle": {"text": name}}
    })
}

fn detail_payload(kind: &str, description: Option<&str>) -> Value {
    let json_ld = json!({"@type": kind, "aggregateRating": {"ratingValue": 4.5, "reviewCount": 80}});
    let about = match description {
        Some(text) => json!({
            "__typename": "WebPresentation_AttractionAboutSectionGroup",
            "about": {"primary": {"about": wrap(text)}}
        }),
        None => json!({"__typename": "WebPresentation_AttractionAboutSectionGroup"}),
    };
    json!([{"data": {"Result": [{
        "container": {"jsonLd": json_ld.to_string()},
        "detailSectionGroups": [
            {"detailSections": [{"tags": {"text": "Historic Sites • Monuments"}}]},
            {"about": {"primary": {"content": []}}},
            about
        ]
    }]}}])
}

async fn mount_provider(provider: &MockServer) {
    // A far candidate first, then the real match
    Mock::given(method("POST"))
        .and(path("/data/graphql/ids"))
        .and(header("x-test-client", "harvester"))
        .and(body_string_contains(r#""query":"Springfield, United States""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(lookup_response(vec![
            location(9999, 37.21, -93.29),
            location(1001, 39.78, -89.65),
        ])))
        .expect(1)
        .mount(provider)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains(r#""query":"Atlantis, Nowhere""#))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(lookup_response(vec![location(7, 10.0, 10.0)])),
        )
        .expect(1)
        .mount(provider)
        .await;

    // Index discovery and page 0 of the id phase
    Mock::given(method("POST"))
        .and(body_string_contains(r#""geoId":1001"#))
        .and(body_string_contains(r#""pagee":"0""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"data": {"Result": [{"sections": [
            card(501, "Lincoln Home"),
            card(502, "Old State Capitol"),
            card(503, "Unnamed Plaque"),
            {"__typename": "WebPresentation_PaginationLinksList", "totalResults": 3}
        ]}]}}])))
        .expect(2)
        .mount(provider)
        .await;

    for (id, payload) in [
        (501, detail_payload("LandmarksOrHistoricalBuildings", Some("Home of a president."))),
        (502, detail_payload("GovernmentBuilding", Some("Former capitol."))),
        (503, detail_payload("Monument", None)),
    ] {
        Mock::given(method("POST"))
            .and(body_string_contains(format!(r#""contentId":{}"#, id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(payload))
            .expect(1)
            .mount(provider)
            .await;
    }
}

async fn mount_sinks(sinks: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/embeddings"))
        .and(header("authorization", "Bearer embed-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
            {"index": 0, "embedding": [0.1, 0.2]},
            {"index": 1, "embedding": [0.3, 0.4]}
        ]})))
        .expect(1)
        .mount(sinks)
        .await;

    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .and(header("api-key", "index-key"))
        .and(body_partial_json(json!({"namespace": "springfield-il"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 2})))
        .expect(1)
        .mount(sinks)
        .await;
}

fn cities() -> Vec<CityTask> {
    vec![
        CityTask::new("Springfield", Some("Illinois".into()), "United States", 39.80, -89.64, "springfield-il"),
        CityTask::new("Atlantis", None, "Nowhere", 0.0, 0.0, "atlantis"),
        CityTask::new("Lyon", None, "France", 45.76, 4.83, "lyon-fr"),
    ]
}

fn read_checkpoint(config: &Config) -> Vec<CityTask> {
    serde_json::from_str(&std::fs::read_to_string(&config.cache.path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_two_city_run() {
    let provider = MockServer::start().await;
    let sinks = MockServer::start().await;
    mount_provider(&provider).await;
    mount_sinks(&sinks).await;

    let dir = TempDir::new().unwrap();
    let config = write_workspace(dir.path(), &provider, &sinks, &cities());
    let mut pipeline = build_pipeline(&config);

    let summary = pipeline.run().await.unwrap();

    // Springfield succeeded with one attraction dropped for lacking a description
    assert!(!summary.cache_complete);
    assert_eq!(summary.succeeded.len(), 1);
    let report = &summary.succeeded[0];
    assert_eq!(report.namespace, "springfield-il");
    assert_eq!(report.discovered, 3);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.parsed, 2);
    assert_eq!(summary.failed, vec!["atlantis".to_string()]);

    // Checkpoint: limit of two, third city untouched
    let tasks = read_checkpoint(&config);
    assert!(tasks[0].processed && tasks[0].success);
    assert!(tasks[1].processed && !tasks[1].success);
    assert!(!tasks[2].processed);
    let counts = pipeline.summary().await;
    assert_eq!((counts.succeeded, counts.failed, counts.pending), (1, 1, 1));

    // Backup holds the vector entries in discovery order
    let backup: Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("backups/springfield-il.json")).unwrap(),
    )
    .unwrap();
    let entries = backup.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["metadata"]["name"], "Lincoln Home");
    assert_eq!(entries[0]["metadata"]["description"], "Home of a president.");
    assert_eq!(entries[0]["metadata"]["state"], "Illinois");
    assert_eq!(entries[0]["metadata"]["activity_duration"], 45);
    assert_eq!(entries[0]["metadata"]["tags"], json!(["Historic Sites", "Monuments"]));
    assert_eq!(entries[0]["metadata"]["id"], entries[0]["id"]);
    assert_eq!(entries[1]["metadata"]["name"], "Old State Capitol");
    let values: Vec<f64> = entries[1]["values"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert_eq!(values.len(), 2);
    assert!((values[0] - 0.3).abs() < 1e-6 && (values[1] - 0.4).abs() < 1e-6);

    // Atlantis failed before any listing call and left a trace
    let trace = std::fs::read_to_string(dir.path().join("error_log/atlantis.txt")).unwrap();
    assert!(trace.contains("city: Atlantis, Nowhere (atlantis)"));
    assert!(trace.contains("No provider location within range of Atlantis, Nowhere"));
    assert_eq!(provider.received_requests().await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_complete_cache_makes_no_requests() {
    let provider = MockServer::start().await;
    let sinks = MockServer::start().await;

    let mut done = cities();
    for task in &mut done {
        task.processed = true;
    }
    done[1].success = true;

    let dir = TempDir::new().unwrap();
    let config = write_workspace(dir.path(), &provider, &sinks, &done);
    let mut pipeline = build_pipeline(&config);

    let summary = pipeline.run().await.unwrap();
    assert!(summary.cache_complete);
    assert!(summary.succeeded.is_empty());
    assert!(provider.received_requests().await.unwrap().is_empty());
    assert_eq!(read_checkpoint(&config), done);
}

#[tokio::test]
async fn test_listing_failure_fails_city() {
    let provider = MockServer::start().await;
    let sinks = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains(r#""query":"Lyon, France""#))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(lookup_response(vec![location(187265, 45.75, 4.85)])),
        )
        .mount(&provider)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains(r#""geoId":187265"#))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&provider)
        .await;

    let dir = TempDir::new().unwrap();
    let lyon = vec![CityTask::new("Lyon", None, "France", 45.76, 4.83, "lyon-fr")];
    let config = write_workspace(dir.path(), &provider, &sinks, &lyon);
    let mut pipeline = build_pipeline(&config);

    let summary = pipeline.run().await.unwrap();
    assert_eq!(summary.failed, vec!["lyon-fr".to_string()]);

    let tasks = read_checkpoint(&config);
    assert!(tasks[0].processed && !tasks[0].success);
    assert!(dir.path().join("error_log/lyon-fr.txt").exists());
    assert!(!dir.path().join("backups/lyon-fr.json").exists());
    assert!(sinks.received_requests().await.unwrap().is_empty());
}
