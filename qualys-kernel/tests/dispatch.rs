use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use qualys_adapters::{
    JSON_CONTENT_TYPE, Transport, TransportError, TransportResult, WireRequest, WireResponse,
};
use qualys_config::{DaysBoundary, QualysConfig};
use qualys_kernel::{
    CONNECTION_REFUSED_MESSAGE, Dispatcher, MIN_REQUEST_INTERVAL, MISSING_CREDENTIALS_MESSAGE,
    RateLimiter, TAG_SEARCH_PATH,
};
use qualys_tools::OperationDefinition;
use serde_json::{Value, json};
use tokio::time::Instant;

struct RecordingTransport {
    calls: AtomicUsize,
    requests: Mutex<Vec<(Instant, WireRequest)>>,
    reply: TransportResult<WireResponse>,
}

impl RecordingTransport {
    fn replying(reply: TransportResult<WireResponse>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            reply,
        })
    }

    fn ok(body: &'static str) -> Arc<Self> {
        Self::replying(Ok(WireResponse::new(200, Some("text/xml".into()), body)))
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_request(&self) -> WireRequest {
        self.requests.lock().unwrap().last().unwrap().1.clone()
    }

    fn started_at(&self) -> Vec<Instant> {
        self.requests.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: WireRequest) -> TransportResult<WireResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((Instant::now(), request));
        self.reply.clone()
    }
}

fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

fn credentials() -> QualysConfig {
    QualysConfig::new().with_credentials("analyst", "secret")
}

fn dispatcher(config: QualysConfig, transport: &Arc<RecordingTransport>) -> Dispatcher {
    Dispatcher::new(config, Arc::clone(transport) as Arc<dyn Transport>)
        .unwrap()
        .with_rate_limiter(RateLimiter::new(Duration::ZERO))
        .with_today(fixed_today)
}

fn parsed(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn missing_credentials_short_circuit_every_operation() {
    let transport = RecordingTransport::ok("<OK/>");
    let dispatcher = dispatcher(QualysConfig::new(), &transport);

    for name in ["list_hosts", "launch_scan", "list_tags", "no_such_tool"] {
        let output = dispatcher.dispatch(name, &json!({})).await;
        assert!(output.is_error());
        assert_eq!(output.text(), format!("Error: {MISSING_CREDENTIALS_MESSAGE}"));
    }
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn launch_scan_without_title_or_target_is_rejected_locally() {
    let transport = RecordingTransport::ok("<OK/>");
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher.dispatch("launch_scan", &json!({})).await;
    assert_eq!(output.text(), "Error: Unknown error: scan_title is required");

    let output = dispatcher
        .dispatch("launch_scan", &json!({ "scan_title": "weekly" }))
        .await;
    assert_eq!(
        output.text(),
        "Error: Unknown error: at least one of ip, asset_group_ids, asset_groups, fqdn is required"
    );
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn unknown_operation_is_reported() {
    let transport = RecordingTransport::ok("<OK/>");
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher.dispatch("list_everything", &json!({})).await;
    assert_eq!(output.text(), "Error: Unknown tool: list_everything");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn detection_listing_wire_body() {
    let transport = RecordingTransport::ok("<HOST_LIST_VM_DETECTION_OUTPUT/>");
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher
        .dispatch(
            "list_host_detections",
            &json!({ "ips": "10.0.0.1,10.0.0.2", "severities": "4,5", "truncation_limit": 100 }),
        )
        .await;
    assert!(!output.is_error(), "{}", output.text());

    let request = transport.last_request();
    assert_eq!(request.path(), "/api/2.0/fo/asset/host/vm/detection/");
    assert_eq!(
        request.body(),
        "action=list&ips=10.0.0.1%2C10.0.0.2&severities=4%2C5&truncation_limit=100&show_igs=0&show_epss=0"
    );
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn xml_results_are_normalized() {
    let transport = RecordingTransport::ok(
        r#"<SCAN_LIST_OUTPUT><RESPONSE><SCAN_LIST><SCAN><REF>scan/1</REF><STATE>Finished</STATE></SCAN></SCAN_LIST></RESPONSE></SCAN_LIST_OUTPUT>"#,
    );
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher.dispatch("list_scans", &json!({ "state": "Finished" })).await;
    let value = parsed(output.text());
    assert_eq!(
        value["SCAN_LIST_OUTPUT"]["RESPONSE"]["SCAN_LIST"]["SCAN"]["REF"],
        "scan/1"
    );
    assert_eq!(transport.last_request().body(), "action=list&state=Finished");
}

#[tokio::test]
async fn malformed_xml_falls_back_to_raw() {
    let transport = RecordingTransport::ok("<unterminated");
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher.dispatch("list_asset_groups", &Value::Null).await;
    assert!(!output.is_error());
    assert_eq!(parsed(output.text()), json!({ "raw": "<unterminated" }));
}

#[tokio::test]
async fn upstream_status_is_rendered_with_body() {
    let transport = RecordingTransport::replying(Err(TransportError::Status {
        status: 401,
        reason: "Unauthorized".into(),
        body: "<SIMPLE_RETURN>Bad Login/Password</SIMPLE_RETURN>".into(),
    }));
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher.dispatch("list_scans", &json!({})).await;
    assert_eq!(
        output.text(),
        "Error: Qualys API error: 401 Unauthorized - <SIMPLE_RETURN>Bad Login/Password</SIMPLE_RETURN>"
    );
}

#[tokio::test]
async fn refused_connection_uses_fixed_text() {
    let transport = RecordingTransport::replying(Err(TransportError::ConnectionRefused {
        endpoint: "https://qualysapi.qualys.com".into(),
    }));
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher.dispatch("list_scans", &json!({})).await;
    assert_eq!(output.text(), format!("Error: {CONNECTION_REFUSED_MESSAGE}"));
}

#[tokio::test]
async fn report_download_reports_metadata_only() {
    let transport = RecordingTransport::replying(Ok(WireResponse::new(
        200,
        Some("application/pdf".into()),
        vec![0x25_u8; 1024],
    )));
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher.dispatch("download_report", &json!({ "id": 42 })).await;
    let value = parsed(output.text());
    assert_eq!(value["report_id"], "42");
    assert_eq!(value["content_type"], "application/pdf");
    assert_eq!(value["size_bytes"], 1024);
    assert_eq!(transport.last_request().body(), "action=fetch&id=42");
}

#[tokio::test]
async fn tag_search_posts_and_reads_json() {
    let transport = RecordingTransport::replying(Ok(WireResponse::new(
        200,
        Some(JSON_CONTENT_TYPE.into()),
        r#"{"ServiceResponse":{"responseCode":"SUCCESS","count":1}}"#,
    )));
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher.dispatch("list_tags", &json!({ "name": "prod" })).await;
    assert_eq!(
        parsed(output.text()),
        json!({ "ServiceResponse": { "responseCode": "SUCCESS", "count": 1 } })
    );

    let request = transport.last_request();
    assert_eq!(request.path(), TAG_SEARCH_PATH);
    assert_eq!(request.content_type(), JSON_CONTENT_TYPE);
    assert_eq!(
        parsed(request.body())["ServiceRequest"]["filters"]["Criteria"][0]["value"],
        "prod"
    );
}

#[tokio::test]
async fn tag_search_rejects_unusable_limits() {
    let transport = RecordingTransport::ok("{}");
    let dispatcher = dispatcher(credentials(), &transport);

    for limit in [json!(5.5), json!(-3)] {
        let output = dispatcher.dispatch("list_tags", &json!({ "limit": limit })).await;
        assert!(output.is_error());
        assert!(output.text().starts_with("Error: Unknown error: "), "{}", output.text());
        assert!(output.text().contains("limit"), "{}", output.text());
    }
    assert_eq!(transport.calls(), 0);

    let output = dispatcher.dispatch("list_tags", &json!({ "limit": "25" })).await;
    assert!(!output.is_error(), "{}", output.text());
    assert_eq!(
        parsed(transport.last_request().body())["ServiceRequest"]["preferences"]["limitResults"],
        25
    );
}

#[tokio::test]
async fn whole_float_arguments_are_sent_as_integers() {
    let transport = RecordingTransport::ok("<HOST_LIST_VM_DETECTION_OUTPUT/>");
    let dispatcher = dispatcher(credentials(), &transport);

    for limit in [json!("1e2"), json!(100.0)] {
        let output = dispatcher
            .dispatch("list_host_detections", &json!({ "truncation_limit": limit }))
            .await;
        assert!(!output.is_error(), "{}", output.text());
        assert_eq!(
            transport.last_request().body(),
            "action=list&truncation_limit=100&show_igs=0&show_epss=0"
        );
    }
}

#[tokio::test]
async fn scan_results_go_through_the_normalizer() {
    let body = r#"[{"qid": 38170}]"#;
    let transport = RecordingTransport::replying(Ok(WireResponse::new(
        200,
        Some("application/json".into()),
        body,
    )));
    let dispatcher = dispatcher(credentials(), &transport);

    let output = dispatcher
        .dispatch("get_scan_results", &json!({ "scan_ref": "scan/1710000000.12345" }))
        .await;
    assert!(!output.is_error());
    assert_eq!(parsed(output.text()), json!({ "raw": body }));
    assert_eq!(
        transport.last_request().body(),
        "action=fetch&scan_ref=scan%2F1710000000.12345&output_format=json_extended"
    );
}

#[tokio::test]
async fn vm_scan_days_becomes_a_cutoff_date() {
    let transport = RecordingTransport::ok("<HOST_LIST_OUTPUT/>");
    let dispatcher = dispatcher(credentials(), &transport);

    dispatcher.dispatch("list_hosts", &json!({ "vm_scan_days": 30 })).await;
    assert_eq!(
        transport.last_request().body(),
        "action=list&details=Basic&vm_scan_since=2024-02-09"
    );

    let exclusive = self::dispatcher(
        credentials().with_days_boundary(DaysBoundary::Exclusive),
        &transport,
    );
    exclusive.dispatch("list_hosts", &json!({ "vm_scan_days": "30" })).await;
    assert_eq!(
        transport.last_request().body(),
        "action=list&details=Basic&vm_scan_since=2024-02-10"
    );
}

#[tokio::test(start_paused = true)]
async fn consecutive_dispatches_are_spaced() {
    let transport = RecordingTransport::ok("<OK/>");
    let dispatcher = Dispatcher::new(credentials(), Arc::clone(&transport) as Arc<dyn Transport>)
        .unwrap()
        .with_today(fixed_today);

    for _ in 0..3 {
        dispatcher.dispatch("list_scans", &json!({})).await;
    }

    let starts = transport.started_at();
    assert_eq!(starts.len(), 3);
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= MIN_REQUEST_INTERVAL);
    }
}

#[tokio::test]
async fn registry_matches_dispatch_table() {
    let transport = RecordingTransport::ok("<OK/>");
    let dispatcher = dispatcher(credentials(), &transport);

    let names: Vec<&str> = dispatcher
        .definitions()
        .into_iter()
        .map(OperationDefinition::name)
        .collect();
    assert_eq!(
        names,
        [
            "list_hosts",
            "list_host_detections",
            "list_scans",
            "launch_scan",
            "get_scan_results",
            "cancel_scan",
            "pause_scan",
            "resume_scan",
            "list_reports",
            "launch_report",
            "download_report",
            "list_asset_groups",
            "get_vulnerability_details",
            "search_vulnerabilities_by_cve",
            "list_scanner_appliances",
            "list_option_profiles",
            "list_tags",
            "list_activity_log",
        ]
    );

    for name in names {
        let output = dispatcher.dispatch(name, &json!({})).await;
        assert!(
            !output.text().starts_with("Error: Unknown tool"),
            "{name} has no handler"
        );
    }
}
