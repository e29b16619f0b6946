//! Mock cluster tests for cdpm-http.
//!
//! These tests run the real reqwest transport against wiremock servers
//! standing in for Cloudera Manager, Ranger, YARN, HDFS, Spark and HUE.

use std::net::TcpListener;
use std::sync::Arc;

use cdpm_core::error::AuthError;
use cdpm_core::{
    Credentials, Error, HeaderToken, HostList, HostUrl, MemorySessionStore, Page, SessionToken,
    StaticAuthorization,
};
use cdpm_http::services::{
    AclChange, AuditQuery, CmClient, CmOptions, HueQpClient, NameNodeClient, QuerySearch,
    RangerClient, SparkHistoryClient, YarnClient,
};
use cdpm_http::{ReqwestTransport, ResilientClient, SessionAuthenticator};
use futures_util::StreamExt;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn host_of(server: &MockServer) -> HostUrl {
    HostUrl::new(format!("http://127.0.0.1:{}", server.address().port())).unwrap()
}

/// A local address nothing listens on.
fn dead_host() -> HostUrl {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    HostUrl::new(format!("http://127.0.0.1:{}", port)).unwrap()
}

fn transport() -> ReqwestTransport {
    ReqwestTransport::new().unwrap()
}

fn session_cookie(value: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", format!("SESSION={}; Path=/; HttpOnly", value).as_str())
        .set_body_json(json!({"items": []}))
}

fn cm_client(server: &MockServer, store: Arc<MemorySessionStore>) -> CmClient {
    let authenticator = SessionAuthenticator::new(Credentials::basic("admin", "secret"))
        .with_probe(cdpm_http::services::CM_PROBE_PATH)
        .with_store(store);
    let hosts = HostList::single(host_of(server));
    let client = ResilientClient::new(transport(), hosts, authenticator);
    CmClient::new(client, CmOptions::default())
}

// ============================================================================
// Cloudera Manager session tests
// ============================================================================

#[tokio::test]
async fn test_cm_session_established_from_basic_auth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/clusters"))
        .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
        .respond_with(session_cookie("abc123"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v41/hosts"))
        .and(query_param("view", "FULL"))
        .and(header("cookie", "SESSION=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"hostname": "node1.example.com"}, {"hostname": "node2.example.com"}]
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let cm = cm_client(&server, store.clone());
    let hosts = cm.hosts().await.unwrap();

    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0]["hostname"], "node1.example.com");
    assert_eq!(store.current().await.unwrap().as_str(), "abc123");
}

#[tokio::test]
async fn test_cm_expired_session_is_renewed_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/clusters"))
        .respond_with(session_cookie("first"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/clusters"))
        .respond_with(session_cookie("second"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v41/commands/7"))
        .and(header("cookie", "SESSION=first"))
        .respond_with(ResponseTemplate::new(401).set_body_string("session expired"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v41/commands/7"))
        .and(header("cookie", "SESSION=second"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7, "name": "Rebalance", "active": false, "success": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let cm = cm_client(&server, store.clone());
    let command = cm.command(7).await.unwrap();

    assert_eq!(command.id, 7);
    assert_eq!(command.success, Some(true));
    assert_eq!(store.current().await.unwrap().as_str(), "second");
    assert_eq!(store.save_count().await, 2);
    assert_eq!(cm.client().authenticator().renewal_count(), 2);
}

#[tokio::test]
async fn test_cm_repeated_401_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/clusters"))
        .respond_with(session_cookie("s"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v41/authRoles"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let cm = cm_client(&server, Arc::new(MemorySessionStore::new()));
    let err = cm.auth_roles().await.unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::Rejected { status: 401, .. })));
}

#[tokio::test]
async fn test_cm_header_token_sent_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/clusters"))
        .and(header("authorization", "Basic cHJlLWVuY29kZWQ="))
        .respond_with(session_cookie("h"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cmf/healthIssues.json"))
        .and(header("cookie", "SESSION=h"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "unhealthyChecks": [{"entityId": "e1", "name": "DATA_NODE_FREE_SPACE"}],
            "unhealthyEntities": [{"entityId": "e1", "hostName": "dn1"}]
        })))
        .mount(&server)
        .await;

    let cm = CmClient::connect(
        transport(),
        HostList::single(host_of(&server)),
        Credentials::Header(HeaderToken::new("cHJlLWVuY29kZWQ=")),
        CmOptions::default(),
    );
    let issues = cm.health_issues().await.unwrap();

    assert_eq!(issues.unhealthy_checks.len(), 1);
    assert_eq!(issues.unhealthy_entities[0]["hostName"], "dn1");
}

#[tokio::test]
async fn test_cm_rejected_session_is_not_persisted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/clusters"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad session"))
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let authenticator = SessionAuthenticator::new(Credentials::Session(SessionToken::new("stale")))
        .with_probe("/api/v1/clusters")
        .with_store(store.clone());
    let hosts = HostList::single(host_of(&server));
    let client = ResilientClient::new(transport(), hosts, authenticator);

    let err = client.authenticate().await.unwrap_err();

    assert!(matches!(err, Error::Auth(AuthError::Rejected { .. })));
    assert_eq!(store.save_count().await, 0);
}

#[tokio::test]
async fn test_cm_rebalance_start_finds_command() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/clusters"))
        .respond_with(session_cookie("r"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/cmf/services/12/instances/34/commands/Rebalance/do"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v41/clusters/prod/services/hdfs/roles/hdfs-BALANCER-1/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"id": 1, "name": "Restart", "active": true},
                {"id": 99, "name": "Rebalance", "active": true}
            ]
        })))
        .mount(&server)
        .await;

    let options = CmOptions {
        cluster_name: "prod".into(),
        rebalance_path: "/cmf/services/12/instances/34/commands/Rebalance".into(),
        rebalance_role: "hdfs-BALANCER-1".into(),
        ..CmOptions::default()
    };
    let cm = CmClient::connect(
        transport(),
        HostList::single(host_of(&server)),
        Credentials::basic("admin", "secret"),
        options,
    );
    let command = cm.rebalance_start().await.unwrap();

    assert_eq!(command.id, 99);
    assert!(command.active);
}

const QUEUES_PATH: &str = "/cmf/clusters/cluster/queue-manager-api/api/v1/environments/dev\
                           /clusters/cluster/resources/scheduler/partitions/default/queues";

async fn mount_queues(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/clusters"))
        .respond_with(session_cookie("q"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(QUEUES_PATH))
        .and(header("cookie", "SESSION=q"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queues": [
                {
                    "name": "root",
                    "queuePath": "root",
                    "state": "RUNNING",
                    "properties": {"queueAcls.SUBMIT_APP": "*", "queueAcls.ADMINISTER_QUEUE": "*"},
                    "capacity": {"percentage": "100"}
                },
                {
                    "name": "etl",
                    "queuePath": "root.etl",
                    "state": "RUNNING",
                    "properties": {
                        "queueAcls.SUBMIT_APP": "etl,ops analysts",
                        "queueAcls.ADMINISTER_QUEUE": "etl,ops analysts",
                        "userLimitFactor": "1"
                    },
                    "capacity": {"percentage": "40"}
                }
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_cm_queue_config_lists_queues() {
    let server = MockServer::start().await;
    mount_queues(&server).await;

    let cm = cm_client(&server, Arc::new(MemorySessionStore::new()));
    let queues = cm.queue_config().await.unwrap();

    assert_eq!(queues.len(), 2);
    assert_eq!(queues[1].queue_path, "root.etl");
    assert_eq!(queues[1].properties.acl_submit, "etl,ops analysts");
    assert_eq!(queues[1].properties.other["userLimitFactor"], "1");
    assert_eq!(queues[1].other["capacity"]["percentage"], "40");
}

#[tokio::test]
async fn test_cm_queue_acls_merged_and_put() {
    let server = MockServer::start().await;
    mount_queues(&server).await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/root.etl", QUEUES_PATH)))
        .and(header("cookie", "SESSION=q"))
        .and(body_partial_json(json!({
            "properties": [
                {"name": "acl_submit_applications", "value": "etl,bob analysts,admins"},
                {"name": "acl_administer_queue", "value": "etl,bob analysts,admins"}
            ],
            "message": "Changed properties of root.etl by automation"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let cm = cm_client(&server, Arc::new(MemorySessionStore::new()));
    let acl = cm
        .update_queue_acls(
            "root.etl",
            &[AclChange::Remove("ops".into()), AclChange::Add("bob".into())],
            &[AclChange::Add("admins".into())],
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(acl.to_string(), "etl,bob analysts,admins");
}

#[tokio::test]
async fn test_cm_queue_acls_unchanged_sends_nothing() {
    let server = MockServer::start().await;
    mount_queues(&server).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cm = cm_client(&server, Arc::new(MemorySessionStore::new()));
    let changed = cm
        .update_queue_acls("root.etl", &[AclChange::Add("etl".into())], &[])
        .await
        .unwrap();
    assert!(changed.is_none());

    let missing = cm.update_queue_acls("root.nope", &[], &[]).await.unwrap_err();
    assert!(matches!(missing, Error::InvalidInput(_)));
}

// ============================================================================
// Failover tests
// ============================================================================

#[tokio::test]
async fn test_failover_to_third_host_and_promote() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ws/v1/cluster/apps/application_1700000000000_0001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "app": {"id": "application_1700000000000_0001", "state": "FINISHED"}
        })))
        .mount(&server)
        .await;

    let h1 = dead_host();
    let h2 = dead_host();
    let h3 = host_of(&server);
    let hosts = HostList::new(vec![h1.clone(), h2.clone(), h3.clone()]).unwrap();
    let yarn = YarnClient::connect(transport(), hosts);

    let app = yarn
        .application("application_1700000000000_0001")
        .await
        .unwrap();

    assert_eq!(app["state"], "FINISHED");
    let order: Vec<HostUrl> = yarn.client().hosts().await.iter().cloned().collect();
    assert_eq!(order, vec![h3, h1, h2]);
}

#[tokio::test]
async fn test_namenode_standby_fails_over() {
    let standby = MockServer::start().await;
    let active = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jmx"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_string("Operation category READ is not supported in state standby"),
        )
        .mount(&standby)
        .await;
    Mock::given(method("GET"))
        .and(path("/jmx"))
        .and(query_param("qry", "Hadoop:service=NameNode,name=NameNodeInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "beans": [{"name": "Hadoop:service=NameNode,name=NameNodeInfo", "Total": 1024}]
        })))
        .mount(&active)
        .await;

    let hosts = HostList::new(vec![host_of(&standby), host_of(&active)]).unwrap();
    let nn = NameNodeClient::connect(transport(), hosts);
    let bean = nn.health_status().await.unwrap();

    assert_eq!(bean["Total"], 1024);
    assert_eq!(nn.client().hosts().await.primary(), &host_of(&active));
}

#[tokio::test]
async fn test_static_authorization_sent_and_401_host_skipped() {
    let kerberized = MockServer::start().await;
    let healthy = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Authentication required"))
        .expect(1)
        .mount(&kerberized)
        .await;
    Mock::given(method("GET"))
        .and(path("/ws/v1/cluster/apps/application_1700000000000_0002"))
        .and(header("authorization", "Negotiate YIIC"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "app": {"id": "application_1700000000000_0002", "state": "RUNNING"}
        })))
        .expect(1)
        .mount(&healthy)
        .await;

    let transport = transport()
        .with_credential_provider(Arc::new(StaticAuthorization::new("Negotiate YIIC")));
    let hosts = HostList::new(vec![host_of(&kerberized), host_of(&healthy)]).unwrap();
    let yarn = YarnClient::connect(transport, hosts);

    let app = yarn
        .application("application_1700000000000_0002")
        .await
        .unwrap();

    assert_eq!(app["state"], "RUNNING");
    assert_eq!(yarn.client().hosts().await.primary(), &host_of(&healthy));
}

#[tokio::test]
async fn test_all_hosts_failing_reports_last_status() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("a broke"))
        .mount(&a)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(503)
                .insert_header("retry-after", "30")
                .set_body_string("b broke"),
        )
        .mount(&b)
        .await;

    let hosts = HostList::new(vec![host_of(&a), host_of(&b)]).unwrap();
    let yarn = YarnClient::connect(transport(), hosts);
    let err = yarn.application("application_1").await.unwrap_err();

    match err {
        Error::ExhaustedHosts(e) => {
            assert_eq!(e.tried, 2);
            assert_eq!(e.last_status(), Some(503));
            assert_eq!(e.last_body(), Some("b broke"));
            assert!(e.last_headers().iter().any(|(k, v)| k == "retry-after" && v == "30"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Spark History tests
// ============================================================================

#[tokio::test]
async fn test_spark_environment_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/applications/app-missing/environment"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such app"))
        .expect(1)
        .mount(&server)
        .await;

    let spark = SparkHistoryClient::connect(transport(), HostList::single(host_of(&server)));
    let err = spark.environment("app-missing").await.unwrap_err();

    assert!(matches!(err, Error::ApplicationNotFound { ref app_id } if app_id == "app-missing"));
}

#[tokio::test]
async fn test_spark_environments_fan_out() {
    let server = MockServer::start().await;

    for id in ["app-1", "app-2", "app-3"] {
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/applications/{}/environment", id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sparkProperties": [["spark.app.id", id]]
            })))
            .mount(&server)
            .await;
    }

    let spark = SparkHistoryClient::connect(transport(), HostList::single(host_of(&server)));
    let ids = vec!["app-1".to_string(), "app-2".to_string(), "app-3".to_string()];
    let mut results: Vec<(String, Value)> = spark
        .environments(ids, 2)
        .map(|(id, env)| (id, env.unwrap()))
        .collect()
        .await;
    results.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(results.len(), 3);
    assert_eq!(results[2].1["sparkProperties"][0][1], "app-3");
}

// ============================================================================
// Pagination tests
// ============================================================================

fn audit_page(start: u64, count: u64, total: u64) -> ResponseTemplate {
    let items: Vec<Value> = (start..start + count).map(|i| json!({"id": i})).collect();
    ResponseTemplate::new(200).set_body_json(json!({
        "startIndex": start,
        "pageSize": 10,
        "totalCount": total,
        "resultSize": count,
        "vXAccessAudits": items
    }))
}

#[tokio::test]
async fn test_ranger_audits_count_bounded() {
    let server = MockServer::start().await;

    for (start, count) in [(0, 10), (10, 10), (20, 5)] {
        Mock::given(method("GET"))
            .and(path("/service/assets/accessAudit"))
            .and(query_param("startIndex", start.to_string()))
            .and(query_param("repoName", "cm_hdfs"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(audit_page(start, count, 25))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/service/assets/accessAudit"))
        .and(query_param("startIndex", "25"))
        .respond_with(audit_page(25, 0, 25))
        .expect(0)
        .mount(&server)
        .await;

    let hosts = HostList::single(host_of(&server));
    let ranger = RangerClient::connect(transport(), hosts, "user", "pass").with_page_size(10);
    let query = AuditQuery {
        service: "cm_hdfs".into(),
        ..AuditQuery::default()
    };
    let pages: Vec<Page<Value>> = ranger
        .access_audit(&query)
        .map(|p| p.unwrap())
        .collect()
        .await;

    assert_eq!(pages.len(), 3);
    let ids: Vec<u64> = pages
        .iter()
        .flat_map(|p| p.items.iter().map(|i| i["id"].as_u64().unwrap()))
        .collect();
    assert_eq!(ids, (0..25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_ranger_policies_stop_on_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/service/plugins/policies"))
        .and(query_param("serviceType", "hive"))
        .and(query_param("policyType", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "startIndex": 0,
            "pageSize": 10,
            "totalCount": 1000,
            "resultSize": 3,
            "policies": [{"id": 1}, {"id": 2}, {"id": 3}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hosts = HostList::single(host_of(&server));
    let ranger = RangerClient::connect(transport(), hosts, "user", "pass").with_page_size(10);
    let pages: Vec<_> = ranger.policies("hive", &[]).collect().await;

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].as_ref().unwrap().items.len(), 3);
}

#[tokio::test]
async fn test_hue_search_pages_until_short_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/query/search"))
        .and(header("x-do-as", "hue"))
        .and(body_partial_json(json!({"search": {"offset": 0, "limit": 2, "type": "BASIC"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queries": [{"queryId": "q1"}, {"queryId": "q2"}],
            "meta": {"limit": 2, "offset": 0, "size": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/query/search"))
        .and(body_partial_json(json!({"search": {"offset": 2}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "queries": [{"queryId": "q3"}],
            "meta": {"limit": 2, "offset": 2, "size": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hue = HueQpClient::connect(transport(), HostList::single(host_of(&server)), "hue")
        .with_page_size(2);
    let search = QuerySearch {
        start_time: 1_700_000_000_000,
        end_time: 1_700_086_400_000,
        text: String::new(),
    };
    let ids: Vec<String> = hue
        .search(&search)
        .map(|p| p.unwrap())
        .flat_map(|p| futures_util::stream::iter(p.items))
        .map(|q| q["queryId"].as_str().unwrap().to_string())
        .collect()
        .await;

    assert_eq!(ids, vec!["q1", "q2", "q3"]);
}
