//! Issue lifecycle against an in-memory GitLab stand-in.

mod common;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use gl_api::{path_args, Payload, Request, RequestBody, Response, Transport, Verb};
use gl_core::GlResult;

use common::{client_with, params};

const ISSUES: &str = "https://gitlab.example.com/api/v4/projects/7/issues";

#[derive(Default)]
struct IssueTracker {
    issues: Mutex<BTreeMap<u64, Value>>,
}

impl IssueTracker {
    fn body(request: &Request) -> Value {
        match &request.body {
            RequestBody::Json(bytes) => serde_json::from_slice(bytes).unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    fn json(status: u16, value: &Value) -> Response {
        Response::new(status, serde_json::to_vec(value).unwrap())
    }
}

#[async_trait]
impl Transport for IssueTracker {
    async fn send(&self, request: &Request) -> GlResult<Response> {
        let mut issues = self.issues.lock().unwrap();
        let path = request.url.split('?').next().unwrap_or_default();

        if path == ISSUES {
            return Ok(match request.verb {
                Verb::Post => {
                    let iid = issues.keys().next_back().copied().unwrap_or(0) + 1;
                    let mut issue = Self::body(request);
                    issue["iid"] = json!(iid);
                    issue["state"] = json!("opened");
                    issues.insert(iid, issue.clone());
                    Self::json(201, &issue)
                }
                Verb::Get => Self::json(200, &Value::Array(issues.values().cloned().collect())),
                _ => Response::new(405, ""),
            });
        }

        let iid = match path
            .strip_prefix(ISSUES)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.parse::<u64>().ok())
        {
            Some(iid) => iid,
            None => return Ok(Response::new(404, r#"{"message":"404 Not found"}"#)),
        };

        if request.verb == Verb::Delete {
            return Ok(match issues.remove(&iid) {
                Some(_) => Response::new(204, ""),
                None => Response::new(404, r#"{"message":"404 Issue Not Found"}"#),
            });
        }

        Ok(match (request.verb, issues.get_mut(&iid)) {
            (_, None) => Response::new(404, r#"{"message":"404 Issue Not Found"}"#),
            (Verb::Get, Some(issue)) => Self::json(200, issue),
            (Verb::Put, Some(issue)) => {
                if let Value::Object(changes) = Self::body(request) {
                    for (key, value) in changes {
                        issue[key.as_str()] = value;
                    }
                }
                Self::json(200, issue)
            }
            (_, Some(_)) => Response::new(405, ""),
        })
    }
}

fn json_of(payload: Option<Payload>) -> Value {
    payload
        .and_then(Payload::into_json)
        .expect("expected a JSON payload")
}

#[tokio::test]
async fn issue_lifecycle() {
    let tracker = Arc::new(IssueTracker::default());
    let client = client_with(tracker.clone(), |c| c.private_token = Some("t".into()));

    let created = json_of(
        client
            .call(
                "create_project_issue",
                &path_args![7],
                Some(params(json!({"title": "Login broken", "labels": "bug"}))),
            )
            .await
            .unwrap(),
    );
    assert_eq!(created["iid"], 1);
    assert_eq!(created["title"], "Login broken");

    let fetched = json_of(
        client
            .call("get_project_issue", &path_args![7, 1], None)
            .await
            .unwrap(),
    );
    assert_eq!(fetched, created);

    let updated = json_of(
        client
            .call(
                "edit_project_issue",
                &path_args![7, 1],
                Some(params(json!({"state_event": "close", "title": "Login fixed"}))),
            )
            .await
            .unwrap(),
    );
    assert_eq!(updated["title"], "Login fixed");

    let listed = json_of(
        client
            .call("list_project_issues", &path_args![7], None)
            .await
            .unwrap(),
    );
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["title"], "Login fixed");

    let deleted = client
        .call("delete_project_issue", &path_args![7, 1], None)
        .await
        .unwrap();
    assert!(deleted.is_none());

    let gone = client
        .call("get_project_issue", &path_args![7, 1], None)
        .await
        .unwrap();
    assert!(gone.is_none());

    let err = client
        .call(
            "edit_project_issue",
            &path_args![7, 1],
            Some(params(json!({"title": "too late"}))),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn concurrent_calls_share_one_client() {
    let tracker = Arc::new(IssueTracker::default());
    let client = client_with(tracker.clone(), |_| {});

    let mut handles = Vec::new();
    for n in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .call_exchange(
                    "create_project_issue",
                    &path_args![7],
                    Some(params(json!({"title": format!("issue {n}")}))),
                )
                .await
        }));
    }

    for handle in handles {
        let exchange = handle.await.unwrap().unwrap();
        let sent: Value = match exchange.request.body {
            RequestBody::Json(ref bytes) => serde_json::from_slice(bytes).unwrap(),
            ref other => panic!("unexpected body: {other:?}"),
        };
        let received = exchange.payload.and_then(Payload::into_json).unwrap();
        assert_eq!(sent["title"], received["title"]);
    }

    assert_eq!(tracker.issues.lock().unwrap().len(), 8);
}
