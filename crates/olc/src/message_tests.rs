// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde_json::json;

use ats_core::{ClientId, SessionConfig, SessionId};

use super::*;
use crate::log::{GetLogRequest, LogImportance};

fn config() -> SessionConfig {
    SessionConfig {
        session_name: "run_cts".to_string(),
        plugin_label: "ats_plugin".to_string(),
        plugin_class: "AtsSessionPlugin".to_string(),
        payload: json!({"command": "run cts -m CtsBionicTestCases"}),
        parent_span: Default::default(),
    }
}

#[test]
fn request_wire_shape_is_tagged() {
    let request = Request::GetSession {
        session_id: SessionId::new("s-7"),
        view: SessionView::Status,
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["type"], "GetSession");
    assert_eq!(value["view"], "status");
}

#[test]
fn get_session_view_defaults_to_full() {
    let value = json!({"type": "GetSession", "session_id": "s-7"});
    let request: Request = serde_json::from_value(value).unwrap();
    assert_eq!(
        request,
        Request::GetSession {
            session_id: SessionId::new("s-7"),
            view: SessionView::Full,
        }
    );
}

#[test]
fn create_session_round_trip() {
    let request = Request::CreateSession { config: config() };
    let bytes = serde_json::to_vec(&request).unwrap();
    let back: Request = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back, request);
}

#[test]
fn cancel_notification_is_the_well_known_variant() {
    let request = Request::NotifySession {
        session_id: SessionId::new("s-9"),
        notification: SessionNotification::Cancel,
    };
    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["notification"]["type"], "cancel");
}

#[test]
fn get_log_request_round_trip() {
    let request = Request::GetLog(GetLogRequest {
        enable: true,
        client_id: ClientId::new("c-1"),
        min_importance: LogImportance::Info,
    });
    let bytes = serde_json::to_vec(&request).unwrap();
    let back: Request = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(back, request);
}

#[test]
fn error_response_carries_message() {
    let value = json!({"type": "Error", "message": "no such session"});
    let response: Response = serde_json::from_value(value).unwrap();
    assert_eq!(
        response,
        Response::Error {
            message: "no such session".to_string()
        }
    );
}
