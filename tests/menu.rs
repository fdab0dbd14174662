use anyhow::anyhow;
use catalog_cli::api::{RequestEnvelope, Transport};
use catalog_cli::dispatcher::Dispatcher;
use catalog_cli::error::ApiError;
use catalog_cli::ui::{run_menu, Prompter};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Write;

/// Answers prompts from a fixed script; running out of lines ends the loop.
struct Script {
    lines: VecDeque<String>,
    prompts: Vec<String>,
}

impl Script {
    fn new(lines: &[&str]) -> Self {
        Script {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            prompts: Vec::new(),
        }
    }
}

impl Prompter for Script {
    fn line(&mut self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.push(prompt.to_string());
        self.lines.pop_front().ok_or_else(|| anyhow!("end of script"))
    }

    fn secret(&mut self, prompt: &str) -> anyhow::Result<String> {
        self.line(prompt)
    }
}

#[derive(Default)]
struct Recorder {
    sent: RefCell<Vec<RequestEnvelope>>,
    replies: RefCell<VecDeque<Result<Value, ApiError>>>,
}

impl Recorder {
    fn replying(replies: Vec<Result<Value, ApiError>>) -> Self {
        Recorder {
            sent: RefCell::default(),
            replies: RefCell::new(replies.into()),
        }
    }
}

impl Transport for Recorder {
    fn send(&self, envelope: &RequestEnvelope) -> Result<Value, ApiError> {
        self.sent.borrow_mut().push(envelope.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({"reason": null})))
    }
}

fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

#[test]
fn add_product_with_defaults_sends_golden_payload() {
    let transport = Recorder::default();
    let dispatcher = Dispatcher::new(&transport);
    // product id, then blank category, manufacturer, name, description, image
    let mut script = Script::new(&["addProduct", "lizard", "", "", "", "", "", "q"]);
    let mut out = Vec::new();

    run_menu(&dispatcher, &mut script, &mut out).unwrap();

    let sent = transport.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        serde_json::to_value(&sent[0]).unwrap(),
        json!({
            "requestType": "addProduct",
            "username": "",
            "token": "",
            "requestData": {
                "productID": "lizard",
                "categoryID": "uncategorized",
                "manufacturer": "unknown",
                "name": {"en": "lizard"}
            }
        })
    );
    assert!(script.prompts.contains(&"Product ID".to_string()));
}

#[test]
fn login_logout_session_flow() {
    let transport = Recorder::replying(vec![
        Ok(json!({"reason": null, "responseData": {"token": "1600000000"}})),
        Ok(json!({"reason": null, "success": true})),
    ]);
    let dispatcher = Dispatcher::new(&transport);
    let mut script = Script::new(&["1", "Administrator", "secret", "logout", "exit"]);
    let mut out = Vec::new();

    let session = run_menu(&dispatcher, &mut script, &mut out).unwrap();

    assert_eq!(session.token, "");
    assert_eq!(session.username, "Administrator");
    let sent = transport.sent.borrow();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].token, "1600000000");

    let text = output(out);
    assert!(text.contains("logged in as Administrator"));
    assert!(text.contains("\"success\": true"));
}

#[test]
fn unknown_selection_reprints_menu_and_sends_nothing() {
    let transport = Recorder::default();
    let dispatcher = Dispatcher::new(&transport);
    let mut script = Script::new(&["99", "fly", "q"]);
    let mut out = Vec::new();

    run_menu(&dispatcher, &mut script, &mut out).unwrap();

    assert!(transport.sent.borrow().is_empty());
    let text = output(out);
    assert!(text.contains("Unknown selection '99'"));
    assert!(text.contains("Unknown selection 'fly'"));
    assert_eq!(text.matches("== Catalog client").count(), 3);
}

#[test]
fn failures_are_reported_and_loop_continues() {
    let transport = Recorder::replying(vec![
        Err(ApiError::Status {
            status: 500,
            body: "boom".into(),
        }),
        Ok(json!({"responseData": {"productItemID": "42"}})),
    ]);
    let dispatcher = Dispatcher::new(&transport);
    let mut script = Script::new(&[
        "getUsers",
        // missing product id: nothing is sent
        "deleteProduct",
        "",
        "addProductItem",
        "lizard",
        "",
        "s",
    ]);
    let mut out = Vec::new();

    // Script runs dry after "s", which ends the loop like an interrupt would.
    let session = run_menu(&dispatcher, &mut script, &mut out).unwrap();

    assert_eq!(session.last_object_id, "42");
    assert_eq!(transport.sent.borrow().len(), 2);
    let text = output(out);
    assert!(text.contains("Failed: server returned HTTP 500: boom"));
    assert!(text.contains("Failed: missing required argument 'productID'"));
    assert!(text.contains("last object id: 42"));
    assert!(text.contains("token: not set"));
}

#[test]
fn menu_lists_every_operation() {
    let dispatcher = Dispatcher::new(Recorder::default());
    let mut script = Script::new(&["q"]);
    let mut out = Vec::new();
    run_menu(&dispatcher, &mut script, &mut out).unwrap();

    let text = output(out);
    for (i, op) in dispatcher.operations().iter().enumerate() {
        let mut expected = Vec::new();
        write!(expected, "{:>3}) {}", i + 1, op.name).unwrap();
        assert!(text.contains(&output(expected)), "missing {}", op.name);
    }
    assert!(text.contains("not logged in"));
}
