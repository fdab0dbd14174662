// Command dispatcher: turns (operation, arguments) into a request envelope,
// sends it, and applies the operation's session effect to the reply.
//
// The session is only touched once a response has been received; a build or
// transport error leaves it exactly as it was.

use crate::api::{RequestEnvelope, Transport};
use crate::credentials::{CredentialEncoder, Sha512Encoder};
use crate::error::DispatchError;
use crate::operations::{self, Args, BuildContext, Effect, OperationDescriptor};
use crate::session::{Session, SessionUpdate};
use serde_json::Value;
use tracing::{debug, info, warn};

pub struct Dispatcher<T, E = Sha512Encoder> {
    transport: T,
    encoder: E,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Dispatcher {
            transport,
            encoder: Sha512Encoder,
        }
    }
}

impl<T: Transport, E: CredentialEncoder> Dispatcher<T, E> {
    pub fn with_encoder(transport: T, encoder: E) -> Self {
        Dispatcher { transport, encoder }
    }

    /// The operation catalog, in menu order.
    pub fn operations(&self) -> &'static [OperationDescriptor] {
        operations::OPERATIONS
    }

    /// Build the envelope for `op` without sending it. Missing session
    /// fields never block the build; the envelope simply carries empty values.
    pub fn build_envelope(
        &self,
        session: &Session,
        op: &OperationDescriptor,
        args: &Args,
    ) -> Result<RequestEnvelope, DispatchError> {
        let ctx = BuildContext {
            session,
            args,
            encoder: &self.encoder,
        };
        let data = op.build_payload(&ctx)?;
        Ok(RequestEnvelope::new(op.name, session, data))
    }

    /// Send `op` and return the server's reply unmodified.
    pub fn execute(
        &self,
        session: &mut Session,
        op: &OperationDescriptor,
        args: &Args,
    ) -> Result<Value, DispatchError> {
        let envelope = self.build_envelope(session, op, args)?;

        let missing = op.missing_fields(session);
        if !missing.is_empty() {
            warn!(operation = op.name, ?missing, "sending request without session fields");
        }
        info!(operation = op.name, "sending request");
        let fields: Vec<&String> = envelope.request_data.keys().collect();
        debug!(operation = op.name, ?fields, "request data");

        let response = self.transport.send(&envelope).map_err(|e| {
            warn!(operation = op.name, error = %e, "request failed");
            DispatchError::from(e)
        })?;

        apply_effect(session, op.effect, args, &response);
        Ok(response)
    }

    /// Convenience wrapper resolving the operation by name.
    pub fn execute_named(
        &self,
        session: &mut Session,
        name: &str,
        args: &Args,
    ) -> Result<Value, DispatchError> {
        let op = operations::lookup(name).ok_or_else(|| DispatchError::InvalidArgument {
            name: "requestType",
            reason: format!("unknown operation '{name}'"),
        })?;
        self.execute(session, op, args)
    }
}

fn apply_effect(session: &mut Session, effect: Effect, args: &Args, response: &Value) {
    match effect {
        Effect::None => {}
        Effect::CaptureLogin => match login_token(response) {
            Some(token) => {
                let username = response
                    .pointer("/responseData/username")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .or_else(|| args.get("username").map(str::to_string));
                session.update(SessionUpdate {
                    username,
                    token: Some(token),
                    ..Default::default()
                });
                info!(username = %session.username, "logged in");
            }
            None => {
                warn!("login response carried no token");
                session.clear_token();
            }
        },
        Effect::ClearToken => {
            session.clear_token();
            info!("logged out");
        }
        Effect::CaptureObjectId => {
            if let Some(id) = created_item_id(response) {
                session.update(SessionUpdate {
                    last_object_id: Some(id),
                    ..Default::default()
                });
            }
        }
    }
}

/// `responseData.productItemID`, or the last id when `responseData` is the
/// bare list of created item ids.
fn created_item_id(response: &Value) -> Option<String> {
    match response.get("responseData") {
        Some(Value::Array(ids)) => ids.last().and_then(id_string),
        Some(data) => data.get("productItemID").and_then(id_string),
        None => None,
    }
}

/// `responseData.token`, falling back to a top-level `token`.
fn login_token(response: &Value) -> Option<String> {
    response
        .pointer("/responseData/token")
        .and_then(id_string)
        .or_else(|| response.get("token").and_then(id_string))
}

/// Ids and tokens come back either as strings or as numbers.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
