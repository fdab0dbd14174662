// Library root
// -----------
// Console driver for the JSON-over-HTTP catalog API. The binary
// (`main.rs`) wires these modules into the interactive menu.
//
// Module responsibilities:
// - `session`: client-held username, token and last created object id.
// - `operations`: the request types, their prompts and payload builders.
// - `dispatcher`: builds envelopes, sends them, applies session effects.
// - `api`: request envelope and the blocking HTTP transport.
// - `credentials` / `image`: password digests and image payloads.
// - `ui`: the numbered REPL menu.
pub mod api;
pub mod config;
pub mod credentials;
pub mod dispatcher;
pub mod error;
pub mod image;
pub mod operations;
pub mod session;
pub mod ui;
