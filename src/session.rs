// Client-held session: who is logged in, with which token, and the last
// object id the server handed back. Lives only for the duration of the process.

/// Fields an operation may expect to find populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    Username,
    Token,
}

/// Empty strings mean "not set", which is also what goes on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub token: String,
    pub last_object_id: String,
}

/// A partial set of session values to merge in. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub username: Option<String>,
    pub token: Option<String>,
    pub last_object_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the given fields into the session.
    pub fn update(&mut self, fields: SessionUpdate) {
        if let Some(username) = fields.username {
            self.username = username;
        }
        if let Some(token) = fields.token {
            self.token = token;
        }
        if let Some(id) = fields.last_object_id {
            self.last_object_id = id;
        }
    }

    /// Reset everything to the start-of-process state.
    pub fn clear(&mut self) {
        *self = Session::default();
    }

    pub fn clear_token(&mut self) {
        self.token.clear();
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    pub fn has(&self, field: SessionField) -> bool {
        match field {
            SessionField::Username => !self.username.is_empty(),
            SessionField::Token => !self.token.is_empty(),
        }
    }
}
