// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test doubles for code built on this crate.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::{FetchError, Upstream, UpstreamResponse};

/// A scripted answer of [`ScriptedUpstream`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// `200 OK` with the JSON document as body.
    Json(Value),
    /// The given status with an empty body.
    Status(u16),
    /// The given status and raw body.
    Body(u16, Vec<u8>),
    /// A transport failure.
    Transport(String),
    /// Never answers.
    Hang,
    /// Answers with the inner reply after a delay.
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    /// Wraps this reply so it is returned after `delay`.
    #[must_use]
    pub fn after(self, delay: Duration) -> Self {
        Self::Delayed(delay, Box::new(self))
    }
}

/// An [`Upstream`] replaying a script of replies.
///
/// Scripted replies are consumed in order; once the script is exhausted every call gets the
/// fallback reply. Clones share the script and the call log.
///
/// # Example
///
/// ```
/// use steadfetch::testing::{Reply, ScriptedUpstream};
///
/// let upstream = ScriptedUpstream::new(Reply::Status(503)).then(Reply::Json(serde_json::json!({ "id": 1 })));
/// assert_eq!(upstream.calls(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ScriptedUpstream {
    script: Arc<Mutex<Script>>,
}

#[derive(Debug)]
struct Script {
    replies: VecDeque<Reply>,
    fallback: Reply,
    requested: Vec<String>,
}

impl ScriptedUpstream {
    /// Creates an upstream answering every call with `fallback`.
    #[must_use]
    pub fn new(fallback: Reply) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                replies: VecDeque::new(),
                fallback,
                requested: Vec::new(),
            })),
        }
    }

    /// Creates an upstream answering every call with `document`.
    #[must_use]
    pub fn json(document: Value) -> Self {
        Self::new(Reply::Json(document))
    }

    /// Appends a reply to the script.
    #[must_use]
    pub fn then(self, reply: Reply) -> Self {
        self.push(reply);
        self
    }

    /// Appends a reply to the script of a shared upstream.
    pub fn push(&self, reply: Reply) {
        self.script.lock().replies.push_back(reply);
    }

    /// Replaces the reply used once the script is exhausted.
    pub fn set_fallback(&self, reply: Reply) {
        self.script.lock().fallback = reply;
    }

    /// Number of calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.script.lock().requested.len()
    }

    /// Ids requested so far, in call order.
    #[must_use]
    pub fn requested_ids(&self) -> Vec<String> {
        self.script.lock().requested.clone()
    }

    /// Forgets the calls made so far.
    pub fn clear_calls(&self) {
        self.script.lock().requested.clear();
    }

    fn next_reply(&self, id: &str) -> Reply {
        let mut script = self.script.lock();
        script.requested.push(id.to_owned());
        match script.replies.pop_front() {
            Some(reply) => reply,
            None => script.fallback.clone(),
        }
    }
}

impl Upstream for ScriptedUpstream {
    async fn get(&self, id: &str) -> Result<UpstreamResponse, FetchError> {
        let mut reply = self.next_reply(id);
        while let Reply::Delayed(delay, next) = reply {
            tokio::time::sleep(delay).await;
            reply = *next;
        }

        match reply {
            Reply::Json(document) => {
                let body = serde_json::to_vec(&document).map_err(FetchError::transport)?;
                Ok(UpstreamResponse::new(200, body))
            }
            Reply::Status(status) => Ok(UpstreamResponse::new(status, Vec::new())),
            Reply::Body(status, body) => Ok(UpstreamResponse::new(status, body)),
            Reply::Transport(message) => Err(FetchError::Transport(message)),
            Reply::Hang | Reply::Delayed(..) => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn replays_script_then_fallback() {
        let upstream = ScriptedUpstream::new(Reply::Status(404))
            .then(Reply::Transport("reset".to_owned()))
            .then(Reply::Json(json!({ "a": 1 })));

        assert_eq!(upstream.get("x").await, Err(FetchError::Transport("reset".to_owned())));
        assert_eq!(upstream.get("y").await.unwrap().body, br#"{"a":1}"#.to_vec());
        assert_eq!(upstream.get("z").await.unwrap().status, 404);
        assert_eq!(upstream.requested_ids(), ["x", "y", "z"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_reply_waits() {
        let upstream = ScriptedUpstream::new(Reply::Status(200).after(Duration::from_secs(2)));
        let started = tokio::time::Instant::now();

        let response = upstream.get("x").await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn clones_share_calls() {
        let upstream = ScriptedUpstream::json(json!(null));
        let clone = upstream.clone();
        clone.next_reply("a");
        assert_eq!(upstream.calls(), 1);
        upstream.clear_calls();
        assert_eq!(clone.calls(), 0);
    }
}
