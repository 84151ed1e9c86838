use std::collections::HashMap;
use std::sync::Mutex;

use super::PlaybackContext;

/// In-memory playback contexts, one per session token.
///
/// Contexts live only as long as the session: logout drops them. Concurrent
/// requests for the same session are not serialized, the last write wins.
#[derive(Default)]
pub struct PlaybackContextStore {
    contexts: Mutex<HashMap<String, PlaybackContext>>,
}

impl PlaybackContextStore {
    pub fn get(&self, session_token: &str) -> Option<PlaybackContext> {
        self.contexts.lock().unwrap().get(session_token).cloned()
    }

    pub fn put(&self, session_token: &str, context: PlaybackContext) {
        self.contexts
            .lock()
            .unwrap()
            .insert(session_token.to_string(), context);
    }

    pub fn remove(&self, session_token: &str) {
        self.contexts.lock().unwrap().remove(session_token);
    }
}
