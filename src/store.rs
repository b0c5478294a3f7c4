use chrono::Utc;

use crate::config::Settings;
use crate::error::StorageError;
use crate::storage::KeyValueStore;
use crate::timeline::{Author, Message, STORAGE_KEY, Timeline};

/// Owns the conversation and keeps the stored snapshot in step with it.
///
/// Storage failures never reach the caller as errors: a failed load leaves
/// the seeded timeline in place, a failed write is logged and the next
/// successful write catches the snapshot up.
pub struct TimelineStore<S> {
    storage: S,
    timeline: Timeline,
    local: Author,
    counterpart: Author,
    reply_text: String,
}

impl<S: KeyValueStore> TimelineStore<S> {
    pub fn initialize(storage: S, settings: &Settings) -> Self {
        let settings = &settings.clone().sanitized();
        let counterpart = Author::counterpart(settings.counterpart_name.clone());
        let timeline = match storage.get(STORAGE_KEY) {
            Ok(Some(json)) => match Timeline::from_snapshot(&json) {
                Ok(timeline) => timeline,
                Err(e) => {
                    log::warn!("discarding stored messages: {e}");
                    Self::seed(settings, &counterpart)
                }
            },
            Ok(None) => Self::seed(settings, &counterpart),
            Err(e) => {
                log::warn!("failed to load messages from storage: {e}");
                Self::seed(settings, &counterpart)
            }
        };
        Self {
            storage,
            timeline,
            local: Author::local(settings.local_name.clone()),
            counterpart,
            reply_text: settings.reply_text.clone(),
        }
    }

    fn seed(settings: &Settings, counterpart: &Author) -> Timeline {
        Timeline::seeded(&settings.welcome_text, counterpart.clone(), Utc::now())
    }

    pub fn messages(&self) -> &[Message] {
        self.timeline.messages()
    }

    /// Appends and persists. Returns false when the message was refused.
    pub fn append(&mut self, message: Message) -> bool {
        if let Err(e) = self.timeline.append(message) {
            log::debug!("message not appended: {e}");
            return false;
        }
        if let Err(e) = self.persist() {
            log::warn!("failed to save messages to storage: {e}");
        }
        true
    }

    /// Overwrites the stored snapshot with the whole current timeline.
    pub fn persist(&mut self) -> Result<(), StorageError> {
        let json = self.timeline.to_snapshot()?;
        self.storage.set(STORAGE_KEY, &json)
    }

    /// Posts `text` as the local user. Blank input yields `None`.
    pub fn send(&mut self, text: &str) -> Option<Message> {
        let message = self.timeline.compose(self.local.clone(), text, Utc::now());
        self.append(message.clone()).then_some(message)
    }

    /// Posts the counterpart's canned reply.
    pub fn deliver_reply(&mut self) -> Option<Message> {
        let message = self
            .timeline
            .compose(self.counterpart.clone(), &self.reply_text, Utc::now());
        self.append(message.clone()).then_some(message)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
