//! Decides whether an inbound event needs translating and posting
//!
//! Classification is pure: the same event and configuration always give the
//! same answer, and nothing here touches the network.

use crate::config::{ClassifierConfig, ClassifierMode, CommentFallback};
use crate::event::{InboundEvent, PlatformEvent, RelayMessage};
use crate::translate::normalize_language;
use std::collections::HashSet;

/// Attachment field carrying the detected source language
pub const LANG_FIELD: &str = "lang";
/// Attachment field carrying the text to translate
pub const COMMENT_FIELD: &str = "comment";

/// The pieces of an actionable event the rest of the pipeline needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub channel: String,
    /// Reply anchor; `None` posts a new top-level message
    pub thread_id: Option<String>,
    pub text: String,
    /// Normalized `lang` field, when the event carried one
    pub source_language: Option<String>,
}

/// Why an event was let through without doing anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingEvent,
    NotAMessage,
    /// Replies are never translated; the relay's own replies would loop otherwise
    ThreadReply,
    MissingChannel,
    NoAttachments,
    LanguageNotNeeded(String),
    EmptyText,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingEvent => write!(f, "payload carries no event"),
            SkipReason::NotAMessage => write!(f, "event is not a message"),
            SkipReason::ThreadReply => write!(f, "event is a thread reply"),
            SkipReason::MissingChannel => write!(f, "no channel to post to"),
            SkipReason::NoAttachments => write!(f, "message has no attachments"),
            SkipReason::LanguageNotNeeded(lang) => {
                write!(f, "language '{}' does not need translation", lang)
            }
            SkipReason::EmptyText => write!(f, "nothing to translate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Actionable(ClassifiedEvent),
    NoActionNeeded(SkipReason),
}

#[derive(Debug, Clone)]
pub struct EventClassifier {
    mode: ClassifierMode,
    languages: HashSet<String>,
    comment_fallback: CommentFallback,
    default_channel: Option<String>,
}

impl EventClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            mode: config.mode,
            languages: config
                .languages
                .iter()
                .map(|code| normalize_language(code))
                .collect(),
            comment_fallback: config.comment_fallback,
            default_channel: config.default_channel.clone(),
        }
    }

    pub fn classify(&self, event: &InboundEvent) -> Classification {
        match event {
            InboundEvent::Relay(message) => self.classify_relay(message),
            InboundEvent::Platform(event) => self.classify_platform(event),
            InboundEvent::UrlVerification { .. } | InboundEvent::Unrecognized => {
                Classification::NoActionNeeded(SkipReason::MissingEvent)
            }
        }
    }

    fn classify_relay(&self, message: &RelayMessage) -> Classification {
        let Some(channel) = message.channel.clone().or_else(|| self.default_channel.clone())
        else {
            return Classification::NoActionNeeded(SkipReason::MissingChannel);
        };

        Classification::Actionable(ClassifiedEvent {
            channel,
            thread_id: message.thread_id.clone(),
            text: message.text.clone(),
            source_language: None,
        })
    }

    fn classify_platform(&self, event: &PlatformEvent) -> Classification {
        if event.kind.as_deref() != Some("message") {
            return Classification::NoActionNeeded(SkipReason::NotAMessage);
        }
        if event.thread_ts.is_some() {
            return Classification::NoActionNeeded(SkipReason::ThreadReply);
        }
        if self.mode == ClassifierMode::Attachments && event.attachments.is_none() {
            return Classification::NoActionNeeded(SkipReason::NoAttachments);
        }

        let source_language = event.field(LANG_FIELD).map(normalize_language);
        if let Some(lang) = &source_language {
            if !self.languages.contains(lang) {
                return Classification::NoActionNeeded(SkipReason::LanguageNotNeeded(
                    lang.clone(),
                ));
            }
        }

        let Some(channel) = event.channel.clone() else {
            return Classification::NoActionNeeded(SkipReason::MissingChannel);
        };

        Classification::Actionable(ClassifiedEvent {
            channel,
            thread_id: event.anchor().map(str::to_string),
            text: self.text_for(event, source_language.is_some()),
            source_language,
        })
    }

    fn text_for(&self, event: &PlatformEvent, has_lang: bool) -> String {
        let message_text = || event.text.clone().unwrap_or_default();
        if self.mode == ClassifierMode::Plain {
            return message_text();
        }

        match event.field(COMMENT_FIELD) {
            Some(comment) => comment.to_string(),
            None if !has_lang => message_text(),
            None => match self.comment_fallback {
                CommentFallback::Empty => String::new(),
                CommentFallback::MessageText => message_text(),
            },
        }
    }
}
