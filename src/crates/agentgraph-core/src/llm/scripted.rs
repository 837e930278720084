//! Deterministic collaborator replaying canned replies

use crate::error::{GraphError, Result};
use crate::llm::config::ChatRequest;
use crate::llm::response::ChatResponse;
use crate::llm::traits::ChatModel;
use crate::messages::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

enum Reply {
    Message(Message),
    Failure { message: String, retryable: bool },
}

/// Chat model returning queued replies in order.
///
/// Every request is recorded and can be inspected with
/// [`requests`](Self::requests). Running out of replies is a
/// non-retryable collaborator error.
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChatModel {
    pub fn new(replies: impl IntoIterator<Item = Message>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(Reply::Message).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another reply
    pub fn push(&self, message: Message) {
        self.lock_replies().push_back(Reply::Message(message));
    }

    /// Queue a failure
    pub fn push_error(&self, message: impl Into<String>, retryable: bool) {
        self.lock_replies().push_back(Reply::Failure {
            message: message.into(),
            retryable,
        });
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ChatRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.lock_replies().len()
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Reply>> {
        self.replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        match self.lock_replies().pop_front() {
            Some(Reply::Message(message)) => Ok(ChatResponse::new(message)),
            Some(Reply::Failure { message, retryable }) => {
                Err(GraphError::Collaborator { message, retryable })
            }
            None => Err(GraphError::collaborator("scripted model has no replies left")),
        }
    }
}
