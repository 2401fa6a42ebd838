use crate::types::enums::{ArbitrationStatus, ConversationStatus, RequestStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request not found")]
    NotFound,
    #[error("invalid state: request is {from:?}")]
    InvalidState { from: RequestStatus },
    #[error("user already has an active request")]
    ActiveRequestExists,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("store error: {message}")]
    Store { message: String },
}

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant not found")]
    NotFound,
    #[error("invalid state: {message}")]
    InvalidState { message: String },
    #[error("store error: {message}")]
    Store { message: String },
}

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("conversation not found")]
    NotFound,
    #[error("invalid state: conversation is {from:?}")]
    InvalidState { from: ConversationStatus },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("store error: {message}")]
    Store { message: String },
}

#[derive(Debug, Error)]
pub enum ArbitrationError {
    #[error("arbitration not found")]
    NotFound,
    #[error("an active arbitration already exists for this pair")]
    AlreadyEscalated,
    #[error("arbitration already claimed by another moderator")]
    AlreadyClaimed,
    #[error("invalid state: arbitration is {from:?}")]
    InvalidState { from: ArbitrationStatus },
    #[error("store error: {message}")]
    Store { message: String },
}

#[derive(Debug, Error)]
pub enum ModeratorError {
    #[error("moderator not found")]
    NotFound,
    #[error("store error: {message}")]
    Store { message: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no pending session for this actor")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("store error: {message}")]
    Store { message: String },
}

#[derive(Debug, Error)]
pub enum InvitationError {
    #[error("invitation token is invalid")]
    InvalidToken,
    #[error("invitation already used")]
    AlreadyUsed,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("store error: {message}")]
    Store { message: String },
}

/// Outbound delivery failure. Never rolls back state; the dispatcher retries
/// once and then drops the notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("send failed: {message}")]
    SendFailed { message: String },
}

#[derive(Debug, Error)]
pub enum HelplineError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Assistant(#[from] AssistantError),
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error(transparent)]
    Arbitration(#[from] ArbitrationError),
    #[error(transparent)]
    Moderator(#[from] ModeratorError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Invitation(#[from] InvitationError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
