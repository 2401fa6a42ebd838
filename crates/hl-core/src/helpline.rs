use crate::config::HelplineConfig;
use crate::error::{
    ArbitrationError, AssistantError, ConversationError, HelplineError, InvitationError,
    ModeratorError, RequestError, SessionError,
};
use crate::invitations::hash_password;
use crate::notify::ActorRef;
use crate::penalty;
use crate::routing::{self, RankedAssistant};
use crate::store::Store;
use crate::types::{
    ActionKind, Arbitration, ArbitrationId, ArbitrationStatus, Assistant, AssistantId,
    CoinTransaction, ConversationStatus, Decision, DialogRef, EventBody, InviteRole,
    MessageSource, Moderator, ModeratorId, OpenArbitrationInput, Party, RequestId, RequestStatus,
    SessionState, SupportRequest, SweepReport, UserId,
};
use crate::validation::{validate_decision, validate_request_transition, validate_target_id};
use crate::{
    actions::ActionRepository, arbitrations::ArbitrationRepository,
    assistants::AssistantRepository, coins::CoinLedgerRepository,
    conversations::ConversationRepository, events::EventRepository,
    invitations::InvitationRepository, moderators::ModeratorRepository,
    requests::RequestRepository, sessions::ActorSessionRepository,
};
use chrono::{DateTime, Utc};
use hl_events::bus::EventBus;
use hl_events::types::{EventRecord, EventSource};

/// At most two scans of the candidate pool per reassignment: one against the
/// current ignored set, one after the single reset.
const MAX_SELECTION_ROUNDS: usize = 2;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub source: EventSource,
    pub correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(source: EventSource, correlation_id: Option<String>) -> Self {
        Self {
            source,
            correlation_id,
        }
    }
}

/// What an actor who just accepted or was redeemed turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemedActor {
    Assistant(Assistant),
    Moderator(Moderator),
}

/// Next step in the moderator direct-message compose flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeReply {
    /// Target accepted; ask the moderator for the message text.
    PromptMessage,
    /// Flow finished; relay `text` to `target`.
    Relay { target: ActorRef, text: String },
}

pub struct Helpline<S: Store> {
    store: S,
    event_bus: EventBus,
    config: HelplineConfig,
}

impl<S: Store> Helpline<S> {
    pub fn new(store: S, event_bus: EventBus, config: HelplineConfig) -> Self {
        Self {
            store,
            event_bus,
            config,
        }
    }

    pub fn requests(&self) -> RequestsApi<'_, S> {
        RequestsApi { core: self }
    }

    pub fn messages(&self) -> MessagesApi<'_, S> {
        MessagesApi { core: self }
    }

    pub fn arbitrations(&self) -> ArbitrationsApi<'_, S> {
        ArbitrationsApi { core: self }
    }

    pub fn assistants(&self) -> AssistantsApi<'_, S> {
        AssistantsApi { core: self }
    }

    pub fn moderators(&self) -> ModeratorsApi<'_, S> {
        ModeratorsApi { core: self }
    }

    pub fn sweep(&self) -> SweepApi<'_, S> {
        SweepApi { core: self }
    }

    pub fn events(&self) -> EventsApi<'_, S> {
        EventsApi { core: self }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &HelplineConfig {
        &self.config
    }

    fn with_events<T, F>(&self, ctx: &RequestContext, f: F) -> Result<T, HelplineError>
    where
        F: FnOnce(&S) -> Result<(T, Vec<EventBody>), HelplineError>,
    {
        let (value, records) = self.store.with_tx(|store| {
            let (value, bodies) = f(store)?;
            let mut records = Vec::new();
            for body in bodies {
                let record = build_event_record(ctx, body)?;
                let record = store.events().append(record)?;
                records.push(record);
            }
            Ok((value, records))
        })?;
        for record in records {
            let _ = self.event_bus.publish(record);
        }
        Ok(value)
    }
}

pub struct RequestsApi<'a, S: Store> {
    core: &'a Helpline<S>,
}

impl<'a, S: Store> RequestsApi<'a, S> {
    /// A user opens a new help request. At most one active request per user;
    /// a candidate assistant is offered immediately when one is available,
    /// otherwise the request stays queued for the sweeper.
    pub fn open(
        &self,
        ctx: &RequestContext,
        user_id: UserId,
    ) -> Result<SupportRequest, HelplineError> {
        let config = &self.core.config;
        self.core.with_events(ctx, |store| {
            if store.requests().get_active_for_user(user_id)?.is_some() {
                return Err(RequestError::ActiveRequestExists.into());
            }
            let request = store.requests().create(user_id)?;
            let mut events = vec![EventBody::RequestOpened {
                request: request.clone(),
            }];
            let window_start = Utc::now() - config.penalty_window();
            match pick_assistant(store, &[], window_start)? {
                Some(assistant) => {
                    let updated = store.requests().assign(&request.id, Some(assistant.id))?;
                    events.push(EventBody::AssistantOffered {
                        request: updated.clone(),
                        assistant_id: assistant.id,
                    });
                    Ok((updated, events))
                }
                None => {
                    events.push(EventBody::RequestQueued {
                        request_id: request.id.clone(),
                    });
                    Ok((request, events))
                }
            }
        })
    }

    /// The offered assistant accepts or rejects. Accept transitions
    /// Pending -> InProgress and opens the conversation; reject records the
    /// penalty action and runs the bounded reassignment loop.
    pub fn decide(
        &self,
        ctx: &RequestContext,
        request_id: &RequestId,
        assistant_id: AssistantId,
        decision: Decision,
    ) -> Result<SupportRequest, HelplineError> {
        let config = &self.core.config;
        self.core.with_events(ctx, |store| {
            let request = store
                .requests()
                .get(request_id)?
                .ok_or(RequestError::NotFound)?;
            validate_decision(&request, assistant_id)?;
            store.assistants().touch(assistant_id, Utc::now())?;
            match decision {
                Decision::Accept => {
                    let assistant = store
                        .assistants()
                        .get(assistant_id)?
                        .ok_or(AssistantError::NotFound)?;
                    if assistant.is_busy {
                        return Err(AssistantError::InvalidState {
                            message: "assistant already holds an active dialog".to_string(),
                        }
                        .into());
                    }
                    let updated =
                        store
                            .requests()
                            .set_status(request_id, RequestStatus::InProgress, true)?;
                    store.assistants().set_busy(assistant_id, true)?;
                    let conversation =
                        store
                            .conversations()
                            .open(request_id, request.user_id, assistant_id)?;
                    Ok((
                        updated.clone(),
                        vec![EventBody::RequestAccepted {
                            request: updated,
                            conversation,
                        }],
                    ))
                }
                Decision::Reject => {
                    reassign(store, config, &request, assistant_id, ActionKind::Rejected)
                }
            }
        })
    }

    /// Close a dialog. Ended by the assistant it counts as a completion and
    /// pays the coin award; ended by the user (or forced by a moderator) it
    /// aborts.
    pub fn end_dialog(
        &self,
        ctx: &RequestContext,
        dialog: &DialogRef,
        ended_by: Party,
    ) -> Result<SupportRequest, HelplineError> {
        let config = &self.core.config;
        self.core.with_events(ctx, |store| {
            let request = resolve_dialog(store, dialog)?;
            match ended_by {
                Party::Assistant => complete(store, config, &request, "Dialog completed"),
                Party::User | Party::Moderator => abort(store, &request),
            }
        })
    }

    pub fn get(&self, id: &RequestId) -> Result<Option<SupportRequest>, HelplineError> {
        self.core
            .store
            .requests()
            .get(id)
            .map_err(HelplineError::from)
    }

    pub fn get_active_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<SupportRequest>, HelplineError> {
        self.core
            .store
            .requests()
            .get_active_for_user(user_id)
            .map_err(HelplineError::from)
    }
}

pub struct MessagesApi<'a, S: Store> {
    core: &'a Helpline<S>,
}

impl<'a, S: Store> MessagesApi<'a, S> {
    /// Route one inbound chat message: record who spoke and return the actors
    /// the transport must relay the text to. While an arbitration over the
    /// same pair is in progress, its moderator listens in on the
    /// conversation.
    pub fn route(
        &self,
        ctx: &RequestContext,
        source: &MessageSource,
        from: Party,
    ) -> Result<Vec<ActorRef>, HelplineError> {
        self.core.with_events(ctx, |store| {
            let at = Utc::now();
            let targets = match source {
                MessageSource::Conversation(id) => {
                    let conversation = store
                        .conversations()
                        .get(id)?
                        .ok_or(ConversationError::NotFound)?;
                    if conversation.status != ConversationStatus::InProgress {
                        return Err(ConversationError::InvalidState {
                            from: conversation.status,
                        }
                        .into());
                    }
                    if from == Party::Moderator {
                        return Err(ConversationError::InvalidInput {
                            message: "moderators speak through arbitrations".to_string(),
                        }
                        .into());
                    }
                    store.conversations().record_message(id, from, at)?;
                    let counterpart = match from {
                        Party::User => ActorRef::assistant(conversation.assistant_id.get()),
                        _ => ActorRef::user(conversation.user_id.get()),
                    };
                    if from == Party::Assistant {
                        store.assistants().touch(conversation.assistant_id, at)?;
                    }
                    let mut targets = vec![counterpart];
                    if let Some(arbitration) = store
                        .arbitrations()
                        .get_active_for_pair(conversation.user_id, conversation.assistant_id)?
                    {
                        if arbitration.status == ArbitrationStatus::InProgress {
                            if let Some(moderator_id) = arbitration.moderator_id {
                                targets.push(ActorRef::moderator(moderator_id.get()));
                            }
                        }
                    }
                    targets
                }
                MessageSource::Arbitration(id) => {
                    let arbitration = store
                        .arbitrations()
                        .get(id)?
                        .ok_or(ArbitrationError::NotFound)?;
                    if arbitration.status != ArbitrationStatus::InProgress {
                        return Err(ArbitrationError::InvalidState {
                            from: arbitration.status,
                        }
                        .into());
                    }
                    match from {
                        Party::Assistant => {
                            store.assistants().touch(arbitration.assistant_id, at)?;
                        }
                        Party::Moderator => {
                            if let Some(moderator_id) = arbitration.moderator_id {
                                store.moderators().touch(moderator_id, at)?;
                            }
                        }
                        Party::User => {}
                    }
                    let mut targets = Vec::new();
                    if from != Party::User {
                        targets.push(ActorRef::user(arbitration.user_id.get()));
                    }
                    if from != Party::Assistant {
                        targets.push(ActorRef::assistant(arbitration.assistant_id.get()));
                    }
                    if from != Party::Moderator {
                        if let Some(moderator_id) = arbitration.moderator_id {
                            targets.push(ActorRef::moderator(moderator_id.get()));
                        }
                    }
                    targets
                }
            };
            Ok((targets, Vec::new()))
        })
    }
}

pub struct ArbitrationsApi<'a, S: Store> {
    core: &'a Helpline<S>,
}

impl<'a, S: Store> ArbitrationsApi<'a, S> {
    pub fn open(
        &self,
        ctx: &RequestContext,
        input: OpenArbitrationInput,
    ) -> Result<Arbitration, HelplineError> {
        self.core.with_events(ctx, |store| {
            if store
                .arbitrations()
                .get_active_for_pair(input.user_id, input.assistant_id)?
                .is_some()
            {
                return Err(ArbitrationError::AlreadyEscalated.into());
            }
            let arbitration = store.arbitrations().create(input)?;
            let offered_to = store
                .moderators()
                .most_recently_active()?
                .map(|moderator| moderator.id);
            Ok((
                arbitration.clone(),
                vec![EventBody::ArbitrationOpened {
                    arbitration,
                    offered_to,
                }],
            ))
        })
    }

    /// First moderator to claim wins; the transactional compare-and-set makes
    /// the loser observe `AlreadyClaimed` without mutating anything.
    pub fn claim(
        &self,
        ctx: &RequestContext,
        id: &ArbitrationId,
        moderator_id: ModeratorId,
    ) -> Result<Arbitration, HelplineError> {
        self.core.with_events(ctx, |store| {
            store
                .moderators()
                .get(moderator_id)?
                .ok_or(ModeratorError::NotFound)?;
            store.moderators().touch(moderator_id, Utc::now())?;
            let arbitration = store.arbitrations().claim(id, moderator_id)?;
            Ok((
                arbitration.clone(),
                vec![EventBody::ArbitrationClaimed { arbitration }],
            ))
        })
    }

    pub fn resolve(
        &self,
        ctx: &RequestContext,
        id: &ArbitrationId,
        moderator_id: ModeratorId,
    ) -> Result<Arbitration, HelplineError> {
        self.core.with_events(ctx, |store| {
            let arbitration = store
                .arbitrations()
                .get(id)?
                .ok_or(ArbitrationError::NotFound)?;
            if arbitration.status != ArbitrationStatus::InProgress
                || arbitration.moderator_id != Some(moderator_id)
            {
                return Err(ArbitrationError::InvalidState {
                    from: arbitration.status,
                }
                .into());
            }
            let resolved = store.arbitrations().resolve(id)?;
            Ok((
                resolved.clone(),
                vec![EventBody::ArbitrationResolved {
                    arbitration: resolved,
                }],
            ))
        })
    }

    pub fn get(&self, id: &ArbitrationId) -> Result<Option<Arbitration>, HelplineError> {
        self.core
            .store
            .arbitrations()
            .get(id)
            .map_err(HelplineError::from)
    }
}

pub struct AssistantsApi<'a, S: Store> {
    core: &'a Helpline<S>,
}

impl<'a, S: Store> AssistantsApi<'a, S> {
    /// Redeem an invitation token: creates the assistant or moderator row and
    /// burns the token in one transaction.
    pub fn redeem_invitation(
        &self,
        ctx: &RequestContext,
        token: &str,
        actor_id: i64,
    ) -> Result<RedeemedActor, HelplineError> {
        self.core.with_events(ctx, |store| {
            let invitation = store
                .invitations()
                .get_by_token(token)?
                .ok_or(InvitationError::InvalidToken)?;
            if invitation.used {
                return Err(InvitationError::AlreadyUsed.into());
            }
            store.invitations().mark_used(token)?;
            match invitation.role {
                InviteRole::Assistant => {
                    let assistant = store.assistants().create(AssistantId::new(actor_id))?;
                    Ok((
                        RedeemedActor::Assistant(assistant.clone()),
                        vec![EventBody::AssistantJoined { assistant }],
                    ))
                }
                InviteRole::Moderator => {
                    let login =
                        invitation
                            .login
                            .clone()
                            .ok_or_else(|| InvitationError::InvalidInput {
                                message: "moderator invitation carries no login".to_string(),
                            })?;
                    let password_hash = invitation
                        .password_hash
                        .clone()
                        .unwrap_or_else(|| hash_password("defaultPassword"));
                    let moderator = store.moderators().create(
                        ModeratorId::new(actor_id),
                        &login,
                        &password_hash,
                    )?;
                    Ok((
                        RedeemedActor::Moderator(moderator.clone()),
                        vec![EventBody::ModeratorJoined { moderator }],
                    ))
                }
            }
        })
    }

    /// Work-shift toggle. Going off shift while holding a dialog is refused.
    pub fn set_working(
        &self,
        ctx: &RequestContext,
        assistant_id: AssistantId,
        working: bool,
    ) -> Result<Assistant, HelplineError> {
        self.core.with_events(ctx, |store| {
            let assistant = store
                .assistants()
                .get(assistant_id)?
                .ok_or(AssistantError::NotFound)?;
            if !working && assistant.is_busy {
                return Err(AssistantError::InvalidState {
                    message: "cannot leave shift while holding a dialog".to_string(),
                }
                .into());
            }
            store.assistants().touch(assistant_id, Utc::now())?;
            let updated = store.assistants().set_working(assistant_id, working)?;
            Ok((
                updated.clone(),
                vec![EventBody::WorkShiftChanged { assistant: updated }],
            ))
        })
    }

    pub fn touch(
        &self,
        ctx: &RequestContext,
        assistant_id: AssistantId,
    ) -> Result<Assistant, HelplineError> {
        self.core.with_events(ctx, |store| {
            let assistant = store.assistants().touch(assistant_id, Utc::now())?;
            Ok((assistant, Vec::new()))
        })
    }

    pub fn get(&self, assistant_id: AssistantId) -> Result<Option<Assistant>, HelplineError> {
        self.core
            .store
            .assistants()
            .get(assistant_id)
            .map_err(HelplineError::from)
    }

    pub fn balance(
        &self,
        assistant_id: AssistantId,
    ) -> Result<(i64, Vec<CoinTransaction>), HelplineError> {
        let assistant = self
            .core
            .store
            .assistants()
            .get(assistant_id)?
            .ok_or(AssistantError::NotFound)?;
        let transactions = self.core.store.coins().list_for_assistant(assistant_id)?;
        Ok((assistant.coins, transactions))
    }
}

pub struct ModeratorsApi<'a, S: Store> {
    core: &'a Helpline<S>,
}

impl<'a, S: Store> ModeratorsApi<'a, S> {
    pub fn touch(
        &self,
        ctx: &RequestContext,
        moderator_id: ModeratorId,
    ) -> Result<Moderator, HelplineError> {
        self.core.with_events(ctx, |store| {
            let moderator = store.moderators().touch(moderator_id, Utc::now())?;
            Ok((moderator, Vec::new()))
        })
    }

    /// Start the direct-message flow: the moderator picked a target role and
    /// will be prompted for a chat id next.
    pub fn begin_compose(
        &self,
        ctx: &RequestContext,
        moderator_id: ModeratorId,
        target_role: Party,
    ) -> Result<(), HelplineError> {
        let ttl = self.core.config.session_ttl();
        self.core.with_events(ctx, |store| {
            if target_role == Party::Moderator {
                return Err(SessionError::InvalidInput {
                    message: "compose targets are users or assistants".to_string(),
                }
                .into());
            }
            store
                .moderators()
                .get(moderator_id)?
                .ok_or(ModeratorError::NotFound)?;
            store.moderators().touch(moderator_id, Utc::now())?;
            store.sessions().put(
                moderator_id.get(),
                Party::Moderator,
                SessionState::AwaitingTargetId { target_role },
                Utc::now() + ttl,
            )?;
            Ok(((), Vec::new()))
        })
    }

    /// Feed the moderator's next text input through the compose state
    /// machine.
    pub fn compose_input(
        &self,
        ctx: &RequestContext,
        moderator_id: ModeratorId,
        text: &str,
    ) -> Result<ComposeReply, HelplineError> {
        let ttl = self.core.config.session_ttl();
        self.core.with_events(ctx, |store| {
            let now = Utc::now();
            let session = store
                .sessions()
                .get(moderator_id.get(), Party::Moderator, now)?
                .ok_or(SessionError::NotFound)?;
            match session.state {
                SessionState::AwaitingTargetId { target_role } => {
                    let target_id = validate_target_id(text)?;
                    store.sessions().put(
                        moderator_id.get(),
                        Party::Moderator,
                        SessionState::AwaitingMessage {
                            target_role,
                            target_id,
                        },
                        now + ttl,
                    )?;
                    Ok((ComposeReply::PromptMessage, Vec::new()))
                }
                SessionState::AwaitingMessage {
                    target_role,
                    target_id,
                } => {
                    store.sessions().clear(moderator_id.get(), Party::Moderator)?;
                    Ok((
                        ComposeReply::Relay {
                            target: ActorRef {
                                role: target_role,
                                id: target_id,
                            },
                            text: format!("Message from moderator:\n\n{text}"),
                        },
                        Vec::new(),
                    ))
                }
            }
        })
    }
}

pub struct SweepApi<'a, S: Store> {
    core: &'a Helpline<S>,
}

enum SweepOutcome {
    Completed,
    Reassigned,
}

impl<'a, S: Store> SweepApi<'a, S> {
    /// One sweeper pass. Every item runs in its own transaction; a failing
    /// item is logged and counted, never aborts the batch.
    pub fn run(&self, ctx: &RequestContext) -> Result<SweepReport, HelplineError> {
        let config = &self.core.config;
        let now = Utc::now();
        let mut report = SweepReport::default();

        let stale = self
            .core
            .store
            .conversations()
            .list_stale(now - config.idle_timeout())?;
        for conversation in stale {
            let outcome = self.core.with_events(ctx, |store| {
                let Some(conversation) = store.conversations().get(&conversation.id)? else {
                    return Ok((None, Vec::new()));
                };
                if conversation.status != ConversationStatus::InProgress {
                    return Ok((None, Vec::new()));
                }
                let Some(request) = store.requests().get(&conversation.request_id)? else {
                    return Ok((None, Vec::new()));
                };
                if !request.is_active || request.status != RequestStatus::InProgress {
                    return Ok((None, Vec::new()));
                }
                match conversation.last_message_from {
                    Party::User => {
                        let (_, events) = reassign(
                            store,
                            config,
                            &request,
                            conversation.assistant_id,
                            ActionKind::Rejected,
                        )?;
                        Ok((Some(SweepOutcome::Reassigned), events))
                    }
                    _ => {
                        let (_, events) =
                            complete(store, config, &request, "Automatic dialog completion")?;
                        Ok((Some(SweepOutcome::Completed), events))
                    }
                }
            });
            match outcome {
                Ok(Some(SweepOutcome::Completed)) => report.completed += 1,
                Ok(Some(SweepOutcome::Reassigned)) => report.reassigned += 1,
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(conversation = %conversation.id, error = %err, "sweep: conversation item failed");
                    report.failed += 1;
                }
            }
        }

        let offer_cutoff = now - config.offer_timeout();
        let stale_offers = self.core.store.requests().list_stale_offers(offer_cutoff)?;
        for request in stale_offers {
            let outcome = self.core.with_events(ctx, |store| {
                let Some(request) = store.requests().get(&request.id)? else {
                    return Ok((false, Vec::new()));
                };
                if request.status != RequestStatus::Pending || request.updated_at >= offer_cutoff {
                    return Ok((false, Vec::new()));
                }
                let Some(offender) = request.assistant_id else {
                    return Ok((false, Vec::new()));
                };
                let (_, events) =
                    reassign(store, config, &request, offender, ActionKind::Ignored)?;
                Ok((true, events))
            });
            match outcome {
                Ok(true) => report.offers_expired += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(request = %request.id, error = %err, "sweep: expired offer item failed");
                    report.failed += 1;
                }
            }
        }

        let unassigned = self.core.store.requests().list_unassigned()?;
        let window_start = now - config.penalty_window();
        for request in unassigned {
            let outcome = self.core.with_events(ctx, |store| {
                let Some(request) = store.requests().get(&request.id)? else {
                    return Ok((false, Vec::new()));
                };
                if request.status != RequestStatus::Pending || request.assistant_id.is_some() {
                    return Ok((false, Vec::new()));
                }
                match pick_assistant(store, &request.ignored_assistants, window_start)? {
                    Some(assistant) => {
                        let updated = store.requests().assign(&request.id, Some(assistant.id))?;
                        Ok((
                            true,
                            vec![EventBody::AssistantOffered {
                                request: updated,
                                assistant_id: assistant.id,
                            }],
                        ))
                    }
                    None => Ok((false, Vec::new())),
                }
            });
            match outcome {
                Ok(true) => report.revisited += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(request = %request.id, error = %err, "sweep: unassigned item failed");
                    report.failed += 1;
                }
            }
        }

        match self.core.store.sessions().cleanup(now) {
            Ok(deleted) => report.sessions_expired = deleted,
            Err(err) => {
                tracing::warn!(error = %err, "sweep: session cleanup failed");
                report.failed += 1;
            }
        }

        Ok(report)
    }
}

pub struct EventsApi<'a, S: Store> {
    core: &'a Helpline<S>,
}

impl<'a, S: Store> EventsApi<'a, S> {
    pub fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, HelplineError> {
        self.core.store.events().list(after, limit)
    }
}

fn build_event_record(ctx: &RequestContext, body: EventBody) -> Result<EventRecord, HelplineError> {
    let value = serde_json::to_value(body).map_err(|err| HelplineError::Internal {
        message: err.to_string(),
    })?;
    Ok(EventRecord {
        id: String::new(),
        seq: 0,
        at: Utc::now(),
        correlation_id: ctx.correlation_id.clone(),
        source: ctx.source,
        body: value,
    })
}

fn resolve_dialog<S: Store>(
    store: &S,
    dialog: &DialogRef,
) -> Result<SupportRequest, HelplineError> {
    match dialog {
        DialogRef::Request(id) => {
            let request = store.requests().get(id)?.ok_or(RequestError::NotFound)?;
            Ok(request)
        }
        DialogRef::Conversation(id) => {
            let conversation = store
                .conversations()
                .get(id)?
                .ok_or(ConversationError::NotFound)?;
            let request = store
                .requests()
                .get(&conversation.request_id)?
                .ok_or(RequestError::NotFound)?;
            Ok(request)
        }
    }
}

/// Rank the available pool by penalty and recency and take the head.
fn pick_assistant<S: Store>(
    store: &S,
    exclude: &[AssistantId],
    window_start: DateTime<Utc>,
) -> Result<Option<Assistant>, HelplineError> {
    let available = store.assistants().list_available(exclude)?;
    let mut ranked = Vec::with_capacity(available.len());
    for assistant in available {
        let actions = store
            .actions()
            .list_for_assistant_since(assistant.id, window_start)?;
        ranked.push(RankedAssistant {
            penalty: penalty::score(&actions),
            assistant,
        });
    }
    Ok(routing::select(ranked))
}

/// The shared rejection/ignore path: audit the action, grow the ignored set,
/// free the offender, abort any open conversation, then look for a
/// replacement. The ignored set is cleared at most once when the pool is
/// exhausted; if the rescan also finds nobody the request stays Pending and
/// unassigned for the sweeper to revisit.
fn reassign<S: Store>(
    store: &S,
    config: &HelplineConfig,
    request: &SupportRequest,
    offender: AssistantId,
    kind: ActionKind,
) -> Result<(SupportRequest, Vec<EventBody>), HelplineError> {
    validate_request_transition(request.status, RequestStatus::Pending)?;
    let mut events = Vec::new();

    store.actions().append(&request.id, offender, kind)?;
    events.push(match kind {
        ActionKind::Rejected => EventBody::RequestRejected {
            request_id: request.id.clone(),
            assistant_id: offender,
        },
        ActionKind::Ignored => EventBody::RequestIgnored {
            request_id: request.id.clone(),
            assistant_id: offender,
        },
    });

    if let Some(conversation) = store.conversations().get_by_request(&request.id)? {
        if conversation.status == ConversationStatus::InProgress {
            let closed = store
                .conversations()
                .close(&conversation.id, ConversationStatus::Aborted)?;
            events.push(EventBody::ConversationClosed {
                conversation: closed,
            });
        }
    }

    store.assistants().set_busy(offender, false)?;

    let mut ignored = request.ignored_assistants.clone();
    if !ignored.contains(&offender) {
        ignored.push(offender);
    }
    store.requests().set_ignored(&request.id, &ignored)?;
    store
        .requests()
        .set_status(&request.id, RequestStatus::Pending, true)?;

    let window_start = Utc::now() - config.penalty_window();
    let mut chosen = None;
    for round in 0..MAX_SELECTION_ROUNDS {
        if let Some(assistant) = pick_assistant(store, &ignored, window_start)? {
            chosen = Some(assistant);
            break;
        }
        if round + 1 == MAX_SELECTION_ROUNDS {
            break;
        }
        ignored.clear();
        store.requests().set_ignored(&request.id, &ignored)?;
    }

    let updated = match chosen {
        Some(assistant) => {
            let updated = store.requests().assign(&request.id, Some(assistant.id))?;
            events.push(EventBody::AssistantOffered {
                request: updated.clone(),
                assistant_id: assistant.id,
            });
            updated
        }
        None => {
            let updated = store.requests().assign(&request.id, None)?;
            events.push(EventBody::RequestQueued {
                request_id: request.id.clone(),
            });
            updated
        }
    };

    Ok((updated, events))
}

/// Completion path shared by the explicit end-dialog call and the sweeper:
/// terminal status, conversation closed, assistant freed and paid exactly
/// once.
fn complete<S: Store>(
    store: &S,
    config: &HelplineConfig,
    request: &SupportRequest,
    reason: &str,
) -> Result<(SupportRequest, Vec<EventBody>), HelplineError> {
    validate_request_transition(request.status, RequestStatus::Completed)?;
    let updated = store
        .requests()
        .set_status(&request.id, RequestStatus::Completed, false)?;
    let mut events = vec![EventBody::RequestCompleted {
        request: updated.clone(),
    }];

    if let Some(conversation) = store.conversations().get_by_request(&request.id)? {
        let closed = store
            .conversations()
            .close(&conversation.id, ConversationStatus::Completed)?;
        events.push(EventBody::ConversationClosed {
            conversation: closed,
        });
    }

    if let Some(assistant_id) = request.assistant_id {
        store.assistants().set_busy(assistant_id, false)?;
        store.assistants().add_coins(assistant_id, config.coin_award)?;
        let transaction = store
            .coins()
            .append(assistant_id, config.coin_award, reason)?;
        events.push(EventBody::CoinsAwarded { transaction });
    }

    Ok((updated, events))
}

fn abort<S: Store>(
    store: &S,
    request: &SupportRequest,
) -> Result<(SupportRequest, Vec<EventBody>), HelplineError> {
    validate_request_transition(request.status, RequestStatus::Aborted)?;
    let updated = store
        .requests()
        .set_status(&request.id, RequestStatus::Aborted, false)?;
    let mut events = Vec::new();

    if let Some(conversation) = store.conversations().get_by_request(&request.id)? {
        if conversation.status == ConversationStatus::InProgress {
            let closed = store
                .conversations()
                .close(&conversation.id, ConversationStatus::Aborted)?;
            events.push(EventBody::ConversationClosed {
                conversation: closed,
            });
        }
    }

    if let Some(assistant_id) = request.assistant_id {
        store.assistants().set_busy(assistant_id, false)?;
    }

    events.insert(
        0,
        EventBody::RequestAborted {
            request: updated.clone(),
        },
    );
    Ok((updated, events))
}
