use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chatsync_protocol::{ChatroomId, SendMessageRequest};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::auth::SessionManager;
use crate::classify::escalate;
use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::room::Message;

pub const EMPTY_MESSAGE: &str = "Message cannot be empty.";
pub const NO_CHATROOM_SELECTED: &str = "No chatroom selected.";

/// Notifications produced while synchronizing, mostly from the poll task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// The message view of the active chatroom changed
    MessagesUpdated { chatroom: ChatroomId, count: usize },
    /// The server rejected the token; the session is gone and polling stopped
    SessionExpired,
    /// A fetch failed without affecting the session; polling continues
    Transient { message: String },
}

#[derive(Default)]
struct View {
    active: Option<ChatroomId>,
    /// Bumped on every selection; fetch results carry the epoch they started under
    epoch: u64,
    messages: Vec<Message>,
}

#[derive(Clone)]
struct Shared {
    session: SessionManager,
    connection: Connection,
    view: Arc<Mutex<View>>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl Shared {
    fn view(&self) -> MutexGuard<'_, View> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn target(&self) -> Result<(ChatroomId, u64)> {
        let view = self.view();
        view.active
            .map(|id| (id, view.epoch))
            .ok_or_else(|| ClientError::Validation(NO_CHATROOM_SELECTED.to_string()))
    }

    fn notify(&self, event: SyncEvent) {
        // Nobody listening is fine
        self.events.send(event).ok();
    }

    /// Fetch the full message list and replace the view if `epoch` is still current
    async fn fetch(&self, chatroom: ChatroomId, epoch: u64) -> Result<Vec<Message>> {
        let token = self.session.access_token()?;
        let records = self
            .connection
            .fetch_messages(&token, chatroom)
            .await
            .map_err(|e| escalate(&self.session, e))?;

        let messages: Vec<Message> = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| Message::from_record(chatroom, position, record))
            .collect();

        let changed = {
            let mut view = self.view();
            if view.epoch != epoch {
                tracing::debug!(chatroom, "Discarding messages for inactive chatroom");
                return Err(ClientError::Stale { chatroom });
            }
            let changed = view.messages != messages;
            view.messages = messages.clone();
            changed
        };

        if changed {
            tracing::debug!(chatroom, count = messages.len(), "Message view replaced");
            self.notify(SyncEvent::MessagesUpdated {
                chatroom,
                count: messages.len(),
            });
        }
        Ok(messages)
    }
}

/// Handle to a running poll loop; aborts the loop when dropped
struct PollTask {
    handle: JoinHandle<()>,
}

impl PollTask {
    fn spawn(shared: Shared, chatroom: ChatroomId, epoch: u64, period: Duration) -> Self {
        Self {
            handle: tokio::spawn(poll(shared, chatroom, epoch, period)),
        }
    }

    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Fetch immediately, then once per period.
///
/// A tick waits for its own fetch, so poll fetches never overlap; ticks
/// missed meanwhile are skipped.
async fn poll(shared: Shared, chatroom: ChatroomId, epoch: u64, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match shared.fetch(chatroom, epoch).await {
            Ok(_) => {}
            Err(ClientError::SessionExpired) => {
                shared.notify(SyncEvent::SessionExpired);
                break;
            }
            Err(ClientError::Auth(_)) | Err(ClientError::Stale { .. }) => break,
            Err(e) => shared.notify(SyncEvent::Transient {
                message: e.to_string(),
            }),
        }
    }

    tracing::debug!(chatroom, "Poll loop finished");
}

/// Keeps the message view of the active chatroom in sync with the server.
///
/// Each fetch replaces the whole view; nothing is merged or reordered
/// locally. Dropping the synchronizer stops its poll task.
pub struct MessageSynchronizer {
    shared: Shared,
    poll_interval: Duration,
    poller: Mutex<Option<PollTask>>,
}

impl MessageSynchronizer {
    pub fn new(
        session: SessionManager,
        connection: Connection,
        poll_interval: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let synchronizer = Self {
            shared: Shared {
                session,
                connection,
                view: Arc::new(Mutex::new(View::default())),
                events,
            },
            poll_interval,
            poller: Mutex::new(None),
        };

        (synchronizer, receiver)
    }

    /// Make `chatroom` the active target and restart polling.
    ///
    /// The previous poll task is cancelled and the view cleared first. `None`
    /// only stops polling. Must be called from within a Tokio runtime.
    pub fn select_chatroom(&self, chatroom: Option<ChatroomId>) {
        let mut poller = self.poller.lock().unwrap_or_else(PoisonError::into_inner);
        poller.take();

        let epoch = {
            let mut view = self.shared.view();
            view.epoch += 1;
            view.active = chatroom;
            view.messages.clear();
            view.epoch
        };

        match chatroom {
            Some(id) => {
                *poller = Some(PollTask::spawn(
                    self.shared.clone(),
                    id,
                    epoch,
                    self.poll_interval,
                ));
                tracing::info!(chatroom = id, "Chatroom selected");
            }
            None => tracing::info!("Chatroom deselected"),
        }
    }

    /// Fetch the active chatroom's messages once and replace the view.
    ///
    /// Returns [`ClientError::Stale`] if the selection changed while the
    /// request was in flight; the view is then left alone.
    pub async fn fetch_once(&self) -> Result<Vec<Message>> {
        let (chatroom, epoch) = self.shared.target()?;
        self.shared.fetch(chatroom, epoch).await
    }

    /// Post a message to the active chatroom, then refetch to show it.
    ///
    /// Once the post succeeds the call returns `Ok` even if the refetch
    /// fails; a transient refetch failure is reported as
    /// [`SyncEvent::Transient`] instead.
    pub async fn send(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(ClientError::Validation(EMPTY_MESSAGE.to_string()));
        }
        let (chatroom, epoch) = self.shared.target()?;
        let token = self.shared.session.access_token()?;

        self.shared
            .connection
            .send_message(&token, chatroom, &SendMessageRequest { content })
            .await
            .map_err(|e| escalate(&self.shared.session, e))?;
        tracing::debug!(chatroom, "Message sent");

        // Delivered; only an expired session fails the call from here on
        match self.shared.fetch(chatroom, epoch).await {
            Ok(_) | Err(ClientError::Stale { .. }) | Err(ClientError::Auth(_)) => Ok(()),
            Err(ClientError::SessionExpired) => Err(ClientError::SessionExpired),
            Err(e) => {
                self.shared.notify(SyncEvent::Transient {
                    message: e.to_string(),
                });
                Ok(())
            }
        }
    }

    /// Stop polling and clear the selection
    pub fn shutdown(&self) {
        self.select_chatroom(None);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.shared.view().messages.clone()
    }

    pub fn active_chatroom(&self) -> Option<ChatroomId> {
        self.shared.view().active
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(PollTask::is_running)
    }
}
