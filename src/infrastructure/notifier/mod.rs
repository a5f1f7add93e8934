use crate::core::models::todo::TodoView;
use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TodoEventKind {
    Created,
    Updated,
    Deleted,
}

impl TodoEventKind {
    pub fn event_name(self) -> &'static str {
        match self {
            TodoEventKind::Created => "todo-created",
            TodoEventKind::Updated => "todo-updated",
            TodoEventKind::Deleted => "todo-deleted",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TodoEvent {
    pub kind: TodoEventKind,
    pub todo: TodoView,
}

/// Fans todo mutations out to every connected client.
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<TodoEvent>,
}

impl Notifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Notifier { tx }
    }

    pub fn publish(&self, kind: TodoEventKind, todo: TodoView) {
        let todo_id = todo.id;
        match self.tx.send(TodoEvent { kind, todo }) {
            Ok(receivers) => {
                tracing::debug!(event = kind.event_name(), %todo_id, receivers, "Broadcast todo event")
            }
            Err(_) => tracing::debug!(event = kind.event_name(), %todo_id, "No subscribers for todo event"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TodoEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
