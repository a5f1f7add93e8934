use crate::core::services::TodoService;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::broadcast::error::RecvError;

/// Server-sent event stream of `todo-created`, `todo-updated` and
/// `todo-deleted` events, each carrying the todo as JSON.
pub async fn todo_events(State(service): State<Arc<TodoService>>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut receiver = service.notifier().subscribe();
    tracing::info!("Event subscriber connected");

    let stream = async_stream::stream! {
        loop {
            match receiver.recv().await {
                Ok(event) => match Event::default().event(event.kind.event_name()).json_data(&event.todo) {
                    Ok(sse) => yield Ok(sse),
                    Err(e) => tracing::error!("Failed to encode todo event: {:?}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Event subscriber lagged, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
