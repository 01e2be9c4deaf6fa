use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }

    /// Sends an event after a committed write. Delivery failures are logged,
    /// never surfaced: the write they describe has already happened.
    pub async fn send_or_log(&self, event: Event) {
        let name = event.name();
        if let Err(e) = self.send(event).await {
            warn!(event = name, error = %e, "dropping domain event");
        }
    }
}

/// Domain events emitted after a successful commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    BookCreated(i32),
    BookUpdated(i32),
    BookDeleted(i32),

    StudentCreated(i32),
    StudentUpdated(i32),
    StudentDeleted(i32),

    BookIssued {
        loan_id: i32,
        book_id: i32,
        student_id: i32,
        quantity: i32,
    },
    BookReturned {
        loan_id: i32,
        book_id: i32,
        quantity: i32,
        closed: bool,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::BookCreated(_) => "book_created",
            Event::BookUpdated(_) => "book_updated",
            Event::BookDeleted(_) => "book_deleted",
            Event::StudentCreated(_) => "student_created",
            Event::StudentUpdated(_) => "student_updated",
            Event::StudentDeleted(_) => "student_deleted",
            Event::BookIssued { .. } => "book_issued",
            Event::BookReturned { .. } => "book_returned",
        }
    }
}

/// Creates the event channel with the configured capacity
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::BookIssued {
                loan_id,
                book_id,
                student_id,
                quantity,
            } => info!(
                event = event.name(),
                loan_id, book_id, student_id, quantity, "loan opened"
            ),
            Event::BookReturned {
                loan_id,
                book_id,
                quantity,
                closed,
            } => info!(
                event = event.name(),
                loan_id, book_id, quantity, closed, "copies returned"
            ),
            Event::BookCreated(id) | Event::BookUpdated(id) | Event::BookDeleted(id) => {
                info!(event = event.name(), book_id = id, "catalog changed")
            }
            Event::StudentCreated(id) | Event::StudentUpdated(id) | Event::StudentDeleted(id) => {
                info!(event = event.name(), student_id = id, "roster changed")
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn events_reach_the_receiver_in_order() {
        let (sender, mut rx) = channel(4);
        sender.send(Event::BookCreated(1)).await.unwrap();
        sender.send_or_log(Event::BookDeleted(1)).await;

        assert_eq!(rx.recv().await, Some(Event::BookCreated(1)));
        assert_eq!(rx.recv().await, Some(Event::BookDeleted(1)));
    }

    #[tokio::test]
    async fn sending_to_a_closed_channel_fails() {
        let (sender, rx) = channel(1);
        drop(rx);

        assert_matches!(
            sender.send(Event::StudentCreated(3)).await,
            Err(ServiceError::EventError(_))
        );
        // Logged, not propagated.
        sender.send_or_log(Event::StudentCreated(3)).await;
    }
}
