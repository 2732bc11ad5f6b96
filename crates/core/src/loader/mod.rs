//! Asynchronous hand-off of the feed and textures into the frame loop.
//!
//! Loading happens outside the engine. The loading phase asks a [`Loader`] for
//! a [`LoadTicket`] and polls it once per frame; the content may arrive on any
//! later frame, from any thread.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::{assets::AssetStore, feed::DataPoint, CodeFreqError, Result};

/// Everything the animation needs before the title can show.
#[derive(Debug, Clone, Default)]
pub struct Content {
    pub feed: Vec<DataPoint>,
    pub assets: AssetStore,
}

#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    pub textures: Vec<String>,
}

/// Source of [`Content`].
pub trait Loader {
    fn begin(&mut self, request: LoadRequest) -> LoadTicket;
}

/// Claim on a load in flight.
#[derive(Debug)]
pub struct LoadTicket {
    state: TicketState,
}

#[derive(Debug)]
enum TicketState {
    Ready(Result<Content>),
    Pending(Receiver<Result<Content>>),
    Taken,
}

impl LoadTicket {
    pub fn ready(result: Result<Content>) -> Self {
        Self {
            state: TicketState::Ready(result),
        }
    }

    /// Ticket that resolves when the returned [`Completer`] is used.
    pub fn pending() -> (Self, Completer) {
        let (tx, rx) = mpsc::channel();
        (
            Self {
                state: TicketState::Pending(rx),
            },
            Completer { tx },
        )
    }

    /// Returns the outcome exactly once, `None` while still waiting and after
    /// the outcome has been taken.
    pub fn poll(&mut self) -> Option<Result<Content>> {
        let outcome = match &self.state {
            TicketState::Ready(_) => None,
            TicketState::Pending(rx) => match rx.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => Some(Err(CodeFreqError::load(
                    "loader finished without producing content",
                ))),
            },
            TicketState::Taken => return None,
        };

        match std::mem::replace(&mut self.state, TicketState::Taken) {
            TicketState::Ready(result) => Some(result),
            _ => outcome,
        }
    }
}

/// Sending half of a pending [`LoadTicket`].
#[derive(Debug)]
pub struct Completer {
    tx: Sender<Result<Content>>,
}

impl Completer {
    pub fn complete(self, result: Result<Content>) {
        // The session may already be gone; nobody is left to tell.
        let _ = self.tx.send(result);
    }
}

/// Loader that hands over content prepared up front.
#[derive(Debug, Default)]
pub struct StaticLoader {
    content: Option<Content>,
}

impl StaticLoader {
    pub fn new(content: Content) -> Self {
        Self {
            content: Some(content),
        }
    }
}

impl Loader for StaticLoader {
    fn begin(&mut self, request: LoadRequest) -> LoadTicket {
        let result = self
            .content
            .take()
            .ok_or_else(|| CodeFreqError::load("content has already been handed out"))
            .and_then(|content| {
                content
                    .assets
                    .ensure(&request.textures)
                    .map_err(|err| CodeFreqError::load(err.to_string()))?;
                Ok(content)
            });
        LoadTicket::ready(result)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn content() -> Content {
        Content {
            feed: vec![DataPoint::new(1, 2, -3)],
            assets: AssetStore::builtin(),
        }
    }

    #[test]
    fn ready_ticket_yields_once() {
        let mut ticket = LoadTicket::ready(Ok(content()));
        assert!(matches!(ticket.poll(), Some(Ok(_))));
        assert!(ticket.poll().is_none());
    }

    #[test]
    fn pending_ticket_resolves_from_another_thread() {
        let (mut ticket, completer) = LoadTicket::pending();
        assert!(ticket.poll().is_none());

        thread::spawn(move || completer.complete(Ok(content())))
            .join()
            .unwrap();

        let loaded = ticket.poll().unwrap().unwrap();
        assert_eq!(loaded.feed.len(), 1);
        assert!(ticket.poll().is_none());
    }

    #[test]
    fn dropped_completer_is_a_load_failure() {
        let (mut ticket, completer) = LoadTicket::pending();
        drop(completer);
        assert!(matches!(
            ticket.poll(),
            Some(Err(CodeFreqError::LoadFailure(_)))
        ));
        assert!(ticket.poll().is_none());
    }

    #[test]
    fn static_loader_checks_requested_textures() {
        let mut loader = StaticLoader::new(Content {
            feed: Vec::new(),
            assets: AssetStore::new(),
        });
        let mut ticket = loader.begin(LoadRequest {
            textures: vec!["planet".to_string()],
        });
        let err = ticket.poll().unwrap().unwrap_err();
        assert!(format!("{err}").contains("planet"));
    }
}
