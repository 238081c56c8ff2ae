//! Search lifecycle controller.
//!
//! Runs geocode lookups off the UI thread and reports outcomes back as events.

use crate::geocode::{GeocodeError, Geocoder};
use crate::model::{AppEvent, Coordinate, InfoEvent};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Commands emitted by the UI to the controller.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Search { ticket: u64, query: String },
    Quit,
}

type SearchOutcome = (u64, String, std::result::Result<Coordinate, GeocodeError>);

/// Internal handle for an in-flight lookup.
struct SearchCtx {
    ticket: u64,
    query: String,
    handle: Option<tokio::task::JoinHandle<SearchOutcome>>,
}

fn start_search(geocoder: Arc<dyn Geocoder>, ticket: u64, query: String) -> SearchCtx {
    let q = query.clone();
    let handle = tokio::spawn(async move {
        let outcome = geocoder.geocode(&q).await;
        (ticket, q, outcome)
    });
    SearchCtx {
        ticket,
        query,
        handle: Some(handle),
    }
}

/// Serve search requests until the UI quits or drops its command sender.
/// At most one lookup runs at a time; a newer request aborts the older one.
pub(crate) async fn run_controller(
    geocoder: Arc<dyn Geocoder>,
    event_tx: UnboundedSender<AppEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut in_flight: Option<SearchCtx> = None;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Search { ticket, query }) => {
                        if let Some(mut prev) = in_flight.take() {
                            if let Some(h) = prev.handle.take() {
                                h.abort();
                            }
                            tracing::debug!(ticket = prev.ticket, "search superseded");
                            let _ = event_tx.send(AppEvent::Info(InfoEvent::SearchSuperseded {
                                query: prev.query,
                            }));
                        }
                        tracing::info!(ticket, %query, "search started");
                        in_flight = Some(start_search(geocoder.clone(), ticket, query));
                    }
                    Some(UiCommand::Quit) | None => {
                        if let Some(mut ctx) = in_flight.take() {
                            if let Some(h) = ctx.handle.take() {
                                h.abort();
                            }
                        }
                        break Ok(());
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut in_flight {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                let Some(join_res) = maybe_done else { continue };
                let ctx = in_flight.take();
                match join_res {
                    Ok((ticket, query, outcome)) => {
                        let _ = event_tx.send(AppEvent::SearchCompleted { ticket, query, outcome });
                    }
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => {
                        let (ticket, query) = ctx
                            .map(|c| (c.ticket, c.query))
                            .unwrap_or_default();
                        let _ = event_tx.send(AppEvent::SearchCompleted {
                            ticket,
                            query,
                            outcome: Err(GeocodeError::Service(format!("search task failed: {e}"))),
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Answers after `delay`; "nowhere" has no match.
    struct SlowGeocoder {
        delay: Duration,
    }

    #[async_trait]
    impl Geocoder for SlowGeocoder {
        async fn geocode(&self, query: &str) -> std::result::Result<Coordinate, GeocodeError> {
            tokio::time::sleep(self.delay).await;
            match query {
                "nowhere" => Err(GeocodeError::NotFound),
                _ => Ok(Coordinate::new(23.0, 120.2)),
            }
        }
    }

    fn spawn_controller(
        delay: Duration,
    ) -> (
        mpsc::UnboundedSender<UiCommand>,
        mpsc::UnboundedReceiver<AppEvent>,
        tokio::task::JoinHandle<Result<()>>,
    ) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let geocoder: Arc<dyn Geocoder> = Arc::new(SlowGeocoder { delay });
        let handle = tokio::spawn(run_controller(geocoder, event_tx, cmd_rx));
        (cmd_tx, event_rx, handle)
    }

    #[tokio::test]
    async fn test_search_result_is_delivered() {
        let (cmd_tx, mut event_rx, handle) = spawn_controller(Duration::from_millis(1));
        cmd_tx
            .send(UiCommand::Search {
                ticket: 1,
                query: "Main St".into(),
            })
            .unwrap();

        match event_rx.recv().await.unwrap() {
            AppEvent::SearchCompleted {
                ticket,
                query,
                outcome,
            } => {
                assert_eq!(ticket, 1);
                assert_eq!(query, "Main St");
                assert_eq!(outcome, Ok(Coordinate::new(23.0, 120.2)));
            }
            other => panic!("unexpected event {other:?}"),
        }

        cmd_tx.send(UiCommand::Quit).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_not_found_is_delivered() {
        let (cmd_tx, mut event_rx, _handle) = spawn_controller(Duration::from_millis(1));
        cmd_tx
            .send(UiCommand::Search {
                ticket: 7,
                query: "nowhere".into(),
            })
            .unwrap();
        match event_rx.recv().await.unwrap() {
            AppEvent::SearchCompleted { ticket, outcome, .. } => {
                assert_eq!(ticket, 7);
                assert_eq!(outcome, Err(GeocodeError::NotFound));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_newer_search_supersedes_older() {
        let (cmd_tx, mut event_rx, _handle) = spawn_controller(Duration::from_millis(200));
        cmd_tx
            .send(UiCommand::Search {
                ticket: 1,
                query: "first".into(),
            })
            .unwrap();
        cmd_tx
            .send(UiCommand::Search {
                ticket: 2,
                query: "second".into(),
            })
            .unwrap();

        match event_rx.recv().await.unwrap() {
            AppEvent::Info(InfoEvent::SearchSuperseded { query }) => assert_eq!(query, "first"),
            other => panic!("unexpected event {other:?}"),
        }
        match event_rx.recv().await.unwrap() {
            AppEvent::SearchCompleted { ticket, .. } => assert_eq!(ticket, 2),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropping_sender_stops_controller() {
        let (cmd_tx, _event_rx, handle) = spawn_controller(Duration::from_secs(60));
        cmd_tx
            .send(UiCommand::Search {
                ticket: 1,
                query: "slow".into(),
            })
            .unwrap();
        drop(cmd_tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("controller should stop")
            .unwrap()
            .unwrap();
    }
}
