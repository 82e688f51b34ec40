use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{BidAcceptedEvent, BidPlacedEvent, EventHandler, EventProducer, Handler};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub bid_accepted_producer: Vec<EventProducer<BidAcceptedEvent>>,
    pub bid_placed_producer: Vec<EventProducer<BidPlacedEvent>>,
}

pub struct EventHandlers {
    pub on_bid_accepted: Option<EventHandler<BidAcceptedEvent>>,
    pub on_bid_placed: Option<EventHandler<BidPlacedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_bid_accepted = hooks.on_bid_accepted.map(|f| EventHandler::new(buffer_size, f));
        let on_bid_placed = hooks.on_bid_placed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_bid_accepted, on_bid_placed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_bid_accepted {
            result.bid_accepted_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_bid_placed {
            result.bid_placed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_bid_accepted {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_bid_placed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

/// The hook points the surrounding system can attach to. The chat-channel creator and notification dispatcher are
/// wired in here by the server at startup.
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_bid_accepted: Option<Handler<BidAcceptedEvent>>,
    pub on_bid_placed: Option<Handler<BidPlacedEvent>>,
}

impl EventHooks {
    pub fn on_bid_accepted<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BidAcceptedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_bid_accepted = Some(Arc::new(f));
        self
    }

    pub fn on_bid_placed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(BidPlacedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_bid_placed = Some(Arc::new(f));
        self
    }
}
