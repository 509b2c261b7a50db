//! Scripted provider for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{ProviderError, ProviderId, Quote, QuoteProvider};

#[derive(Clone, Copy)]
pub(crate) enum Answer {
    Price(Decimal),
    Full(Quote),
    Nothing,
    Fail,
}

pub(crate) struct StubProvider {
    id: ProviderId,
    answer: Mutex<Answer>,
    available: bool,
    calls: AtomicUsize,
}

impl StubProvider {
    pub(crate) fn new(id: ProviderId, answer: Answer) -> Arc<Self> {
        Arc::new(Self {
            id,
            answer: Mutex::new(answer),
            available: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn unavailable(id: ProviderId) -> Arc<Self> {
        Arc::new(Self {
            id,
            answer: Mutex::new(Answer::Nothing),
            available: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn set(&self, answer: Answer) {
        *self.answer.lock().unwrap() = answer;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for StubProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn try_fetch(&self, _symbol: &str) -> Result<Option<Quote>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = *self.answer.lock().unwrap();
        match answer {
            Answer::Price(p) => Ok(Some(Quote::from_price(p))),
            Answer::Full(q) => Ok(Some(q)),
            Answer::Nothing => Ok(None),
            Answer::Fail => Err(ProviderError::Upstream(stockknock_quotes::Error::HttpStatus {
                status: 503,
                body: "unavailable".to_string(),
            })),
        }
    }
}
