//! Scripted in-memory [`StreamFetcher`] for tests.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;

use crate::error::FetchError;

use super::fetcher::{ByteStream, FetchRequest, OpenStream, StreamFetcher};

/// Canned response for one request.
pub enum Script {
    /// Connection refused
    Refuse,
    Status(u16),
    /// Never answers
    Hang,
    /// Body chunks, then end-of-stream
    Body(Vec<Vec<u8>>),
    /// Body chunks, then a transport error
    Broken(Vec<Vec<u8>>),
    /// Body chunks, then no further data ever
    Stall(Vec<Vec<u8>>),
    /// Body chunks, each delivered after the given delay
    Paced(Duration, Vec<Vec<u8>>),
}

fn to_chunks<I, S>(chunks: I) -> Vec<Vec<u8>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    chunks
        .into_iter()
        .map(|c| c.as_ref().as_bytes().to_vec())
        .collect()
}

impl Script {
    pub fn body<I: IntoIterator<Item = S>, S: AsRef<str>>(chunks: I) -> Self {
        Script::Body(to_chunks(chunks))
    }

    pub fn raw(chunks: Vec<Vec<u8>>) -> Self {
        Script::Body(chunks)
    }

    pub fn broken<I: IntoIterator<Item = S>, S: AsRef<str>>(chunks: I) -> Self {
        Script::Broken(to_chunks(chunks))
    }

    pub fn stall<I: IntoIterator<Item = S>, S: AsRef<str>>(chunks: I) -> Self {
        Script::Stall(to_chunks(chunks))
    }

    pub fn paced<I: IntoIterator<Item = S>, S: AsRef<str>>(delay: Duration, chunks: I) -> Self {
        Script::Paced(delay, to_chunks(chunks))
    }
}

/// Observes what happened to one opened body stream.
#[derive(Default)]
pub struct StreamProbe {
    reads: AtomicUsize,
    cancelled: AtomicBool,
}

impl StreamProbe {
    /// Number of times the body was polled.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// The body was dropped before it reached end-of-stream.
    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct ProbedStream {
    inner: ByteStream,
    probe: Arc<StreamProbe>,
    finished: bool,
}

impl Stream for ProbedStream {
    type Item = Result<Vec<u8>, FetchError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.probe.reads.fetch_add(1, Ordering::SeqCst);
        let polled = self.inner.poll_next_unpin(cx);
        if let Poll::Ready(None) = polled {
            self.finished = true;
        }
        polled
    }
}

impl Drop for ProbedStream {
    fn drop(&mut self) {
        if !self.finished {
            self.probe.cancelled.store(true, Ordering::SeqCst);
        }
    }
}

/// Answers requests from per-URL queues of scripts and records every request.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    requests: Mutex<Vec<FetchRequest>>,
    probes: Mutex<HashMap<String, Arc<StreamProbe>>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, url: impl Into<String>, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.into())
            .or_default()
            .push_back(script);
        self
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    /// Probe for the most recent body opened for `url`. Created up front so
    /// tests can grab it before the request is made.
    pub fn probe(&self, url: &str) -> Arc<StreamProbe> {
        Arc::clone(
            self.probes
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default(),
        )
    }

    fn probed(&self, url: &str, inner: ByteStream) -> ByteStream {
        let probe = self.probe(url);
        ProbedStream {
            inner,
            probe,
            finished: false,
        }
        .boxed()
    }
}

#[async_trait]
impl StreamFetcher for ScriptedFetcher {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, request: &FetchRequest) -> Result<OpenStream, FetchError> {
        self.requests.lock().unwrap().push(request.clone());
        let url = request.url.clone();
        let script = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&url)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(Script::Status(404));

        let body: ByteStream = match script {
            Script::Refuse => {
                return Err(FetchError::Network {
                    url,
                    message: "connection refused".into(),
                })
            }
            Script::Status(status) if !(200..300).contains(&status) => {
                return Err(FetchError::HttpStatus { url, status })
            }
            Script::Status(_) => stream::empty().boxed(),
            Script::Hang => {
                futures_util::future::pending::<()>().await;
                unreachable!()
            }
            Script::Body(chunks) => stream::iter(chunks.into_iter().map(Ok::<_, FetchError>)).boxed(),
            Script::Broken(chunks) => {
                let err = FetchError::Network {
                    url: url.clone(),
                    message: "connection reset".into(),
                };
                stream::iter(chunks.into_iter().map(Ok).chain(std::iter::once(Err(err)))).boxed()
            }
            Script::Stall(chunks) => stream::iter(chunks.into_iter().map(Ok::<_, FetchError>))
                .chain(stream::pending())
                .boxed(),
            Script::Paced(delay, chunks) => stream::iter(chunks)
                .then(move |chunk| async move {
                    tokio::time::sleep(delay).await;
                    Ok::<_, FetchError>(chunk)
                })
                .boxed(),
        };

        Ok(OpenStream {
            status: 200,
            body: self.probed(&url, body),
        })
    }
}
