//! Sequential caption loader
//!
//! Each caption runs fetch, convert, register and attach to completion
//! before the next one starts. Input order therefore decides which track is
//! flagged default, and at most one fetch is in flight per session.

use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;

use super::fetch::CaptionFetcher;
use crate::observe::{EventSink, SessionEvent};
use crate::resource::{ResourceAllocator, ResourceLedger};
use crate::subtitle::{bytes_to_webvtt, WEBVTT_MIME};
use crate::types::CaptionSpec;

/// Where converted captions are attached
pub trait TrackTarget: Send + Sync {
    /// False once the engine behind the target has been disposed
    fn is_live(&self) -> bool;

    /// Attach a converted caption at `address`. Returns false when the
    /// target was disposed and the call was dropped.
    fn attach(&self, spec: &CaptionSpec, address: &str, is_default: bool) -> bool;
}

/// Outcome of one loader run, by caption index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub attached: Vec<usize>,
    pub failed: Vec<usize>,
    /// Converted after the target was disposed
    pub dropped: Vec<usize>,
    /// The run stopped early because the session went away
    pub abandoned: bool,
}

/// The default flag a caption is attached with
pub fn resolve_default(spec: &CaptionSpec, index: usize) -> bool {
    spec.default || index == 0
}

pub struct CaptionLoader<F> {
    fetcher: Arc<F>,
    sink: Arc<dyn EventSink>,
}

impl<F> Clone for CaptionLoader<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: self.fetcher.clone(),
            sink: self.sink.clone(),
        }
    }
}

impl<F: CaptionFetcher> CaptionLoader<F> {
    pub fn new(fetcher: Arc<F>, sink: Arc<dyn EventSink>) -> Self {
        Self { fetcher, sink }
    }

    /// Load `specs` in order into `target`, tracking every created handle
    /// in `ledger`. A failed fetch skips that caption only.
    pub async fn load<A, T>(
        &self,
        specs: &[CaptionSpec],
        ledger: &ResourceLedger<A>,
        target: &T,
    ) -> LoadReport
    where
        A: ResourceAllocator,
        T: TrackTarget,
    {
        let mut report = LoadReport::default();

        for (index, spec) in specs.iter().enumerate() {
            if !target.is_live() {
                report.abandoned = true;
                break;
            }

            tracing::debug!(index, label = %spec.label, src = %spec.src, "converting SRT to WebVTT");
            let bytes = match self.fetcher.fetch(&spec.src).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    self.sink.emit(SessionEvent::CaptionFetchFailed {
                        index,
                        label: spec.label.clone(),
                        location: spec.src.clone(),
                        reason: e.to_string(),
                    });
                    report.failed.push(index);
                    continue;
                }
            };

            let vtt = bytes_to_webvtt(&bytes);

            // The session may have been disposed while the fetch was pending
            if !target.is_live() {
                self.sink.emit(SessionEvent::CaptionDropped {
                    index,
                    label: spec.label.clone(),
                });
                report.dropped.push(index);
                report.abandoned = true;
                break;
            }

            let handle = match ledger.register(Bytes::from(vtt), WEBVTT_MIME) {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::debug!(index, error = %e, "ledger closed, stopping caption load");
                    report.dropped.push(index);
                    report.abandoned = true;
                    break;
                }
            };

            let is_default = resolve_default(spec, index);
            if target.attach(spec, handle.address(), is_default) {
                self.sink.emit(SessionEvent::CaptionAttached {
                    index,
                    label: spec.label.clone(),
                    address: handle.address().to_string(),
                    is_default,
                });
                report.attached.push(index);
            } else {
                self.sink.emit(SessionEvent::CaptionDropped {
                    index,
                    label: spec.label.clone(),
                });
                report.dropped.push(index);
            }
        }

        if !report.abandoned {
            self.sink.emit(SessionEvent::CaptionsLoaded {
                attached: report.attached.len(),
                total: specs.len(),
            });
        }
        report
    }
}
