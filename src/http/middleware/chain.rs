//! Fixed pipeline compositions.
//!
//! The two stage orderings are declared once, as data, and applied by a
//! generic composer, so the ordering contract is visible in one place and
//! testable without any route registration. Ordering is load-bearing:
//! compression negotiation sits *outside* failure containment so a recovered
//! panic still yields a finalized gzip stream, and catalog refresh runs
//! before the stopwatch starts so the latency log reflects handler time, not
//! reload time.

use std::sync::Arc;

use crate::http::middleware::{stages, BoxedHandler};
use crate::i18n::Catalog;

/// One pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RefreshCatalog,
    Stopwatch,
    NegotiateCompression,
    CatchPanic,
}

/// Stages of the plain pipeline, outermost first.
pub const PLAIN_STAGES: &[Stage] = &[Stage::RefreshCatalog, Stage::Stopwatch, Stage::CatchPanic];

/// Stages of the compressing pipeline, outermost first.
pub const COMPRESSING_STAGES: &[Stage] = &[
    Stage::RefreshCatalog,
    Stage::Stopwatch,
    Stage::NegotiateCompression,
    Stage::CatchPanic,
];

/// Builds the two pipelines every route is registered through.
#[derive(Clone)]
pub struct ChainBuilder {
    catalog: Arc<Catalog>,
}

impl ChainBuilder {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Plain pipeline: refresh → stopwatch → containment → `f`.
    pub fn plain(&self, f: BoxedHandler) -> BoxedHandler {
        self.compose(PLAIN_STAGES, f)
    }

    /// Compressing pipeline: refresh → stopwatch → negotiation →
    /// containment → `f`.
    pub fn compressing(&self, f: BoxedHandler) -> BoxedHandler {
        self.compose(COMPRESSING_STAGES, f)
    }

    /// Wrap `f` in `stages`, first element outermost.
    pub fn compose(&self, stages: &[Stage], f: BoxedHandler) -> BoxedHandler {
        stages
            .iter()
            .rev()
            .fold(f, |inner, stage| self.apply(*stage, inner))
    }

    fn apply(&self, stage: Stage, next: BoxedHandler) -> BoxedHandler {
        match stage {
            Stage::RefreshCatalog => stages::refresh_catalog(self.catalog.clone(), next),
            Stage::Stopwatch => stages::stopwatch(next),
            Stage::NegotiateCompression => stages::negotiate_compression(next),
            Stage::CatchPanic => stages::catch_panic(next),
        }
    }
}
