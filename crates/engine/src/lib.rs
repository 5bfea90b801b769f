//! # AgroLens Engine
//!
//! The raster index engine behind the multi-temporal viewer: spectral-index
//! formulas, per-image caching, spatial aggregation over user geometries and
//! the session state the host UI drives.
//!
//! Everything here is single-threaded and host-driven. Batch ingestion is a
//! sequential fold over input files; per-file failures are collected, never
//! fatal. Each raster owns its index cache exclusively, so memoization needs
//! no locks.

pub mod aggregate;
pub mod cache;
pub mod indices;
pub mod ingest;
pub mod measurements;
pub mod render;
pub mod scene;
pub mod series;

pub use aggregate::Aggregate;
pub use cache::IndexCache;
pub use indices::{Overlay, SpectralIndex};
pub use ingest::{ingest_batch, IngestReport, InputFile};
pub use scene::{PointKind, Region, SamplePoint, Scene, SceneImage};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregate::Aggregate;
    pub use crate::indices::{Overlay, SpectralIndex};
    pub use crate::ingest::{ingest_batch, IngestReport, InputFile};
    pub use crate::scene::{PointKind, Scene};
    pub use agrolens_core::prelude::*;
}
