//! Umbrella crate that re-exports the `delve-*` building blocks.
//!
//! Agents run behavior trees from [`bt`] over a world that implements the [`core`] traits; the
//! [`nav`] nodes plan and walk voxel paths through a pathfinding service.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use delve_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use delve_tools as tools;

#[cfg(feature = "bt")]
#[cfg_attr(docsrs, doc(cfg(feature = "bt")))]
pub use delve_bt as bt;

#[cfg(feature = "nav")]
#[cfg_attr(docsrs, doc(cfg(feature = "nav")))]
pub use delve_nav as nav;
