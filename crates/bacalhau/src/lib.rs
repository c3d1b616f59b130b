//! Bacalhau requester-API and IPFS gateway clients.
//!
//! [`api::BacalhauApi`] submits jobs and queries their state and published
//! results; [`ipfs::IpfsGateway`] downloads the published result files into
//! a local directory.

pub mod api;
pub mod ipfs;
pub mod model;
