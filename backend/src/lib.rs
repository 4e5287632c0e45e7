//! Image upload service that stores files, answers with a retrieval URL and
//! tracker code, then analyses and records each upload in the background.

pub mod analysis;
pub mod config;
pub mod ledger;
pub mod pipeline;
pub mod routes;
pub mod storage;
#[cfg(test)]
mod test_helpers;
pub mod tracker;
