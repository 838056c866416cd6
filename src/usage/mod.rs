// src/usage/mod.rs
// =============================================================================
// This module reports how many notifications were delivered this month.
//
// Currently implements:
// - Paging through the notifications API with limit/offset
// - Summing per-channel delivery counts (mobile push, web push, email, sms)
// - Stopping once notifications from last month show up
// =============================================================================

mod fetch;

pub use fetch::{UsageClient, UsageTally};
