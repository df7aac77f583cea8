//! Headless core of a trade-flow dashboard: two CSV datasets loaded
//! once into memory, then a filter → aggregate → render pipeline that
//! re-runs in full on every UI event, producing serializable chart
//! specs and a map plan.

pub mod aggregate;
pub mod controller;
pub mod data;
pub mod feed;
pub mod filter;
pub mod logging;
pub mod render;
pub mod state;
pub mod storage;
