//! End-to-end tests across the context pipeline.

mod pipeline;
