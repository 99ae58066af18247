//! Workspace-level integration tests. See `pg_flow.rs`.
