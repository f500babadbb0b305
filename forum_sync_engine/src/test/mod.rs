pub mod mocks;
mod sync_flow;
