//! # TutorQ Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (name index lookups)
//! └── src/integration/  # Cross-crate flows
//!     ├── name_index_flows.rs   # identity lifecycle → autocomplete
//!     ├── fanout_flows.rs       # queue writes → broker → notifier → connections
//!     ├── websocket_flows.rs    # WebSocket adapter pumps over in-process channels
//!     └── gateway_flows.rs      # full runtime over a real TCP listener
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p tq-tests
//!
//! # By flow
//! cargo test -p tq-tests integration::fanout_flows::
//!
//! # Benchmarks
//! cargo bench -p tq-tests
//! ```

#![allow(dead_code)]
