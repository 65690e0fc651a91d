//! # State Module
//!
//! Shared state the screens hold on to.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                        AppContext                               │   │
//! │  │  config • database • session • locations • api • notices        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │ AuthService  │  │  CartState   │  │ CheckoutWorkflow │              │
//! │  │ OrderService │  │  Arc<Mutex<  │  │ (one per run,    │              │
//! │  │ ListFetchers │  │    Cart      │  │  shares the cart)│              │
//! │  │              │  │  >>          │  │                  │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Stores: internal tokio locks / SQLite pool                          │
//! │  • CartState: Arc<Mutex<Cart>>, shared with checkout                   │
//! │  • ClientConfig: read-only after initialization                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod context;

pub use cart::{CartState, CartTotals};
pub use context::AppContext;
