//! External-collaborator surface of the daovault treasury: the
//! fungible-asset ledger the controller reads balances from and moves
//! funds through, and the conversion gateway it swaps non-reference
//! assets with. In-memory implementations back the test suites and
//! embedded deployments.

pub mod error;
pub mod gateway;
pub mod ledger;

pub use error::{GatewayError, GatewayResult, LedgerError, LedgerResult};
pub use gateway::{ConversionGateway, FixedRateGateway};
pub use ledger::{AssetLedger, MemoryLedger, TransactionRecord};
