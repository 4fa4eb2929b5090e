// Price collection, position book and trade execution
pub mod executor;
pub mod position_manager;
pub mod price_buffer;
pub mod price_feed;
pub mod session;

pub use executor::{ExecutionAction, ExecutionDecision, Executor};
pub use position_manager::{Position, PositionError, PositionManager, TradeRecord};
pub use price_buffer::PriceHistoryBuffer;
pub use price_feed::{Fetched, GoldSource, PriceFeedManager, PriceTick};
pub use session::TradingSession;
