pub mod dispatcher;
pub mod filter;

pub use dispatcher::{Dispatcher, Extractor, InboundMessage};
pub use filter::is_in_scope;
