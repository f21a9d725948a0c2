mod booth;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use booth::Booth;
pub use types::ComponentState;
