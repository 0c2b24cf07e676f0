mod claude;
mod detect;
mod settings;
mod tail;
mod watch;

pub use claude::*;
pub use detect::*;
pub use settings::*;
pub use tail::*;
pub use watch::*;
