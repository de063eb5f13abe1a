mod watch;

pub use test::*;
pub use watch::*;
