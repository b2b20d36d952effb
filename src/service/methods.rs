//! Fully-qualified operation names
//!
//! Access patterns in the ACL are matched against these strings.

pub const CHECK: &str = "/main.Biz/Check";
pub const ADD: &str = "/main.Biz/Add";
pub const TEST: &str = "/main.Biz/Test";
pub const LOGGING: &str = "/main.Admin/Logging";
pub const STATISTICS: &str = "/main.Admin/Statistics";
