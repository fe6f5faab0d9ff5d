pub use crate::check::{
    check_last_activity, check_last_activity_vec, check_no_activity, check_no_activity_vec,
};
pub use crate::compare::{compare_level, compare_unsigned, Base, ExpectedLevel, ExpectedValue};
pub use crate::edge::{clock, clocked_wait_for, pulse};
pub use crate::executor::{JoinHandle, Task};
pub use crate::report::{self, CheckError, CheckReport};
pub use crate::signal::Signal;
pub use crate::sim;
pub use crate::sim_if;
pub use crate::strobe::{generate_strobe, strobe_period, ResetPolarity};
pub use crate::tb_obj::TbObj;
pub use crate::trigger::Trigger;
pub use crate::utils;
pub use crate::value::Val;
pub use crate::{SimpleResult, TbResult};
pub use futures::future::FutureExt;
