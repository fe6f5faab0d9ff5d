pub mod check;
pub mod compare;
pub mod edge;
mod engine;
mod executor;
pub mod prelude;
pub mod report;
pub mod signal;
pub mod sim;
pub mod sim_if;
pub mod strobe;
mod tb_obj;
mod trigger;
pub mod utils;
mod value;

pub use executor::{JoinHandle, Task};
pub use tb_obj::TbObj;
pub use trigger::Trigger;
pub use value::Val;

pub type SimpleResult<T> = Result<T, ()>;
pub type TbResult = Result<Val, Val>;
