pub mod cache;
pub mod case;
pub mod compatibility;
pub mod dimensions;
pub mod feedback;
pub mod gear;
