pub mod action;
pub mod condition;
pub mod fileclass;
pub mod policy;
pub mod trigger;
