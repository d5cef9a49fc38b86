pub mod actor;
pub mod domain;
pub mod isolated;
pub mod lab;
pub mod main_actor;
pub mod runtime;
pub mod sendable;
pub mod task;
pub mod transfer;
