// dnsload Driver Library

pub mod command;
pub mod config;
pub mod ramp;
pub mod runlog;
pub mod split;
pub mod supervisor;
